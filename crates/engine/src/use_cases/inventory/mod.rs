//! Inventory use cases - consuming held items.

use std::sync::Arc;

mod error;
mod use_item;

pub use error::InventoryError;
pub use use_item::{ItemUseOutcome, UseItem};

/// Container for the inventory use cases.
pub struct InventoryUseCases {
    pub use_item: Arc<UseItem>,
}
