//! Use cases - the narrative-update pipeline and inventory actions.

pub mod inventory;
pub mod narration;

pub use inventory::InventoryUseCases;
pub use narration::NarrationUseCases;
