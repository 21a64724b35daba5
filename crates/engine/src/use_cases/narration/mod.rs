//! The narrative-update pipeline.
//!
//! A player action flows through: prompt assembly -> generation with
//! retries -> embedded-payload extraction -> sanitization/validation ->
//! state mutation -> response composition. Every stage after generation
//! degrades gracefully: a missing or rejected payload still yields a
//! narrative turn, just without state changes.

pub mod apply;
pub mod compose;
mod error;
pub mod extract;
mod handle_player_action;
pub mod payload;
pub mod prompt;

pub use apply::ApplyStateUpdates;
pub use error::NarrationError;
pub use handle_player_action::{HandlePlayerAction, NarrationOutcome};

use std::sync::Arc;

/// Container for the narration use cases.
pub struct NarrationUseCases {
    pub handle_player_action: Arc<HandlePlayerAction>,
}
