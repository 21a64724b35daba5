//! Errors for the narration pipeline.

use lorekeeper_domain::GameId;

use crate::infrastructure::ports::RepoError;

/// Failures that prevent a narrative turn from being handled at all.
///
/// Generation failure is deliberately NOT here: after retries are
/// exhausted the pipeline still produces and persists a fallback turn.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Player message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Repo(#[from] RepoError),
}
