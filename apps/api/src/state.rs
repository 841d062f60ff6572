use crate::config::Config;
use crate::submission::pipeline::Collaborators;
use crate::submission::status::StatusBoard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Storage, conversion, key-value and feedback services used by every run.
    pub collaborators: Collaborators,
    pub status_board: StatusBoard,
    pub config: Config,
}
