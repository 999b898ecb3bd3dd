//! Error types for the flyover engine.

use thiserror::Error;

/// Errors surfaced by parsing and configuration.
///
/// The controller itself never returns these from a tick or a command; bad
/// input there is clamped or ignored and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlyoverError {
    #[error("unknown camera mode: {0}")]
    UnknownMode(String),
    #[error("unknown view side: {0}")]
    UnknownSide(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("renderer rejected camera update: {0}")]
pub struct RenderError(pub String);
