use thiserror::Error;

use crate::span::Position;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lex error at {position}: {message}")]
    Lex { position: Position, message: String },
    #[error("parse error at {position}: {message}")]
    Parse { position: Position, message: String },
    #[error("invalid {kind} {value:?}: {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),
    #[error("invalid type reference: {0}")]
    InvalidTypeRef(String),
    #[error("no type registry registered for binding {0:?}")]
    UnknownBinding(String),
    #[error("invalid type mapping config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("step {step} failed: {message}")]
    StepFailed { step: &'static str, message: String },
}

impl CoreError {
    pub(crate) fn parse(position: Position, message: impl Into<String>) -> CoreError {
        CoreError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Source position for errors that originate in WIT text.
    pub fn position(&self) -> Option<Position> {
        match self {
            CoreError::Lex { position, .. } | CoreError::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}
