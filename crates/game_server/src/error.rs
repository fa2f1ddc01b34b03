//! Server-level error type.
//!
//! Domain failures have their own enums next to the code that raises them
//! ([`uttt_rules::MoveRejection`], [`crate::room::RegistryError`],
//! [`crate::protocol::ProtocolError`]); this one covers the process-facing
//! infrastructure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
