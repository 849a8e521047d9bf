//! Bridge protocol errors

use thiserror::Error;

/// Errors on the host bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The event tag is not one the protocol defines
    #[error("Unknown host event type '{0}'")]
    UnknownEventKind(String),

    /// The event needs a primary payload and got none
    #[error("Host event {0} is missing its payload")]
    MissingPayload(&'static str),

    /// The receiving side has been torn down
    #[error("Host bridge is not bound")]
    Unbound,

    /// Envelope JSON could not be parsed
    #[error("Malformed host event: {0}")]
    Malformed(#[from] serde_json::Error),
}
