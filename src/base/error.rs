//! Error types that are surfaced to users rather than propagated.

use thiserror::Error;

/// Why a page fetch for link-title resolution failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the server could not be reached.
    #[error("could not reach {url}: {reason}")]
    Unreachable { url: String, reason: String },
    /// The server answered but the body could not be read.
    #[error("could not read the body of {url}: {reason}")]
    UnreadableBody { url: String, reason: String },
}
