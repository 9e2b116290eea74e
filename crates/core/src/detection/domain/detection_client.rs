use thiserror::Error;

use crate::shared::detection::Detection;
use crate::shared::frame::PreparedFrame;

#[derive(Error, Debug)]
pub enum DetectionError {
    /// The request never produced an HTTP response (connect, DNS, timeout,
    /// or the body could not be read).
    #[error("network error: {cause}")]
    Network {
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Server responded with {status_code}")]
    Server { status_code: u16 },
    /// A 2xx response whose body is not a valid detection list.
    #[error("malformed detection response: {reason}")]
    Protocol { reason: String },
    /// The request could not be assembled locally; nothing was sent.
    #[error("could not build detection request: {cause}")]
    Request {
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DetectionError {
    pub fn protocol(reason: impl std::fmt::Display) -> Self {
        DetectionError::Protocol {
            reason: reason.to_string(),
        }
    }
}

/// Domain interface for the remote detection service.
///
/// One call is exactly one request; retrying is the caller's decision.
pub trait DetectionClient: Send + Sync {
    fn detect(&self, frame: &PreparedFrame) -> Result<Vec<Detection>, DetectionError>;
}
