//! Client error type.

use common::{Error as CommonError, StatusWord};

/// Errors that can occur when building requests or checking replies.
#[derive(Debug)]
pub enum MnbClientError {
    /// The device answered with a non-success status word.
    Device(StatusWord),
    /// Key path or buffer error from the shared types.
    Common(CommonError),
    /// The reply could not be decoded.
    InvalidResponse(String),
    /// The signature does not verify against the broadcast.
    InvalidSignature,
    /// Malformed input on the host side.
    InvalidInput(String),
    /// I/O error reading a file.
    Io(std::io::Error),
}

impl From<StatusWord> for MnbClientError {
    fn from(sw: StatusWord) -> Self {
        Self::Device(sw)
    }
}

impl From<CommonError> for MnbClientError {
    fn from(e: CommonError) -> Self {
        Self::Common(e)
    }
}

impl From<std::io::Error> for MnbClientError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<&'static str> for MnbClientError {
    fn from(e: &'static str) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<String> for MnbClientError {
    fn from(e: String) -> Self {
        Self::InvalidInput(e)
    }
}

impl std::fmt::Display for MnbClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MnbClientError::Device(sw) => write!(f, "Device error: {}", sw),
            MnbClientError::Common(e) => write!(f, "Error: {}", e),
            MnbClientError::InvalidResponse(e) => write!(f, "InvalidResponse: {}", e),
            MnbClientError::InvalidSignature => write!(f, "Signature does not verify"),
            MnbClientError::InvalidInput(e) => write!(f, "InvalidInput: {}", e),
            MnbClientError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MnbClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MnbClientError::Common(e) => Some(e),
            MnbClientError::Io(e) => Some(e),
            _ => None,
        }
    }
}
