//! Error type shared by the device core and the host wallet.
//!
//! These never reach the channel directly: the device maps them to a
//! [`StatusWord`](crate::StatusWord) and the host wraps them in its own error.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Library-level errors.
///
/// Messages are intentionally terse to avoid information leakage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Request shorter than its header, or `Lc` disagrees with the body.
    InvalidLength,
    /// Key path deeper than `MAX_BIP32_PATH`.
    PathTooLong,
    /// Key path text or bytes could not be parsed.
    InvalidPath,
    /// Key derivation failed.
    KeyDerivationFailed,
    /// Signing operation failed.
    SigningFailed,
    /// Output buffer too small.
    BufferOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLength => write!(f, "Invalid length"),
            Error::PathTooLong => write!(f, "Keypath too long"),
            Error::InvalidPath => write!(f, "Invalid keypath"),
            Error::KeyDerivationFailed => write!(f, "Key derivation failed"),
            Error::SigningFailed => write!(f, "Signing failed"),
            Error::BufferOverflow => write!(f, "Buffer overflow"),
        }
    }
}

impl core::error::Error for Error {}
