//! Shared value types.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BIP32_PATH, P1_SIGN_MNB, P2_SIGN_MNB};

/// SHA-256 digest (32 bytes).
pub type Hash256 = [u8; 32];

/// IPv4 address as carried in the broadcast payload.
pub type Ipv4Addr = [u8; 4];

/// Protocol version for compatibility checks.
pub const PROTOCOL_VERSION: u32 = 1;

/// Device configuration reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfiguration {
    /// Major version.
    pub version_major: u8,
    /// Minor version.
    pub version_minor: u8,
    /// Patch version.
    pub version_patch: u8,
    /// Deepest key path accepted.
    pub max_path_depth: u8,
    /// Only accepted `(P1, P2)` pair for SIGN_MNB.
    pub sign_mnb_params: (u8, u8),
    /// Protocol version for compatibility.
    pub protocol_version: u32,
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            version_major: 0,
            version_minor: 1,
            version_patch: 0,
            max_path_depth: MAX_BIP32_PATH as u8,
            sign_mnb_params: (P1_SIGN_MNB, P2_SIGN_MNB),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

impl AppConfiguration {
    /// Deepest key path the parser accepts, never beyond what a
    /// [`KeyPath`](crate::KeyPath) can hold.
    pub fn max_depth(&self) -> usize {
        (self.max_path_depth as usize).min(MAX_BIP32_PATH)
    }
}
