//! Wire constants of the SIGN_MNB command.
//!
//! The payload is the hash serialization of a masternode broadcast:
//!
//! ```text
//! outpoint (36) | service ip (16) | port (2) | collateral pubkey (1+33)
//!   | masternode pubkey (1+65) | sig_time (8) | protocol version (4)
//! ```
//!
//! Only the sizes below take part in the minimum length check; the pubkey
//! fields are budgeted at 33 bytes each, as the device does.

/// Class byte of every command understood by the device.
pub const CLA: u8 = 0xE0;

/// Instruction byte of the masternode broadcast signing command.
pub const INS_SIGN_MNB: u8 = 0x50;

/// Only supported P1 value for SIGN_MNB.
pub const P1_SIGN_MNB: u8 = 0xA5;

/// Only supported P2 value for SIGN_MNB.
pub const P2_SIGN_MNB: u8 = 0x5A;

/// Size of the `CLA INS P1 P2 Lc` header.
pub const APDU_HEADER_LEN: usize = 5;

/// Offsets inside the APDU header.
pub const OFFSET_CLA: usize = 0;
pub const OFFSET_INS: usize = 1;
pub const OFFSET_P1: usize = 2;
pub const OFFSET_P2: usize = 3;
pub const OFFSET_LC: usize = 4;

/// Maximum BIP32 derivation depth accepted on the wire.
pub const MAX_BIP32_PATH: usize = 10;

/// Serialized key path capacity: count byte plus `MAX_BIP32_PATH` indices.
pub const KEYPATH_MAX_LEN: usize = 1 + 4 * MAX_BIP32_PATH;

/// Collateral outpoint (txid + vout). Hashed, never interpreted.
pub const OUTPOINT_LEN: usize = 36;

/// IPv6 (or IPv4-mapped) service address.
pub const SERVICE_IP_LEN: usize = 16;

/// Service port.
pub const SERVICE_PORT_LEN: usize = 2;

/// Budget for both public keys.
pub const PUBKEYS_LEN: usize = 2 * 33;

/// Signature timestamp.
pub const SIG_TIME_LEN: usize = 8;

/// Protocol version.
pub const PROTOCOL_VERSION_LEN: usize = 4;

/// Fixed part of the payload that must follow the key path.
pub const MNB_FIXED_LEN: usize =
    OUTPOINT_LEN + SERVICE_IP_LEN + SERVICE_PORT_LEN + PUBKEYS_LEN + SIG_TIME_LEN + PROTOCOL_VERSION_LEN;

/// Offset of the IPv4-mapped marker, relative to the end of the key path.
pub const IPV4_MARKER_OFFSET: usize = OUTPOINT_LEN + 10;

/// Offset of the IPv4 address, relative to the end of the key path.
pub const IPV4_OFFSET: usize = OUTPOINT_LEN + 12;

/// The two bytes preceding an IPv4 address inside an IPv6 field.
pub const IPV4_MARKER: [u8; 2] = [0xFF, 0xFF];

/// Size of the channel reply buffer.
pub const REPLY_BUFFER_SIZE: usize = 260;

/// Upper bound of a DER encoded secp256k1 ECDSA signature.
pub const MAX_DER_SIGNATURE_LEN: usize = 72;

/// Coin type used by the host wallet when it builds key paths (BIP44).
pub const ENERGI_COIN_TYPE: u32 = 9797;

/// Minimum body length for a request declaring `path_count` indices.
#[inline]
pub const fn min_request_len(path_count: usize) -> usize {
    1 + 4 * path_count + MNB_FIXED_LEN
}
