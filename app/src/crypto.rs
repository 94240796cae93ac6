//! Key derivation and signing services.
//!
//! The signing command only sees the [`Keyring`] trait: derive a key handle
//! for a path, sign a 32-byte digest with it. [`SeedKeyring`] is the
//! reference implementation:
//! - BIP32 derivation from a 64-byte seed
//! - deterministic (RFC 6979) ECDSA over secp256k1, low-S
//! - DER output whose tag byte carries the recovery bits (`0x30 | recid`)
//!
//! # Security
//!
//! - Key handles are zeroized on drop and never outlive the signing step
//! - Seeds are zeroized on drop

use common::constants::MAX_DER_SIGNATURE_LEN;
use common::{Error, Hash256, KeyPath};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// DER tag of an ECDSA signature sequence.
const DER_SEQUENCE: u8 = 0x30;
/// DER tag of an integer.
const DER_INTEGER: u8 = 0x02;

// =============================================================================
// Keyring
// =============================================================================

/// Key derivation and signature primitive consumed by the signing command.
pub trait Keyring {
    /// Derived private key handle. Must wipe itself when dropped.
    type PrivateKey: ZeroizeOnDrop;

    /// Derives the private key for `path`.
    fn derive_private_key(&self, path: &KeyPath) -> Result<Self::PrivateKey, Error>;

    /// Signs a 32-byte digest.
    fn sign_digest(&self, key: &Self::PrivateKey, digest: &Hash256) -> Result<DerSignature, Error>;
}

/// DER encoded signature in a fixed buffer.
///
/// The low two bits of the first byte carry the recovery id; clear them to
/// get the standard `0x30` tag back.
#[derive(Clone, PartialEq, Eq)]
pub struct DerSignature {
    bytes: [u8; MAX_DER_SIGNATURE_LEN],
    len: usize,
}

impl DerSignature {
    /// Wraps an already encoded signature.
    pub fn from_slice(der: &[u8]) -> Result<Self, Error> {
        if der.is_empty() || der.len() > MAX_DER_SIGNATURE_LEN {
            return Err(Error::SigningFailed);
        }
        let mut bytes = [0u8; MAX_DER_SIGNATURE_LEN];
        bytes[..der.len()].copy_from_slice(der);
        Ok(Self {
            bytes,
            len: der.len(),
        })
    }

    /// Encodes `(r, s)` and stamps `recovery_id` into the tag byte.
    pub fn encode(r: &[u8; 32], s: &[u8; 32], recovery_id: u8) -> Result<Self, Error> {
        if recovery_id > 3 {
            return Err(Error::SigningFailed);
        }

        let mut bytes = [0u8; MAX_DER_SIGNATURE_LEN];
        let mut pos = 2;
        pos = write_der_integer(&mut bytes, pos, r)?;
        pos = write_der_integer(&mut bytes, pos, s)?;

        bytes[0] = DER_SEQUENCE | recovery_id;
        bytes[1] = (pos - 2) as u8;
        Ok(Self { bytes, len: pos })
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Encoded length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for a constructed signature.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recovery id carried in the tag byte.
    pub fn recovery_id(&self) -> u8 {
        self.bytes[0] & 0x03
    }
}

impl core::fmt::Debug for DerSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DerSignature({} bytes)", self.len)
    }
}

/// Writes a positive big-endian integer as a minimal DER INTEGER.
fn write_der_integer(out: &mut [u8], pos: usize, value: &[u8; 32]) -> Result<usize, Error> {
    let first = value.iter().position(|&b| b != 0).ok_or(Error::SigningFailed)?;
    let digits = &value[first..];
    let pad = usize::from(digits[0] & 0x80 != 0);
    let len = digits.len() + pad;

    let end = pos + 2 + len;
    if end > out.len() {
        return Err(Error::BufferOverflow);
    }
    out[pos] = DER_INTEGER;
    out[pos + 1] = len as u8;
    out[pos + 2..pos + 2 + pad].fill(0);
    out[pos + 2 + pad..end].copy_from_slice(digits);
    Ok(end)
}

// =============================================================================
// Seed-backed keyring
// =============================================================================

/// Seed for key derivation.
///
/// In production, this comes from the secure element. For development the
/// test seed below can be enabled.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Create from bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(*bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Development test seed (BIP39: "abandon abandon ... about").
///
/// WARNING: NEVER use this in production!
#[cfg(feature = "dev-mode")]
pub fn get_dev_seed() -> Seed {
    let seed_bytes: [u8; 64] = [
        0x5e, 0xb0, 0x0b, 0xbd, 0xdc, 0xf0, 0x69, 0x08, 0x48, 0x89, 0xa8, 0xab, 0x91, 0x55, 0x56,
        0x81, 0x65, 0xf5, 0xc4, 0x53, 0xcc, 0xb8, 0x5e, 0x70, 0x81, 0x1a, 0xae, 0xd6, 0xf6, 0xda,
        0x5f, 0xc1, 0x9a, 0x5a, 0xc4, 0x0b, 0x38, 0x9c, 0xd3, 0x70, 0xd0, 0x86, 0x20, 0x6d, 0xec,
        0x8a, 0xa6, 0xc4, 0x3d, 0xae, 0xa6, 0x69, 0x0f, 0x20, 0xad, 0x3d, 0x8d, 0x48, 0xb2, 0xd2,
        0xce, 0x9e, 0x38, 0xe4,
    ];
    Seed::from_bytes(&seed_bytes)
}

/// Derived secp256k1 key. The inner `SigningKey` zeroizes its scalar on drop.
pub struct PrivateKey(SigningKey);

impl ZeroizeOnDrop for PrivateKey {}

impl PrivateKey {
    /// Compressed SEC1 public key.
    pub fn compressed_public_key(&self) -> [u8; 33] {
        let pubkey: PublicKey = self.0.verifying_key().into();
        let encoded = pubkey.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(encoded.as_bytes());
        result
    }
}

/// Derive a private key from seed along a BIP32 path.
pub fn derive_private_key(seed: &Seed, path: &KeyPath) -> Result<PrivateKey, Error> {
    use bip32::{ChildNumber, XPrv};

    let mut xprv = XPrv::new(seed.as_bytes()).map_err(|_| Error::KeyDerivationFailed)?;

    for component in path.indices() {
        let hardened = component & KeyPath::HARDENED != 0;
        let child = ChildNumber::new(component & !KeyPath::HARDENED, hardened)
            .map_err(|_| Error::InvalidPath)?;
        xprv = xprv
            .derive_child(child)
            .map_err(|_| Error::KeyDerivationFailed)?;
    }

    let mut private_key_bytes = xprv.private_key().to_bytes();
    let signing_key = SigningKey::from_bytes(&private_key_bytes)
        .map_err(|_| Error::KeyDerivationFailed);
    let bytes: &mut [u8] = &mut private_key_bytes;
    bytes.zeroize();

    Ok(PrivateKey(signing_key?))
}

/// Sign a 32-byte digest, returning the DER signature with recovery bits.
pub fn sign_digest(key: &PrivateKey, digest: &Hash256) -> Result<DerSignature, Error> {
    let (sig, recid) = key
        .0
        .sign_prehash_recoverable(digest)
        .map_err(|_| Error::SigningFailed)?;

    let compact = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    DerSignature::encode(&r, &s, recid.to_byte())
}

/// Keyring backed by a BIP32 seed.
pub struct SeedKeyring {
    seed: Seed,
}

impl SeedKeyring {
    /// Creates a keyring owning `seed`.
    pub fn new(seed: Seed) -> Self {
        Self { seed }
    }

    /// Compressed public key for `path`.
    pub fn public_key(&self, path: &KeyPath) -> Result<[u8; 33], Error> {
        Ok(derive_private_key(&self.seed, path)?.compressed_public_key())
    }
}

impl Keyring for SeedKeyring {
    type PrivateKey = PrivateKey;

    fn derive_private_key(&self, path: &KeyPath) -> Result<PrivateKey, Error> {
        derive_private_key(&self.seed, path)
    }

    fn sign_digest(&self, key: &PrivateKey, digest: &Hash256) -> Result<DerSignature, Error> {
        sign_digest(key, digest)
    }
}
