//! BIP32 key path in its wire form.
//!
//! The device copies the path bytes verbatim out of the request, so the path
//! is stored serialized: one count byte followed by the big-endian indices,
//! in a fixed-capacity array. No allocation, and wiping is a plain zeroize.

use core::fmt;
use core::str::FromStr;

use zeroize::Zeroize;

use crate::constants::{KEYPATH_MAX_LEN, MAX_BIP32_PATH};
use crate::error::Error;

/// Serialized BIP32 derivation path (`N || index_0 || ... || index_{N-1}`).
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct KeyPath {
    raw: [u8; KEYPATH_MAX_LEN],
}

impl KeyPath {
    /// Hardened index marker (bit 31).
    pub const HARDENED: u32 = 0x8000_0000;

    /// An empty (depth 0, all-zero) path.
    pub const fn empty() -> Self {
        Self {
            raw: [0u8; KEYPATH_MAX_LEN],
        }
    }

    /// Copies a wire-encoded path from the start of `bytes`.
    ///
    /// Bytes after the path are ignored.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, Error> {
        let mut path = Self::empty();
        path.load(bytes)?;
        Ok(path)
    }

    /// Overwrites this path with the wire-encoded path at the start of `bytes`.
    ///
    /// Leaves `self` untouched on error.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let count = *bytes.first().ok_or(Error::InvalidLength)? as usize;
        if count > MAX_BIP32_PATH {
            return Err(Error::PathTooLong);
        }
        let len = Self::wire_len(count);
        let src = bytes.get(..len).ok_or(Error::InvalidLength)?;
        self.raw.zeroize();
        self.raw[..len].copy_from_slice(src);
        Ok(len)
    }

    /// Builds a path from index values.
    pub fn from_indices(indices: &[u32]) -> Result<Self, Error> {
        if indices.len() > MAX_BIP32_PATH {
            return Err(Error::PathTooLong);
        }
        let mut path = Self::empty();
        path.raw[0] = indices.len() as u8;
        for (i, index) in indices.iter().enumerate() {
            path.raw[1 + 4 * i..5 + 4 * i].copy_from_slice(&index.to_be_bytes());
        }
        Ok(path)
    }

    /// BIP44 path `m/44'/coin'/account'/change/index`.
    pub fn bip44(coin_type: u32, account: u32, change: u32, index: u32) -> Result<Self, Error> {
        if (coin_type | account | change | index) & Self::HARDENED != 0 {
            return Err(Error::InvalidPath);
        }
        Self::from_indices(&[
            44 | Self::HARDENED,
            coin_type | Self::HARDENED,
            account | Self::HARDENED,
            change,
            index,
        ])
    }

    /// Serialized length for a path of `count` indices.
    #[inline]
    pub const fn wire_len(count: usize) -> usize {
        1 + 4 * count
    }

    /// Number of indices.
    #[inline]
    pub fn depth(&self) -> usize {
        self.raw[0] as usize
    }

    /// Index at `position`, if within depth.
    pub fn index(&self, position: usize) -> Option<u32> {
        if position >= self.depth() {
            return None;
        }
        let at = 1 + 4 * position;
        let mut be = [0u8; 4];
        be.copy_from_slice(&self.raw[at..at + 4]);
        Some(u32::from_be_bytes(be))
    }

    /// Iterates over the indices, root first.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.depth()).filter_map(move |i| self.index(i))
    }

    /// The serialized path (`1 + 4 * depth` bytes).
    pub fn as_wire(&self) -> &[u8] {
        &self.raw[..Self::wire_len(self.depth())]
    }

    /// Returns true if every byte of the backing storage is zero.
    pub fn is_zero(&self) -> bool {
        self.raw.iter().all(|&b| b == 0)
    }
}

impl Default for KeyPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in self.indices() {
            if index & Self::HARDENED != 0 {
                write!(f, "/{}'", index & !Self::HARDENED)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPath({})", self)
    }
}

impl FromStr for KeyPath {
    type Err = Error;

    /// Parses `m/44'/9797'/0'/0/0`. Both `'` and `h` mark hardened indices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(Error::InvalidPath);
        }

        let mut indices = [0u32; MAX_BIP32_PATH];
        let mut depth = 0;
        for part in parts {
            if depth == MAX_BIP32_PATH {
                return Err(Error::PathTooLong);
            }
            let (digits, hardened) = match part.strip_suffix(['\'', 'h']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let value: u32 = digits.parse().map_err(|_| Error::InvalidPath)?;
            if value & Self::HARDENED != 0 {
                return Err(Error::InvalidPath);
            }
            indices[depth] = if hardened { value | Self::HARDENED } else { value };
            depth += 1;
        }

        Self::from_indices(&indices[..depth])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use hex_literal::hex;

    #[test]
    fn test_parse_and_display() {
        let path: KeyPath = "m/44'/9797'/0'/0/1".parse().unwrap();
        assert_eq!(path.depth(), 5);
        assert_eq!(path.index(0), Some(44 | KeyPath::HARDENED));
        assert_eq!(path.index(4), Some(1));
        assert_eq!(path.index(5), None);
        assert_eq!(path.to_string(), "m/44'/9797'/0'/0/1");

        let alt: KeyPath = "m/44h/9797h/0h/0/1".parse().unwrap();
        assert_eq!(alt, path);
    }

    #[test]
    fn test_wire_encoding() {
        let path = KeyPath::from_indices(&[0x8000002C, 1]).unwrap();
        assert_eq!(path.as_wire(), &hex!("02 8000002C 00000001"));

        let decoded = KeyPath::from_wire(&hex!("02 8000002C 00000001 FFFF")).unwrap();
        assert_eq!(decoded, path);
    }

    #[test]
    fn test_bip44() {
        let path = KeyPath::bip44(crate::constants::ENERGI_COIN_TYPE, 0, 0, 3).unwrap();
        assert_eq!(path.to_string(), "m/44'/9797'/0'/0/3");
        assert_eq!(KeyPath::bip44(KeyPath::HARDENED, 0, 0, 0), Err(Error::InvalidPath));
    }

    #[test]
    fn test_empty_path() {
        let path: KeyPath = "m".parse().unwrap();
        assert_eq!(path.depth(), 0);
        assert_eq!(path.as_wire(), &[0u8]);
        assert!(path.is_zero());
        assert_eq!(path.to_string(), "m");
    }

    #[test]
    fn test_rejects_bad_paths() {
        assert_eq!("44'/0".parse::<KeyPath>(), Err(Error::InvalidPath));
        assert_eq!("m/abc".parse::<KeyPath>(), Err(Error::InvalidPath));
        assert_eq!("m/2147483648".parse::<KeyPath>(), Err(Error::InvalidPath));
        assert_eq!(
            "m/0/1/2/3/4/5/6/7/8/9/10".parse::<KeyPath>(),
            Err(Error::PathTooLong)
        );
        assert_eq!(KeyPath::from_wire(&[11]), Err(Error::PathTooLong));
        assert_eq!(KeyPath::from_wire(&[2, 0, 0, 0]), Err(Error::InvalidLength));
        assert_eq!(KeyPath::from_wire(&[]), Err(Error::InvalidLength));
    }

    #[test]
    fn test_load_replaces_previous_path() {
        let mut path = KeyPath::from_indices(&[1, 2, 3]).unwrap();
        path.load(&[1, 0, 0, 0, 9]).unwrap();
        assert_eq!(path.depth(), 1);
        assert_eq!(path.index(0), Some(9));
        // no residue of the longer path beyond the new one
        assert!(path.raw[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zeroize() {
        let mut path = KeyPath::from_indices(&[7, 8]).unwrap();
        path.zeroize();
        assert!(path.is_zero());
    }
}
