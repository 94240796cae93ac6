//! SIGN_MNB reply decoding and signature verification.
//!
//! The device returns `SW (2, BE) || len || DER`, where the DER tag byte
//! carries the recovery id in its low two bits. The wallet needs the
//! 65-byte compact recoverable form (`27 + recid + 4 || r || s`).

use common::constants::MAX_DER_SIGNATURE_LEN;
use common::{Hash256, StatusWord};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;

use crate::MnbClientError;

/// Header base of a compact recoverable signature.
const COMPACT_HEADER_BASE: u8 = 27;
/// Header offset marking a compressed public key.
const COMPACT_HEADER_COMPRESSED: u8 = 4;

/// Splits a raw reply and returns the tagged DER signature.
pub fn decode_reply(reply: &[u8]) -> Result<Vec<u8>, MnbClientError> {
    if reply.len() < 2 {
        return Err(MnbClientError::InvalidResponse(format!(
            "Reply too short: {} bytes",
            reply.len()
        )));
    }

    let code = u16::from_be_bytes([reply[0], reply[1]]);
    let sw = StatusWord::try_from(code).map_err(|_| {
        MnbClientError::InvalidResponse(format!("Unknown status word {:04X}", code))
    })?;
    if !sw.is_ok() {
        return Err(MnbClientError::Device(sw));
    }

    let data = &reply[2..];
    let (&len, signature) = data
        .split_first()
        .ok_or_else(|| MnbClientError::InvalidResponse("Missing signature".to_string()))?;
    if len == 0 || len as usize != signature.len() || signature.len() > MAX_DER_SIGNATURE_LEN {
        return Err(MnbClientError::InvalidResponse(format!(
            "Signature length {} does not match {} bytes",
            len,
            signature.len()
        )));
    }
    Ok(signature.to_vec())
}

/// Parses a DER-encoded ECDSA signature into (r, s) components.
///
/// DER format: 0x30 [total-len] 0x02 [r-len] [r] 0x02 [s-len] [s]
pub fn parse_der_signature(der: &[u8]) -> Result<([u8; 32], [u8; 32]), MnbClientError> {
    let malformed = || MnbClientError::InvalidResponse("Malformed DER signature".to_string());

    if der.len() < 8 || der[0] != 0x30 || der[1] as usize != der.len() - 2 {
        return Err(malformed());
    }

    let mut pos = 2;
    let mut read_integer = || -> Result<[u8; 32], MnbClientError> {
        if der.get(pos) != Some(&0x02) {
            return Err(malformed());
        }
        let len = *der.get(pos + 1).ok_or_else(malformed)? as usize;
        let bytes = der.get(pos + 2..pos + 2 + len).ok_or_else(malformed)?;
        pos += 2 + len;

        // Handle potential leading zero byte in DER encoding
        let bytes = match bytes {
            [0, rest @ ..] if rest.len() == 32 => rest,
            _ => bytes,
        };
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(malformed());
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(out)
    };

    let r = read_integer()?;
    let s = read_integer()?;
    if pos != der.len() {
        return Err(malformed());
    }
    Ok((r, s))
}

/// Signature with its public key recovery id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Reads a DER signature whose tag byte carries the recovery id.
    pub fn from_tagged_der(tagged: &[u8]) -> Result<Self, MnbClientError> {
        let (&tag, rest) = tagged
            .split_first()
            .ok_or_else(|| MnbClientError::InvalidResponse("Empty signature".to_string()))?;

        let mut der = Vec::with_capacity(tagged.len());
        der.push(tag & 0xFC);
        der.extend_from_slice(rest);

        let (r, s) = parse_der_signature(&der)?;
        Ok(Self {
            recovery_id: tag & 0x03,
            r,
            s,
        })
    }

    /// 65-byte compact form for a compressed collateral key.
    pub fn to_compact(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = COMPACT_HEADER_BASE + self.recovery_id + COMPACT_HEADER_COMPRESSED;
        out[1..33].copy_from_slice(&self.r);
        out[33..].copy_from_slice(&self.s);
        out
    }

    /// Reads the 65-byte compact form.
    pub fn from_compact(compact: &[u8; 65]) -> Result<Self, MnbClientError> {
        let recovery_id = compact[0]
            .checked_sub(COMPACT_HEADER_BASE)
            .map(|v| v & 0x03)
            .ok_or_else(|| MnbClientError::InvalidResponse("Bad compact header".to_string()))?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[1..33]);
        s.copy_from_slice(&compact[33..]);
        Ok(Self { recovery_id, r, s })
    }

    /// Recovers the compressed public key that signed `digest`.
    pub fn recover(&self, digest: &Hash256) -> Result<[u8; 33], MnbClientError> {
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);

        let signature =
            Signature::from_slice(&compact).map_err(|_| MnbClientError::InvalidSignature)?;
        let recovery_id =
            RecoveryId::from_byte(self.recovery_id).ok_or(MnbClientError::InvalidSignature)?;
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|_| MnbClientError::InvalidSignature)?;

        let key: PublicKey = (&key).into();
        let mut out = [0u8; 33];
        out.copy_from_slice(key.to_encoded_point(true).as_bytes());
        Ok(out)
    }

    /// Checks that `expected` signed `digest`.
    pub fn verify(&self, digest: &Hash256, expected: &[u8]) -> Result<(), MnbClientError> {
        if self.recover(digest)?.as_slice() != expected {
            log::debug!("Recovered key does not match the collateral key");
            return Err(MnbClientError::InvalidSignature);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FaultPhase;
    use hex_literal::hex;

    #[test]
    fn test_decode_reply_errors() {
        assert!(matches!(
            decode_reply(&hex!("6985")),
            Err(MnbClientError::Device(StatusWord::ConditionsOfUseNotSatisfied))
        ));
        assert!(matches!(
            decode_reply(&hex!("6F1F")),
            Err(MnbClientError::Device(StatusWord::InternalFault(FaultPhase::Sign)))
        ));
        assert!(matches!(
            decode_reply(&hex!("1234")),
            Err(MnbClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_reply(&hex!("9000")),
            Err(MnbClientError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_reply(&hex!("9000 03 AABB")),
            Err(MnbClientError::InvalidResponse(_))
        ));
        assert!(matches!(decode_reply(&[0x90]), Err(MnbClientError::InvalidResponse(_))));
    }

    #[test]
    fn test_decode_reply_ok() {
        let sig = decode_reply(&hex!("9000 03 AABBCC")).unwrap();
        assert_eq!(sig, hex!("AABBCC"));
    }

    #[test]
    fn test_parse_der() {
        let (r, s) = parse_der_signature(&hex!("30 08 02 01 01 02 03 00 80 00")).unwrap();
        assert_eq!(r[31], 1);
        assert_eq!(&s[30..], &[0x80, 0x00]);
        assert!(r[..31].iter().all(|&b| b == 0));

        // trailing garbage
        assert!(parse_der_signature(&hex!("30 09 02 01 01 02 03 00 80 00 FF")).is_err());
        // wrong tag
        assert!(parse_der_signature(&hex!("31 08 02 01 01 02 03 00 80 00")).is_err());
    }

    #[test]
    fn test_tagged_der_and_compact() {
        let sig = RecoverableSignature::from_tagged_der(&hex!("31 08 02 01 01 02 03 00 80 00"))
            .unwrap();
        assert_eq!(sig.recovery_id, 1);

        let compact = sig.to_compact();
        assert_eq!(compact[0], 27 + 1 + 4);
        assert_eq!(RecoverableSignature::from_compact(&compact).unwrap(), sig);
    }
}
