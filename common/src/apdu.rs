//! APDU header access.
//!
//! The header is read first and on its own: the device has to look at P1/P2
//! before it decides whether the body is worth examining.

use crate::constants::{
    APDU_HEADER_LEN, OFFSET_CLA, OFFSET_INS, OFFSET_LC, OFFSET_P1, OFFSET_P2,
};
use crate::error::Error;

/// `CLA INS P1 P2 Lc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApduHeader {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    /// Declared body length.
    pub lc: u8,
}

impl ApduHeader {
    /// Reads the header of a raw request.
    pub fn read(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() < APDU_HEADER_LEN {
            return Err(Error::InvalidLength);
        }
        Ok(Self {
            cla: raw[OFFSET_CLA],
            ins: raw[OFFSET_INS],
            p1: raw[OFFSET_P1],
            p2: raw[OFFSET_P2],
            lc: raw[OFFSET_LC],
        })
    }

    /// Returns the body of `raw`, checking it against the declared length.
    pub fn body<'a>(&self, raw: &'a [u8]) -> Result<&'a [u8], Error> {
        let body = raw.get(APDU_HEADER_LEN..).ok_or(Error::InvalidLength)?;
        if body.len() != self.lc as usize {
            return Err(Error::InvalidLength);
        }
        Ok(body)
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; APDU_HEADER_LEN] {
        [self.cla, self.ins, self.p1, self.p2, self.lc]
    }
}
