//! SIGN_MNB request construction.

use common::constants::{
    APDU_HEADER_LEN, CLA, INS_SIGN_MNB, MNB_FIXED_LEN, P1_SIGN_MNB, P2_SIGN_MNB,
};
use common::{ApduHeader, KeyPath};

use crate::MnbClientError;

/// Builds `E0 50 A5 5A Lc || path || payload`.
pub fn sign_mnb_apdu(path: &KeyPath, payload: &[u8]) -> Result<Vec<u8>, MnbClientError> {
    if payload.len() < MNB_FIXED_LEN {
        return Err(format!(
            "Payload too short: {} bytes, at least {} expected",
            payload.len(),
            MNB_FIXED_LEN
        )
        .into());
    }

    let wire_path = path.as_wire();
    let body_len = wire_path.len() + payload.len();
    let lc = u8::try_from(body_len)
        .map_err(|_| format!("Request body of {} bytes does not fit one APDU", body_len))?;

    let header = ApduHeader {
        cla: CLA,
        ins: INS_SIGN_MNB,
        p1: P1_SIGN_MNB,
        p2: P2_SIGN_MNB,
        lc,
    };

    let mut apdu = Vec::with_capacity(APDU_HEADER_LEN + body_len);
    apdu.extend_from_slice(&header.to_bytes());
    apdu.extend_from_slice(wire_path);
    apdu.extend_from_slice(payload);
    log::debug!("SIGN_MNB request: {} bytes, path {}", apdu.len(), path);
    Ok(apdu)
}
