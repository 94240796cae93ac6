//! SIGN_MNB request parser and validator.
//!
//! Body layout: `N || path (4N, BE) || broadcast payload`. The payload is
//! hashed in full; only the IPv4 marker and address inside the service field
//! are interpreted.
//!
//! # Security
//!
//! All input is untrusted. The session is written field by field and only
//! after every check guarding that field passed. Callers are responsible for
//! wiping it when this returns an error.

use common::constants::{min_request_len, IPV4_MARKER, IPV4_MARKER_OFFSET, IPV4_OFFSET};
use common::{ApduHeader, AppConfiguration, FaultPhase, StatusWord};

use crate::accumulator::IncrementalHash;
use crate::session::PendingSession;

/// Rejects any P1/P2 other than the configured SIGN_MNB sentinel pair.
pub fn check_params(header: &ApduHeader, config: &AppConfiguration) -> Result<(), StatusWord> {
    if (header.p1, header.p2) != config.sign_mnb_params {
        log::debug!("Bad P1/P2 {:02X}{:02X}", header.p1, header.p2);
        return Err(StatusWord::IncorrectParameters);
    }
    Ok(())
}

/// Validates the request body, stores the key path and IPv4 address in
/// `session` and feeds the payload into `digest`.
///
/// `digest` is re-initialized before the first byte goes in. Paths deeper
/// than [`AppConfiguration::max_depth`] are refused.
pub fn parse_sign_mnb<H: IncrementalHash>(
    header: &ApduHeader,
    raw: &[u8],
    config: &AppConfiguration,
    session: &mut PendingSession,
    digest: &mut H,
) -> Result<(), StatusWord> {
    let fault = StatusWord::InternalFault(FaultPhase::Parse);

    let body = header.body(raw).map_err(|_| {
        log::warn!("Lc {} disagrees with delivered body", header.lc);
        fault
    })?;

    let count = body.first().copied().unwrap_or(0) as usize;
    if body.len() < min_request_len(count) {
        log::debug!("Not enough data");
        return Err(StatusWord::IncorrectData);
    }
    if count > config.max_depth() {
        log::debug!("Keypath too long");
        return Err(StatusWord::IncorrectData);
    }

    let cursor = session.keypath.load(body).map_err(|_| fault)?;
    let payload = &body[cursor..];

    digest.init();
    digest.update(payload);

    let marker = payload
        .get(IPV4_MARKER_OFFSET..IPV4_MARKER_OFFSET + 2)
        .ok_or(fault)?;
    if marker != &IPV4_MARKER[..] {
        log::debug!("Not IPv4");
        return Err(StatusWord::IncorrectData);
    }

    let ip = payload.get(IPV4_OFFSET..IPV4_OFFSET + 4).ok_or(fault)?;
    session.ip.copy_from_slice(ip);

    Ok(())
}
