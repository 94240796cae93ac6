//! SIGN_MNB command: parse, suspend for confirmation, sign.
//!
//! A request goes through two steps. [`MnbSigner::begin`] validates it and,
//! if it is well formed, parks a [`PendingConfirmation`] in the signer's
//! [`Phase`]. [`MnbSigner::resolve`] consumes that continuation exactly once
//! with the user's decision.
//!
//! # Security
//!
//! - The PIN gate is checked before anything else and touches no state
//! - The scratch session is zero whenever `begin` returns
//! - A continuation wipes its session and digest when dropped, whether it
//!   was resolved, replaced by a newer request or abandoned

use common::{ApduHeader, AppConfiguration, FaultPhase, StatusWord};

use crate::accumulator::{DigestAccumulator, IncrementalHash};
use crate::crypto::Keyring;
use crate::finalizer;
use crate::io::ReplyBuffer;
use crate::parser;
use crate::session::{PendingSession, WipeGuard};
use crate::ui::MnbPrompt;

/// A validated request waiting for the user.
///
/// Owns everything the signing step needs. Not `Clone`: it can be resolved
/// at most once.
pub struct PendingConfirmation {
    session: PendingSession,
    digest: DigestAccumulator,
}

impl PendingConfirmation {
    /// What to show the user.
    pub fn prompt(&self) -> MnbPrompt {
        MnbPrompt {
            ip: self.session.ip(),
            keypath: self.session.keypath().clone(),
        }
    }

    /// The parsed request data.
    pub fn session(&self) -> &PendingSession {
        &self.session
    }

    /// Completes the request with the user's decision and writes the reply.
    pub fn resolve<K: Keyring>(
        mut self,
        confirmed: bool,
        keyring: &K,
        reply: &mut ReplyBuffer,
    ) -> StatusWord {
        if !confirmed {
            log::info!("Masternode broadcast signing rejected by user");
            reply.set_status(StatusWord::ConditionsOfUseNotSatisfied);
            return StatusWord::ConditionsOfUseNotSatisfied;
        }

        match finalizer::finalize(&self.session, &mut self.digest, keyring) {
            Ok(signature) => {
                let sw = finalizer::write_signature(reply, &signature);
                if sw.is_ok() {
                    log::info!("Masternode broadcast signed ({} byte signature)", signature.len());
                }
                sw
            }
            Err(sw) => {
                reply.set_status(sw);
                sw
            }
        }
    }
}

impl Drop for PendingConfirmation {
    fn drop(&mut self) {
        self.session.wipe();
        self.digest.init();
    }
}

impl core::fmt::Debug for PendingConfirmation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingConfirmation")
            .field("depth", &self.session.keypath().depth())
            .field("bytes_hashed", &self.digest.bytes_fed())
            .finish()
    }
}

/// Where the command stands between requests.
#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingConfirmation(PendingConfirmation),
}

/// Outcome of [`MnbSigner::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Reply immediately with this status word.
    Reply(StatusWord),
    /// Reply deferred until the user answered this prompt.
    AwaitConfirmation(MnbPrompt),
}

/// The SIGN_MNB command state machine.
#[derive(Debug, Default)]
pub struct MnbSigner {
    scratch: PendingSession,
    phase: Phase,
}

impl MnbSigner {
    /// Creates an idle signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a raw SIGN_MNB request.
    ///
    /// CLA and INS are assumed to have been routed already. The sentinel pair
    /// and the depth limit come from `config`.
    pub fn begin(
        &mut self,
        config: &AppConfiguration,
        pin_validated: bool,
        raw: &[u8],
    ) -> Dispatch {
        if !pin_validated {
            log::warn!("SIGN_MNB refused: device locked");
            return Dispatch::Reply(StatusWord::SecurityNotSatisfied);
        }

        let header = match ApduHeader::read(raw) {
            Ok(header) => header,
            Err(_) => return Dispatch::Reply(StatusWord::InternalFault(FaultPhase::Parse)),
        };
        if let Err(sw) = parser::check_params(&header, config) {
            return Dispatch::Reply(sw);
        }

        if let Phase::AwaitingConfirmation(stale) = core::mem::take(&mut self.phase) {
            log::warn!("Discarding unanswered confirmation {:?}", stale);
        }

        let mut guard = WipeGuard::new(&mut self.scratch);
        let mut digest = DigestAccumulator::new();
        if let Err(sw) = parser::parse_sign_mnb(&header, raw, config, &mut guard, &mut digest) {
            log::debug!("SIGN_MNB rejected: {}", sw);
            return Dispatch::Reply(sw);
        }

        let pending = PendingConfirmation {
            session: guard.retain(),
            digest,
        };
        let prompt = pending.prompt();
        log::info!("SIGN_MNB accepted, awaiting confirmation");
        self.phase = Phase::AwaitingConfirmation(pending);
        Dispatch::AwaitConfirmation(prompt)
    }

    /// Resolves the pending request, if any, and writes the reply.
    ///
    /// With nothing pending the reply is `ConditionsOfUseNotSatisfied` and no
    /// key is touched.
    pub fn resolve<K: Keyring>(
        &mut self,
        confirmed: bool,
        keyring: &K,
        reply: &mut ReplyBuffer,
    ) -> StatusWord {
        match core::mem::take(&mut self.phase) {
            Phase::AwaitingConfirmation(pending) => pending.resolve(confirmed, keyring, reply),
            Phase::Idle => {
                log::warn!("Confirmation with nothing pending");
                reply.set_status(StatusWord::ConditionsOfUseNotSatisfied);
                StatusWord::ConditionsOfUseNotSatisfied
            }
        }
    }

    /// The suspended request, if any.
    pub fn pending(&self) -> Option<&PendingConfirmation> {
        match &self.phase {
            Phase::AwaitingConfirmation(pending) => Some(pending),
            Phase::Idle => None,
        }
    }

    /// Returns true while a request waits for the user.
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.pending().is_some()
    }

    /// The scratch session slot used during parsing.
    pub fn scratch(&self) -> &PendingSession {
        &self.scratch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Seed, SeedKeyring};
    use common::constants::{CLA, INS_SIGN_MNB, MNB_FIXED_LEN, P1_SIGN_MNB, P2_SIGN_MNB};
    use common::KeyPath;

    fn request(path: &KeyPath, ip: [u8; 4]) -> Vec<u8> {
        let mut payload = vec![0x22u8; MNB_FIXED_LEN];
        payload[36..46].fill(0);
        payload[46..48].copy_from_slice(&[0xFF, 0xFF]);
        payload[48..52].copy_from_slice(&ip);

        let mut raw = vec![CLA, INS_SIGN_MNB, P1_SIGN_MNB, P2_SIGN_MNB, 0];
        raw.extend_from_slice(path.as_wire());
        raw.extend_from_slice(&payload);
        raw[4] = (raw.len() - 5) as u8;
        raw
    }

    fn config() -> AppConfiguration {
        AppConfiguration::default()
    }

    fn keyring() -> SeedKeyring {
        SeedKeyring::new(Seed::from_bytes(&[0x42; 64]))
    }

    fn collateral_path() -> KeyPath {
        "m/44'/9797'/0'/0/0".parse().unwrap()
    }

    #[test]
    fn test_begin_suspends_with_prompt() {
        let mut signer = MnbSigner::new();
        let dispatch = signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        assert_eq!(
            dispatch,
            Dispatch::AwaitConfirmation(MnbPrompt {
                ip: [10, 0, 0, 1],
                keypath: collateral_path(),
            })
        );
        assert!(signer.is_awaiting_confirmation());
        assert!(signer.scratch().is_wiped());

        let pending = signer.pending().unwrap();
        assert_eq!(pending.session().keypath(), &collateral_path());
        assert_eq!(pending.session().ip(), [10, 0, 0, 1]);
    }

    #[test]
    fn test_pin_closed_touches_nothing() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let dispatch = signer.begin(&config(), false, &request(&KeyPath::empty(), [1, 1, 1, 1]));
        assert_eq!(dispatch, Dispatch::Reply(StatusWord::SecurityNotSatisfied));
        assert_eq!(signer.pending().unwrap().session().ip(), [10, 0, 0, 1]);
    }

    #[test]
    fn test_bad_params_keep_pending_request() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let mut raw = request(&KeyPath::empty(), [1, 1, 1, 1]);
        raw[2] = 0x00;
        assert_eq!(
            signer.begin(&config(), true, &raw),
            Dispatch::Reply(StatusWord::IncorrectParameters)
        );
        assert!(signer.is_awaiting_confirmation());
    }

    #[test]
    fn test_new_request_replaces_stale_confirmation() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let mut bad = request(&KeyPath::empty(), [1, 1, 1, 1]);
        bad[5 + 1 + 46] = 0x00;
        assert_eq!(signer.begin(&config(), true, &bad), Dispatch::Reply(StatusWord::IncorrectData));
        assert!(!signer.is_awaiting_confirmation());
        assert!(signer.scratch().is_wiped());
    }

    #[test]
    fn test_rejected_request_leaves_nothing() {
        let mut signer = MnbSigner::new();
        let mut raw = request(&collateral_path(), [10, 0, 0, 1]);
        raw.truncate(raw.len() - 1);
        raw[4] -= 1;

        assert_eq!(signer.begin(&config(), true, &raw), Dispatch::Reply(StatusWord::IncorrectData));
        assert!(!signer.is_awaiting_confirmation());
        assert!(signer.scratch().is_wiped());
    }

    #[test]
    fn test_non_ipv4_after_path_copy_wipes_scratch() {
        let mut signer = MnbSigner::new();
        let mut raw = request(&collateral_path(), [10, 0, 0, 1]);
        let payload_start = 5 + collateral_path().as_wire().len();
        raw[payload_start + 46] = 0x00;

        assert_eq!(signer.begin(&config(), true, &raw), Dispatch::Reply(StatusWord::IncorrectData));
        assert!(!signer.is_awaiting_confirmation());
        assert!(signer.scratch().is_wiped());
    }

    #[test]
    fn test_depth_beyond_configuration_wipes_scratch() {
        let config = AppConfiguration {
            max_path_depth: 3,
            ..AppConfiguration::default()
        };
        let mut signer = MnbSigner::new();

        assert_eq!(
            signer.begin(&config, true, &request(&collateral_path(), [10, 0, 0, 1])),
            Dispatch::Reply(StatusWord::IncorrectData)
        );
        assert!(signer.scratch().is_wiped());

        let shallow: KeyPath = "m/44'/9797'/0'".parse().unwrap();
        assert!(matches!(
            signer.begin(&config, true, &request(&shallow, [10, 0, 0, 1])),
            Dispatch::AwaitConfirmation(_)
        ));
    }

    #[test]
    fn test_short_header_is_parse_fault() {
        let mut signer = MnbSigner::new();
        assert_eq!(
            signer.begin(&config(), true, &[CLA, INS_SIGN_MNB, P1_SIGN_MNB]),
            Dispatch::Reply(StatusWord::InternalFault(FaultPhase::Parse))
        );
    }

    #[test]
    fn test_resolve_confirmed_signs() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let mut reply = ReplyBuffer::new();
        assert_eq!(signer.resolve(true, &keyring(), &mut reply), StatusWord::Ok);
        assert_eq!(reply.status(), Some(StatusWord::Ok));
        let len = reply.data()[0] as usize;
        assert!(len > 0);
        assert_eq!(reply.data().len(), 1 + len);
        assert!(!signer.is_awaiting_confirmation());
    }

    #[test]
    fn test_resolve_declined() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let mut reply = ReplyBuffer::new();
        assert_eq!(
            signer.resolve(false, &keyring(), &mut reply),
            StatusWord::ConditionsOfUseNotSatisfied
        );
        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
        assert!(!signer.is_awaiting_confirmation());
    }

    #[test]
    fn test_resolve_without_pending_request() {
        let mut signer = MnbSigner::new();
        let mut reply = ReplyBuffer::new();
        assert_eq!(
            signer.resolve(true, &keyring(), &mut reply),
            StatusWord::ConditionsOfUseNotSatisfied
        );
        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
    }

    #[test]
    fn test_resolves_only_once() {
        let mut signer = MnbSigner::new();
        signer.begin(&config(), true, &request(&collateral_path(), [10, 0, 0, 1]));

        let mut reply = ReplyBuffer::new();
        assert_eq!(signer.resolve(true, &keyring(), &mut reply), StatusWord::Ok);
        assert_eq!(
            signer.resolve(true, &keyring(), &mut reply),
            StatusWord::ConditionsOfUseNotSatisfied
        );
        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
    }
}
