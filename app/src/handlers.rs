//! APDU handlers.
//!
//! The channel hands over one raw request at a time. Only SIGN_MNB is routed;
//! other classes and instructions get their "not supported" status.
//! Handlers are responsible for:
//! - Routing on CLA / INS
//! - Driving the SIGN_MNB state machine
//! - Asking the platform for confirmation and showing the outcome
//! - Keeping the statistics

use common::constants::{CLA, INS_SIGN_MNB};
use common::{ApduHeader, Error, FaultPhase, StatusWord};

use crate::crypto::{Keyring, SeedKeyring};
use crate::io::ReplyBuffer;
use crate::platform::Platform;
use crate::sign_mnb::Dispatch;
use crate::state::ServiceState;
use crate::ui::{self, MnbPrompt};

/// What the channel gets back for a request.
#[derive(Debug)]
pub enum Response {
    /// Send this reply now.
    Reply(ReplyBuffer),
    /// Hold the reply until [`user_action`] is called.
    Deferred(MnbPrompt),
}

/// Keyring over the device seed.
#[cfg(feature = "dev-mode")]
pub fn device_keyring() -> Result<SeedKeyring, Error> {
    Ok(SeedKeyring::new(crate::crypto::get_dev_seed()))
}

#[cfg(not(feature = "dev-mode"))]
pub fn device_keyring() -> Result<SeedKeyring, Error> {
    // In production, this would load from secure storage
    Err(Error::KeyDerivationFailed)
}

fn status_reply(sw: StatusWord) -> ReplyBuffer {
    let mut reply = ReplyBuffer::new();
    reply.set_status(sw);
    reply
}

/// Handles a raw request from the channel.
pub fn process_apdu(state: &mut ServiceState, pin_validated: bool, raw: &[u8]) -> Response {
    let header = match ApduHeader::read(raw) {
        Ok(header) => header,
        Err(_) => {
            log::warn!("Request shorter than an APDU header ({} bytes)", raw.len());
            state.record_error();
            return Response::Reply(status_reply(StatusWord::InternalFault(FaultPhase::Parse)));
        }
    };

    let dispatch = if header.cla != CLA {
        Dispatch::Reply(StatusWord::ClaNotSupported)
    } else if header.ins != INS_SIGN_MNB {
        Dispatch::Reply(StatusWord::InsNotSupported)
    } else {
        state.signer.begin(&state.config, pin_validated, raw)
    };

    match dispatch {
        Dispatch::Reply(sw) => {
            state.record_error();
            Response::Reply(status_reply(sw))
        }
        Dispatch::AwaitConfirmation(prompt) => Response::Deferred(prompt),
    }
}

/// Resumes the suspended request with the user's decision.
///
/// Without a suspended request the reply is `ConditionsOfUseNotSatisfied`
/// and it counts as an error, not as a user rejection.
pub fn user_action<K: Keyring>(
    state: &mut ServiceState,
    keyring: &K,
    confirmed: bool,
) -> ReplyBuffer {
    let mut reply = ReplyBuffer::new();
    if !state.signer.is_awaiting_confirmation() {
        state.signer.resolve(confirmed, keyring, &mut reply);
        state.record_error();
        return reply;
    }
    match state.signer.resolve(confirmed, keyring, &mut reply) {
        StatusWord::Ok => state.record_sign_success(),
        StatusWord::ConditionsOfUseNotSatisfied => state.record_sign_rejected(),
        _ => state.record_error(),
    }
    reply
}

/// Full request/reply exchange with the confirmation taken synchronously
/// from `platform`.
pub fn exchange<P: Platform, K: Keyring>(
    state: &mut ServiceState,
    platform: &P,
    keyring: &K,
    raw: &[u8],
) -> ReplyBuffer {
    let prompt = match process_apdu(state, platform.is_pin_validated(), raw) {
        Response::Reply(reply) => return reply,
        Response::Deferred(prompt) => prompt,
    };

    let confirmed = ui::confirm_sign_mnb(platform, &prompt);
    let reply = user_action(state, keyring, confirmed);

    match reply.status() {
        Some(StatusWord::Ok) => platform.show_info(true, "Broadcast signed"),
        Some(StatusWord::ConditionsOfUseNotSatisfied) => platform.show_info(false, "Rejected"),
        _ => platform.show_info(false, "Signing failed"),
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Seed;
    use crate::platform::MockPlatform;
    use common::constants::{MNB_FIXED_LEN, P1_SIGN_MNB, P2_SIGN_MNB};

    fn request(ip: [u8; 4]) -> Vec<u8> {
        let mut raw = vec![CLA, INS_SIGN_MNB, P1_SIGN_MNB, P2_SIGN_MNB, 0, 0];
        let mut payload = vec![0u8; MNB_FIXED_LEN];
        payload[46..48].copy_from_slice(&[0xFF, 0xFF]);
        payload[48..52].copy_from_slice(&ip);
        raw.extend_from_slice(&payload);
        raw[4] = (raw.len() - 5) as u8;
        raw
    }

    fn keyring() -> SeedKeyring {
        SeedKeyring::new(Seed::from_bytes(&[0x11; 64]))
    }

    fn reply_status(response: Response) -> Option<StatusWord> {
        match response {
            Response::Reply(reply) => reply.status(),
            Response::Deferred(_) => None,
        }
    }

    #[test]
    fn test_routing() {
        let mut state = ServiceState::new();

        let mut raw = request([10, 0, 0, 1]);
        raw[0] = 0x80;
        assert_eq!(
            reply_status(process_apdu(&mut state, true, &raw)),
            Some(StatusWord::ClaNotSupported)
        );

        let mut raw = request([10, 0, 0, 1]);
        raw[1] = 0x02;
        assert_eq!(
            reply_status(process_apdu(&mut state, true, &raw)),
            Some(StatusWord::InsNotSupported)
        );

        assert_eq!(
            reply_status(process_apdu(&mut state, true, &[CLA])),
            Some(StatusWord::InternalFault(FaultPhase::Parse))
        );
        assert_eq!(state.get_stats().errors, 3);
    }

    #[test]
    fn test_deferred_then_user_action() {
        let mut state = ServiceState::new();
        match process_apdu(&mut state, true, &request([10, 0, 0, 1])) {
            Response::Deferred(prompt) => assert_eq!(prompt.ip, [10, 0, 0, 1]),
            Response::Reply(reply) => panic!("unexpected reply {:?}", reply),
        }

        let reply = user_action(&mut state, &keyring(), true);
        assert_eq!(reply.status(), Some(StatusWord::Ok));
        assert_eq!(state.get_stats().signs_completed, 1);
    }

    #[test]
    fn test_user_action_without_request_is_an_error() {
        let mut state = ServiceState::new();
        let reply = user_action(&mut state, &keyring(), true);

        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
        assert_eq!(state.get_stats().signs_rejected, 0);
        assert_eq!(state.get_stats().errors, 1);
    }

    #[test]
    fn test_user_decline_is_counted_as_rejection() {
        let mut state = ServiceState::new();
        assert!(matches!(
            process_apdu(&mut state, true, &request([10, 0, 0, 1])),
            Response::Deferred(_)
        ));

        let reply = user_action(&mut state, &keyring(), false);
        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
        assert_eq!(state.get_stats().signs_rejected, 1);
        assert_eq!(state.get_stats().errors, 0);
    }

    #[test]
    fn test_configuration_drives_parser() {
        let mut state = ServiceState::new();
        state.config.sign_mnb_params = (0x00, 0x00);

        assert_eq!(
            reply_status(process_apdu(&mut state, true, &request([10, 0, 0, 1]))),
            Some(StatusWord::IncorrectParameters)
        );

        let mut raw = request([10, 0, 0, 1]);
        raw[2] = 0x00;
        raw[3] = 0x00;
        assert!(matches!(
            process_apdu(&mut state, true, &raw),
            Response::Deferred(_)
        ));
    }

    #[test]
    fn test_exchange_shows_review_and_outcome() {
        let mut state = ServiceState::new();
        let platform = MockPlatform::new();

        let reply = exchange(&mut state, &platform, &keyring(), &request([10, 0, 0, 1]));
        assert_eq!(reply.status(), Some(StatusWord::Ok));
        assert_eq!(platform.infos(), vec![(true, "Broadcast signed".to_string())]);

        #[cfg(not(feature = "autoapprove"))]
        {
            let reviews = platform.reviews();
            assert_eq!(reviews.len(), 1);
            assert_eq!(reviews[0].title, MnbPrompt::TITLE);
            assert_eq!(reviews[0].fields[0].1, "10.0.0.1");
        }
    }

    #[cfg(not(feature = "autoapprove"))]
    #[test]
    fn test_exchange_declined() {
        let mut state = ServiceState::new();
        let platform = MockPlatform::new();
        platform.set_auto_approve(false);

        let reply = exchange(&mut state, &platform, &keyring(), &request([10, 0, 0, 1]));
        assert_eq!(reply.as_slice(), &[0x69, 0x85]);
        assert_eq!(state.get_stats().signs_rejected, 1);
        assert!(!state.signer.is_awaiting_confirmation());
    }

    #[test]
    fn test_exchange_locked_device() {
        let mut state = ServiceState::new();
        let platform = MockPlatform::new();
        platform.set_pin_validated(false);

        let reply = exchange(&mut state, &platform, &keyring(), &request([10, 0, 0, 1]));
        assert_eq!(reply.as_slice(), &[0x69, 0x82]);
        assert!(platform.reviews().is_empty());
        assert!(platform.infos().is_empty());
    }
}
