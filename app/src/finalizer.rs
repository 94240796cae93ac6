//! Signing finalizer: double hash, derive, sign.
//!
//! Runs only after the user confirmed. The private key handle lives inside
//! [`finalize`] and is dropped (and zeroized) before it returns.

use common::{Error, FaultPhase, Hash256, StatusWord};

use crate::accumulator::IncrementalHash;
use crate::crypto::{DerSignature, Keyring};
use crate::io::ReplyBuffer;
use crate::session::PendingSession;

/// Turns the accumulated payload hash into the digest that gets signed.
///
/// `D1 = SHA256(payload)`, `D2 = SHA256(D1)`. Leaves `digest` reset.
pub fn double_hash<H: IncrementalHash>(digest: &mut H) -> Hash256 {
    let first = digest.finalize_reset();
    digest.init();
    digest.update(&first);
    digest.finalize_reset()
}

/// Signs the broadcast described by `session` and `digest`.
pub fn finalize<H, K>(
    session: &PendingSession,
    digest: &mut H,
    keyring: &K,
) -> Result<DerSignature, StatusWord>
where
    H: IncrementalHash,
    K: Keyring,
{
    let fault = StatusWord::InternalFault(FaultPhase::Sign);
    let hash = double_hash(digest);

    let key = keyring.derive_private_key(session.keypath()).map_err(|e| {
        log::warn!("Key derivation failed: {}", e);
        fault
    })?;
    let signature = keyring.sign_digest(&key, &hash).map_err(|e| {
        log::warn!("Signing failed: {}", e);
        fault
    })?;
    drop(key);

    Ok(signature)
}

/// Writes a successful signing reply: `90 00 || len || signature`.
///
/// On overflow the reply is replaced by a bare sign-phase fault.
pub fn write_signature(reply: &mut ReplyBuffer, signature: &DerSignature) -> StatusWord {
    fn try_write(reply: &mut ReplyBuffer, signature: &DerSignature) -> Result<(), Error> {
        reply.set_status(StatusWord::Ok);
        reply.push(signature.len() as u8)?;
        reply.extend_from_slice(signature.as_bytes())
    }

    match try_write(reply, signature) {
        Ok(()) => StatusWord::Ok,
        Err(e) => {
            log::warn!("Reply does not fit: {}", e);
            let sw = StatusWord::InternalFault(FaultPhase::Sign);
            reply.set_status(sw);
            sw
        }
    }
}
