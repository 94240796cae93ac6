//! Pending session state and its wiper.
//!
//! The session holds what the signing step needs from the request once the
//! request bytes are gone: the key path and the masternode IPv4 address.
//! It is written field by field, only after each preceding check passed, and
//! zeroed on every exit path that does not hand it over to a confirmation.

use core::ops::{Deref, DerefMut};

use common::{Ipv4Addr, KeyPath};
use zeroize::Zeroize;

/// Transient state carried from request parsing to confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize)]
pub struct PendingSession {
    pub(crate) keypath: KeyPath,
    pub(crate) ip: Ipv4Addr,
}

impl PendingSession {
    /// An all-zero session.
    pub const fn new() -> Self {
        Self {
            keypath: KeyPath::empty(),
            ip: [0u8; 4],
        }
    }

    /// Key path to sign with.
    pub fn keypath(&self) -> &KeyPath {
        &self.keypath
    }

    /// Masternode IPv4 address.
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Zeroes every field. Idempotent.
    pub fn wipe(&mut self) {
        self.zeroize();
    }

    /// Returns true if no field holds any data.
    pub fn is_wiped(&self) -> bool {
        self.keypath.is_zero() && self.ip == [0u8; 4]
    }
}

/// Scoped access to the session slot that wipes it on entry and on drop.
///
/// The only way to keep the parsed data is [`WipeGuard::retain`], which moves
/// it out and leaves the slot zeroed.
pub struct WipeGuard<'a> {
    session: &'a mut PendingSession,
}

impl<'a> WipeGuard<'a> {
    /// Clears any residue left in `session` and guards it.
    pub fn new(session: &'a mut PendingSession) -> Self {
        session.wipe();
        Self { session }
    }

    /// Moves the parsed data out. The slot is zero afterwards.
    pub fn retain(self) -> PendingSession {
        core::mem::take(&mut *self.session)
    }
}

impl Deref for WipeGuard<'_> {
    type Target = PendingSession;

    fn deref(&self) -> &PendingSession {
        self.session
    }
}

impl DerefMut for WipeGuard<'_> {
    fn deref_mut(&mut self) -> &mut PendingSession {
        self.session
    }
}

impl Drop for WipeGuard<'_> {
    fn drop(&mut self) {
        self.session.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> PendingSession {
        PendingSession {
            keypath: KeyPath::from_indices(&[0x8000002C, 0x80002645, 0x80000000, 0, 0]).unwrap(),
            ip: [10, 0, 0, 1],
        }
    }

    #[test]
    fn test_new_is_wiped() {
        assert!(PendingSession::new().is_wiped());
        assert!(PendingSession::default().is_wiped());
    }

    #[test]
    fn test_wipe_is_idempotent() {
        let mut session = populated();
        assert!(!session.is_wiped());
        session.wipe();
        assert!(session.is_wiped());
        session.wipe();
        assert!(session.is_wiped());
        assert_eq!(session, PendingSession::new());
    }

    #[test]
    fn test_guard_wipes_on_entry() {
        let mut slot = populated();
        let guard = WipeGuard::new(&mut slot);
        assert!(guard.is_wiped());
    }

    #[test]
    fn test_guard_wipes_on_drop() {
        let mut slot = PendingSession::new();
        {
            let mut guard = WipeGuard::new(&mut slot);
            guard.ip = [192, 168, 1, 1];
            guard.keypath = KeyPath::from_indices(&[1]).unwrap();
        }
        assert!(slot.is_wiped());
    }

    #[test]
    fn test_guard_retain_moves_data_out() {
        let mut slot = PendingSession::new();
        let mut guard = WipeGuard::new(&mut slot);
        guard.ip = [10, 0, 0, 1];
        let retained = guard.retain();
        assert_eq!(retained.ip(), [10, 0, 0, 1]);
        assert!(slot.is_wiped());
    }
}
