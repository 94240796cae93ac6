//! Confirmation prompt for the signing command.
//!
//! # Security
//!
//! No signature is produced without the user approving this prompt. The user
//! sees the masternode address being announced and the key that signs it.

use common::{Ipv4Addr, KeyPath};

use crate::platform::Platform;

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnbPrompt {
    /// Masternode IPv4 address from the broadcast.
    pub ip: Ipv4Addr,
    /// Collateral key path that will sign.
    pub keypath: KeyPath,
}

impl MnbPrompt {
    /// Title of the review screen.
    pub const TITLE: &'static str = "Sign masternode broadcast";

    /// Label of the approve action.
    pub const ACTION: &'static str = "Sign broadcast";

    /// Review fields as (tag, value) pairs.
    pub fn fields(&self) -> [(&'static str, String); 2] {
        [
            ("Masternode IP", format_ipv4(&self.ip)),
            ("Key path", self.keypath.to_string()),
        ]
    }
}

/// Dotted-quad rendering of an IPv4 address.
pub fn format_ipv4(ip: &Ipv4Addr) -> String {
    format!("{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3])
}

/// Shows the prompt and returns the user's decision.
pub fn confirm_sign_mnb<P: Platform>(platform: &P, prompt: &MnbPrompt) -> bool {
    // Auto-approve for testing
    #[cfg(feature = "autoapprove")]
    {
        let _ = (platform, prompt);
        return true;
    }

    #[cfg(not(feature = "autoapprove"))]
    {
        let fields = prompt.fields();
        let field_refs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        platform.review(MnbPrompt::TITLE, &field_refs, MnbPrompt::ACTION)
    }
}
