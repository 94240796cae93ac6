//! Masternode broadcast signing core.
//!
//! Device-side processing of the SIGN_MNB command: a host wallet sends the
//! hash serialization of a masternode broadcast together with the key path
//! of the collateral key, the user confirms the masternode address on the
//! device, and the device answers with a signature over
//! `SHA256(SHA256(payload))`.
//!
//! # Architecture
//!
//! 1. [`handlers::process_apdu`] routes on CLA/INS
//! 2. [`sign_mnb::MnbSigner::begin`] checks the PIN gate and P1/P2, then
//!    [`parser`] validates the body, fills the session and feeds the
//!    [`accumulator`]
//! 3. The request is suspended as a [`sign_mnb::PendingConfirmation`]
//! 4. [`handlers::user_action`] resumes it; [`finalizer`] double-hashes,
//!    derives the key through a [`crypto::Keyring`] and signs
//! 5. The outcome goes back in an [`io::ReplyBuffer`]
//!
//! # Security Model
//!
//! - Every byte of the request is untrusted
//! - No signature without user confirmation
//! - Key material lives only inside the finalizer and is zeroized on drop
//! - The parsed session is wiped on every path that does not suspend
//! - Fail closed: every error is a bare two-byte status word

pub mod accumulator;
pub mod crypto;
pub mod finalizer;
pub mod handlers;
pub mod io;
pub mod parser;
pub mod platform;
pub mod session;
pub mod sign_mnb;
pub mod state;
pub mod ui;

pub use handlers::{exchange, process_apdu, user_action, Response};
pub use io::ReplyBuffer;
pub use sign_mnb::{Dispatch, MnbSigner, PendingConfirmation, Phase};
pub use state::ServiceState;
