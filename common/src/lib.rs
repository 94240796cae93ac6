//! Common types and definitions for the masternode broadcast signing command.
//!
//! This crate is shared by the device-side command core (`app`) and the host
//! wallet (`client`). It holds the wire constants of the SIGN_MNB APDU, the
//! status words returned on the channel and the key path representation that
//! is copied verbatim out of the request.
//!
//! # Security Note
//!
//! Everything in here describes attacker-controlled input. Types only encode
//! the layout; the validation policy lives in the `app` crate.

#![no_std]

extern crate alloc;

pub mod apdu;
pub mod constants;
pub mod error;
pub mod path;
pub mod status;
pub mod types;

pub use apdu::ApduHeader;
pub use error::Error;
pub use path::KeyPath;
pub use status::{FaultPhase, StatusWord};
pub use types::*;
