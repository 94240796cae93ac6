//! Masternode broadcast signing client library.
//!
//! This library provides the wallet side of the SIGN_MNB command:
//! - building the broadcast hash serialization ([`masternode`])
//! - wrapping it in a request APDU ([`apdu`])
//! - decoding and verifying the device reply ([`signature`])
//! - reading `masternode.conf` ([`conf`])
//!
//! # Example
//!
//! ```no_run
//! use mnsign_client::{InProcessDevice, MnbClient};
//! use mnsign_client::masternode::{MasternodeBroadcast, OutPoint};
//!
//! let device = InProcessDevice::with_dev_seed().unwrap();
//! let path = "m/44'/9797'/0'/0/0".parse().unwrap();
//! let collateral = device.keyring().public_key(&path).unwrap();
//! let mnb = MasternodeBroadcast::new(
//!     OutPoint::from_txid_hex(&"ab".repeat(32), 1).unwrap(),
//!     "10.0.0.1:39797".parse().unwrap(),
//!     collateral.to_vec(),
//!     vec![0x04; 65],
//!     1_700_000_000,
//! );
//!
//! let mut client = MnbClient::new(device);
//! let signature = client.sign_broadcast(&path, &mnb).unwrap();
//! println!("{}", hex::encode(signature.to_compact()));
//! ```

pub mod apdu;
mod client;
pub mod conf;
mod error;
pub mod masternode;
pub mod signature;

pub use client::{InProcessDevice, MnbClient, Transport};
pub use error::MnbClientError;
