//! `masternode.conf` parsing.
//!
//! One masternode per line: `alias ip:port masternode_privkey txid vout`.
//! Lines starting with `#` are comments.

use std::path::Path;

use crate::masternode::{OutPoint, Service};
use crate::MnbClientError;

/// One configured masternode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasternodeEntry {
    pub alias: String,
    pub service: Service,
    /// Masternode private key in wallet import format, passed through as is.
    pub masternode_privkey: String,
    pub outpoint: OutPoint,
}

/// Parses the content of a `masternode.conf` file.
pub fn parse_conf(text: &str) -> Result<Vec<MasternodeEntry>, MnbClientError> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [alias, service, privkey, txid, vout] = fields.as_slice() else {
            return Err(format!("bad conf line {}: {}", number + 1, line).into());
        };

        let vout: u32 = vout
            .parse()
            .map_err(|_| format!("bad output index on line {}: {}", number + 1, vout))?;
        entries.push(MasternodeEntry {
            alias: alias.to_string(),
            service: service.parse()?,
            masternode_privkey: privkey.to_string(),
            outpoint: OutPoint::from_txid_hex(txid, vout)?,
        });
    }
    Ok(entries)
}

/// Reads and parses a `masternode.conf` file.
pub fn read_conf(path: impl AsRef<Path>) -> Result<Vec<MasternodeEntry>, MnbClientError> {
    let text = std::fs::read_to_string(path)?;
    parse_conf(&text)
}
