//! Masternode broadcast payload.
//!
//! Builds the hash serialization the device signs:
//!
//! ```text
//! outpoint (txid 32, vout u32 LE) | service (ip 16, port u16 BE)
//!   | ser_string(collateral pubkey) | ser_string(masternode pubkey)
//!   | sig_time i64 LE | protocol version i32 LE
//! ```

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use common::Hash256;
use sha2::{Digest, Sha256};

use crate::MnbClientError;

/// Protocol version announced in broadcasts.
pub const PROTOCOL_VERSION: i32 = 70212;

/// Collateral transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutPoint {
    /// Transaction id in serialization (little-endian) order.
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    /// Builds an outpoint from a txid as displayed by wallets and explorers.
    pub fn from_txid_hex(txid: &str, vout: u32) -> Result<Self, MnbClientError> {
        let bytes = hex::decode(txid.strip_prefix("0x").unwrap_or(txid))
            .map_err(|e| format!("Invalid txid hex: {}", e))?;
        if bytes.len() != 32 {
            return Err("txid must be 32 bytes".into());
        }
        let mut txid = [0u8; 32];
        for (dst, src) in txid.iter_mut().zip(bytes.iter().rev()) {
            *dst = *src;
        }
        Ok(Self { txid, vout })
    }

    /// Serialized outpoint.
    pub fn serialize(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(&self.txid);
        out[32..].copy_from_slice(&self.vout.to_le_bytes());
        out
    }
}

/// Network address of the masternode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// IPv6 address, IPv4 addresses in their mapped form.
    pub ip: [u8; 16],
    pub port: u16,
}

impl Service {
    /// IPv4 service, stored as `::ffff:a.b.c.d`.
    pub fn ipv4(addr: [u8; 4], port: u16) -> Self {
        let mut ip = [0u8; 16];
        ip[10] = 0xFF;
        ip[11] = 0xFF;
        ip[12..].copy_from_slice(&addr);
        Self { ip, port }
    }

    /// The IPv4 address if this is an IPv4-mapped service.
    pub fn ipv4_addr(&self) -> Option<[u8; 4]> {
        if self.ip[..10].iter().all(|&b| b == 0) && self.ip[10..12] == [0xFF, 0xFF] {
            let mut addr = [0u8; 4];
            addr.copy_from_slice(&self.ip[12..]);
            Some(addr)
        } else {
            None
        }
    }

    /// Serialized service: address, then port in network order.
    pub fn serialize(&self) -> [u8; 18] {
        let mut out = [0u8; 18];
        out[..16].copy_from_slice(&self.ip);
        out[16..].copy_from_slice(&self.port.to_be_bytes());
        out
    }
}

impl FromStr for Service {
    type Err = MnbClientError;

    /// Parses `a.b.c.d:port`. Only IPv4 is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr: SocketAddr = s
            .parse()
            .map_err(|e| format!("Invalid address '{}': {}", s, e))?;
        match addr.ip() {
            IpAddr::V4(v4) => Ok(Self::ipv4(v4.octets(), addr.port())),
            IpAddr::V6(_) => Err("only IPv4 masternode addresses are supported".into()),
        }
    }
}

/// Masternode announcement signed with the collateral key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasternodeBroadcast {
    pub outpoint: OutPoint,
    pub addr: Service,
    /// Compressed public key of the collateral address.
    pub pubkey_collateral: Vec<u8>,
    /// Uncompressed public key of the masternode.
    pub pubkey_masternode: Vec<u8>,
    pub sig_time: i64,
    pub protocol_version: i32,
}

impl MasternodeBroadcast {
    /// Broadcast at the current protocol version.
    pub fn new(
        outpoint: OutPoint,
        addr: Service,
        pubkey_collateral: Vec<u8>,
        pubkey_masternode: Vec<u8>,
        sig_time: i64,
    ) -> Self {
        Self {
            outpoint,
            addr,
            pubkey_collateral,
            pubkey_masternode,
            sig_time,
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// Serialization covered by the collateral signature.
    pub fn serialize_for_hash(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            36 + 18 + 2 + self.pubkey_collateral.len() + self.pubkey_masternode.len() + 12,
        );
        out.extend_from_slice(&self.outpoint.serialize());
        out.extend_from_slice(&self.addr.serialize());
        write_string(&mut out, &self.pubkey_collateral);
        write_string(&mut out, &self.pubkey_masternode);
        out.extend_from_slice(&self.sig_time.to_le_bytes());
        out.extend_from_slice(&self.protocol_version.to_le_bytes());
        out
    }

    /// `SHA256(SHA256(serialize_for_hash()))`, the digest the device signs.
    pub fn signature_hash(&self) -> Hash256 {
        let first = Sha256::digest(self.serialize_for_hash());
        Sha256::digest(first).into()
    }
}

/// Bitcoin compact-size length prefix.
fn write_compact_size(out: &mut Vec<u8>, len: usize) {
    match len {
        0..=252 => out.push(len as u8),
        253..=0xFFFF => {
            out.push(253);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(254);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
        _ => {
            out.push(255);
            out.extend_from_slice(&(len as u64).to_le_bytes());
        }
    }
}

fn write_string(out: &mut Vec<u8>, data: &[u8]) {
    write_compact_size(out, data.len());
    out.extend_from_slice(data);
}
