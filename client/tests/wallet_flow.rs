//! Wallet-to-device tests over the in-process transport.
//!
//! Run with: cargo test --test wallet_flow

use app::crypto::{Seed, SeedKeyring};
use common::{KeyPath, StatusWord};
use hex_literal::hex;
use mnsign_client::apdu::sign_mnb_apdu;
use mnsign_client::conf::parse_conf;
use mnsign_client::masternode::MasternodeBroadcast;
use mnsign_client::signature::{decode_reply, RecoverableSignature};
use mnsign_client::{InProcessDevice, MnbClient, MnbClientError, Transport};

const CONF: &str = "\
# alias ip:port masternode_privkey collateral_txid collateral_output_index
mn1 10.0.0.1:39797 GZ2wAvbXkq3g7EnPZbRQ7QKrSDJm3LMcHqRbw8BUnRuFnBxDMs1 0c7f6e3b2a1d4c5b6a7988776655443322110fedcba9876543210fedcba98765 1
";

fn device() -> InProcessDevice {
    InProcessDevice::new(SeedKeyring::new(Seed::from_bytes(&[0x42; 64])))
}

fn collateral_path() -> KeyPath {
    "m/44'/9797'/0'/0/0".parse().unwrap()
}

fn broadcast(device: &InProcessDevice) -> MasternodeBroadcast {
    let entry = parse_conf(CONF).unwrap().remove(0);
    let collateral = device.keyring().public_key(&collateral_path()).unwrap();
    MasternodeBroadcast::new(
        entry.outpoint,
        entry.service,
        collateral.to_vec(),
        [0x04; 65].to_vec(),
        1_700_000_000,
    )
}

#[test]
fn test_sign_broadcast_from_conf() {
    let device = device();
    let mnb = broadcast(&device);
    let mut client = MnbClient::new(device);

    let signature = client.sign_broadcast(&collateral_path(), &mnb).unwrap();
    let compact = signature.to_compact();
    assert!((31..=34).contains(&compact[0]));

    let again = RecoverableSignature::from_compact(&compact).unwrap();
    again
        .verify(&mnb.signature_hash(), &mnb.pubkey_collateral)
        .unwrap();
    assert_eq!(client.transport().state().get_stats().signs_completed, 1);
}

#[test]
fn test_wrong_collateral_key_is_detected() {
    let device = device();
    let mut mnb = broadcast(&device);
    mnb.pubkey_collateral = device
        .keyring()
        .public_key(&"m/44'/9797'/0'/0/1".parse().unwrap())
        .unwrap()
        .to_vec();

    let mut client = MnbClient::new(device);
    assert!(matches!(
        client.sign_broadcast(&collateral_path(), &mnb),
        Err(MnbClientError::InvalidSignature)
    ));
}

#[test]
fn test_user_rejection_reaches_the_wallet() {
    let device = device();
    device.platform().set_auto_approve(false);
    let mnb = broadcast(&device);
    let mut client = MnbClient::new(device);

    assert!(matches!(
        client.sign_broadcast(&collateral_path(), &mnb),
        Err(MnbClientError::Device(StatusWord::ConditionsOfUseNotSatisfied))
    ));
}

#[test]
fn test_locked_device() {
    let device = device();
    device.platform().set_pin_validated(false);
    let mnb = broadcast(&device);
    let mut client = MnbClient::new(device);

    assert!(matches!(
        client.sign_broadcast(&collateral_path(), &mnb),
        Err(MnbClientError::Device(StatusWord::SecurityNotSatisfied))
    ));
}

#[test]
fn test_raw_exchange() {
    let mut device = device();
    let mnb = broadcast(&device);
    let apdu = sign_mnb_apdu(&KeyPath::empty(), &mnb.serialize_for_hash()).unwrap();
    assert_eq!(&apdu[..4], &hex!("E0 50 A5 5A"));

    let reply = device.exchange(&apdu).unwrap();
    assert_eq!(&reply[..2], &hex!("9000"));
    let tagged = decode_reply(&reply).unwrap();
    assert_eq!(tagged[0] & 0xFC, 0x30);

    let signature = RecoverableSignature::from_tagged_der(&tagged).unwrap();
    let signer = signature.recover(&mnb.signature_hash()).unwrap();
    assert_eq!(signer, device.keyring().public_key(&KeyPath::empty()).unwrap());
}
