//! Host side of the SIGN_MNB exchange.

use app::crypto::SeedKeyring;
use app::platform::MockPlatform;
use app::ServiceState;
use common::KeyPath;

use crate::apdu::sign_mnb_apdu;
use crate::masternode::MasternodeBroadcast;
use crate::signature::{decode_reply, RecoverableSignature};
use crate::MnbClientError;

/// Carries one APDU to the device and brings back the raw reply.
pub trait Transport {
    fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>, MnbClientError>;
}

/// The signing core running in-process, for simulation and tests.
pub struct InProcessDevice {
    state: ServiceState,
    platform: MockPlatform,
    keyring: SeedKeyring,
}

impl InProcessDevice {
    /// Device with the given keyring, unlocked, approving every prompt.
    pub fn new(keyring: SeedKeyring) -> Self {
        Self {
            state: ServiceState::new(),
            platform: MockPlatform::new(),
            keyring,
        }
    }

    /// Device over the development seed.
    pub fn with_dev_seed() -> Result<Self, MnbClientError> {
        Ok(Self::new(app::handlers::device_keyring()?))
    }

    /// The simulated user and PIN gate.
    pub fn platform(&self) -> &MockPlatform {
        &self.platform
    }

    /// The device keyring.
    pub fn keyring(&self) -> &SeedKeyring {
        &self.keyring
    }

    /// Device-side state, for inspection.
    pub fn state(&self) -> &ServiceState {
        &self.state
    }
}

impl Transport for InProcessDevice {
    fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>, MnbClientError> {
        let reply = app::exchange(&mut self.state, &self.platform, &self.keyring, apdu);
        Ok(reply.as_slice().to_vec())
    }
}

/// Masternode broadcast signing client.
pub struct MnbClient<T: Transport> {
    transport: T,
}

impl<T: Transport> MnbClient<T> {
    /// Creates a new client with the given transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Asks the device to sign `mnb` with the collateral key at `path`.
    ///
    /// The signature is checked against `mnb.pubkey_collateral` before it is
    /// returned.
    pub fn sign_broadcast(
        &mut self,
        path: &KeyPath,
        mnb: &MasternodeBroadcast,
    ) -> Result<RecoverableSignature, MnbClientError> {
        let apdu = sign_mnb_apdu(path, &mnb.serialize_for_hash())?;
        let reply = self.transport.exchange(&apdu)?;
        let tagged = decode_reply(&reply)?;
        let signature = RecoverableSignature::from_tagged_der(&tagged)?;
        signature.verify(&mnb.signature_hash(), &mnb.pubkey_collateral)?;
        log::info!("Broadcast for {:?} signed and verified", mnb.addr.ipv4_addr());
        Ok(signature)
    }
}
