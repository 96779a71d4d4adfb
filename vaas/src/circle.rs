//! Circle (CCTP) burn messages.
//!
//! The message emitted by the message transmitter is passed to the destination chain as-is, next
//! to the attestation Circle signs over it. The only thing the SDK derives from it is its keccak256
//! hash, which is the key for requesting the attestation. [`CircleMessage::decode`] is provided
//! for inspecting the burn.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{Amount, Error, UniversalAddress};

/// The raw bytes of a `MessageSent` event.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct CircleMessage(pub Vec<u8>);

/// The signature returned by the attestation service for a [`CircleMessage`].
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct CircleAttestation(pub Vec<u8>);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub version: u32,
    pub source_domain: u32,
    pub destination_domain: u32,
    pub nonce: u64,
    pub sender: UniversalAddress,
    pub recipient: UniversalAddress,
    pub destination_caller: UniversalAddress,
}

/// The token messenger's message body.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BurnMessage {
    pub version: u32,
    pub burn_token: UniversalAddress,
    pub mint_recipient: UniversalAddress,
    pub amount: Amount,
    pub message_sender: UniversalAddress,
}

impl CircleMessage {
    pub fn hash(&self) -> [u8; 32] {
        Keccak256::digest(&self.0).into()
    }

    /// `0x` prefixed hex of [`Self::hash`], the form the attestation service expects.
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash()))
    }

    pub fn decode(&self) -> Result<(MessageHeader, BurnMessage), Error> {
        let (header, body) = serde_wormhole::from_slice_with_payload::<MessageHeader>(&self.0)?;
        let burn = serde_wormhole::from_slice(body)?;

        Ok((header, burn))
    }

    pub fn encode(header: &MessageHeader, burn: &BurnMessage) -> Result<Self, Error> {
        let mut buf = serde_wormhole::to_vec(header)?;
        buf.extend(serde_wormhole::to_vec(burn)?);

        Ok(CircleMessage(buf))
    }
}

impl From<Vec<u8>> for CircleMessage {
    fn from(buf: Vec<u8>) -> Self {
        CircleMessage(buf)
    }
}

impl From<Vec<u8>> for CircleAttestation {
    fn from(buf: Vec<u8>) -> Self {
        CircleAttestation(buf)
    }
}
