//! Serde support for Wormhole VAAs and the payloads the connect SDK moves around.
//!
//! This crate provides:
//!
//! - The [`Vaa`] type with its header, body and the digest rules used to identify it.
//! - The token bridge payloads (transfers, attestations and governance) and a polymorphic
//!   [`Payload`] that decodes any of them by discriminator.
//! - The NFT bridge transfer and its governance actions.
//! - The IBC gateway routing messages carried inside transfers to and from Cosmos chains.
//! - The token bridge relayer payload that names the real recipient of a relayed transfer.
//! - The Circle (CCTP) burn message and its hash.

#![deny(unused_results)]

use std::fmt;

use serde::{Deserialize, Serialize};

mod arraystring;
pub mod circle;
mod error;
pub mod gateway;
pub mod nft;
pub mod payload;
pub mod relayer;
pub mod token;
pub mod vaa;

pub use error::Error;
pub use payload::{Payload, PayloadKind};
pub use vaa::{digest, Body, Digest, Header, Signature, Vaa, VaaPayload};
pub use wormhole_connect_base::{Chain, UniversalAddress};

/// The `GOVERNANCE_EMITTER` is a special address Wormhole guardians trust to observe governance
/// actions from. The value is "0000000000000000000000000000000000000000000000000000000000000004".
pub const GOVERNANCE_EMITTER: UniversalAddress = UniversalAddress([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
]);

/// Wormhole specifies an amount as a uint256 encoded in big-endian order.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Amount(pub [u8; 32]);

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        let mut buf = [0u8; 32];
        buf[16..].copy_from_slice(&v.to_be_bytes());
        Amount(buf)
    }
}

impl TryFrom<Amount> for u128 {
    type Error = Error;

    fn try_from(a: Amount) -> Result<Self, Self::Error> {
        if a.0[..16].iter().any(|b| *b != 0) {
            return Err(Error::AmountOverflow);
        }

        let mut buf = [0u8; 16];
        buf.copy_from_slice(&a.0[16..]);
        Ok(u128::from_be_bytes(buf))
    }
}

/// Identifies a Wormhole message independently of any transfer object: the emitter and its
/// sequence number. Sequences increase per emitter, not globally.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WormholeMessageId {
    pub chain: Chain,
    pub emitter: UniversalAddress,
    pub sequence: u64,
}

impl fmt::Display for WormholeMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            u16::from(self.chain),
            self.emitter,
            self.sequence
        )
    }
}
