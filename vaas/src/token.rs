//! Token bridge payloads.
//!
//! A transfer payload starts with a one byte discriminator (1 = transfer, 2 = asset metadata,
//! 3 = transfer with payload). Governance payloads instead start with the 32 byte module name
//! "TokenBridge", left padded with zeroes.

use bstr::BString;
use serde::{Deserialize, Serialize};

use crate::{Amount, Chain, Error, PayloadKind, UniversalAddress, VaaPayload};

/// `"TokenBridge"`, left padded to 32 bytes.
pub const MODULE: [u8; 32] =
    *b"\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00TokenBridge";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub amount: Amount,
    pub token_address: UniversalAddress,
    pub token_chain: Chain,
    pub recipient: UniversalAddress,
    pub recipient_chain: Chain,
    pub fee: Amount,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetMeta {
    pub token_address: UniversalAddress,
    pub token_chain: Chain,
    pub decimals: u8,
    #[serde(with = "crate::arraystring")]
    pub symbol: BString,
    #[serde(with = "crate::arraystring")]
    pub name: BString,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferWithPayload {
    pub amount: Amount,
    pub token_address: UniversalAddress,
    pub token_chain: Chain,
    pub recipient: UniversalAddress,
    pub recipient_chain: Chain,
    pub sender_address: UniversalAddress,
    // The payload is directly appended to the message.
    #[serde(skip)]
    pub payload: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    #[serde(rename = "1")]
    Transfer(Transfer),
    #[serde(rename = "2")]
    AssetMeta(AssetMeta),
    #[serde(rename = "3")]
    TransferWithPayload(TransferWithPayload),
}

impl Message {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Message::Transfer(_) => PayloadKind::Transfer,
            Message::AssetMeta(_) => PayloadKind::AttestMeta,
            Message::TransferWithPayload(_) => PayloadKind::TransferWithPayload,
        }
    }
}

impl VaaPayload for Message {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = serde_wormhole::to_vec(self)?;
        if let Message::TransferWithPayload(t) = self {
            buf.extend_from_slice(&t.payload);
        }

        Ok(buf)
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        match buf.first() {
            None => return Err(Error::EmptyPayload),
            Some(1..=3) => {}
            Some(&k) => return Err(Error::UnknownPayloadKind(k)),
        }

        let (mut msg, rest) = serde_wormhole::from_slice_with_payload::<Message>(buf)?;
        match &mut msg {
            Message::TransferWithPayload(t) => t.payload = rest.to_vec(),
            m if !rest.is_empty() => return Err(Error::TrailingData(m.kind())),
            _ => {}
        }

        Ok(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    RegisterChain {
        chain: Chain,
        emitter_address: UniversalAddress,
    },
    ContractUpgrade {
        new_contract: UniversalAddress,
    },
}

/// A token bridge governance instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GovernancePacket {
    /// The chain the action is meant for; `Chain::Any` for all of them.
    pub chain: Chain,
    pub action: Action,
}

// The wire format puts the action before the target chain and then appends the action body, so
// the packet is assembled from its parts rather than derived.
#[derive(Serialize, Deserialize)]
struct GovernanceHeader {
    module: [u8; 32],
    action: u8,
    chain: Chain,
}

#[derive(Serialize, Deserialize)]
struct RegisterChain {
    chain: Chain,
    emitter_address: UniversalAddress,
}

#[derive(Serialize, Deserialize)]
struct ContractUpgrade {
    new_contract: UniversalAddress,
}

impl VaaPayload for GovernancePacket {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        self.encode(MODULE)
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        GovernancePacket::decode(MODULE, buf)
    }
}

impl GovernancePacket {
    pub fn kind(&self) -> PayloadKind {
        match self.action {
            Action::RegisterChain { .. } => PayloadKind::RegisterChain,
            Action::ContractUpgrade { .. } => PayloadKind::ContractUpgrade,
        }
    }

    /// Encode under `module`. The NFT bridge uses the same actions with its own module name.
    pub(crate) fn encode(&self, module: [u8; 32]) -> Result<Vec<u8>, Error> {
        let (action, mut body) = match self.action {
            Action::RegisterChain {
                chain,
                emitter_address,
            } => (
                1u8,
                serde_wormhole::to_vec(&RegisterChain {
                    chain,
                    emitter_address,
                })?,
            ),
            Action::ContractUpgrade { new_contract } => (
                2u8,
                serde_wormhole::to_vec(&ContractUpgrade { new_contract })?,
            ),
        };

        let mut buf = serde_wormhole::to_vec(&GovernanceHeader {
            module,
            action,
            chain: self.chain,
        })?;
        buf.append(&mut body);

        Ok(buf)
    }

    pub(crate) fn decode(module: [u8; 32], buf: &[u8]) -> Result<Self, Error> {
        let (hdr, body) = serde_wormhole::from_slice_with_payload::<GovernanceHeader>(buf)?;
        if hdr.module != module {
            return Err(Error::UnknownModule);
        }

        let action = match hdr.action {
            1 => {
                let RegisterChain {
                    chain,
                    emitter_address,
                } = serde_wormhole::from_slice(body)?;

                Action::RegisterChain {
                    chain,
                    emitter_address,
                }
            }
            2 => {
                let ContractUpgrade { new_contract } = serde_wormhole::from_slice(body)?;

                Action::ContractUpgrade { new_contract }
            }
            v => return Err(Error::UnknownAction(v)),
        };

        Ok(GovernancePacket {
            chain: hdr.chain,
            action,
        })
    }
}
