use std::fmt;

use crate::{
    gateway::GatewayIbcTokenBridgePayload,
    nft,
    token::{self, AssetMeta, GovernancePacket, Message, Transfer, TransferWithPayload},
    Amount, Chain, Error, UniversalAddress, VaaPayload,
};

// Discriminator, amount, token address, token chain, recipient, recipient chain and fee.
const TOKEN_TRANSFER_LEN: usize = 1 + 32 + 32 + 2 + 32 + 2 + 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PayloadKind {
    Transfer,
    AttestMeta,
    TransferWithPayload,
    GatewayTransfer,
    NftTransfer,
    RegisterChain,
    ContractUpgrade,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Transfer => "Transfer",
            PayloadKind::AttestMeta => "AttestMeta",
            PayloadKind::TransferWithPayload => "TransferWithPayload",
            PayloadKind::GatewayTransfer => "GatewayTransfer",
            PayloadKind::NftTransfer => "NftTransfer",
            PayloadKind::RegisterChain => "RegisterChain",
            PayloadKind::ContractUpgrade => "ContractUpgrade",
        };

        f.write_str(name)
    }
}

/// Any payload the connect SDK understands, decoded by its discriminator.
///
/// A transfer-with-payload whose payload is a gateway routing message decodes as
/// `GatewayTransfer`; the raw bytes stay available on `transfer.payload`. Token and NFT bridge
/// transfers share a discriminator and are told apart by length: a token transfer is always
/// exactly 133 bytes, an NFT transfer always longer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    Transfer(Transfer),
    AttestMeta(AssetMeta),
    TransferWithPayload(TransferWithPayload),
    GatewayTransfer {
        transfer: TransferWithPayload,
        message: GatewayIbcTokenBridgePayload,
    },
    TokenBridgeGovernance(GovernancePacket),
    NftTransfer(nft::Transfer),
    NftBridgeGovernance(nft::GovernancePacket),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Transfer(_) => PayloadKind::Transfer,
            Payload::AttestMeta(_) => PayloadKind::AttestMeta,
            Payload::TransferWithPayload(_) => PayloadKind::TransferWithPayload,
            Payload::GatewayTransfer { .. } => PayloadKind::GatewayTransfer,
            Payload::TokenBridgeGovernance(g) => g.kind(),
            Payload::NftTransfer(_) => PayloadKind::NftTransfer,
            Payload::NftBridgeGovernance(g) => g.kind(),
        }
    }

    /// Whether this payload moves fungible tokens.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Payload::Transfer(_) | Payload::TransferWithPayload(_) | Payload::GatewayTransfer { .. }
        )
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Payload::Transfer(t) => Some(t.amount),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => {
                Some(t.amount)
            }
            _ => None,
        }
    }

    /// The token's chain of origin and its address there.
    pub fn token(&self) -> Option<(Chain, UniversalAddress)> {
        match self {
            Payload::Transfer(t) => Some((t.token_chain, t.token_address)),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => {
                Some((t.token_chain, t.token_address))
            }
            Payload::AttestMeta(m) => Some((m.token_chain, m.token_address)),
            Payload::NftTransfer(t) => Some((t.nft_chain, t.nft_address)),
            Payload::TokenBridgeGovernance(_) | Payload::NftBridgeGovernance(_) => None,
        }
    }

    pub fn recipient(&self) -> Option<(Chain, UniversalAddress)> {
        match self {
            Payload::Transfer(t) => Some((t.recipient_chain, t.recipient)),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => {
                Some((t.recipient_chain, t.recipient))
            }
            Payload::NftTransfer(t) => Some((t.to_chain, t.to)),
            _ => None,
        }
    }
}

impl From<Message> for Payload {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Transfer(t) => Payload::Transfer(t),
            Message::AssetMeta(m) => Payload::AttestMeta(m),
            Message::TransferWithPayload(t) => match GatewayIbcTokenBridgePayload::from_json(&t.payload) {
                Ok(message) => Payload::GatewayTransfer {
                    transfer: t,
                    message,
                },
                Err(_) => Payload::TransferWithPayload(t),
            },
        }
    }
}

impl VaaPayload for Payload {
    fn to_payload_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            Payload::Transfer(t) => Message::Transfer(t.clone()).to_payload_bytes(),
            Payload::AttestMeta(m) => Message::AssetMeta(m.clone()).to_payload_bytes(),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => {
                Message::TransferWithPayload(t.clone()).to_payload_bytes()
            }
            Payload::TokenBridgeGovernance(g) => g.to_payload_bytes(),
            Payload::NftTransfer(t) => nft::Message::Transfer(t.clone()).to_payload_bytes(),
            Payload::NftBridgeGovernance(g) => g.to_payload_bytes(),
        }
    }

    fn from_payload_bytes(buf: &[u8]) -> Result<Self, Error> {
        if buf.starts_with(&token::MODULE) {
            return GovernancePacket::from_payload_bytes(buf).map(Payload::TokenBridgeGovernance);
        }
        if buf.starts_with(&nft::MODULE) {
            return nft::GovernancePacket::from_payload_bytes(buf).map(Payload::NftBridgeGovernance);
        }
        if buf.first() == Some(&1) && buf.len() > TOKEN_TRANSFER_LEN {
            let nft::Message::Transfer(t) = nft::Message::from_payload_bytes(buf)?;
            return Ok(Payload::NftTransfer(t));
        }

        Message::from_payload_bytes(buf).map(Payload::from)
    }
}
