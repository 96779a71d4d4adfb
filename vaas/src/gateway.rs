//! Routing messages for the IBC gateway.
//!
//! A transfer into Cosmos is a token bridge transfer-with-payload to the gateway's translator
//! contract whose payload is one of these messages, JSON encoded. A transfer out of Cosmos is an
//! ICS-20 transfer to the gateway carrying the message, wrapped in
//! [`GatewayIbcTransferMsg`], as its memo.

use serde::{Deserialize, Serialize};

use crate::{Chain, Error};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct GatewayTransfer {
    /// Base64 of the recipient: the bech32 string's bytes for a Cosmos recipient, the universal
    /// address otherwise.
    pub recipient: String,
    pub chain: u16,
    pub nonce: u32,
    /// Relayer fee as a decimal string.
    pub fee: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct GatewayTransferWithPayload {
    /// Base64 of the receiving contract.
    pub contract: String,
    pub chain: u16,
    /// Base64 of the payload delivered to `contract`.
    pub payload: String,
    pub nonce: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GatewayIbcTokenBridgePayload {
    GatewayTransfer(GatewayTransfer),
    GatewayTransferWithPayload(GatewayTransferWithPayload),
}

impl GatewayIbcTokenBridgePayload {
    /// A plain transfer to `recipient` on `chain`, with no relayer fee.
    pub fn transfer(recipient: &[u8], chain: Chain, nonce: u32) -> Self {
        GatewayIbcTokenBridgePayload::GatewayTransfer(GatewayTransfer {
            recipient: base64::encode(recipient),
            chain: chain.into(),
            nonce,
            fee: "0".into(),
        })
    }

    pub fn chain(&self) -> Chain {
        match self {
            GatewayIbcTokenBridgePayload::GatewayTransfer(t) => t.chain.into(),
            GatewayIbcTokenBridgePayload::GatewayTransferWithPayload(t) => t.chain.into(),
        }
    }

    pub fn nonce(&self) -> u32 {
        match self {
            GatewayIbcTokenBridgePayload::GatewayTransfer(t) => t.nonce,
            GatewayIbcTokenBridgePayload::GatewayTransferWithPayload(t) => t.nonce,
        }
    }

    /// The decoded recipient, or receiving contract.
    pub fn recipient(&self) -> Result<Vec<u8>, Error> {
        let encoded = match self {
            GatewayIbcTokenBridgePayload::GatewayTransfer(t) => &t.recipient,
            GatewayIbcTokenBridgePayload::GatewayTransferWithPayload(t) => &t.contract,
        };

        Ok(base64::decode(encoded)?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(buf: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(buf)?)
    }

    /// Base64 of the JSON encoding. The translator contract emits this as the `transfer_payload`
    /// attribute, so it is the key for finding the transaction that carried the message.
    pub fn encoded(&self) -> Result<String, Error> {
        self.to_json().map(base64::encode)
    }
}

/// The memo of an ICS-20 transfer routed through the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GatewayIbcTransferMsg {
    pub gateway_ibc_token_bridge_payload: GatewayIbcTokenBridgePayload,
}

impl GatewayIbcTransferMsg {
    pub fn new(payload: GatewayIbcTokenBridgePayload) -> Self {
        GatewayIbcTransferMsg {
            gateway_ibc_token_bridge_payload: payload,
        }
    }

    pub fn memo(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_memo(memo: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(memo)?)
    }
}
