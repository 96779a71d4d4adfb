//! ICS-20 transfers through the IBC gateway.
//!
//! Cosmos chains reach Wormhole through the gateway chain. An outbound transfer is an ICS-20
//! transfer to the gateway contract whose memo says where the tokens go next. An inbound transfer
//! arrives as an ICS-20 packet sent by the gateway. Every packet is identified by its channels,
//! ports and sequence, which is what [`IbcMessageId`] captures.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use wormhole_connect_base::{
    registry::GATEWAY, Chain, ChainAddress, IbcChannel, NativeAddress, Network, Platform, Registry,
    UniversalAddress,
};
use wormhole_connect_vaas::{
    gateway::{GatewayIbcTokenBridgePayload, GatewayIbcTransferMsg},
    WormholeMessageId,
};

use crate::{lookup::Lookup, Error, TokenAddress, TxHash, UnsignedTransaction};

pub const IBC_TRANSFER_PORT: &str = "transfer";
pub const IBC_PACKET_SEND: &str = "send_packet";
pub const IBC_PACKET_RECEIVE: &str = "recv_packet";

const PACKET_SRC_CHANNEL: &str = "packet_src_channel";
const PACKET_DST_CHANNEL: &str = "packet_dst_channel";
const PACKET_SRC_PORT: &str = "packet_src_port";
const PACKET_DST_PORT: &str = "packet_dst_port";
const PACKET_SEQUENCE: &str = "packet_sequence";
const PACKET_DATA: &str = "packet_data";

/// Indexed attribute the translator contract sets to the base64 of the gateway payload it
/// forwarded.
pub const TRANSFER_PAYLOAD_KEY: &str = "wasm.transfer_payload";

// Attributes of the core contract's wasm event for a published message.
const MESSAGE_SENDER: &str = "message.sender";
const MESSAGE_CHAIN_ID: &str = "message.chain_id";
const MESSAGE_SEQUENCE: &str = "message.sequence";

/// Identifies an IBC packet. `chain` is the chain that sent it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct IbcMessageId {
    pub chain: Chain,
    pub src_channel: String,
    pub dst_channel: String,
    pub src_port: String,
    pub dst_port: String,
    pub sequence: u64,
}

/// Whether the sending chain still holds a commitment for a packet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketCommitment {
    /// The packet is in flight.
    Present,
    /// The packet was delivered, or this chain received it.
    Absent,
    /// The commitment query failed.
    Indeterminate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IbcTransferInfo {
    pub id: IbcMessageId,
    /// The packet data, for a transfer an ICS-20 [`FungibleTokenPacketData`].
    pub data: serde_json::Value,
    /// True only while a commitment is known to exist. A failed query reports false; check
    /// `commitment` to tell the two apart.
    pub pending: bool,
    pub commitment: PacketCommitment,
}

impl IbcTransferInfo {
    pub fn packet_data(&self) -> Result<FungibleTokenPacketData, Error> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| wormhole_connect_vaas::Error::from(e).into())
    }
}

/// The ICS-20 packet payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FungibleTokenPacketData {
    pub denom: String,
    /// Decimal string.
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub memo: String,
}

impl FungibleTokenPacketData {
    pub fn amount(&self) -> Result<u128, Error> {
        self.amount
            .parse()
            .map_err(|e| Error::Rpc(anyhow::anyhow!("invalid packet amount {:?}: {e}", self.amount)))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl TxEvent {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// A transaction as returned by a Cosmos indexer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IndexedTx {
    pub hash: TxHash,
    pub height: u64,
    /// Zero on success.
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    pub events: Vec<TxEvent>,
}

/// The keys a transfer can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IbcLookup {
    Tx(TxHash),
    Message(GatewayIbcTokenBridgePayload),
    Id(IbcMessageId),
}

/// IBC transfers through the gateway, on a Cosmos chain or on the gateway itself.
///
/// Adapters provide the chain queries; the lookups are built on top of them.
pub trait IbcBridge: Send + Sync {
    fn network(&self) -> Network;

    fn chain(&self) -> Chain;

    /// An ICS-20 transfer to the gateway whose memo is [`gateway_memo`] for `recipient`.
    fn transfer(
        &self,
        sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        nonce: u32,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    fn get_tx(&self, txid: &str) -> Result<Option<IndexedTx>, Error>;

    /// Transactions whose indexed events match every `(key, value)` pair.
    fn search_tx(&self, query: &[(String, String)]) -> Result<Vec<IndexedTx>, Error>;

    /// The commitment for a packet this chain sent, `None` once it is cleared.
    fn packet_commitment(
        &self,
        port: &str,
        channel: &str,
        sequence: u64,
    ) -> Result<Option<Vec<u8>>, Error>;

    /// Smart query against the gateway contract. Only meaningful on the gateway chain.
    fn query_gateway(&self, msg: &serde_json::Value) -> Result<serde_json::Value, Error>;

    /// The channel at the other end of `channel`.
    fn counterparty_channel(&self, port: &str, channel: &str) -> Result<Option<String>, Error>;

    fn lookup_transfer_from_tx(&self, txid: &str) -> Result<IbcTransferInfo, Error> {
        let tx = self
            .get_tx(txid)?
            .ok_or_else(|| Error::NotFound(format!("transaction {txid} on {}", self.chain())))?;
        if tx.code != 0 {
            return Err(Error::TransferFailed {
                txid: tx.hash,
                reason: tx.raw_log,
            });
        }

        let xfers = fetch_transfer_info(self, &tx)?;
        Ok(Lookup::from_matches(format!("ibc transfers in {txid}"), xfers)?.into_first())
    }

    /// Find the transfer that carried `msg` out of this chain.
    ///
    /// On the gateway the same transaction may also hold the packet that brought the tokens in,
    /// so only packets sent from here are considered.
    fn lookup_transfer_from_msg(
        &self,
        msg: &GatewayIbcTokenBridgePayload,
    ) -> Result<IbcTransferInfo, Error> {
        let encoded = msg.encoded()?;
        let txs = self.search_tx(&[(TRANSFER_PAYLOAD_KEY.to_string(), encoded.clone())])?;
        let tx = Lookup::from_matches(format!("transactions for payload {encoded}"), txs)?.into_first();

        let chain = self.chain();
        let sent = fetch_transfer_info(self, &tx)?
            .into_iter()
            .filter(|x| x.id.chain == chain)
            .collect();
        Ok(Lookup::from_matches(format!("ibc transfers sent by {chain} in {}", tx.hash), sent)?
            .into_first())
    }

    fn lookup_transfer_from_ibc_msg_id(&self, id: &IbcMessageId) -> Result<IbcTransferInfo, Error> {
        let tx = lookup_tx_from_ibc_msg_id(self, id)?;
        let xfers = fetch_transfer_info(self, &tx)?
            .into_iter()
            .filter(|x| {
                x.id.sequence == id.sequence
                    && x.id.src_channel == id.src_channel
                    && x.id.dst_channel == id.dst_channel
            })
            .collect();

        Ok(Lookup::from_matches(format!("ibc transfers in {}", tx.hash), xfers)?.into_first())
    }

    /// The Wormhole message the gateway published when it received packet `id`.
    fn lookup_message_from_ibc_msg_id(&self, id: &IbcMessageId) -> Result<WormholeMessageId, Error> {
        let tx = lookup_tx_from_ibc_msg_id(self, id)?;
        parse_wormhole_message(&tx)
    }

    /// The channel pair between the gateway and `chain`, as the gateway contract reports it.
    fn fetch_channel(&self, chain: Chain) -> Result<Option<IbcChannel>, Error> {
        if self.chain() != GATEWAY {
            return Err(Error::Unsupported(format!(
                "gateway channel queries on {}",
                self.chain()
            )));
        }

        let resp = self.query_gateway(&json!({ "ibc_channel": { "chain_id": u16::from(chain) } }))?;
        let src_channel = match resp.get("channel").and_then(|c| c.as_str()) {
            Some(c) => c.to_string(),
            None => return Ok(None),
        };

        Ok(self
            .counterparty_channel(IBC_TRANSFER_PORT, &src_channel)?
            .map(|dst_channel| IbcChannel {
                src_channel,
                dst_channel,
            }))
    }
}

/// Look up a transfer by any of its keys.
///
/// A transfer that can't be found, or a lookup that fails for a transient reason, is `None` so
/// that pollers keep going. Anything else is an error.
pub fn fetch_ibc_transfer(
    bridge: &dyn IbcBridge,
    key: &IbcLookup,
) -> Result<Option<IbcTransferInfo>, Error> {
    let res = match key {
        IbcLookup::Tx(txid) => bridge.lookup_transfer_from_tx(txid),
        IbcLookup::Message(msg) => bridge.lookup_transfer_from_msg(msg),
        IbcLookup::Id(id) => bridge.lookup_transfer_from_ibc_msg_id(id),
    };

    match res {
        Ok(info) => Ok(Some(info)),
        Err(e) if e.is_transient() || matches!(e, Error::NotFound(_)) => {
            warn!(chain = %bridge.chain(), ?key, error = %e, "ibc transfer lookup failed");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// The gateway's representation of a recipient: the bech32 string for a Cosmos account, the
/// universal address for anything else.
pub fn gateway_recipient(recipient: &ChainAddress) -> Vec<u8> {
    match &recipient.address {
        a @ NativeAddress::Cosmwasm(_) => a.to_string().into_bytes(),
        a => a.to_universal().0.to_vec(),
    }
}

/// The inverse of [`gateway_recipient`].
pub fn recipient_from_gateway(chain: Chain, recipient: &[u8]) -> Result<ChainAddress, Error> {
    if Registry::global()?.platform(chain)? == Platform::Cosmwasm {
        let s = std::str::from_utf8(recipient)
            .map_err(|e| Error::InvalidAddress(format!("gateway recipient on {chain}: {e}")))?;
        return Ok(ChainAddress::parse(chain, s)?);
    }

    let universal = UniversalAddress::left_pad(recipient)?;
    Ok(ChainAddress::from_universal(chain, &universal)?)
}

/// The routing instructions for sending tokens to `recipient` through the gateway.
pub fn gateway_payload(recipient: &ChainAddress, nonce: u32) -> GatewayIbcTokenBridgePayload {
    GatewayIbcTokenBridgePayload::transfer(&gateway_recipient(recipient), recipient.chain, nonce)
}

/// The memo of an ICS-20 transfer to the gateway bound for `recipient`.
pub fn gateway_memo(recipient: &ChainAddress, nonce: u32) -> Result<String, Error> {
    Ok(GatewayIbcTransferMsg::new(gateway_payload(recipient, nonce)).memo()?)
}

/// The IBC packets sent or received in `tx`, with the chain that sent each one.
///
/// A packet received by the gateway is attributed through the gateway's end of its channel. A
/// packet received anywhere else came from the gateway.
pub fn parse_ibc_packets(
    network: Network,
    chain: Chain,
    tx: &IndexedTx,
) -> Result<Vec<(IbcMessageId, serde_json::Value)>, Error> {
    let packets: Vec<_> = tx
        .events
        .iter()
        .filter(|ev| ev.kind == IBC_PACKET_SEND || ev.kind == IBC_PACKET_RECEIVE)
        .collect();
    if packets.is_empty() {
        return Err(Error::NotFound(format!(
            "ibc packets on {chain} in {}",
            tx.hash
        )));
    }

    let mut out = Vec::with_capacity(packets.len());
    for ev in packets {
        let attr = |key| packet_attribute(ev, key, &tx.hash);

        let src_channel = attr(PACKET_SRC_CHANNEL)?.to_string();
        let dst_channel = attr(PACKET_DST_CHANNEL)?.to_string();
        let sequence = attr(PACKET_SEQUENCE)?;
        let sequence = sequence.parse().map_err(|e| {
            Error::Rpc(anyhow::anyhow!("invalid packet sequence {sequence:?}: {e}"))
        })?;
        let data: serde_json::Value = serde_json::from_str(attr(PACKET_DATA)?)
            .map_err(wormhole_connect_vaas::Error::from)?;

        let sender = if ev.kind == IBC_PACKET_SEND {
            chain
        } else if chain == GATEWAY {
            Registry::global()?.chain_by_gateway_channel(network, &dst_channel)?
        } else {
            GATEWAY
        };

        out.push((
            IbcMessageId {
                chain: sender,
                src_channel,
                dst_channel,
                src_port: attr(PACKET_SRC_PORT)?.to_string(),
                dst_port: attr(PACKET_DST_PORT)?.to_string(),
                sequence,
            },
            data,
        ));
    }

    Ok(out)
}

fn packet_attribute<'a>(ev: &'a TxEvent, key: &str, hash: &str) -> Result<&'a str, Error> {
    ev.attribute(key)
        .ok_or_else(|| Error::NotFound(format!("{key} in {} event of {hash}", ev.kind)))
}

/// The message the core contract published in `tx`.
pub fn parse_wormhole_message(tx: &IndexedTx) -> Result<WormholeMessageId, Error> {
    let mut ids = Vec::new();
    for ev in tx.events.iter().filter(|ev| ev.kind == "wasm") {
        let (Some(sender), Some(chain), Some(sequence)) = (
            ev.attribute(MESSAGE_SENDER),
            ev.attribute(MESSAGE_CHAIN_ID),
            ev.attribute(MESSAGE_SEQUENCE),
        ) else {
            continue;
        };

        let emitter: UniversalAddress = sender
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("message emitter {sender:?}: {e}")))?;
        let chain: u16 = chain
            .parse()
            .map_err(|e| Error::Rpc(anyhow::anyhow!("invalid message chain {chain:?}: {e}")))?;
        let sequence = sequence
            .parse()
            .map_err(|e| Error::Rpc(anyhow::anyhow!("invalid message sequence {sequence:?}: {e}")))?;

        ids.push(WormholeMessageId {
            chain: chain.into(),
            emitter,
            sequence,
        });
    }

    Ok(Lookup::from_matches(format!("wormhole messages in {}", tx.hash), ids)?.into_first())
}

fn lookup_tx_from_ibc_msg_id<B: IbcBridge + ?Sized>(
    bridge: &B,
    id: &IbcMessageId,
) -> Result<IndexedTx, Error> {
    let prefix = if bridge.chain() == id.chain {
        IBC_PACKET_SEND
    } else {
        IBC_PACKET_RECEIVE
    };

    let query: Vec<(String, String)> = [
        (PACKET_DST_CHANNEL, id.dst_channel.clone()),
        (PACKET_SRC_CHANNEL, id.src_channel.clone()),
        (PACKET_SRC_PORT, id.src_port.clone()),
        (PACKET_DST_PORT, id.dst_port.clone()),
        (PACKET_SEQUENCE, id.sequence.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (format!("{prefix}.{k}"), v))
    .collect();

    let txs = bridge.search_tx(&query)?;
    Ok(Lookup::from_matches(format!("transactions for packet {id:?}"), txs)?.into_first())
}

// Parse the packets of `tx` and check whether each one is still in flight.
fn fetch_transfer_info<B: IbcBridge + ?Sized>(
    bridge: &B,
    tx: &IndexedTx,
) -> Result<Vec<IbcTransferInfo>, Error> {
    let chain = bridge.chain();
    let packets = parse_ibc_packets(bridge.network(), chain, tx)?;

    let mut xfers = Vec::with_capacity(packets.len());
    for (id, data) in packets {
        let commitment = if id.chain != chain {
            PacketCommitment::Absent
        } else {
            match bridge.packet_commitment(&id.src_port, &id.src_channel, id.sequence) {
                Ok(Some(_)) => PacketCommitment::Present,
                Ok(None) => PacketCommitment::Absent,
                Err(e) => {
                    warn!(%chain, ?id, error = %e, "packet commitment query failed, reporting the packet as not pending");
                    PacketCommitment::Indeterminate
                }
            }
        };

        xfers.push(IbcTransferInfo {
            id,
            data,
            pending: commitment == PacketCommitment::Present,
            commitment,
        });
    }

    Ok(xfers)
}
