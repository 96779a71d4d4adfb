//! Shared fixtures for the lifecycle tests.
//!
//! [`Ledger`] stands in for every chain a test touches. The mock adapters build transactions as
//! JSON instructions for it and [`MockSigner`] executes them, recording the logs the adapters
//! later parse. Guardians, Circle's attestation service, the gateway and the Cosmos relayers only
//! act when a test tells the ledger to, so tests control when attestations become available.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::{json, Value};
use wormhole_connect::{
    api::{CircleAttestationProvider, VaaProvider},
    base::{Chain, ChainAddress, NativeAddress, Network, Platform, Registry, UniversalAddress},
    protocols::{
        circle::pair_burn_and_message,
        ibc::{gateway_memo, EventAttribute, IBC_PACKET_RECEIVE, IBC_PACKET_SEND, IBC_TRANSFER_PORT},
        token_bridge::parse_published_messages,
        AutomaticTokenBridge, CircleBridge, CircleTransferTransaction, DepositForBurn, IbcBridge,
        IndexedTx, PublishedMessage, TokenBridge, TokenTransferTransaction, TxEvent,
    },
    vaas::{
        circle::{BurnMessage, CircleAttestation, CircleMessage, MessageHeader},
        gateway::{GatewayIbcTokenBridgePayload, GatewayIbcTransferMsg},
        relayer::{RelayerMessage, TransferWithRelay},
        token::{Message, Transfer, TransferWithPayload},
        Amount, Payload, Vaa, VaaPayload, WormholeMessageId,
    },
    ChainConfig, Contracts, Error, Signer, TokenAddress, TokenId, TransactionId, TxHash,
    UnsignedTransaction, Wormhole, WormholeConfig,
};

pub const POLYGON_RELAYER: &str = "0xcafd2f0a35a4459fa40c0517e17e6fa2939441ca";
pub const TRANSLATOR: &str = "wormhole14kk6mtdd4kk6mtdd4kk6mtdd4kk6mtdd4kk6mtdd4kk6mtdd4kksh2pkhv";
pub const OSMO_SENDER: &str = "osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5helwsw";
pub const OSMO_RECIPIENT: &str = "osmo1yg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zxmp5v2";
pub const GATEWAY_EMITTER: UniversalAddress = UniversalAddress([0xaa; 32]);
pub const RELAYER_FEE: u128 = 500;

const WRAPPED_NATIVE: [u8; 20] = [0xee; 20];
const GATEWAY_TOKEN: UniversalAddress = UniversalAddress([0x0a; 32]);
const REMOTE_TOKEN_MESSENGER: UniversalAddress = UniversalAddress([0x1b; 32]);

pub fn evm(chain: Chain, byte: u8) -> ChainAddress {
    ChainAddress::new(chain, NativeAddress::Evm([byte; 20]))
}

pub fn eth_sender() -> ChainAddress {
    evm(Chain::Ethereum, 0x5e)
}

pub fn usdc() -> NativeAddress {
    NativeAddress::Evm([0xa0; 20])
}

pub fn usdc_token() -> TokenId {
    TokenId::new(Chain::Ethereum, usdc().to_universal())
}

pub fn osmo_sender() -> ChainAddress {
    ChainAddress::parse(Chain::Osmosis, OSMO_SENDER).unwrap()
}

pub fn osmo_recipient() -> ChainAddress {
    ChainAddress::parse(Chain::Osmosis, OSMO_RECIPIENT).unwrap()
}

pub fn token_bridge_emitter(chain: Chain) -> UniversalAddress {
    NativeAddress::Evm([u16::from(chain) as u8; 20]).to_universal()
}

pub fn vaa(chain: Chain, emitter: UniversalAddress, sequence: u64, payload: Payload) -> Vaa<Payload> {
    Vaa {
        version: 1,
        guardian_set_index: 0,
        signatures: Vec::new(),
        timestamp: 1_700_000_000,
        nonce: 0,
        emitter_chain: chain,
        emitter_address: emitter,
        sequence,
        consistency_level: 1,
        payload,
    }
}

fn field<'a>(t: &'a Value, key: &str) -> &'a str {
    t[key]
        .as_str()
        .unwrap_or_else(|| panic!("missing {key} in {t}"))
}

fn universal(t: &Value, key: &str) -> UniversalAddress {
    field(t, key).parse().unwrap()
}

fn amount(t: &Value, key: &str) -> u128 {
    field(t, key).parse().unwrap()
}

fn chain(t: &Value, key: &str) -> Chain {
    Chain::from(t[key].as_u64().unwrap() as u16)
}

fn event(kind: &str, attrs: &[(&str, String)]) -> TxEvent {
    TxEvent {
        kind: kind.into(),
        attributes: attrs
            .iter()
            .map(|(key, value)| EventAttribute {
                key: key.to_string(),
                value: value.clone(),
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct Ledger {
    network: Network,
    next_tx: u64,
    next_sequence: u64,
    pub executed: Vec<(TxHash, UnsignedTransaction)>,
    allowances: HashMap<(Chain, UniversalAddress), u128>,
    receipts: HashMap<TxHash, (ChainAddress, Vec<PublishedMessage>)>,
    unsigned_vaas: Vec<Vaa<Payload>>,
    vaas: HashMap<WormholeMessageId, Vec<u8>>,
    redeemed: HashSet<[u8; 32]>,
    burns: HashMap<TxHash, (ChainAddress, DepositForBurn, CircleMessage)>,
    unattested: Vec<CircleMessage>,
    attestations: HashMap<[u8; 32], CircleAttestation>,
    minted: HashSet<[u8; 32]>,
    ibc_txs: Vec<(Chain, IndexedTx)>,
    commitments: HashSet<(Chain, String, u64)>,
    in_flight: Vec<(Chain, TxEvent, Value)>,
    // Packets the gateway sent, with their destination.
    outbound: Vec<(Chain, TxEvent)>,
}

pub type Shared = Arc<Mutex<Ledger>>;

impl Ledger {
    fn tx_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        format!("0x{:064x}", self.next_tx)
    }

    fn sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    pub fn allowance(&self, chain: Chain, token: &UniversalAddress) -> u128 {
        self.allowances.get(&(chain, *token)).copied().unwrap_or(0)
    }

    pub fn approve(&mut self, chain: Chain, token: UniversalAddress, amount: u128) {
        let _ = self.allowances.insert((chain, token), amount);
    }

    /// Executed transactions whose description is `description`.
    pub fn count(&self, description: &str) -> usize {
        self.executed
            .iter()
            .filter(|(_, tx)| tx.description == description)
            .count()
    }

    pub fn last_instruction(&self) -> Value {
        self.executed.last().unwrap().1.transaction.clone()
    }

    /// The guardians sign every message published so far.
    pub fn sign_vaas(&mut self) {
        for vaa in std::mem::take(&mut self.unsigned_vaas) {
            let _ = self.vaas.insert(vaa.message_id(), vaa.to_bytes().unwrap());
        }
    }

    /// Circle attests every burn so far.
    pub fn attest_burns(&mut self) {
        for message in std::mem::take(&mut self.unattested) {
            let _ = self
                .attestations
                .insert(message.hash(), CircleAttestation(vec![0xa5; 65]));
        }
    }

    /// A relayer redeems `vaa` on its destination.
    pub fn relay(&mut self, vaa: &Vaa<Payload>) {
        let _ = self.redeemed.insert(vaa.digest().unwrap().secp256k_hash);
    }

    /// The gateway receives every packet sent to it. Transfers bound for a Cosmos chain go on over
    /// IBC, everything else over the token bridge.
    pub fn relay_packets(&mut self) {
        for (src_chain, sent, data) in std::mem::take(&mut self.in_flight) {
            let channel = sent.attribute("packet_src_channel").unwrap().to_string();
            let sequence: u64 = sent.attribute("packet_sequence").unwrap().parse().unwrap();
            let _ = self.commitments.remove(&(src_chain, channel, sequence));

            let msg = GatewayIbcTransferMsg::from_memo(field(&data, "memo"))
                .unwrap()
                .gateway_ibc_token_bridge_payload;
            let mut received = sent.clone();
            received.kind = IBC_PACKET_RECEIVE.into();

            if Registry::global().unwrap().platform(msg.chain()).unwrap() == Platform::Cosmwasm {
                self.forward_over_ibc(&msg, amount(&data, "amount"), vec![received]);
                continue;
            }

            let wh_sequence = self.sequence();
            let payload = Payload::Transfer(Transfer {
                amount: amount(&data, "amount").into(),
                token_address: GATEWAY_TOKEN,
                token_chain: Chain::Wormchain,
                recipient: UniversalAddress::left_pad(&msg.recipient().unwrap()).unwrap(),
                recipient_chain: msg.chain(),
                fee: Amount::default(),
            });
            self.unsigned_vaas
                .push(vaa(Chain::Wormchain, GATEWAY_EMITTER, wh_sequence, payload));

            let published = event(
                "wasm",
                &[
                    ("message.sender", hex::encode(GATEWAY_EMITTER.0)),
                    ("message.chain_id", u16::from(Chain::Wormchain).to_string()),
                    ("message.sequence", wh_sequence.to_string()),
                ],
            );

            let hash = self.tx_hash();
            self.ibc_txs.push((
                Chain::Wormchain,
                IndexedTx {
                    hash,
                    height: self.next_tx,
                    code: 0,
                    raw_log: String::new(),
                    events: vec![received, published],
                },
            ));
        }
    }

    /// The translator redeems every signed transfer addressed to it and forwards the tokens over
    /// IBC.
    pub fn translate_vaas(&mut self) {
        let signed: Vec<Vaa<Payload>> = self
            .vaas
            .values()
            .map(|bytes| Vaa::<Payload>::from_bytes(bytes).unwrap())
            .collect();

        for vaa in signed {
            let Payload::GatewayTransfer { transfer, message } = &vaa.payload else {
                continue;
            };
            if transfer.recipient_chain != Chain::Wormchain
                || !self.redeemed.insert(vaa.digest().unwrap().secp256k_hash)
            {
                continue;
            }

            self.forward_over_ibc(message, u128::try_from(transfer.amount).unwrap(), Vec::new());
        }
    }

    /// Every packet the gateway sent arrives, clearing its commitment.
    pub fn deliver_packets(&mut self) {
        for (to, sent) in std::mem::take(&mut self.outbound) {
            let channel = sent.attribute("packet_src_channel").unwrap().to_string();
            let sequence: u64 = sent.attribute("packet_sequence").unwrap().parse().unwrap();
            let _ = self.commitments.remove(&(Chain::Wormchain, channel, sequence));

            let mut received = sent;
            received.kind = IBC_PACKET_RECEIVE.into();
            let hash = self.tx_hash();
            self.ibc_txs.push((
                to,
                IndexedTx {
                    hash,
                    height: self.next_tx,
                    code: 0,
                    raw_log: String::new(),
                    events: vec![received],
                },
            ));
        }
    }

    // A gateway transaction that sends `amount` on to the recipient of `msg`, after `events`.
    fn forward_over_ibc(
        &mut self,
        msg: &GatewayIbcTokenBridgePayload,
        amount: u128,
        mut events: Vec<TxEvent>,
    ) {
        let channel = Registry::global()
            .unwrap()
            .ibc_channel(self.network, msg.chain())
            .unwrap()
            .clone();
        let sequence = self.sequence();
        let data = json!({
            "denom": format!("{IBC_TRANSFER_PORT}/{}/{}", channel.src_channel, GATEWAY_TOKEN),
            "amount": amount.to_string(),
            "sender": TRANSLATOR,
            "receiver": String::from_utf8(msg.recipient().unwrap()).unwrap(),
            "memo": "",
        });
        let sent = event(
            IBC_PACKET_SEND,
            &[
                ("packet_src_channel", channel.src_channel.clone()),
                ("packet_dst_channel", channel.dst_channel.clone()),
                ("packet_src_port", IBC_TRANSFER_PORT.to_string()),
                ("packet_dst_port", IBC_TRANSFER_PORT.to_string()),
                ("packet_sequence", sequence.to_string()),
                ("packet_data", data.to_string()),
            ],
        );

        let _ = self
            .commitments
            .insert((Chain::Wormchain, channel.src_channel, sequence));
        self.outbound.push((msg.chain(), sent.clone()));
        events.push(sent);
        events.push(event("wasm", &[("transfer_payload", msg.encoded().unwrap())]));

        let hash = self.tx_hash();
        self.ibc_txs.push((
            Chain::Wormchain,
            IndexedTx {
                hash,
                height: self.next_tx,
                code: 0,
                raw_log: String::new(),
                events,
            },
        ));
    }

    fn spend(&mut self, chain: Chain, token: UniversalAddress, amount: u128, hash: &str) -> Result<(), Error> {
        let allowance = self.allowances.entry((chain, token)).or_default();
        if *allowance < amount {
            return Err(Error::TransferFailed {
                txid: hash.into(),
                reason: "insufficient allowance".into(),
            });
        }

        *allowance -= amount;
        Ok(())
    }

    pub fn execute(&mut self, tx: &UnsignedTransaction, from: &ChainAddress) -> Result<TxHash, Error> {
        let hash = self.tx_hash();
        let t = &tx.transaction;
        let mut published = Vec::new();

        match field(t, "kind") {
            "approve" => self.approve(tx.chain, universal(t, "token"), amount(t, "amount")),
            "transfer" => {
                let token = universal(t, "token");
                let value = amount(t, "amount");
                if t["needs_allowance"].as_bool() == Some(true) {
                    self.spend(tx.chain, token, value, &hash)?;
                }

                let msg = match t["payload"].as_str() {
                    None => Message::Transfer(Transfer {
                        amount: value.into(),
                        token_address: token,
                        token_chain: chain(t, "token_chain"),
                        recipient: universal(t, "recipient"),
                        recipient_chain: chain(t, "recipient_chain"),
                        fee: Amount::default(),
                    }),
                    Some(p) => Message::TransferWithPayload(TransferWithPayload {
                        amount: value.into(),
                        token_address: token,
                        token_chain: chain(t, "token_chain"),
                        recipient: universal(t, "recipient"),
                        recipient_chain: chain(t, "recipient_chain"),
                        sender_address: from.to_universal(),
                        payload: hex::decode(p).unwrap(),
                    }),
                };

                let emitter = universal(t, "emitter");
                let sequence = self.sequence();
                published.push(PublishedMessage {
                    emitter,
                    sequence,
                    nonce: 0,
                    payload: msg.to_payload_bytes().unwrap(),
                });
                self.unsigned_vaas
                    .push(vaa(tx.chain, emitter, sequence, Payload::from(msg)));
            }
            "redeem" => {
                let vaa = Vaa::<Payload>::from_bytes(&hex::decode(field(t, "vaa")).unwrap()).unwrap();
                let (recipient_chain, _) = vaa.payload.recipient().unwrap();
                if recipient_chain != tx.chain {
                    return Err(Error::TransferFailed {
                        txid: hash,
                        reason: format!("vaa for {recipient_chain} redeemed on {}", tx.chain),
                    });
                }
                if !self.redeemed.insert(vaa.digest().unwrap().secp256k_hash) {
                    return Err(Error::TransferFailed {
                        txid: hash,
                        reason: "transfer already completed".into(),
                    });
                }
            }
            "burn" => {
                let token = universal(t, "token");
                let value = amount(t, "amount");
                self.spend(tx.chain, token, value, &hash)?;

                let header = MessageHeader {
                    version: 0,
                    source_domain: t["source_domain"].as_u64().unwrap() as u32,
                    destination_domain: t["destination_domain"].as_u64().unwrap() as u32,
                    nonce: self.sequence(),
                    sender: token_bridge_emitter(tx.chain),
                    recipient: REMOTE_TOKEN_MESSENGER,
                    destination_caller: UniversalAddress::ZERO,
                };
                let burn = BurnMessage {
                    version: 0,
                    burn_token: token,
                    mint_recipient: universal(t, "mint_recipient"),
                    amount: value.into(),
                    message_sender: from.to_universal(),
                };
                let message = CircleMessage::encode(&header, &burn).unwrap();
                let deposit = DepositForBurn {
                    burn_token: token,
                    amount: value,
                    mint_recipient: burn.mint_recipient,
                    destination_domain: header.destination_domain,
                    destination_token_messenger: REMOTE_TOKEN_MESSENGER,
                    destination_caller: UniversalAddress::ZERO,
                };

                self.unattested.push(message.clone());
                let _ = self.burns.insert(hash.clone(), (from.clone(), deposit, message));
            }
            "mint" => {
                let message = CircleMessage(hex::decode(field(t, "message")).unwrap());
                if !self.minted.insert(message.hash()) {
                    return Err(Error::TransferFailed {
                        txid: hash,
                        reason: "nonce already used".into(),
                    });
                }
            }
            "ibc_transfer" => {
                let sequence = self.sequence();
                let data = json!({
                    "denom": t["denom"],
                    "amount": t["amount"],
                    "sender": t["sender"],
                    "receiver": t["receiver"],
                    "memo": t["memo"],
                });
                let sent = event(
                    IBC_PACKET_SEND,
                    &[
                        ("packet_src_channel", field(t, "channel").to_string()),
                        ("packet_dst_channel", field(t, "counterparty").to_string()),
                        ("packet_src_port", IBC_TRANSFER_PORT.to_string()),
                        ("packet_dst_port", IBC_TRANSFER_PORT.to_string()),
                        ("packet_sequence", sequence.to_string()),
                        ("packet_data", data.to_string()),
                    ],
                );

                let _ = self
                    .commitments
                    .insert((tx.chain, field(t, "channel").to_string(), sequence));
                self.in_flight.push((tx.chain, sent.clone(), data));
                self.ibc_txs.push((
                    tx.chain,
                    IndexedTx {
                        hash: hash.clone(),
                        height: self.next_tx,
                        code: 0,
                        raw_log: String::new(),
                        events: vec![sent],
                    },
                ));
            }
            other => panic!("unknown instruction {other}"),
        }

        let _ = self.receipts.insert(hash.clone(), (from.clone(), published));
        self.executed.push((hash.clone(), tx.clone()));
        Ok(hash)
    }
}

pub struct MockSigner {
    pub address: ChainAddress,
    pub ledger: Shared,
}

impl Signer for MockSigner {
    fn chain(&self) -> Chain {
        self.address.chain
    }

    fn address(&self) -> NativeAddress {
        self.address.address.clone()
    }

    fn sign_and_send(&self, txs: &[UnsignedTransaction]) -> Result<Vec<TxHash>, Error> {
        let mut ledger = self.ledger.lock().unwrap();
        txs.iter().map(|tx| ledger.execute(tx, &self.address)).collect()
    }
}

pub struct MockVaas(pub Shared);

impl VaaProvider for MockVaas {
    fn get_vaa_bytes(&self, id: &WormholeMessageId) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.0.lock().unwrap().vaas.get(id).cloned())
    }
}

pub struct MockCircleApi(pub Shared);

impl CircleAttestationProvider for MockCircleApi {
    fn get_attestation(&self, message_hash: &[u8; 32]) -> Result<Option<CircleAttestation>, Error> {
        Ok(self.0.lock().unwrap().attestations.get(message_hash).cloned())
    }
}

// An approval when the allowance falls short, then the token bridge transfer.
#[allow(clippy::too_many_arguments)]
fn token_bridge_transfer(
    network: Network,
    chain: Chain,
    ledger: &Shared,
    recipient_chain: Chain,
    recipient: UniversalAddress,
    token: &TokenAddress,
    amount: u128,
    payload: Option<&[u8]>,
) -> Result<Vec<UnsignedTransaction>, Error> {
    let (token_chain, token_address, needs_allowance) = match token {
        TokenAddress::Native => (chain, NativeAddress::Evm(WRAPPED_NATIVE).to_universal(), false),
        TokenAddress::Token(id) => (id.chain, id.address, true),
        TokenAddress::Denom(d) => {
            return Err(Error::Unsupported(format!("bank denomination {d} on {chain}")))
        }
    };

    let mut txs = Vec::new();
    if needs_allowance && ledger.lock().unwrap().allowance(chain, &token_address) < amount {
        txs.push(UnsignedTransaction::new(
            network,
            chain,
            "ERC20.approve",
            json!({
                "kind": "approve",
                "token": hex::encode(token_address.0),
                "amount": amount.to_string(),
            }),
        ));
    }

    txs.push(UnsignedTransaction::new(
        network,
        chain,
        "TokenBridge.transferTokens",
        json!({
            "kind": "transfer",
            "emitter": hex::encode(token_bridge_emitter(chain).0),
            "token_chain": u16::from(token_chain),
            "token": hex::encode(token_address.0),
            "amount": amount.to_string(),
            "needs_allowance": needs_allowance,
            "recipient_chain": u16::from(recipient_chain),
            "recipient": hex::encode(recipient.0),
            "payload": payload.map(hex::encode),
        }),
    ));

    Ok(txs)
}

pub struct MockTokenBridge {
    pub network: Network,
    pub chain: Chain,
    pub ledger: Shared,
}

impl TokenBridge for MockTokenBridge {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn transfer(
        &self,
        _sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        payload: Option<&[u8]>,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        token_bridge_transfer(
            self.network,
            self.chain,
            &self.ledger,
            recipient.chain,
            recipient.to_universal(),
            token,
            amount,
            payload,
        )
    }

    fn redeem(
        &self,
        _sender: &NativeAddress,
        vaa: &Vaa<Payload>,
        _unwrap_native: bool,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        Ok(vec![UnsignedTransaction::new(
            self.network,
            self.chain,
            "TokenBridge.completeTransfer",
            json!({ "kind": "redeem", "vaa": hex::encode(vaa.to_bytes()?) }),
        )])
    }

    fn is_transfer_completed(&self, vaa: &Vaa<Payload>) -> Result<bool, Error> {
        let digest = vaa.digest()?;
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .redeemed
            .contains(&digest.secp256k_hash))
    }

    fn create_attestation(&self, token: &NativeAddress) -> Result<Vec<UnsignedTransaction>, Error> {
        Ok(vec![UnsignedTransaction::new(
            self.network,
            self.chain,
            "TokenBridge.attestToken",
            json!({ "kind": "attest", "token": token.to_string() }),
        )])
    }

    fn submit_attestation(&self, vaa: &Vaa<Payload>) -> Result<Vec<UnsignedTransaction>, Error> {
        Ok(vec![UnsignedTransaction::new(
            self.network,
            self.chain,
            "TokenBridge.createWrapped",
            json!({ "kind": "create_wrapped", "vaa": hex::encode(vaa.to_bytes()?) }),
        )])
    }

    fn is_wrapped_asset(&self, _token: &NativeAddress) -> Result<bool, Error> {
        Ok(false)
    }

    fn get_original_asset(&self, token: &NativeAddress) -> Result<TokenId, Error> {
        Err(Error::NotWrapped(TokenId::new(self.chain, token.to_universal())))
    }

    fn get_wrapped_asset(&self, token: &TokenId) -> Result<NativeAddress, Error> {
        Err(Error::NotWrapped(*token))
    }

    fn get_wrapped_native(&self) -> Result<NativeAddress, Error> {
        Ok(NativeAddress::Evm(WRAPPED_NATIVE))
    }

    fn parse_transaction_details(&self, txid: &str) -> Result<Vec<TokenTransferTransaction>, Error> {
        let ledger = self.ledger.lock().unwrap();
        let (from, messages) = ledger
            .receipts
            .get(txid)
            .ok_or_else(|| Error::NotFound(format!("transaction {txid}")))?;

        let tx = TransactionId {
            chain: self.chain,
            txid: txid.into(),
        };
        parse_published_messages(&tx, from, &token_bridge_emitter(self.chain), messages)
    }
}

pub struct MockAutomaticBridge {
    pub network: Network,
    pub chain: Chain,
    /// The relayer contract on the destination chain.
    pub relayer: UniversalAddress,
    pub ledger: Shared,
}

impl AutomaticTokenBridge for MockAutomaticBridge {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn transfer(
        &self,
        _sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        relayer_fee: u128,
        native_gas: Option<u128>,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        let payload = RelayerMessage::TransferWithRelay(TransferWithRelay {
            target_relayer_fee: relayer_fee.into(),
            to_native_token_amount: native_gas.unwrap_or(0).into(),
            target_recipient: recipient.to_universal(),
        })
        .to_bytes()?;

        token_bridge_transfer(
            self.network,
            self.chain,
            &self.ledger,
            recipient.chain,
            self.relayer,
            token,
            amount,
            Some(&payload),
        )
    }

    fn get_relayer_fee(
        &self,
        _sender: &ChainAddress,
        _recipient: &ChainAddress,
        _token: &TokenAddress,
    ) -> Result<u128, Error> {
        Ok(RELAYER_FEE)
    }
}

pub struct MockCircleBridge {
    pub network: Network,
    pub chain: Chain,
    pub ledger: Shared,
}

impl CircleBridge for MockCircleBridge {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn transfer(
        &self,
        token: &NativeAddress,
        _sender: &NativeAddress,
        recipient: &ChainAddress,
        amount: u128,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        let registry = Registry::global()?;
        let token = token.to_universal();

        let mut txs = Vec::new();
        if self.ledger.lock().unwrap().allowance(self.chain, &token) < amount {
            txs.push(UnsignedTransaction::new(
                self.network,
                self.chain,
                "ERC20.approve",
                json!({
                    "kind": "approve",
                    "token": hex::encode(token.0),
                    "amount": amount.to_string(),
                }),
            ));
        }

        txs.push(UnsignedTransaction::new(
            self.network,
            self.chain,
            "TokenMessenger.depositForBurn",
            json!({
                "kind": "burn",
                "token": hex::encode(token.0),
                "amount": amount.to_string(),
                "source_domain": registry.circle_domain(self.chain)?,
                "destination_domain": registry.circle_domain(recipient.chain)?,
                "mint_recipient": hex::encode(recipient.to_universal().0),
            }),
        ));

        Ok(txs)
    }

    fn redeem(
        &self,
        _sender: &NativeAddress,
        message: &CircleMessage,
        attestation: &CircleAttestation,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        Ok(vec![UnsignedTransaction::new(
            self.network,
            self.chain,
            "MessageTransmitter.receiveMessage",
            json!({
                "kind": "mint",
                "message": hex::encode(&message.0),
                "attestation": hex::encode(&attestation.0),
            }),
        )])
    }

    fn is_transfer_completed(&self, message: &CircleMessage) -> Result<bool, Error> {
        Ok(self.ledger.lock().unwrap().minted.contains(&message.hash()))
    }

    fn parse_transaction_details(&self, txid: &str) -> Result<CircleTransferTransaction, Error> {
        let ledger = self.ledger.lock().unwrap();
        let (from, burn, message) = ledger
            .burns
            .get(txid)
            .ok_or_else(|| Error::NotFound(format!("burn in {txid}")))?;

        let tx = TransactionId {
            chain: self.chain,
            txid: txid.into(),
        };
        pair_burn_and_message(&tx, from, vec![burn.clone()], vec![message.clone()])
    }
}

pub struct MockIbcBridge {
    pub network: Network,
    pub chain: Chain,
    pub ledger: Shared,
}

impl IbcBridge for MockIbcBridge {
    fn network(&self) -> Network {
        self.network
    }

    fn chain(&self) -> Chain {
        self.chain
    }

    fn transfer(
        &self,
        sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        nonce: u32,
    ) -> Result<Vec<UnsignedTransaction>, Error> {
        let TokenAddress::Denom(denom) = token else {
            return Err(Error::Unsupported(format!("{token:?} over ibc")));
        };
        let channel = Registry::global()?.ibc_channel(self.network, self.chain)?;

        Ok(vec![UnsignedTransaction::new(
            self.network,
            self.chain,
            "MsgTransfer",
            json!({
                "kind": "ibc_transfer",
                "denom": denom,
                "amount": amount.to_string(),
                "sender": sender.to_string(),
                "receiver": TRANSLATOR,
                "memo": gateway_memo(recipient, nonce)?,
                "channel": channel.dst_channel,
                "counterparty": channel.src_channel,
            }),
        )])
    }

    fn get_tx(&self, txid: &str) -> Result<Option<IndexedTx>, Error> {
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .ibc_txs
            .iter()
            .find(|(chain, tx)| *chain == self.chain && tx.hash == txid)
            .map(|(_, tx)| tx.clone()))
    }

    fn search_tx(&self, query: &[(String, String)]) -> Result<Vec<IndexedTx>, Error> {
        let matches = |tx: &IndexedTx| {
            query.iter().all(|(key, value)| {
                let (kind, attr) = key.split_once('.').unwrap_or(("", key.as_str()));
                tx.events
                    .iter()
                    .any(|ev| ev.kind == kind && ev.attribute(attr) == Some(value.as_str()))
            })
        };

        Ok(self
            .ledger
            .lock()
            .unwrap()
            .ibc_txs
            .iter()
            .filter(|(chain, tx)| *chain == self.chain && matches(tx))
            .map(|(_, tx)| tx.clone())
            .collect())
    }

    fn packet_commitment(
        &self,
        _port: &str,
        channel: &str,
        sequence: u64,
    ) -> Result<Option<Vec<u8>>, Error> {
        let present = self
            .ledger
            .lock()
            .unwrap()
            .commitments
            .contains(&(self.chain, channel.to_string(), sequence));

        Ok(present.then(|| vec![1]))
    }

    fn query_gateway(&self, _msg: &Value) -> Result<Value, Error> {
        Err(Error::Unsupported("gateway queries".into()))
    }

    fn counterparty_channel(&self, _port: &str, _channel: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }
}

/// A protocol context with mock adapters on every chain the tests use.
pub struct Env {
    pub ledger: Shared,
    pub wh: Wormhole,
}

impl Env {
    pub fn new(network: Network) -> Self {
        let ledger = Shared::new(Mutex::new(Ledger {
            network,
            ..Default::default()
        }));

        let config = WormholeConfig::new(network)
            .with_chain(
                Chain::Polygon,
                ChainConfig {
                    rpc: None,
                    contracts: Contracts {
                        token_bridge_relayer: Some(POLYGON_RELAYER.into()),
                        ..Default::default()
                    },
                },
            )
            .with_chain(
                Chain::Wormchain,
                ChainConfig {
                    rpc: None,
                    contracts: Contracts {
                        translator: Some(TRANSLATOR.into()),
                        ..Default::default()
                    },
                },
            );

        let mut wh = Wormhole::new(config, Arc::new(MockVaas(ledger.clone())))
            .unwrap()
            .with_circle_attestations(Arc::new(MockCircleApi(ledger.clone())))
            .with_automatic_token_bridge(Arc::new(MockAutomaticBridge {
                network,
                chain: Chain::Ethereum,
                relayer: ChainAddress::parse(Chain::Polygon, POLYGON_RELAYER)
                    .unwrap()
                    .to_universal(),
                ledger: ledger.clone(),
            }));

        for chain in [Chain::Ethereum, Chain::Polygon] {
            wh = wh.with_token_bridge(Arc::new(MockTokenBridge {
                network,
                chain,
                ledger: ledger.clone(),
            }));
        }
        for chain in [Chain::Ethereum, Chain::Avalanche] {
            wh = wh.with_circle_bridge(Arc::new(MockCircleBridge {
                network,
                chain,
                ledger: ledger.clone(),
            }));
        }
        for chain in [Chain::Osmosis, Chain::Wormchain] {
            wh = wh.with_ibc_bridge(Arc::new(MockIbcBridge {
                network,
                chain,
                ledger: ledger.clone(),
            }));
        }

        Env { ledger, wh }
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }

    pub fn signer(&self, address: &ChainAddress) -> MockSigner {
        MockSigner {
            address: address.clone(),
            ledger: self.ledger.clone(),
        }
    }
}
