use std::fmt;

use rand::Rng;
use tracing::info;
use wormhole_connect_base::{Chain, ChainAddress};
use wormhole_connect_vaas::{
    gateway::{GatewayIbcTokenBridgePayload, GatewayIbcTransferMsg},
    Error as CodecError, Payload, PayloadKind, Vaa, WormholeMessageId,
};

use crate::{
    lookup::Lookup,
    protocols::{
        ibc::{fetch_ibc_transfer, gateway_payload, recipient_from_gateway},
        IbcLookup, IbcMessageId, IbcTransferInfo, PacketCommitment,
    },
    submit,
    transfer::{advance, require, TransferState, WormholeTransfer},
    Error, Signer, TokenAddress, TokenId, TransactionId, Wormhole,
};

/// Which way a transfer crosses the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayRoute {
    /// IBC into the gateway, then the token bridge out of it. The caller redeems the gateway's
    /// VAA on the destination.
    FromCosmos,
    /// The token bridge into the gateway, then IBC out of it. The gateway delivers.
    IntoCosmos,
    /// IBC in and out of the gateway. The gateway delivers.
    BetweenCosmos,
}

impl GatewayRoute {
    pub fn classify(wh: &Wormhole, from: Chain, to: Chain) -> Result<Self, Error> {
        let gateway = wh.registry().gateway();
        if from == gateway || to == gateway {
            return Err(Error::Unsupported(format!(
                "gateway transfers between {from} and {to}, use a token transfer"
            )));
        }

        match (wh.is_ibc_chain(from)?, wh.is_ibc_chain(to)?) {
            (true, true) => Ok(GatewayRoute::BetweenCosmos),
            (true, false) => Ok(GatewayRoute::FromCosmos),
            (false, true) => Ok(GatewayRoute::IntoCosmos),
            (false, false) => Err(Error::Unsupported(format!(
                "gateway transfers between {from} and {to}, neither is connected over IBC"
            ))),
        }
    }

    fn delivered_by_gateway(self) -> bool {
        self != GatewayRoute::FromCosmos
    }
}

/// The proof that one leg of a gateway transfer happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAttestation {
    Vaa(Vaa<Payload>),
    Ibc(IbcTransferInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTransferDetails {
    pub token: TokenAddress,
    pub amount: u128,
    pub from: ChainAddress,
    pub to: ChainAddress,
}

/// A transfer to, from or between Cosmos chains through the IBC gateway.
///
/// It has two legs, one into the gateway and one out of it, each with its own attestation.
pub struct GatewayTransfer {
    wh: Wormhole,
    state: TransferState,
    details: GatewayTransferDetails,
    route: GatewayRoute,
    msg: GatewayIbcTokenBridgePayload,
    source_txids: Vec<TransactionId>,
    destination_txids: Vec<TransactionId>,
    source_message: Option<WormholeMessageId>,
    source: Option<GatewayAttestation>,
    gateway: Option<GatewayAttestation>,
}

impl fmt::Display for GatewayTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gateway transfer {} of {} from {} to {}",
            self.msg.nonce(),
            self.details.amount,
            self.details.from,
            self.details.to
        )
    }
}

impl GatewayTransfer {
    /// A new transfer with a random nonce.
    pub fn new(wh: &Wormhole, details: GatewayTransferDetails) -> Result<Self, Error> {
        let route = GatewayRoute::classify(wh, details.from.chain, details.to.chain)?;
        match route {
            GatewayRoute::FromCosmos | GatewayRoute::BetweenCosmos => {
                let _ = wh.ibc_bridge(details.from.chain)?;
            }
            GatewayRoute::IntoCosmos => {
                let _ = wh.token_bridge(details.from.chain)?;
            }
        }

        let nonce = rand::thread_rng().gen();
        let msg = gateway_payload(&details.to, nonce);

        Ok(GatewayTransfer::with_state(
            wh,
            TransferState::Created,
            details,
            route,
            msg,
        ))
    }

    fn with_state(
        wh: &Wormhole,
        state: TransferState,
        details: GatewayTransferDetails,
        route: GatewayRoute,
        msg: GatewayIbcTokenBridgePayload,
    ) -> Self {
        GatewayTransfer {
            wh: wh.clone(),
            state,
            details,
            route,
            msg,
            source_txids: Vec::new(),
            destination_txids: Vec::new(),
            source_message: None,
            source: None,
            gateway: None,
        }
    }

    /// Rebuild the transfer started by `txid` on `chain`, either an IBC transfer from a Cosmos
    /// chain or a token bridge transfer to the gateway.
    pub fn from_txid(wh: &Wormhole, chain: Chain, txid: &str) -> Result<Self, Error> {
        let tx = TransactionId {
            chain,
            txid: txid.into(),
        };

        let mut transfer = if wh.is_ibc_chain(chain)? {
            let info = wh.ibc_bridge(chain)?.lookup_transfer_from_tx(txid)?;
            GatewayTransfer::from_ibc_transfer(wh, info)?
        } else {
            let xfers = wh.token_bridge(chain)?.parse_transaction_details(txid)?;
            let xfer = Lookup::from_matches(format!("token transfers in {tx}"), xfers)?.into_first();

            let payload = xfer.payload.as_deref().ok_or(CodecError::UnexpectedPayloadKind {
                expected: PayloadKind::GatewayTransfer,
                found: xfer.kind,
            })?;
            let msg = GatewayIbcTokenBridgePayload::from_json(payload)?;

            let details = GatewayTransferDetails {
                token: TokenAddress::Token(xfer.token),
                amount: xfer.amount,
                from: xfer.from,
                to: recipient_from_gateway(msg.chain(), &msg.recipient()?)?,
            };
            let route = GatewayRoute::classify(wh, chain, details.to.chain)?;

            let mut transfer = GatewayTransfer::with_state(
                wh,
                TransferState::AttestationPending,
                details,
                route,
                msg,
            );
            transfer.source_message = Some(xfer.message_id);
            transfer
        };

        transfer.source_txids.push(tx);
        info!(transfer = %transfer, %txid, "rebuilt transfer from its source transaction");
        Ok(transfer)
    }

    /// Rebuild the transfer whose token bridge leg into the gateway produced message `id`.
    pub fn from_message_id(wh: &Wormhole, id: &WormholeMessageId) -> Result<Self, Error> {
        let vaa = wh.get_vaa(id)?;
        let (transfer, msg) = match &vaa.payload {
            Payload::GatewayTransfer { transfer, message } => (transfer.clone(), message.clone()),
            other => {
                return Err(CodecError::UnexpectedPayloadKind {
                    expected: PayloadKind::GatewayTransfer,
                    found: other.kind(),
                }
                .into())
            }
        };

        let details = GatewayTransferDetails {
            token: TokenAddress::Token(TokenId::new(transfer.token_chain, transfer.token_address)),
            amount: u128::try_from(transfer.amount)?,
            from: ChainAddress::from_universal(vaa.emitter_chain, &transfer.sender_address)?,
            to: recipient_from_gateway(msg.chain(), &msg.recipient()?)?,
        };
        let route = GatewayRoute::classify(wh, vaa.emitter_chain, details.to.chain)?;

        let mut gt =
            GatewayTransfer::with_state(wh, TransferState::AttestationPending, details, route, msg);
        gt.source_message = Some(*id);
        gt.source = Some(GatewayAttestation::Vaa(vaa));

        info!(transfer = %gt, %id, "rebuilt transfer from its message");
        Ok(gt)
    }

    /// Rebuild the transfer whose IBC leg into the gateway is packet `id`.
    pub fn from_ibc_message_id(wh: &Wormhole, id: &IbcMessageId) -> Result<Self, Error> {
        let info = wh.ibc_bridge(id.chain)?.lookup_transfer_from_ibc_msg_id(id)?;
        let transfer = GatewayTransfer::from_ibc_transfer(wh, info)?;

        info!(transfer = %transfer, ?id, "rebuilt transfer from its ibc packet");
        Ok(transfer)
    }

    // The routing instructions ride in the memo of the ICS-20 packet.
    fn from_ibc_transfer(wh: &Wormhole, info: IbcTransferInfo) -> Result<Self, Error> {
        let data = info.packet_data()?;
        let msg = GatewayIbcTransferMsg::from_memo(&data.memo)?.gateway_ibc_token_bridge_payload;

        let details = GatewayTransferDetails {
            amount: data.amount()?,
            from: ChainAddress::parse(info.id.chain, &data.sender)?,
            to: recipient_from_gateway(msg.chain(), &msg.recipient()?)?,
            token: TokenAddress::Denom(data.denom),
        };
        let route = GatewayRoute::classify(wh, info.id.chain, details.to.chain)?;

        let mut transfer =
            GatewayTransfer::with_state(wh, TransferState::AttestationPending, details, route, msg);
        transfer.source = Some(GatewayAttestation::Ibc(info));
        Ok(transfer)
    }

    pub fn details(&self) -> &GatewayTransferDetails {
        &self.details
    }

    pub fn route(&self) -> GatewayRoute {
        self.route
    }

    /// The routing instructions the gateway acts on.
    pub fn message(&self) -> &GatewayIbcTokenBridgePayload {
        &self.msg
    }

    pub fn source_txids(&self) -> &[TransactionId] {
        &self.source_txids
    }

    pub fn destination_txids(&self) -> &[TransactionId] {
        &self.destination_txids
    }

    /// The attestations fetched so far, the leg into the gateway first.
    pub fn attestations(&self) -> Vec<GatewayAttestation> {
        self.source.iter().chain(self.gateway.iter()).cloned().collect()
    }

    fn advance(&mut self, to: TransferState) -> Result<(), Error> {
        let label = self.to_string();
        advance(&mut self.state, to, &label)
    }

    fn fetch_source_leg(&mut self) -> Result<GatewayAttestation, Error> {
        let tx = self
            .source_txids
            .last()
            .cloned()
            .ok_or_else(|| Error::InvalidState(format!("{self} has no source transaction")))?;

        if self.route == GatewayRoute::IntoCosmos {
            let id = match self.source_message {
                Some(id) => id,
                None => {
                    let xfers = self
                        .wh
                        .token_bridge(tx.chain)?
                        .parse_transaction_details(&tx.txid)?;
                    let id = Lookup::from_matches(format!("token transfers in {tx}"), xfers)?
                        .into_first()
                        .message_id;
                    *self.source_message.insert(id)
                }
            };

            return Ok(GatewayAttestation::Vaa(self.wh.get_vaa(&id)?));
        }

        let bridge = self.wh.ibc_bridge(tx.chain)?;
        fetch_ibc_transfer(bridge.as_ref(), &IbcLookup::Tx(tx.txid.clone()))?
            .map(GatewayAttestation::Ibc)
            .ok_or_else(|| Error::AttestationUnavailable(format!("ibc transfer {tx}")))
    }

    fn fetch_gateway_leg(&self) -> Result<GatewayAttestation, Error> {
        let gateway = self.wh.ibc_bridge(self.wh.registry().gateway())?;

        if self.route.delivered_by_gateway() {
            return fetch_ibc_transfer(gateway.as_ref(), &IbcLookup::Message(self.msg.clone()))?
                .map(GatewayAttestation::Ibc)
                .ok_or_else(|| Error::AttestationUnavailable(format!("gateway leg of {self}")));
        }

        let Some(GatewayAttestation::Ibc(source)) = &self.source else {
            return Err(Error::InvalidState(format!("{self} has no ibc source leg")));
        };
        let id = match gateway.lookup_message_from_ibc_msg_id(&source.id) {
            Ok(id) => id,
            Err(e) if e.is_transient() || matches!(e, Error::NotFound(_)) => {
                return Err(Error::AttestationUnavailable(format!(
                    "gateway message of {self}: {e}"
                )))
            }
            Err(e) => return Err(e),
        };

        Ok(GatewayAttestation::Vaa(self.wh.get_vaa(&id)?))
    }

    // Whether the gateway's packet to the destination was delivered.
    fn is_delivered(&self, packet: &IbcTransferInfo) -> Result<bool, Error> {
        let gateway = self.wh.ibc_bridge(self.wh.registry().gateway())?;
        let Some(info) = fetch_ibc_transfer(gateway.as_ref(), &IbcLookup::Id(packet.id.clone()))?
        else {
            return Ok(false);
        };

        match info.commitment {
            PacketCommitment::Present => Ok(false),
            PacketCommitment::Absent => Ok(true),
            PacketCommitment::Indeterminate => Err(Error::AttestationUnavailable(format!(
                "packet commitment of {self}"
            ))),
        }
    }
}

impl WormholeTransfer for GatewayTransfer {
    type Attestation = GatewayAttestation;

    fn state(&self) -> TransferState {
        self.state
    }

    fn initiate_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        if self.state != TransferState::Created {
            return Err(Error::InvalidState(format!("{self} was already initiated")));
        }

        let d = &self.details;
        let txs = match self.route {
            GatewayRoute::FromCosmos | GatewayRoute::BetweenCosmos => self
                .wh
                .ibc_bridge(d.from.chain)?
                .transfer(&d.from.address, &d.to, &d.token, d.amount, self.msg.nonce())?,
            GatewayRoute::IntoCosmos => {
                let translator = ChainAddress::from_universal(
                    self.wh.registry().gateway(),
                    &self.wh.translator_address()?,
                )?;
                let payload = self.msg.to_json()?;

                self.wh.token_bridge(d.from.chain)?.transfer(
                    &d.from.address,
                    &translator,
                    &d.token,
                    d.amount,
                    Some(&payload),
                )?
            }
        };

        let txids = submit(signer, txs)?;
        self.source_txids.extend(txids.iter().cloned());
        self.advance(TransferState::SourceInitiated)?;

        Ok(txids)
    }

    fn fetch_attestation(&mut self) -> Result<Vec<GatewayAttestation>, Error> {
        require(self.state, TransferState::SourceInitiated, "fetching attestations")?;
        self.advance(TransferState::AttestationPending)?;

        if self.source.is_none() {
            self.source = Some(self.fetch_source_leg()?);
        }
        if self.gateway.is_none() {
            self.gateway = Some(self.fetch_gateway_leg()?);
        }

        self.advance(TransferState::AttestationReceived)?;
        Ok(self.attestations())
    }

    fn complete_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        if self.route.delivered_by_gateway() {
            return Err(Error::Unsupported(format!(
                "redeeming {self}, the gateway delivers it"
            )));
        }
        require(self.state, TransferState::AttestationReceived, "completing a transfer")?;
        if self.state == TransferState::Completed {
            return Ok(Vec::new());
        }

        let Some(GatewayAttestation::Vaa(vaa)) = &self.gateway else {
            return Err(Error::InvalidState(format!("{self} has no gateway vaa")));
        };

        let bridge = self.wh.token_bridge(self.details.to.chain)?;
        if bridge.is_transfer_completed(vaa)? {
            info!(transfer = %self, "transfer was already redeemed");
            self.advance(TransferState::Completed)?;
            return Ok(Vec::new());
        }

        let txs = bridge.redeem(&signer.address(), vaa, true)?;
        let txids = submit(signer, txs)?;
        self.destination_txids.extend(txids.iter().cloned());
        self.advance(TransferState::DestinationInitiated)?;

        Ok(txids)
    }

    fn is_completed(&mut self) -> Result<bool, Error> {
        if self.state == TransferState::Completed {
            return Ok(true);
        }

        let done = match &self.gateway {
            None => false,
            Some(GatewayAttestation::Vaa(vaa)) => self
                .wh
                .token_bridge(self.details.to.chain)?
                .is_transfer_completed(vaa)?,
            Some(GatewayAttestation::Ibc(packet)) => self.is_delivered(packet)?,
        };
        if done {
            self.advance(TransferState::Completed)?;
        }

        Ok(done)
    }
}
