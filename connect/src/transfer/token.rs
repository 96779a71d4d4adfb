use std::fmt;

use tracing::info;
use wormhole_connect_base::{ChainAddress, Chain};
use wormhole_connect_vaas::{
    relayer::RelayerMessage, Error as CodecError, Payload, PayloadKind, Vaa, WormholeMessageId,
};

use crate::{
    lookup::Lookup,
    submit,
    transfer::{advance, is_vaa_redeemed, require, TransferState, WormholeTransfer},
    Error, Signer, TokenAddress, TokenId, TransactionId, Wormhole,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferDetails {
    pub token: TokenAddress,
    /// Base units of `token` as the token bridge counts them.
    pub amount: u128,
    pub from: ChainAddress,
    pub to: ChainAddress,
    /// Delivered by the token bridge relayer instead of redeemed by the caller.
    pub automatic: bool,
    /// Delivered to `to` along with the tokens. Manual transfers only.
    pub payload: Option<Vec<u8>>,
    /// Part of `amount` the relayer swaps for gas on the destination. Automatic transfers only.
    pub native_gas: Option<u128>,
}

/// A token bridge transfer, redeemed by the caller or delivered by the relayer.
pub struct TokenTransfer {
    wh: Wormhole,
    state: TransferState,
    details: TokenTransferDetails,
    source_txids: Vec<TransactionId>,
    destination_txids: Vec<TransactionId>,
    message_ids: Vec<WormholeMessageId>,
    vaas: Vec<Vaa<Payload>>,
}

impl fmt::Display for TokenTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.details.automatic {
            "automatic token transfer"
        } else {
            "token transfer"
        };

        write!(
            f,
            "{kind} of {} from {} to {}",
            self.details.amount, self.details.from, self.details.to
        )
    }
}

impl TokenTransfer {
    pub fn new(wh: &Wormhole, details: TokenTransferDetails) -> Result<Self, Error> {
        if details.automatic {
            if details.payload.is_some() {
                return Err(Error::Unsupported("payloads on automatic transfers".into()));
            }
            let _ = wh.automatic_token_bridge(details.from.chain)?;
        } else {
            if details.native_gas.is_some() {
                return Err(Error::Unsupported(
                    "native gas drop-off on manual transfers".into(),
                ));
            }
            let _ = wh.token_bridge(details.from.chain)?;
        }

        Ok(TokenTransfer::with_state(wh, TransferState::Created, details))
    }

    fn with_state(wh: &Wormhole, state: TransferState, details: TokenTransferDetails) -> Self {
        TokenTransfer {
            wh: wh.clone(),
            state,
            details,
            source_txids: Vec::new(),
            destination_txids: Vec::new(),
            message_ids: Vec::new(),
            vaas: Vec::new(),
        }
    }

    /// Rebuild the transfer started by `txid` on `chain`.
    pub fn from_txid(wh: &Wormhole, chain: Chain, txid: &str) -> Result<Self, Error> {
        let xfers = wh.token_bridge(chain)?.parse_transaction_details(txid)?;
        let xfer = Lookup::from_matches(format!("token transfers in {chain}:{txid}"), xfers)?
            .into_first();

        let details = details_from_parts(
            wh,
            TokenAddress::Token(xfer.token),
            xfer.amount,
            xfer.from,
            xfer.to,
            xfer.payload,
        )?;

        let mut transfer = TokenTransfer::with_state(wh, TransferState::AttestationPending, details);
        transfer.source_txids.push(xfer.tx);
        transfer.message_ids.push(xfer.message_id);

        info!(transfer = %transfer, %txid, "rebuilt transfer from its source transaction");
        Ok(transfer)
    }

    /// Rebuild the transfer that produced message `id`. The VAA must already be available.
    ///
    /// A plain transfer doesn't record who sent it, so its `from` is the emitting token bridge.
    pub fn from_message_id(wh: &Wormhole, id: &WormholeMessageId) -> Result<Self, Error> {
        let vaa = wh.get_vaa(id)?;

        let (token, amount, recipient, from, payload) = match &vaa.payload {
            Payload::Transfer(t) => (
                TokenId::new(t.token_chain, t.token_address),
                t.amount,
                (t.recipient_chain, t.recipient),
                ChainAddress::from_universal(vaa.emitter_chain, &vaa.emitter_address)?,
                None,
            ),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => (
                TokenId::new(t.token_chain, t.token_address),
                t.amount,
                (t.recipient_chain, t.recipient),
                ChainAddress::from_universal(vaa.emitter_chain, &t.sender_address)?,
                Some(t.payload.clone()),
            ),
            other => {
                return Err(CodecError::UnexpectedPayloadKind {
                    expected: PayloadKind::Transfer,
                    found: other.kind(),
                }
                .into())
            }
        };

        let details = details_from_parts(
            wh,
            TokenAddress::Token(token),
            u128::try_from(amount)?,
            from,
            ChainAddress::from_universal(recipient.0, &recipient.1)?,
            payload,
        )?;

        let mut transfer = TokenTransfer::with_state(wh, TransferState::AttestationReceived, details);
        transfer.message_ids.push(*id);
        transfer.vaas.push(vaa);

        info!(transfer = %transfer, %id, "rebuilt transfer from its message");
        Ok(transfer)
    }

    pub fn details(&self) -> &TokenTransferDetails {
        &self.details
    }

    pub fn source_txids(&self) -> &[TransactionId] {
        &self.source_txids
    }

    pub fn destination_txids(&self) -> &[TransactionId] {
        &self.destination_txids
    }

    pub fn message_ids(&self) -> &[WormholeMessageId] {
        &self.message_ids
    }

    pub fn vaas(&self) -> &[Vaa<Payload>] {
        &self.vaas
    }

    fn advance(&mut self, to: TransferState) -> Result<(), Error> {
        let label = self.to_string();
        advance(&mut self.state, to, &label)
    }

    // Find the messages the source transactions published.
    fn parse_message_ids(&mut self) -> Result<(), Error> {
        let bridge = self.wh.token_bridge(self.details.from.chain)?;
        for tx in &self.source_txids {
            for xfer in bridge.parse_transaction_details(&tx.txid)? {
                self.message_ids.push(xfer.message_id);
            }
        }

        if self.message_ids.is_empty() {
            return Err(Error::NotFound(format!("token bridge messages of {self}")));
        }

        Ok(())
    }
}

impl WormholeTransfer for TokenTransfer {
    type Attestation = Vaa<Payload>;

    fn state(&self) -> TransferState {
        self.state
    }

    fn initiate_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        if self.state != TransferState::Created {
            return Err(Error::InvalidState(format!("{self} was already initiated")));
        }

        let d = &self.details;
        let txs = if d.automatic {
            let bridge = self.wh.automatic_token_bridge(d.from.chain)?;
            let fee = bridge.get_relayer_fee(&d.from, &d.to, &d.token)?;
            bridge.transfer(&d.from.address, &d.to, &d.token, d.amount, fee, d.native_gas)?
        } else {
            self.wh.token_bridge(d.from.chain)?.transfer(
                &d.from.address,
                &d.to,
                &d.token,
                d.amount,
                d.payload.as_deref(),
            )?
        };

        let txids = submit(signer, txs)?;
        self.source_txids.extend(txids.iter().cloned());
        self.advance(TransferState::SourceInitiated)?;

        Ok(txids)
    }

    fn fetch_attestation(&mut self) -> Result<Vec<Vaa<Payload>>, Error> {
        require(self.state, TransferState::SourceInitiated, "fetching attestations")?;
        if self.state >= TransferState::AttestationReceived {
            return Ok(self.vaas.clone());
        }

        if self.message_ids.is_empty() {
            self.parse_message_ids()?;
        }
        self.advance(TransferState::AttestationPending)?;

        let mut vaas = Vec::with_capacity(self.message_ids.len());
        for id in &self.message_ids {
            vaas.push(self.wh.get_vaa(id)?);
        }

        self.vaas = vaas;
        self.advance(TransferState::AttestationReceived)?;

        Ok(self.vaas.clone())
    }

    fn complete_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        if self.details.automatic {
            return Err(Error::Unsupported(format!(
                "redeeming {self}, the relayer delivers it"
            )));
        }
        require(self.state, TransferState::AttestationReceived, "completing a transfer")?;
        if self.state == TransferState::Completed {
            return Ok(Vec::new());
        }

        let bridge = self.wh.token_bridge(self.details.to.chain)?;
        let sender = signer.address();

        let mut txs = Vec::new();
        for vaa in &self.vaas {
            if !bridge.is_transfer_completed(vaa)? {
                txs.extend(bridge.redeem(&sender, vaa, true)?);
            }
        }

        if txs.is_empty() {
            info!(transfer = %self, "transfer was already redeemed");
            self.advance(TransferState::Completed)?;
            return Ok(Vec::new());
        }

        let txids = submit(signer, txs)?;
        self.destination_txids.extend(txids.iter().cloned());
        self.advance(TransferState::DestinationInitiated)?;

        Ok(txids)
    }

    fn is_completed(&mut self) -> Result<bool, Error> {
        if self.state == TransferState::Completed {
            return Ok(true);
        }
        if self.vaas.is_empty() {
            return Ok(false);
        }

        let bridge = self.wh.token_bridge(self.details.to.chain)?;
        let done = is_vaa_redeemed(bridge.as_ref(), &self.vaas)?;
        if done {
            self.advance(TransferState::Completed)?;
        }

        Ok(done)
    }
}

// A transfer addressed to the destination's relayer contract is an automatic transfer, its real
// recipient is in the relayer payload.
fn details_from_parts(
    wh: &Wormhole,
    token: TokenAddress,
    amount: u128,
    from: ChainAddress,
    to: ChainAddress,
    payload: Option<Vec<u8>>,
) -> Result<TokenTransferDetails, Error> {
    let relayer = wh.relayer_address(to.chain);
    if relayer.is_some() && relayer == Some(to.to_universal()) {
        if let Some(RelayerMessage::TransferWithRelay(relay)) = payload
            .as_deref()
            .and_then(|p| RelayerMessage::from_bytes(p).ok())
        {
            let native_gas = u128::try_from(relay.to_native_token_amount)?;
            return Ok(TokenTransferDetails {
                token,
                amount,
                from,
                to: ChainAddress::from_universal(to.chain, &relay.target_recipient)?,
                automatic: true,
                payload: None,
                native_gas: (native_gas > 0).then_some(native_gas),
            });
        }
    }

    Ok(TokenTransferDetails {
        token,
        amount,
        from,
        to,
        automatic: false,
        payload,
        native_gas: None,
    })
}
