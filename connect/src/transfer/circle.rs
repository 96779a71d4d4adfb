use std::fmt;

use tracing::info;
use wormhole_connect_base::{Chain, ChainAddress, NativeAddress};
use wormhole_connect_vaas::circle::{CircleAttestation, CircleMessage};

use crate::{
    submit,
    transfer::{advance, require, TransferState, WormholeTransfer},
    Error, Signer, TransactionId, Wormhole,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleTransferDetails {
    /// The burned token on the source chain.
    pub token: NativeAddress,
    pub amount: u128,
    pub from: ChainAddress,
    pub to: ChainAddress,
}

/// A manual CCTP transfer: burn on the source chain, wait for Circle's attestation of the burn
/// message, then mint on the destination.
pub struct CircleTransfer {
    wh: Wormhole,
    state: TransferState,
    details: CircleTransferDetails,
    source_txids: Vec<TransactionId>,
    destination_txids: Vec<TransactionId>,
    message: Option<CircleMessage>,
    attestation: Option<CircleAttestation>,
}

impl fmt::Display for CircleTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circle transfer of {} from {} to {}",
            self.details.amount, self.details.from, self.details.to
        )
    }
}

impl CircleTransfer {
    pub fn new(wh: &Wormhole, details: CircleTransferDetails) -> Result<Self, Error> {
        let _ = wh.circle_bridge(details.from.chain)?;
        let _ = wh.registry().circle_domain(details.to.chain).map_err(|_| {
            Error::Unsupported(format!("circle transfers to {}", details.to.chain))
        })?;

        Ok(CircleTransfer::with_state(wh, TransferState::Created, details))
    }

    fn with_state(wh: &Wormhole, state: TransferState, details: CircleTransferDetails) -> Self {
        CircleTransfer {
            wh: wh.clone(),
            state,
            details,
            source_txids: Vec::new(),
            destination_txids: Vec::new(),
            message: None,
            attestation: None,
        }
    }

    /// Rebuild the transfer whose burn is in `txid` on `chain`. The destination comes from the
    /// burn's destination domain.
    pub fn from_txid(wh: &Wormhole, chain: Chain, txid: &str) -> Result<Self, Error> {
        let xfer = wh.circle_bridge(chain)?.parse_transaction_details(txid)?;
        let to_chain = wh
            .registry()
            .chain_from_circle_domain(xfer.burn.destination_domain)?;

        let details = CircleTransferDetails {
            token: NativeAddress::from_universal(chain, &xfer.token.address)?,
            amount: xfer.amount,
            from: xfer.from,
            to: ChainAddress::from_universal(to_chain, &xfer.burn.mint_recipient)?,
        };

        let mut transfer = CircleTransfer::with_state(wh, TransferState::AttestationPending, details);
        transfer.source_txids.push(xfer.tx);
        transfer.message = Some(xfer.message);

        info!(transfer = %transfer, %txid, "rebuilt transfer from its source transaction");
        Ok(transfer)
    }

    pub fn details(&self) -> &CircleTransferDetails {
        &self.details
    }

    pub fn source_txids(&self) -> &[TransactionId] {
        &self.source_txids
    }

    pub fn destination_txids(&self) -> &[TransactionId] {
        &self.destination_txids
    }

    /// The burn message, once it was read from the source transaction.
    pub fn message(&self) -> Option<&CircleMessage> {
        self.message.as_ref()
    }

    fn advance(&mut self, to: TransferState) -> Result<(), Error> {
        let label = self.to_string();
        advance(&mut self.state, to, &label)
    }

    // The burn is the last source transaction, after any approval.
    fn parse_message(&self) -> Result<CircleMessage, Error> {
        let tx = self
            .source_txids
            .last()
            .ok_or_else(|| Error::InvalidState(format!("{self} has no source transaction")))?;

        Ok(self
            .wh
            .circle_bridge(self.details.from.chain)?
            .parse_transaction_details(&tx.txid)?
            .message)
    }
}

impl WormholeTransfer for CircleTransfer {
    type Attestation = CircleAttestation;

    fn state(&self) -> TransferState {
        self.state
    }

    fn initiate_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        if self.state != TransferState::Created {
            return Err(Error::InvalidState(format!("{self} was already initiated")));
        }

        let d = &self.details;
        let txs = self.wh.circle_bridge(d.from.chain)?.transfer(
            &d.token,
            &d.from.address,
            &d.to,
            d.amount,
        )?;

        let txids = submit(signer, txs)?;
        self.source_txids.extend(txids.iter().cloned());
        self.advance(TransferState::SourceInitiated)?;

        Ok(txids)
    }

    fn fetch_attestation(&mut self) -> Result<Vec<CircleAttestation>, Error> {
        require(self.state, TransferState::SourceInitiated, "fetching attestations")?;
        if let Some(attestation) = &self.attestation {
            return Ok(vec![attestation.clone()]);
        }

        let message = match &self.message {
            Some(m) => m.clone(),
            None => self.parse_message()?,
        };
        self.message = Some(message.clone());
        self.advance(TransferState::AttestationPending)?;

        let attestation = self.wh.get_circle_attestation(&message)?;
        self.attestation = Some(attestation.clone());
        self.advance(TransferState::AttestationReceived)?;

        Ok(vec![attestation])
    }

    fn complete_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error> {
        require(self.state, TransferState::AttestationReceived, "completing a transfer")?;
        if self.state == TransferState::Completed {
            return Ok(Vec::new());
        }

        let (Some(message), Some(attestation)) = (&self.message, &self.attestation) else {
            return Err(Error::InvalidState(format!("{self} has no attestation")));
        };

        let bridge = self.wh.circle_bridge(self.details.to.chain)?;
        if bridge.is_transfer_completed(message)? {
            info!(transfer = %self, "transfer was already minted");
            self.advance(TransferState::Completed)?;
            return Ok(Vec::new());
        }

        let txs = bridge.redeem(&signer.address(), message, attestation)?;
        let txids = submit(signer, txs)?;
        self.destination_txids.extend(txids.iter().cloned());
        self.advance(TransferState::DestinationInitiated)?;

        Ok(txids)
    }

    fn is_completed(&mut self) -> Result<bool, Error> {
        if self.state == TransferState::Completed {
            return Ok(true);
        }
        let Some(message) = &self.message else {
            return Ok(false);
        };

        let done = self
            .wh
            .circle_bridge(self.details.to.chain)?
            .is_transfer_completed(message)?;
        if done {
            self.advance(TransferState::Completed)?;
        }

        Ok(done)
    }
}
