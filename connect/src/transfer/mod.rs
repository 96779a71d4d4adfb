//! Transfer lifecycles.
//!
//! A transfer moves forward through [`TransferState`] and never back. Each engine can be rebuilt
//! from what is recorded on chain (its source transaction or the id of the message it produced),
//! so a transfer started in one session can be finished in another.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wormhole_connect_vaas::{Payload, Vaa};

use crate::{protocols::TokenBridge, Error, Signer, TransactionId};

pub mod circle;
pub mod gateway;
pub mod token;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferState {
    /// The parties and amount are fixed. Nothing was submitted yet.
    Created,
    /// The source chain transactions were submitted.
    SourceInitiated,
    /// Waiting for the attestation that lets the destination act.
    AttestationPending,
    /// The attestation was fetched and is cached on the transfer.
    AttestationReceived,
    /// The redeem transactions were submitted.
    DestinationInitiated,
    Completed,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The operations every transfer engine offers.
///
/// Callers drive the lifecycle and do their own polling: `fetch_attestation` fails with
/// [`Error::AttestationUnavailable`] until the attestation exists, and calling it again is the
/// retry. `fetch_attestation` and `complete_transfer` check what was already done before acting,
/// so repeating them after a lost confirmation is safe.
pub trait WormholeTransfer {
    type Attestation;

    fn state(&self) -> TransferState;

    /// Submit the source chain transactions.
    fn initiate_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error>;

    /// Fetch and cache the attestations the destination needs.
    fn fetch_attestation(&mut self) -> Result<Vec<Self::Attestation>, Error>;

    /// Submit the destination chain transactions. Returns no transaction ids when the transfer
    /// was already completed.
    fn complete_transfer(&mut self, signer: &dyn Signer) -> Result<Vec<TransactionId>, Error>;

    /// Ask the destination whether the transfer arrived.
    fn is_completed(&mut self) -> Result<bool, Error>;
}

// Move `state` forward to `to`. Moving to the current state is a no-op.
pub(crate) fn advance(
    state: &mut TransferState,
    to: TransferState,
    transfer: &dyn fmt::Display,
) -> Result<(), Error> {
    if to < *state {
        return Err(Error::InvalidState(format!(
            "{transfer} cannot move from {state} back to {to}"
        )));
    }

    if to != *state {
        debug!(%transfer, from = %state, %to, "transfer state changed");
        *state = to;
    }

    Ok(())
}

// Fail unless the transfer reached at least `min`.
pub(crate) fn require(
    state: TransferState,
    min: TransferState,
    what: &str,
) -> Result<(), Error> {
    if state < min {
        return Err(Error::InvalidState(format!(
            "{what} needs a transfer in state {min} or later, found {state}"
        )));
    }

    Ok(())
}

/// Whether every one of `vaas` was redeemed on `bridge`'s chain. False when there is nothing to
/// check.
pub fn is_vaa_redeemed(bridge: &dyn TokenBridge, vaas: &[Vaa<Payload>]) -> Result<bool, Error> {
    if vaas.is_empty() {
        return Ok(false);
    }

    for vaa in vaas {
        if !bridge.is_transfer_completed(vaa)? {
            return Ok(false);
        }
    }

    Ok(true)
}
