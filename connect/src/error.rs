use thiserror::Error;

use crate::TokenId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The asset has no wrapped representation, or is not itself a wrapped asset.
    #[error("{0} is not a wrapped asset")]
    NotWrapped(TokenId),

    /// The chain accepted the transaction but it reverted.
    #[error("transaction {txid} failed: {reason}")]
    TransferFailed { txid: String, reason: String },

    /// The attestation has not been produced yet. Retry later.
    #[error("attestation not yet available: {0}")]
    AttestationUnavailable(String),

    #[error("{what} matched {count} results")]
    AmbiguousResult { what: String, count: usize },

    /// The operation is not offered for this network or chain.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A lifecycle operation was called in a state that doesn't allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The attestation returned for a request does not belong to it.
    #[error("attestation mismatch: {0}")]
    AttestationMismatch(String),

    /// A query failed in the adapter or the service it talks to.
    #[error(transparent)]
    Rpc(#[from] anyhow::Error),

    #[error(transparent)]
    Registry(wormhole_connect_base::Error),

    #[error(transparent)]
    Codec(#[from] wormhole_connect_vaas::Error),
}

impl Error {
    /// Whether the condition may clear by itself, so that the same call is worth repeating.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::AttestationUnavailable(_) | Error::Rpc(_))
    }
}

impl From<wormhole_connect_base::Error> for Error {
    fn from(e: wormhole_connect_base::Error) -> Self {
        use wormhole_connect_base::Error as Base;

        match e {
            Base::NotFound { .. } => Error::NotFound(e.to_string()),
            Base::InvalidAddress { .. } => Error::InvalidAddress(e.to_string()),
            e => Error::Registry(e),
        }
    }
}
