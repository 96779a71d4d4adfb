use thiserror::Error;

use crate::PayloadKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown payload kind: {0}")]
    UnknownPayloadKind(u8),
    #[error("expected a {expected} payload, found {found}")]
    UnexpectedPayloadKind {
        expected: PayloadKind,
        found: PayloadKind,
    },
    #[error("empty payload")]
    EmptyPayload,
    #[error("trailing data after {0} payload")]
    TrailingData(PayloadKind),
    #[error("unknown governance module")]
    UnknownModule,
    #[error("unknown governance action: {0}")]
    UnknownAction(u8),
    #[error("amount does not fit in 128 bits")]
    AmountOverflow,
    #[error(transparent)]
    Wire(#[from] serde_wormhole::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}
