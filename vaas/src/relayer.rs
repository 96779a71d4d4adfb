//! The payload the token bridge relayer contract attaches to the transfers it sends. The token
//! bridge recipient of such a transfer is the relayer contract on the destination chain; the
//! actual recipient is in here.

use serde::{Deserialize, Serialize};

use crate::{Amount, Error, UniversalAddress};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferWithRelay {
    /// Fee paid to the relayer out of the transferred amount.
    pub target_relayer_fee: Amount,
    /// Part of the transferred amount swapped for the destination's gas token.
    pub to_native_token_amount: Amount,
    pub target_recipient: UniversalAddress,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelayerMessage {
    #[serde(rename = "1")]
    TransferWithRelay(TransferWithRelay),
}

impl RelayerMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_wormhole::to_vec(self)?)
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        match buf.first() {
            None => Err(Error::EmptyPayload),
            Some(1) => Ok(serde_wormhole::from_slice(buf)?),
            Some(&k) => Err(Error::UnknownPayloadKind(k)),
        }
    }
}
