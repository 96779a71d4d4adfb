use wormhole_connect_base::{Chain, ChainAddress, NativeAddress};

use crate::{Error, TokenAddress, UnsignedTransaction};

/// The relayed token bridge. A relayer redeems the transfer on the destination chain and takes a
/// fee out of the transferred amount, so there is nothing to redeem on the caller's side.
pub trait AutomaticTokenBridge: Send + Sync {
    fn chain(&self) -> Chain;

    /// Start a relayed transfer. `relayer_fee` is taken from `amount`'s token; `native_gas` is the
    /// part of the transfer the relayer swaps for gas on the destination chain.
    fn transfer(
        &self,
        sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        relayer_fee: u128,
        native_gas: Option<u128>,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    /// The fee the relayer charges for delivering `token` to `recipient`.
    fn get_relayer_fee(
        &self,
        sender: &ChainAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
    ) -> Result<u128, Error>;
}
