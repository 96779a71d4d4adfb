use wormhole_connect_base::{Chain, ChainAddress, NativeAddress, UniversalAddress};
use wormhole_connect_vaas::circle::{CircleAttestation, CircleMessage};

use crate::{lookup::Lookup, Error, TokenId, TransactionId, UnsignedTransaction};

/// Circle's burn and mint bridge (CCTP).
pub trait CircleBridge: Send + Sync {
    fn chain(&self) -> Chain;

    /// An allowance approval when the current allowance is insufficient, then the burn.
    fn transfer(
        &self,
        token: &NativeAddress,
        sender: &NativeAddress,
        recipient: &ChainAddress,
        amount: u128,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    /// Mint on this chain what `message` burned elsewhere.
    fn redeem(
        &self,
        sender: &NativeAddress,
        message: &CircleMessage,
        attestation: &CircleAttestation,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    /// Whether the nonce of `message` was already used on this chain.
    fn is_transfer_completed(&self, message: &CircleMessage) -> Result<bool, Error>;

    fn parse_transaction_details(&self, txid: &str) -> Result<CircleTransferTransaction, Error>;
}

/// A token messenger `DepositForBurn` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositForBurn {
    pub burn_token: UniversalAddress,
    pub amount: u128,
    pub mint_recipient: UniversalAddress,
    pub destination_domain: u32,
    pub destination_token_messenger: UniversalAddress,
    pub destination_caller: UniversalAddress,
}

/// A burn recovered from a source chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircleTransferTransaction {
    pub tx: TransactionId,
    pub from: ChainAddress,
    pub token: TokenId,
    pub amount: u128,
    pub burn: DepositForBurn,
    pub message: CircleMessage,
    /// The key for requesting the attestation.
    pub message_hash: [u8; 32],
}

/// Pair the burn event of a transaction with the message the transmitter sent for it.
pub fn pair_burn_and_message(
    tx: &TransactionId,
    from: &ChainAddress,
    burns: Vec<DepositForBurn>,
    messages: Vec<CircleMessage>,
) -> Result<CircleTransferTransaction, Error> {
    let burn = Lookup::from_matches(format!("DepositForBurn in {tx}"), burns)?.into_first();
    let message = Lookup::from_matches(format!("MessageSent in {tx}"), messages)?.into_first();

    Ok(CircleTransferTransaction {
        tx: tx.clone(),
        from: from.clone(),
        token: TokenId::new(tx.chain, burn.burn_token),
        amount: burn.amount,
        message_hash: message.hash(),
        burn,
        message,
    })
}
