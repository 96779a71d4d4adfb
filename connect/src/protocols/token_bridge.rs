use wormhole_connect_base::{Chain, ChainAddress, NativeAddress, UniversalAddress};
use wormhole_connect_vaas::{
    Error as CodecError, Payload, PayloadKind, Vaa, VaaPayload, WormholeMessageId,
};

use crate::{Error, TokenAddress, TokenId, TransactionId, UnsignedTransaction};

/// The manual token bridge: lock or burn on the source chain, then redeem the VAA on the
/// destination.
pub trait TokenBridge: Send + Sync {
    fn chain(&self) -> Chain;

    /// The transactions that start a transfer of `amount` base units, in submission order. An
    /// allowance approval is only included when the current allowance is insufficient.
    fn transfer(
        &self,
        sender: &NativeAddress,
        recipient: &ChainAddress,
        token: &TokenAddress,
        amount: u128,
        payload: Option<&[u8]>,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    /// The transactions that complete the transfer carried by `vaa`. With `unwrap_native` a
    /// transfer of the wrapped gas token pays out the gas token itself.
    fn redeem(
        &self,
        sender: &NativeAddress,
        vaa: &Vaa<Payload>,
        unwrap_native: bool,
    ) -> Result<Vec<UnsignedTransaction>, Error>;

    /// Whether `vaa` was already redeemed on this chain. Once true it stays true.
    ///
    /// The EVM token bridge records redeemed VAAs by the double hash of their body, see
    /// [`wormhole_connect_vaas::Digest::secp256k_hash`].
    fn is_transfer_completed(&self, vaa: &Vaa<Payload>) -> Result<bool, Error>;

    /// Publish the metadata of `token` so that other chains can create a wrapped version of it.
    fn create_attestation(&self, token: &NativeAddress) -> Result<Vec<UnsignedTransaction>, Error>;

    /// Create or update the wrapped asset described by an asset metadata VAA.
    fn submit_attestation(&self, vaa: &Vaa<Payload>) -> Result<Vec<UnsignedTransaction>, Error>;

    fn is_wrapped_asset(&self, token: &NativeAddress) -> Result<bool, Error>;

    /// The token a wrapped asset represents. Fails with [`Error::NotWrapped`] for a native asset.
    fn get_original_asset(&self, token: &NativeAddress) -> Result<TokenId, Error>;

    /// The local representation of `token`. Fails with [`Error::NotWrapped`] when none was
    /// created yet.
    fn get_wrapped_asset(&self, token: &TokenId) -> Result<NativeAddress, Error>;

    fn has_wrapped_asset(&self, token: &TokenId) -> Result<bool, Error> {
        match self.get_wrapped_asset(token) {
            Ok(_) => Ok(true),
            Err(Error::NotWrapped(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// The wrapped version of the chain's gas token used by the bridge.
    fn get_wrapped_native(&self) -> Result<NativeAddress, Error>;

    /// The token transfers a transaction started, recovered from its logs.
    fn parse_transaction_details(&self, txid: &str) -> Result<Vec<TokenTransferTransaction>, Error>;
}

/// A message emitted by the core contract, as it appears in a transaction's logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub emitter: UniversalAddress,
    pub sequence: u64,
    pub nonce: u32,
    pub payload: Vec<u8>,
}

/// A token transfer recovered from a source chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferTransaction {
    pub tx: TransactionId,
    /// The key for fetching the VAA.
    pub message_id: WormholeMessageId,
    pub kind: PayloadKind,
    pub token: TokenId,
    pub amount: u128,
    pub from: ChainAddress,
    pub to: ChainAddress,
    /// The payload of a transfer with payload.
    pub payload: Option<Vec<u8>>,
}

/// Recover the token transfers among the messages a transaction published.
///
/// Messages from emitters other than `token_bridge` are ignored. A token bridge message that is
/// not a transfer fails the whole parse: a transaction passed here is expected to be a transfer.
pub fn parse_published_messages(
    tx: &TransactionId,
    sender: &ChainAddress,
    token_bridge: &UniversalAddress,
    messages: &[PublishedMessage],
) -> Result<Vec<TokenTransferTransaction>, Error> {
    let mut transfers = Vec::new();
    for msg in messages.iter().filter(|m| m.emitter == *token_bridge) {
        let payload = Payload::from_payload_bytes(&msg.payload)?;

        let (token, amount, recipient, extra) = match payload {
            Payload::Transfer(t) => (
                TokenId::new(t.token_chain, t.token_address),
                t.amount,
                (t.recipient_chain, t.recipient),
                None,
            ),
            Payload::TransferWithPayload(t) | Payload::GatewayTransfer { transfer: t, .. } => (
                TokenId::new(t.token_chain, t.token_address),
                t.amount,
                (t.recipient_chain, t.recipient),
                Some(t.payload),
            ),
            other => {
                return Err(CodecError::UnexpectedPayloadKind {
                    expected: PayloadKind::Transfer,
                    found: other.kind(),
                }
                .into())
            }
        };
        let kind = if extra.is_some() {
            PayloadKind::TransferWithPayload
        } else {
            PayloadKind::Transfer
        };

        transfers.push(TokenTransferTransaction {
            tx: tx.clone(),
            message_id: WormholeMessageId {
                chain: tx.chain,
                emitter: msg.emitter,
                sequence: msg.sequence,
            },
            kind,
            token,
            amount: u128::try_from(amount)?,
            from: sender.clone(),
            to: ChainAddress::from_universal(recipient.0, &recipient.1)?,
            payload: extra,
        });
    }

    Ok(transfers)
}
