use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;
use wormhole_connect_base::{Chain, NativeAddress, Network, UniversalAddress};

use crate::Error;

/// A transaction hash in the textual form its chain uses.
pub type TxHash = String;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub chain: Chain,
    pub txid: TxHash,
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.txid)
    }
}

/// An asset, identified by a chain and its address there. For a token moved by the token bridge
/// the canonical id is the chain of origin and the address on that chain.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId {
    pub chain: Chain,
    pub address: UniversalAddress,
}

impl TokenId {
    pub fn new(chain: Chain, address: UniversalAddress) -> Self {
        TokenId { chain, address }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// What to transfer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenAddress {
    /// The chain's gas token. Bridges wrap it before sending.
    Native,
    Token(TokenId),
    /// A bank denomination on a Cosmos chain, e.g. `uosmo` or `ibc/...`.
    Denom(String),
}

/// A transaction ready for signing.
///
/// `transaction` is whatever the chain's adapter needs to hand to its signer; the core never
/// looks inside it. Consecutive `parallelizable` transactions may be submitted together; every
/// other transaction must be confirmed before the next one is sent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    pub network: Network,
    pub chain: Chain,
    pub description: String,
    pub transaction: serde_json::Value,
    pub parallelizable: bool,
}

impl UnsignedTransaction {
    pub fn new(
        network: Network,
        chain: Chain,
        description: impl Into<String>,
        transaction: serde_json::Value,
    ) -> Self {
        UnsignedTransaction {
            network,
            chain,
            description: description.into(),
            transaction,
            parallelizable: false,
        }
    }

    pub fn parallelizable(mut self) -> Self {
        self.parallelizable = true;
        self
    }
}

/// Signs and broadcasts transactions for one chain. Key management lives behind this trait.
pub trait Signer {
    fn chain(&self) -> Chain;

    fn address(&self) -> NativeAddress;

    /// Sign, send and wait for every transaction in `txs`, returning their hashes in order. A
    /// reverted transaction must be reported as [`Error::TransferFailed`].
    fn sign_and_send(&self, txs: &[UnsignedTransaction]) -> Result<Vec<TxHash>, Error>;
}

/// Submit `txs` through `signer`.
///
/// Runs of parallelizable transactions go out as one batch. Any other transaction forms a batch of
/// its own, so it is confirmed before anything after it is sent.
pub fn submit(signer: &dyn Signer, txs: Vec<UnsignedTransaction>) -> Result<Vec<TransactionId>, Error> {
    let chain = signer.chain();
    if let Some(tx) = txs.iter().find(|tx| tx.chain != chain) {
        return Err(Error::InvalidState(format!(
            "a signer for {chain} cannot sign \"{}\" on {}",
            tx.description, tx.chain
        )));
    }

    let mut ids = Vec::with_capacity(txs.len());
    for batch in batches(txs) {
        let hashes = signer.sign_and_send(&batch)?;
        if hashes.len() != batch.len() {
            return Err(Error::Rpc(anyhow::anyhow!(
                "signer returned {} hashes for {} transactions",
                hashes.len(),
                batch.len()
            )));
        }

        for (tx, txid) in batch.iter().zip(hashes) {
            info!(chain = %chain, %txid, description = %tx.description, "submitted transaction");
            ids.push(TransactionId { chain, txid });
        }
    }

    Ok(ids)
}

fn batches(txs: Vec<UnsignedTransaction>) -> Vec<Vec<UnsignedTransaction>> {
    let mut out: Vec<Vec<UnsignedTransaction>> = Vec::new();
    for tx in txs {
        if tx.parallelizable {
            if let Some(batch) = out.last_mut().filter(|b| b.iter().all(|t| t.parallelizable)) {
                batch.push(tx);
                continue;
            }
        }
        out.push(vec![tx]);
    }
    out
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    struct Recorder {
        batches: RefCell<Vec<Vec<String>>>,
    }

    impl Signer for Recorder {
        fn chain(&self) -> Chain {
            Chain::Ethereum
        }

        fn address(&self) -> NativeAddress {
            NativeAddress::Evm([1; 20])
        }

        fn sign_and_send(&self, txs: &[UnsignedTransaction]) -> Result<Vec<TxHash>, Error> {
            let names: Vec<String> = txs.iter().map(|t| t.description.clone()).collect();
            self.batches.borrow_mut().push(names.clone());
            Ok(names.into_iter().map(|n| format!("0x{n}")).collect())
        }
    }

    fn tx(description: &str) -> UnsignedTransaction {
        UnsignedTransaction::new(Network::Testnet, Chain::Ethereum, description, json!({}))
    }

    #[test]
    fn sequential_transactions_are_sent_one_at_a_time() {
        let signer = Recorder {
            batches: RefCell::new(vec![]),
        };

        let ids = submit(
            &signer,
            vec![
                tx("approve"),
                tx("transfer"),
                tx("a").parallelizable(),
                tx("b").parallelizable(),
                tx("c"),
            ],
        )
        .unwrap();

        assert_eq!(
            vec![
                vec!["approve".to_string()],
                vec!["transfer".to_string()],
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
            ],
            *signer.batches.borrow()
        );
        assert_eq!(5, ids.len());
        assert_eq!("0xapprove", ids[0].txid);
        assert_eq!(Chain::Ethereum, ids[4].chain);
    }

    #[test]
    fn rejects_foreign_chain() {
        let signer = Recorder {
            batches: RefCell::new(vec![]),
        };
        let mut foreign = tx("redeem");
        foreign.chain = Chain::Solana;

        assert!(matches!(
            submit(&signer, vec![foreign]),
            Err(Error::InvalidState(_))
        ));
        assert!(signer.batches.borrow().is_empty());
    }
}
