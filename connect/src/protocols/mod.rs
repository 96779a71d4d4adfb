//! The capabilities a platform adapter implements, one trait per bridging protocol, and the
//! helpers adapters share for turning their chain's logs and events into the common data model.

pub mod automatic;
pub mod circle;
pub mod ibc;
pub mod token_bridge;

pub use automatic::AutomaticTokenBridge;
pub use circle::{CircleBridge, CircleTransferTransaction, DepositForBurn};
pub use ibc::{
    IbcBridge, IbcLookup, IbcMessageId, IbcTransferInfo, IndexedTx, PacketCommitment, TxEvent,
};
pub use token_bridge::{PublishedMessage, TokenBridge, TokenTransferTransaction};
