//! Move tokens between chains over Wormhole.
//!
//! The crate is split along the seams of a transfer:
//!
//! - [`protocols`] holds the capability traits a platform adapter implements for each bridging
//!   protocol (token bridge, relayed token bridge, Circle CCTP, IBC through the gateway) and the
//!   helpers adapters share for reading their chain's logs.
//! - [`api`] abstracts the off-chain attestation services.
//! - [`Wormhole`] ties a network's configuration to the adapters registered for each chain.
//! - [`transfer`] drives a transfer from creation to completion, and rebuilds one from its
//!   source transaction or message id.
//!
//! Nothing here talks to a chain directly. Every query and every broadcast goes through an
//! adapter or a [`Signer`] supplied by the caller.

#![deny(unused_results)]

pub mod api;
pub mod config;
mod error;
pub mod lookup;
pub mod protocols;
pub mod transfer;
mod types;
mod wormhole;

pub use config::{ChainConfig, Contracts, WormholeConfig};
pub use error::Error;
pub use lookup::Lookup;
pub use transfer::{
    circle::CircleTransfer, gateway::GatewayTransfer, token::TokenTransfer, TransferState,
    WormholeTransfer,
};
pub use types::{submit, Signer, TokenAddress, TokenId, TransactionId, TxHash, UnsignedTransaction};
pub use wormhole::Wormhole;

pub use wormhole_connect_base as base;
pub use wormhole_connect_vaas as vaas;
