//! Provide types and data about the chains, platforms and networks Wormhole connects.
//!
//! This crate holds the leaves of the connect SDK:
//!
//! - The [`Chain`], [`Platform`] and [`Network`] identifiers.
//! - The [`Registry`], an immutable and validated set of bidirectional tables relating those
//!   identifiers to each platform's native identifiers (EVM chain ids, Solana genesis hashes,
//!   Cosmos chain ids, IBC channels, Circle domains).
//! - The address model: the canonical 32 byte [`UniversalAddress`] and the platform specific
//!   [`NativeAddress`].

#![deny(unused_results)]

pub mod address;
mod chain;
mod error;
mod network;
mod platform;
pub mod registry;

pub use address::{ChainAddress, CosmwasmAddress, NativeAddress, UniversalAddress};
pub use chain::{Chain, InvalidChainError};
pub use error::Error;
pub use network::Network;
pub use platform::Platform;
pub use registry::{IbcChannel, Registry};
