use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The deployment a chain is configured for. A `(Network, Chain)` pair is the unit of
/// configuration throughout the SDK.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    /// A local development network.
    Devnet,
}

impl Network {
    pub const ALL: &'static [Network] = &[Network::Mainnet, Network::Testnet, Network::Devnet];
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("Mainnet"),
            Network::Testnet => f.write_str("Testnet"),
            Network::Devnet => f.write_str("Devnet"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .iter()
            .copied()
            .find(|n| s.eq_ignore_ascii_case(&n.to_string()))
            .ok_or_else(|| Error::not_found("network", s))
    }
}
