use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A family of chains sharing one execution environment, address format and adapter
/// implementation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Evm,
    Solana,
    Cosmwasm,
    Btc,
    Algorand,
    Sui,
    Aptos,
    Near,
}

impl Platform {
    pub const ALL: &'static [Platform] = &[
        Platform::Evm,
        Platform::Solana,
        Platform::Cosmwasm,
        Platform::Btc,
        Platform::Algorand,
        Platform::Sui,
        Platform::Aptos,
        Platform::Near,
    ];

    /// Decimals of the platform's native gas token.
    pub fn native_decimals(self) -> u8 {
        match self {
            Platform::Evm => 18,
            Platform::Solana => 9,
            Platform::Cosmwasm => 6,
            Platform::Btc => 8,
            Platform::Algorand => 6,
            Platform::Sui => 9,
            Platform::Aptos => 8,
            Platform::Near => 24,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Evm => "Evm",
            Platform::Solana => "Solana",
            Platform::Cosmwasm => "Cosmwasm",
            Platform::Btc => "Btc",
            Platform::Algorand => "Algorand",
            Platform::Sui => "Sui",
            Platform::Aptos => "Aptos",
            Platform::Near => "Near",
        };

        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| s.eq_ignore_ascii_case(&p.to_string()))
            .ok_or_else(|| Error::not_found("platform", s))
    }
}
