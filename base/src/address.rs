//! The cross-chain address model.
//!
//! Wormhole specifies addresses as 32 bytes. Every platform's native address converts losslessly
//! to and from that [`UniversalAddress`] form: addresses that are shorter, for example 20 byte
//! Ethereum addresses, are left zero padded to 32.

use std::{fmt, str::FromStr};

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{Chain, Error, Platform, Registry};

/// A canonical 32 byte address, independent of the platform it came from.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct UniversalAddress(pub [u8; 32]);

impl UniversalAddress {
    pub const ZERO: UniversalAddress = UniversalAddress([0; 32]);

    /// Left zero pads `bytes` to 32. Fails if `bytes` is wider than 32.
    pub fn left_pad(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() > 32 {
            return Err(Error::invalid_address(
                "universal",
                format_args!("{} bytes, max 32", bytes.len()),
            ));
        }

        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(UniversalAddress(buf))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn leading_zeros(&self) -> usize {
        self.0.iter().take_while(|b| **b == 0).count()
    }
}

impl fmt::Display for UniversalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for UniversalAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|e| Error::invalid_address("universal", e))?;
        if bytes.len() != 32 {
            return Err(Error::invalid_address(
                "universal",
                format_args!("{} bytes, expected 32", bytes.len()),
            ));
        }

        UniversalAddress::left_pad(&bytes)
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(bytes: [u8; 32]) -> Self {
        UniversalAddress(bytes)
    }
}

/// An address in the encoding its platform uses natively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NativeAddress {
    /// 20 byte account, rendered as EIP-55 checksummed hex.
    Evm([u8; 20]),
    /// 32 byte ed25519 public key, rendered as base58.
    Solana([u8; 32]),
    /// 20 byte account or 32 byte contract address, rendered as bech32 with the chain's prefix.
    Cosmwasm(CosmwasmAddress),
    /// Platforms whose native address is already 32 bytes, rendered as hex.
    Raw { platform: Platform, bytes: [u8; 32] },
}

impl NativeAddress {
    pub fn platform(&self) -> Platform {
        match self {
            NativeAddress::Evm(_) => Platform::Evm,
            NativeAddress::Solana(_) => Platform::Solana,
            NativeAddress::Cosmwasm(_) => Platform::Cosmwasm,
            NativeAddress::Raw { platform, .. } => *platform,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            NativeAddress::Evm(b) => b,
            NativeAddress::Solana(b) => b,
            NativeAddress::Cosmwasm(a) => a.bytes(),
            NativeAddress::Raw { bytes, .. } => bytes,
        }
    }

    pub fn to_universal(&self) -> UniversalAddress {
        let bytes = self.as_bytes();
        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(bytes);
        UniversalAddress(buf)
    }

    /// Decode `address` into the native form used on `chain`.
    ///
    /// A 32 byte Cosmos address whose first 12 bytes are zero is indistinguishable from a padded
    /// 20 byte account and decodes as one.
    pub fn from_universal(chain: Chain, address: &UniversalAddress) -> Result<Self, Error> {
        Self::from_universal_in(Registry::global()?, chain, address)
    }

    pub fn from_universal_in(
        registry: &Registry,
        chain: Chain,
        address: &UniversalAddress,
    ) -> Result<Self, Error> {
        let platform = registry.platform(chain)?;
        let bytes = address.0;

        match platform {
            Platform::Evm => {
                if address.leading_zeros() < 12 {
                    return Err(Error::invalid_address(
                        platform,
                        format_args!("{address} does not fit in 20 bytes"),
                    ));
                }

                let mut buf = [0u8; 20];
                buf.copy_from_slice(&bytes[12..]);
                Ok(NativeAddress::Evm(buf))
            }
            Platform::Solana => Ok(NativeAddress::Solana(bytes)),
            Platform::Cosmwasm => {
                let prefix = registry.bech32_prefix(chain)?.to_string();
                let bytes = if address.leading_zeros() >= 12 {
                    bytes[12..].to_vec()
                } else {
                    bytes.to_vec()
                };

                Ok(NativeAddress::Cosmwasm(CosmwasmAddress::new(prefix, bytes)?))
            }
            _ => Ok(NativeAddress::Raw { platform, bytes }),
        }
    }

    /// Parse the textual form an address takes on `chain`.
    pub fn parse(chain: Chain, s: &str) -> Result<Self, Error> {
        Self::parse_in(Registry::global()?, chain, s)
    }

    pub fn parse_in(registry: &Registry, chain: Chain, s: &str) -> Result<Self, Error> {
        let platform = registry.platform(chain)?;

        match platform {
            Platform::Evm => {
                let bytes = decode_hex(s).map_err(|e| Error::invalid_address(platform, e))?;
                let buf = <[u8; 20]>::try_from(bytes.as_slice()).map_err(|_| {
                    Error::invalid_address(platform, format_args!("{} bytes, expected 20", bytes.len()))
                })?;

                Ok(NativeAddress::Evm(buf))
            }
            Platform::Solana => {
                let bytes = bs58::decode(s)
                    .into_vec()
                    .map_err(|e| Error::invalid_address(platform, e))?;
                let buf = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
                    Error::invalid_address(platform, format_args!("{} bytes, expected 32", bytes.len()))
                })?;

                Ok(NativeAddress::Solana(buf))
            }
            Platform::Cosmwasm => {
                let expected = registry.bech32_prefix(chain)?;
                let (hrp, bytes) =
                    bech32::decode(s).map_err(|e| Error::invalid_address(platform, e))?;

                if hrp.as_str() != expected {
                    return Err(Error::invalid_address(
                        platform,
                        format_args!("prefix {hrp}, expected {expected} on {chain}"),
                    ));
                }
                if bytes.len() != 20 && bytes.len() != 32 {
                    return Err(Error::invalid_address(
                        platform,
                        format_args!("{} bytes, expected 20 or 32", bytes.len()),
                    ));
                }

                Ok(NativeAddress::Cosmwasm(CosmwasmAddress::new(expected, bytes)?))
            }
            _ => {
                let bytes = decode_hex(s).map_err(|e| Error::invalid_address(platform, e))?;
                let bytes = UniversalAddress::left_pad(&bytes)
                    .map_err(|_| Error::invalid_address(platform, "wider than 32 bytes"))?
                    .0;

                Ok(NativeAddress::Raw { platform, bytes })
            }
        }
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeAddress::Evm(bytes) => f.write_str(&to_checksum(bytes)),
            NativeAddress::Solana(bytes) => f.write_str(&bs58::encode(bytes).into_string()),
            NativeAddress::Cosmwasm(a) => {
                let hrp = Hrp::parse(&a.prefix).map_err(|_| fmt::Error)?;
                let s = bech32::encode::<Bech32>(hrp, &a.bytes).map_err(|_| fmt::Error)?;
                f.write_str(&s)
            }
            NativeAddress::Raw { bytes, .. } => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

/// A Cosmos account or contract: a bech32 prefix and at most 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CosmwasmAddress {
    prefix: String,
    bytes: Vec<u8>,
}

impl CosmwasmAddress {
    pub fn new(prefix: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(Error::invalid_address(
                Platform::Cosmwasm,
                format_args!("{} bytes, expected 1 to 32", bytes.len()),
            ));
        }

        Ok(CosmwasmAddress {
            prefix: prefix.into(),
            bytes,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// An address qualified by the chain it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainAddress {
    pub chain: Chain,
    pub address: NativeAddress,
}

impl ChainAddress {
    pub fn new(chain: Chain, address: NativeAddress) -> Self {
        ChainAddress { chain, address }
    }

    pub fn parse(chain: Chain, s: &str) -> Result<Self, Error> {
        NativeAddress::parse(chain, s).map(|address| ChainAddress { chain, address })
    }

    pub fn from_universal(chain: Chain, address: &UniversalAddress) -> Result<Self, Error> {
        NativeAddress::from_universal(chain, address).map(|address| ChainAddress { chain, address })
    }

    pub fn to_universal(&self) -> UniversalAddress {
        self.address.to_universal()
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() % 2 == 1 {
        hex::decode(format!("0{s}"))
    } else {
        hex::decode(s)
    }
}

// EIP-55: uppercase each hex letter whose nibble in keccak256(lowercase hex) is >= 8.
fn to_checksum(bytes: &[u8; 20]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };

        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}
