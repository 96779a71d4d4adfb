//! The identifier registry.
//!
//! The [`Registry`] relates every [`Chain`] to its [`Platform`] and, per [`Network`], to the
//! identifier the chain uses natively: a numeric chain id on EVM chains, a genesis hash on
//! Solana, a chain-id string on Cosmos chains, the IBC channel pair connecting a Cosmos chain to
//! the gateway, and the Circle (CCTP) domain.
//!
//! All tables are authored in one direction only. The reverse direction is derived while the
//! registry is built, and the build fails if any derived map would not be a bijection. Once built
//! the registry is immutable and can be read from any thread without synchronization.
//!
//! # Example
//!
//! ```
//! use wormhole_connect_base::{Chain, Network, Platform, Registry};
//!
//! let registry = Registry::global().unwrap();
//!
//! assert_eq!(Platform::Evm, registry.platform(Chain::Base).unwrap());
//! assert_eq!(8453, registry.evm_chain_id(Network::Mainnet, Chain::Base).unwrap());
//! assert_eq!(Chain::Base, registry.evm_chain(Network::Mainnet, 8453).unwrap());
//! ```

use std::{borrow::Borrow, collections::HashMap, fmt::Debug, hash::Hash};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{Chain, Error, Network, Platform};

static REGISTRY: Lazy<Result<Registry, Error>> = Lazy::new(Registry::new);

const PLATFORM_CHAINS: &[(Platform, &[Chain])] = &[
    (
        Platform::Evm,
        &[
            Chain::Ethereum,
            Chain::Bsc,
            Chain::Polygon,
            Chain::Avalanche,
            Chain::Oasis,
            Chain::Aurora,
            Chain::Fantom,
            Chain::Karura,
            Chain::Acala,
            Chain::Klaytn,
            Chain::Celo,
            Chain::Moonbeam,
            Chain::Neon,
            Chain::Arbitrum,
            Chain::Optimism,
            Chain::Gnosis,
            Chain::Base,
            Chain::Sepolia,
        ],
    ),
    (Platform::Solana, &[Chain::Solana, Chain::Pythnet]),
    (
        Platform::Cosmwasm,
        &[
            Chain::Cosmoshub,
            Chain::Evmos,
            Chain::Injective,
            Chain::Kujira,
            Chain::Osmosis,
            Chain::Sei,
            Chain::Terra,
            Chain::Terra2,
            Chain::Wormchain,
            Chain::Xpla,
        ],
    ),
    (Platform::Btc, &[Chain::Btc]),
    (Platform::Algorand, &[Chain::Algorand]),
    (Platform::Sui, &[Chain::Sui]),
    (Platform::Aptos, &[Chain::Aptos]),
    (Platform::Near, &[Chain::Near]),
];

const EVM_CHAIN_IDS: &[(Network, &[(Chain, u64)])] = &[
    (
        Network::Mainnet,
        &[
            (Chain::Ethereum, 1),
            (Chain::Bsc, 56),
            (Chain::Polygon, 137),
            (Chain::Avalanche, 43114),
            (Chain::Oasis, 42262),
            (Chain::Aurora, 1313161554),
            (Chain::Fantom, 250),
            (Chain::Karura, 686),
            (Chain::Acala, 787),
            (Chain::Klaytn, 8217),
            (Chain::Celo, 42220),
            (Chain::Moonbeam, 1284),
            (Chain::Neon, 245022934),
            (Chain::Arbitrum, 42161),
            (Chain::Optimism, 10),
            (Chain::Gnosis, 100),
            (Chain::Base, 8453),
        ],
    ),
    (
        Network::Testnet,
        &[
            (Chain::Ethereum, 5),
            (Chain::Sepolia, 11155111),
            (Chain::Bsc, 97),
            (Chain::Polygon, 80001),
            (Chain::Avalanche, 43113),
            (Chain::Oasis, 42261),
            (Chain::Aurora, 1313161555),
            (Chain::Fantom, 4002),
            (Chain::Karura, 596),
            (Chain::Acala, 597),
            (Chain::Klaytn, 1001),
            (Chain::Celo, 44787),
            (Chain::Moonbeam, 1287),
            (Chain::Arbitrum, 421613),
            (Chain::Optimism, 420),
            (Chain::Gnosis, 77),
            (Chain::Base, 84531),
        ],
    ),
    (
        Network::Devnet,
        &[(Chain::Ethereum, 1337), (Chain::Bsc, 1397)],
    ),
];

// Solana has no small integer chain id; clusters are identified by their genesis hash.
const SOLANA_GENESIS_HASHES: &[(Network, Chain, &str)] = &[
    (
        Network::Mainnet,
        Chain::Solana,
        "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d",
    ),
    (
        Network::Testnet,
        Chain::Solana,
        "EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG",
    ),
];

const COSMWASM_CHAIN_IDS: &[(Network, Chain, &str)] = &[
    (Network::Mainnet, Chain::Cosmoshub, "cosmoshub-4"),
    (Network::Mainnet, Chain::Evmos, "evmos_9001-2"),
    (Network::Mainnet, Chain::Injective, "injective-1"),
    (Network::Mainnet, Chain::Kujira, "kaiyo-1"),
    (Network::Mainnet, Chain::Osmosis, "osmosis-1"),
    (Network::Mainnet, Chain::Sei, "pacific-1"),
    (Network::Mainnet, Chain::Terra, "columbus-5"),
    (Network::Mainnet, Chain::Terra2, "phoenix-1"),
    (Network::Mainnet, Chain::Wormchain, "wormchain"),
    (Network::Mainnet, Chain::Xpla, "dimension_37-1"),
    (Network::Testnet, Chain::Cosmoshub, "theta-testnet-001"),
    (Network::Testnet, Chain::Evmos, "evmos_9000-4"),
    (Network::Testnet, Chain::Injective, "injective-888"),
    (Network::Testnet, Chain::Kujira, "harpoon-4"),
    (Network::Testnet, Chain::Osmosis, "osmo-test-5"),
    (Network::Testnet, Chain::Sei, "atlantic-2"),
    (Network::Testnet, Chain::Terra2, "pisco-1"),
    (Network::Testnet, Chain::Wormchain, "wormchain-testnet-0"),
    (Network::Testnet, Chain::Xpla, "cube_47-5"),
];

const BECH32_PREFIXES: &[(Chain, &str)] = &[
    (Chain::Cosmoshub, "cosmos"),
    (Chain::Evmos, "evmos"),
    (Chain::Injective, "inj"),
    (Chain::Kujira, "kujira"),
    (Chain::Osmosis, "osmo"),
    (Chain::Sei, "sei"),
    (Chain::Terra, "terra"),
    (Chain::Terra2, "terra"),
    (Chain::Wormchain, "wormhole"),
    (Chain::Xpla, "xpla"),
];

// (network, chain, channel on the gateway, channel on the chain)
const IBC_CHANNELS: &[(Network, Chain, &str, &str)] = &[
    (Network::Mainnet, Chain::Osmosis, "channel-3", "channel-2186"),
    (Network::Mainnet, Chain::Evmos, "channel-5", "channel-94"),
    (Network::Mainnet, Chain::Kujira, "channel-9", "channel-113"),
    (Network::Testnet, Chain::Cosmoshub, "channel-5", "channel-3086"),
    (Network::Testnet, Chain::Osmosis, "channel-9", "channel-3906"),
    (Network::Devnet, Chain::Cosmoshub, "channel-1", "channel-1"),
    (Network::Devnet, Chain::Osmosis, "channel-2", "channel-1"),
];

const CIRCLE_DOMAINS: &[(Chain, u32)] = &[
    (Chain::Ethereum, 0),
    (Chain::Avalanche, 1),
    (Chain::Optimism, 2),
    (Chain::Arbitrum, 3),
    (Chain::Solana, 5),
    (Chain::Base, 6),
];

/// The chain routing IBC transfers into and out of Wormhole.
pub const GATEWAY: Chain = Chain::Wormchain;

/// The IBC channel pair connecting a chain to the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct IbcChannel {
    /// The channel end on the gateway.
    pub src_channel: String,
    /// The channel end on the connected chain.
    pub dst_channel: String,
}

/// A map that is a bijection between its keys and values.
#[derive(Debug, Clone)]
pub struct BiMap<K, V> {
    forward: HashMap<K, V>,
    reverse: HashMap<V, K>,
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Eq + Hash + Clone + Debug,
{
    /// Build the map, failing with `DuplicateEntry` if any key or any value appears twice.
    pub fn from_entries<I>(table: &'static str, entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();

        for (k, v) in entries {
            if forward.contains_key(&k) {
                return Err(Error::DuplicateEntry {
                    table,
                    key: format!("{k:?}"),
                });
            }
            if reverse.contains_key(&v) {
                return Err(Error::DuplicateEntry {
                    table,
                    key: format!("{v:?}"),
                });
            }

            let _ = reverse.insert(v.clone(), k.clone());
            let _ = forward.insert(k, v);
        }

        Ok(BiMap { forward, reverse })
    }

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(k)
    }

    pub fn get_key<Q>(&self, v: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.reverse.get(v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.forward.iter()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Validated, immutable identifier tables. See the [module documentation](self).
#[derive(Debug, Clone)]
pub struct Registry {
    platforms: HashMap<Chain, Platform>,
    chains: HashMap<Platform, Vec<Chain>>,
    evm_chain_ids: HashMap<Network, BiMap<Chain, u64>>,
    solana_genesis: BiMap<&'static str, (Network, Chain)>,
    cosmwasm_chain_ids: BiMap<&'static str, (Network, Chain)>,
    bech32_prefixes: HashMap<Chain, &'static str>,
    gateway_channels: HashMap<Network, BiMap<Chain, String>>,
    ibc_channels: HashMap<Network, HashMap<Chain, IbcChannel>>,
    circle_domains: BiMap<Chain, u32>,
}

impl Registry {
    /// The process-wide registry, built and validated on first use.
    pub fn global() -> Result<&'static Registry, Error> {
        REGISTRY.as_ref().map_err(Clone::clone)
    }

    /// Build and validate the registry from the built-in tables.
    pub fn new() -> Result<Registry, Error> {
        let mut platforms = HashMap::new();
        let mut chains = HashMap::new();
        for &(platform, members) in PLATFORM_CHAINS {
            for &chain in members {
                if platforms.insert(chain, platform).is_some() {
                    return Err(Error::DuplicateEntry {
                        table: "platform chains",
                        key: chain.to_string(),
                    });
                }
            }
            if chains.insert(platform, members.to_vec()).is_some() {
                return Err(Error::DuplicateEntry {
                    table: "platform chains",
                    key: platform.to_string(),
                });
            }
        }

        let belongs = |table: &'static str, chain: Chain, platform: Platform| {
            if platforms.get(&chain) == Some(&platform) {
                Ok(())
            } else {
                Err(Error::InvalidEntry {
                    table,
                    key: format!("{chain} is not a {platform} chain"),
                })
            }
        };

        let mut evm_chain_ids = HashMap::new();
        for &(network, ids) in EVM_CHAIN_IDS {
            for &(chain, _) in ids {
                belongs("evm chain ids", chain, Platform::Evm)?;
            }
            let map = BiMap::from_entries("evm chain ids", ids.iter().copied())?;
            if evm_chain_ids.insert(network, map).is_some() {
                return Err(Error::DuplicateEntry {
                    table: "evm chain ids",
                    key: network.to_string(),
                });
            }
        }

        for &(_, chain, _) in SOLANA_GENESIS_HASHES {
            belongs("solana genesis hashes", chain, Platform::Solana)?;
        }
        let solana_genesis = BiMap::from_entries(
            "solana genesis hashes",
            SOLANA_GENESIS_HASHES
                .iter()
                .map(|&(network, chain, hash)| (hash, (network, chain))),
        )?;

        for &(_, chain, _) in COSMWASM_CHAIN_IDS {
            belongs("cosmwasm chain ids", chain, Platform::Cosmwasm)?;
        }
        let cosmwasm_chain_ids = BiMap::from_entries(
            "cosmwasm chain ids",
            COSMWASM_CHAIN_IDS
                .iter()
                .map(|&(network, chain, id)| (id, (network, chain))),
        )?;

        let mut bech32_prefixes = HashMap::new();
        for &(chain, prefix) in BECH32_PREFIXES {
            belongs("bech32 prefixes", chain, Platform::Cosmwasm)?;
            if bech32_prefixes.insert(chain, prefix).is_some() {
                return Err(Error::DuplicateEntry {
                    table: "bech32 prefixes",
                    key: chain.to_string(),
                });
            }
        }
        for &chain in chains.get(&Platform::Cosmwasm).into_iter().flatten() {
            if !bech32_prefixes.contains_key(&chain) {
                return Err(Error::InvalidEntry {
                    table: "bech32 prefixes",
                    key: format!("{chain} has no prefix"),
                });
            }
        }

        let mut gateway_channels = HashMap::new();
        let mut ibc_channels = HashMap::new();
        for &network in Network::ALL {
            let entries: Vec<_> = IBC_CHANNELS
                .iter()
                .filter(|(n, ..)| *n == network)
                .collect();
            for &&(_, chain, ..) in &entries {
                belongs("ibc channels", chain, Platform::Cosmwasm)?;
            }

            // Channel ids on the gateway must be unique. The remote ends live on different chains
            // and may coincide.
            let gateway = BiMap::from_entries(
                "ibc channels",
                entries.iter().map(|&&(_, chain, src, _)| (chain, src.to_string())),
            )?;
            let pairs: HashMap<Chain, IbcChannel> = entries
                .iter()
                .map(|&&(_, chain, src, dst)| {
                    (
                        chain,
                        IbcChannel {
                            src_channel: src.into(),
                            dst_channel: dst.into(),
                        },
                    )
                })
                .collect();

            let _ = gateway_channels.insert(network, gateway);
            let _ = ibc_channels.insert(network, pairs);
        }

        let circle_domains = BiMap::from_entries("circle domains", CIRCLE_DOMAINS.iter().copied())?;

        Ok(Registry {
            platforms,
            chains,
            evm_chain_ids,
            solana_genesis,
            cosmwasm_chain_ids,
            bech32_prefixes,
            gateway_channels,
            ibc_channels,
            circle_domains,
        })
    }

    /// The platform `chain` runs on.
    pub fn platform(&self, chain: Chain) -> Result<Platform, Error> {
        self.platforms
            .get(&chain)
            .copied()
            .ok_or_else(|| Error::not_found("chain", chain))
    }

    /// All chains running on `platform`.
    pub fn chains(&self, platform: Platform) -> &[Chain] {
        self.chains.get(&platform).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The chain routing IBC transfers into and out of Wormhole.
    pub fn gateway(&self) -> Chain {
        GATEWAY
    }

    pub fn evm_chain_id(&self, network: Network, chain: Chain) -> Result<u64, Error> {
        self.evm_chain_ids
            .get(&network)
            .and_then(|m| m.get(&chain))
            .copied()
            .ok_or_else(|| Error::not_found("evm chain", format!("{network} {chain}")))
    }

    pub fn evm_chain(&self, network: Network, chain_id: u64) -> Result<Chain, Error> {
        self.evm_chain_ids
            .get(&network)
            .and_then(|m| m.get_key(&chain_id))
            .copied()
            .ok_or_else(|| Error::not_found("evm chain id", format!("{network} {chain_id}")))
    }

    pub fn solana_genesis_hash(&self, network: Network, chain: Chain) -> Result<&'static str, Error> {
        self.solana_genesis
            .get_key(&(network, chain))
            .copied()
            .ok_or_else(|| Error::not_found("solana chain", format!("{network} {chain}")))
    }

    /// Resolve the network and chain of a Solana cluster from its genesis hash.
    pub fn chain_from_genesis_hash(&self, hash: &str) -> Result<(Network, Chain), Error> {
        self.solana_genesis
            .get(hash)
            .copied()
            .ok_or_else(|| Error::not_found("genesis hash", hash))
    }

    pub fn cosmwasm_chain_id(&self, network: Network, chain: Chain) -> Result<&'static str, Error> {
        self.cosmwasm_chain_ids
            .get_key(&(network, chain))
            .copied()
            .ok_or_else(|| Error::not_found("cosmwasm chain", format!("{network} {chain}")))
    }

    pub fn chain_from_cosmwasm_chain_id(&self, chain_id: &str) -> Result<(Network, Chain), Error> {
        self.cosmwasm_chain_ids
            .get(chain_id)
            .copied()
            .ok_or_else(|| Error::not_found("cosmwasm chain id", chain_id))
    }

    /// The bech32 human readable prefix of addresses on a Cosmos chain.
    pub fn bech32_prefix(&self, chain: Chain) -> Result<&'static str, Error> {
        self.bech32_prefixes
            .get(&chain)
            .copied()
            .ok_or_else(|| Error::not_found("bech32 prefix", chain))
    }

    /// The channel pair connecting `chain` to the gateway.
    pub fn ibc_channel(&self, network: Network, chain: Chain) -> Result<&IbcChannel, Error> {
        self.ibc_channels
            .get(&network)
            .and_then(|m| m.get(&chain))
            .ok_or_else(|| Error::not_found("ibc channel", format!("{network} {chain}")))
    }

    /// Every chain connected to the gateway on `network`, with its channel pair.
    pub fn ibc_channels(&self, network: Network) -> impl Iterator<Item = (Chain, &IbcChannel)> {
        self.ibc_channels
            .get(&network)
            .into_iter()
            .flatten()
            .map(|(chain, channel)| (*chain, channel))
    }

    /// Resolve which chain a channel on the gateway leads to.
    pub fn chain_by_gateway_channel(&self, network: Network, channel: &str) -> Result<Chain, Error> {
        self.gateway_channels
            .get(&network)
            .and_then(|m| m.get_key(channel))
            .copied()
            .ok_or_else(|| Error::not_found("gateway channel", format!("{network} {channel}")))
    }

    pub fn circle_domain(&self, chain: Chain) -> Result<u32, Error> {
        self.circle_domains
            .get(&chain)
            .copied()
            .ok_or_else(|| Error::not_found("circle domain", chain))
    }

    pub fn chain_from_circle_domain(&self, domain: u32) -> Result<Chain, Error> {
        self.circle_domains
            .get_key(&domain)
            .copied()
            .ok_or_else(|| Error::not_found("circle domain", domain))
    }
}
