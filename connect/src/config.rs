//! In-memory configuration: service endpoints per network and the RPC endpoint and contract
//! addresses per chain. Loading it from a file is up to the caller; every type here deserializes
//! from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wormhole_connect_base::{Chain, Network};

use crate::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WormholeConfig {
    pub network: Network,
    /// Base URL of the guardian REST API.
    pub api: String,
    /// Base URL of Circle's attestation service, if CCTP is offered on this network.
    #[serde(default)]
    pub circle_api: Option<String>,
    #[serde(default)]
    pub chains: BTreeMap<Chain, ChainConfig>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    #[serde(default)]
    pub rpc: Option<String>,
    #[serde(default)]
    pub contracts: Contracts,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Contracts {
    pub core: Option<String>,
    pub token_bridge: Option<String>,
    pub token_bridge_relayer: Option<String>,
    pub cctp_token_messenger: Option<String>,
    pub cctp_message_transmitter: Option<String>,
    /// The IBC gateway contract, on the gateway chain.
    pub gateway: Option<String>,
    /// The contract on the gateway chain that receives token bridge transfers bound for Cosmos.
    pub translator: Option<String>,
}

impl WormholeConfig {
    /// A configuration with the public service endpoints for `network` and no chains.
    pub fn new(network: Network) -> Self {
        let (api, circle_api) = match network {
            Network::Mainnet => (
                "https://api.wormholescan.io",
                Some("https://iris-api.circle.com"),
            ),
            Network::Testnet => (
                "https://api.testnet.wormholescan.io",
                Some("https://iris-api-sandbox.circle.com"),
            ),
            Network::Devnet => ("http://localhost:7071", None),
        };

        WormholeConfig {
            network,
            api: api.into(),
            circle_api: circle_api.map(String::from),
            chains: BTreeMap::new(),
        }
    }

    pub fn with_chain(mut self, chain: Chain, config: ChainConfig) -> Self {
        let _ = self.chains.insert(chain, config);
        self
    }

    pub fn chain(&self, chain: Chain) -> Result<&ChainConfig, Error> {
        self.chains
            .get(&chain)
            .ok_or_else(|| Error::NotFound(format!("configuration for {chain} on {}", self.network)))
    }

    pub fn circle_api(&self) -> Result<&str, Error> {
        self.circle_api
            .as_deref()
            .ok_or_else(|| Error::Unsupported(format!("circle attestations on {}", self.network)))
    }
}

fn require<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .ok_or_else(|| Error::NotFound(format!("{what} is not configured")))
}

impl ChainConfig {
    pub fn rpc(&self) -> Result<&str, Error> {
        require(&self.rpc, "rpc endpoint")
    }
}

impl Contracts {
    pub fn core(&self) -> Result<&str, Error> {
        require(&self.core, "core contract")
    }

    pub fn token_bridge(&self) -> Result<&str, Error> {
        require(&self.token_bridge, "token bridge contract")
    }

    pub fn token_bridge_relayer(&self) -> Result<&str, Error> {
        require(&self.token_bridge_relayer, "token bridge relayer contract")
    }

    pub fn cctp_token_messenger(&self) -> Result<&str, Error> {
        require(&self.cctp_token_messenger, "cctp token messenger contract")
    }

    pub fn cctp_message_transmitter(&self) -> Result<&str, Error> {
        require(&self.cctp_message_transmitter, "cctp message transmitter contract")
    }

    pub fn gateway(&self) -> Result<&str, Error> {
        require(&self.gateway, "gateway contract")
    }

    pub fn translator(&self) -> Result<&str, Error> {
        require(&self.translator, "translator contract")
    }
}
