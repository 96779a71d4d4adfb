use std::{collections::HashMap, sync::Arc};

use wormhole_connect_base::{Chain, Network, Platform, Registry, UniversalAddress};
use wormhole_connect_vaas::{
    circle::{CircleAttestation, CircleMessage},
    Payload, Vaa, WormholeMessageId,
};

use crate::{
    api::{self, CircleAttestationProvider, VaaProvider},
    config::{ChainConfig, WormholeConfig},
    protocols::{AutomaticTokenBridge, CircleBridge, IbcBridge, TokenBridge},
    Error,
};

#[derive(Default, Clone)]
struct Adapters {
    token_bridge: Option<Arc<dyn TokenBridge>>,
    automatic_token_bridge: Option<Arc<dyn AutomaticTokenBridge>>,
    circle_bridge: Option<Arc<dyn CircleBridge>>,
    ibc_bridge: Option<Arc<dyn IbcBridge>>,
}

/// The protocol context: one network, its configuration, the attestation services and the
/// platform adapters registered for each chain.
#[derive(Clone)]
pub struct Wormhole {
    config: WormholeConfig,
    registry: &'static Registry,
    vaas: Arc<dyn VaaProvider>,
    circle_attestations: Option<Arc<dyn CircleAttestationProvider>>,
    chains: HashMap<Chain, Adapters>,
}

impl Wormhole {
    pub fn new(config: WormholeConfig, vaas: Arc<dyn VaaProvider>) -> Result<Self, Error> {
        Ok(Wormhole {
            config,
            registry: Registry::global()?,
            vaas,
            circle_attestations: None,
            chains: HashMap::new(),
        })
    }

    pub fn with_circle_attestations(mut self, provider: Arc<dyn CircleAttestationProvider>) -> Self {
        self.circle_attestations = Some(provider);
        self
    }

    pub fn with_token_bridge(mut self, bridge: Arc<dyn TokenBridge>) -> Self {
        self.chains.entry(bridge.chain()).or_default().token_bridge = Some(bridge);
        self
    }

    pub fn with_automatic_token_bridge(mut self, bridge: Arc<dyn AutomaticTokenBridge>) -> Self {
        self.chains
            .entry(bridge.chain())
            .or_default()
            .automatic_token_bridge = Some(bridge);
        self
    }

    pub fn with_circle_bridge(mut self, bridge: Arc<dyn CircleBridge>) -> Self {
        self.chains.entry(bridge.chain()).or_default().circle_bridge = Some(bridge);
        self
    }

    pub fn with_ibc_bridge(mut self, bridge: Arc<dyn IbcBridge>) -> Self {
        self.chains.entry(bridge.chain()).or_default().ibc_bridge = Some(bridge);
        self
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn config(&self) -> &WormholeConfig {
        &self.config
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub fn chain_config(&self, chain: Chain) -> Result<&ChainConfig, Error> {
        self.config.chain(chain)
    }

    pub fn platform(&self, chain: Chain) -> Result<Platform, Error> {
        Ok(self.registry.platform(chain)?)
    }

    /// Whether `chain` is a Cosmos chain connected to the gateway over IBC on this network.
    /// Cosmwasm chains with their own token bridge, and the gateway itself, are not.
    pub fn is_ibc_chain(&self, chain: Chain) -> Result<bool, Error> {
        if self.platform(chain)? != Platform::Cosmwasm || chain == self.registry.gateway() {
            return Ok(false);
        }

        Ok(self.registry.ibc_channel(self.network(), chain).is_ok())
    }

    fn adapters(&self, chain: Chain) -> Option<&Adapters> {
        self.chains.get(&chain)
    }

    pub fn token_bridge(&self, chain: Chain) -> Result<Arc<dyn TokenBridge>, Error> {
        self.adapters(chain)
            .and_then(|a| a.token_bridge.clone())
            .ok_or_else(|| Error::NotFound(format!("token bridge on {chain}")))
    }

    /// Relayed transfers are not offered on a development network.
    pub fn automatic_token_bridge(&self, chain: Chain) -> Result<Arc<dyn AutomaticTokenBridge>, Error> {
        if self.network() == Network::Devnet {
            return Err(Error::Unsupported(format!(
                "automatic token bridge on {}",
                self.network()
            )));
        }

        self.adapters(chain)
            .and_then(|a| a.automatic_token_bridge.clone())
            .ok_or_else(|| Error::NotFound(format!("automatic token bridge on {chain}")))
    }

    /// CCTP is offered outside of development networks, on chains Circle assigned a domain to.
    pub fn circle_bridge(&self, chain: Chain) -> Result<Arc<dyn CircleBridge>, Error> {
        if self.network() == Network::Devnet {
            return Err(Error::Unsupported(format!("circle bridge on {}", self.network())));
        }
        if self.registry.circle_domain(chain).is_err() {
            return Err(Error::Unsupported(format!("circle bridge on {chain}")));
        }

        self.adapters(chain)
            .and_then(|a| a.circle_bridge.clone())
            .ok_or_else(|| Error::NotFound(format!("circle bridge on {chain}")))
    }

    pub fn ibc_bridge(&self, chain: Chain) -> Result<Arc<dyn IbcBridge>, Error> {
        self.adapters(chain)
            .and_then(|a| a.ibc_bridge.clone())
            .ok_or_else(|| Error::NotFound(format!("ibc bridge on {chain}")))
    }

    /// The token bridge relayer contract on `chain`, if one is configured.
    pub fn relayer_address(&self, chain: Chain) -> Option<UniversalAddress> {
        let relayer = self.config.chain(chain).ok()?.contracts.token_bridge_relayer().ok()?;
        wormhole_connect_base::NativeAddress::parse(chain, relayer)
            .ok()
            .map(|a| a.to_universal())
    }

    /// The gateway contract that receives token bridge transfers bound for Cosmos.
    pub fn translator_address(&self) -> Result<UniversalAddress, Error> {
        let gateway = self.registry.gateway();
        let translator = self.config.chain(gateway)?.contracts.translator()?;

        Ok(wormhole_connect_base::NativeAddress::parse(gateway, translator)?.to_universal())
    }

    /// One attempt at fetching the VAA for `id`. See [`api::fetch_vaa`].
    pub fn get_vaa(&self, id: &WormholeMessageId) -> Result<Vaa<Payload>, Error> {
        api::fetch_vaa(self.vaas.as_ref(), id)
    }

    /// One attempt at fetching the Circle attestation for `message`.
    pub fn get_circle_attestation(&self, message: &CircleMessage) -> Result<CircleAttestation, Error> {
        let provider = self.circle_attestations.as_deref().ok_or_else(|| {
            Error::Unsupported(format!("circle attestations on {}", self.network()))
        })?;

        api::fetch_circle_attestation(provider, message)
    }
}
