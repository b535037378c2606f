//! Network selection: per-network parameters plus their verified genesis blocks.

use kepler_consensus::params::{chain_params, ChainParams, ConsensusParams, Network, ParamsError};
use kepler_consensus::hash256_to_hex;
use kepler_pow::validation::IdentityHasher;
use kepler_primitives::block::Block;

use crate::genesis::{find_devnet_genesis, network_genesis, GenesisError};
use crate::index::{BlockIndex, IndexError};

pub const DEVNET_NAME_PREFIX: &str = "devnet";

#[derive(Debug)]
pub enum NetworkError {
    Params(ParamsError),
    Genesis(GenesisError),
    DevnetNameOnOtherNetwork(Network),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::Params(err) => write!(f, "{err}"),
            NetworkError::Genesis(err) => write!(f, "{err}"),
            NetworkError::DevnetNameOnOtherNetwork(network) => write!(
                f,
                "a devnet name was given but the selected network is {}",
                network.as_str()
            ),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<ParamsError> for NetworkError {
    fn from(err: ParamsError) -> Self {
        NetworkError::Params(err)
    }
}

impl From<GenesisError> for NetworkError {
    fn from(err: GenesisError) -> Self {
        NetworkError::Genesis(err)
    }
}

/// Everything a node needs to start on one network.
#[derive(Clone, Debug)]
pub struct SelectedNetwork {
    pub chain: ChainParams,
    pub genesis: Block,
    pub devnet_name: Option<String>,
    pub devnet_genesis: Option<Block>,
}

impl SelectedNetwork {
    pub fn network(&self) -> Network {
        self.chain.network
    }

    pub fn consensus(&self) -> &ConsensusParams {
        &self.chain.consensus
    }

    /// Header index seeded with the genesis block and, on a devnet, its second genesis.
    pub fn seed_index(&self) -> Result<BlockIndex, IndexError> {
        let mut index = BlockIndex::new();
        let params = self.consensus();
        index.accept_header(&self.genesis.header, &IdentityHasher, params)?;
        if let Some(devnet) = &self.devnet_genesis {
            index.accept_header(&devnet.header, &IdentityHasher, params)?;
        }
        Ok(index)
    }
}

/// `devnet` on its own, `devnet-<suffix>` otherwise. A bare `devnet` conf key reads as
/// "1" and so names `devnet-1`.
pub fn devnet_name(suffix: Option<&str>) -> String {
    match suffix.map(str::trim) {
        None | Some("") => DEVNET_NAME_PREFIX.to_string(),
        Some(suffix) => format!("{DEVNET_NAME_PREFIX}-{suffix}"),
    }
}

pub fn select_network(
    name: &str,
    devnet_suffix: Option<&str>,
) -> Result<SelectedNetwork, NetworkError> {
    let network = Network::parse(name)?;
    select_chain(chain_params(network), devnet_suffix)
}

/// Verifies the genesis of an already built `chain`; on a devnet, also searches for the
/// named devnet genesis and records its hash in the consensus parameters.
pub fn select_chain(
    mut chain: ChainParams,
    devnet_suffix: Option<&str>,
) -> Result<SelectedNetwork, NetworkError> {
    let network = chain.network;
    if devnet_suffix.is_some() && network != Network::Devnet {
        return Err(NetworkError::DevnetNameOnOtherNetwork(network));
    }

    let genesis = network_genesis(&chain)?;
    kepler_log::log_info!(
        "selected {} network, genesis {}",
        network.as_str(),
        hash256_to_hex(&genesis.hash())
    );

    if network != Network::Devnet {
        return Ok(SelectedNetwork {
            chain,
            genesis,
            devnet_name: None,
            devnet_genesis: None,
        });
    }

    let name = devnet_name(devnet_suffix);
    kepler_log::log_info!("searching devnet genesis for {name}");
    let devnet = find_devnet_genesis(&chain.consensus, &genesis, &name, chain.genesis.reward)?;
    let devnet_hash = devnet.hash();
    kepler_log::log_info!(
        "devnet {name} genesis {} (nonce {})",
        hash256_to_hex(&devnet_hash),
        devnet.header.nonce
    );
    chain.consensus.hash_devnet_genesis_block = Some(devnet_hash);

    Ok(SelectedNetwork {
        chain,
        genesis,
        devnet_name: Some(name),
        devnet_genesis: Some(devnet),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_names() {
        assert_eq!(devnet_name(None), "devnet");
        assert_eq!(devnet_name(Some("")), "devnet");
        assert_eq!(devnet_name(Some("1")), "devnet-1");
        assert_eq!(devnet_name(Some("kepler")), "devnet-kepler");
    }

    #[test]
    fn unknown_network_is_a_params_error() {
        let err = select_network("moonnet", None).expect_err("unknown");
        assert!(matches!(
            err,
            NetworkError::Params(ParamsError::UnknownNetwork(ref name)) if name == "moonnet"
        ));
    }

    #[test]
    fn devnet_name_requires_devnet() {
        let err = select_network("regtest", Some("x")).expect_err("regtest has no devnet name");
        assert!(matches!(
            err,
            NetworkError::DevnetNameOnOtherNetwork(Network::Regtest)
        ));
    }

    #[test]
    fn regtest_has_no_devnet_genesis() {
        let selected = select_network("regtest", None).expect("regtest");
        assert_eq!(selected.network(), Network::Regtest);
        assert!(selected.devnet_genesis.is_none());
        assert!(selected.consensus().hash_devnet_genesis_block.is_none());
        let index = selected.seed_index().expect("seed");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn devnet_seeds_two_genesis_blocks() {
        let selected = select_network("dev", None).expect("devnet");
        let devnet = selected.devnet_genesis.as_ref().expect("devnet genesis");
        assert_eq!(selected.devnet_name.as_deref(), Some("devnet"));
        assert_eq!(devnet.header.prev_block, selected.genesis.hash());
        assert_eq!(
            selected.consensus().hash_devnet_genesis_block,
            Some(devnet.hash())
        );

        let index = selected.seed_index().expect("seed");
        assert_eq!(index.len(), 2);
        let tip = index.best_tip().expect("tip");
        assert_eq!(index.node(tip).hash, devnet.hash());
        assert_eq!(index.node(tip).height, 1);
    }
}
