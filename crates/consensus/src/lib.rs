//! Consensus constants, algorithm slots, and per-network parameters.

pub mod algo;
pub mod constants;
pub mod deployments;
pub mod money;
pub mod params;
pub mod rewards;

pub use algo::{algo_from_version, base_version, Algo, ALL_ALGOS, NUM_ALGOS};
pub use deployments::{Deployment, DeploymentPos, Hash256};
pub use params::{
    chain_params, consensus_params, hash256_from_hex, hash256_to_hex, ChainParams,
    ConsensusParams, GenesisParams, Network, ParamsError,
};
pub use rewards::block_subsidy;
