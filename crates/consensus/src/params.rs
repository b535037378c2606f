//! Consensus parameter definitions.

use crate::algo::{Algo, NUM_ALGOS};
use crate::deployments::{Deployment, DeploymentPos, Hash256, MAX_DEPLOYMENTS};
use crate::money::{Amount, COIN};

/// Below this tip height the retarget clamp is widened to +/-20%.
pub const BOOTSTRAP_RETARGET_HEIGHT: i32 = 2_999;
const BOOTSTRAP_MAX_ADJUST: i64 = 20;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Regtest,
}

pub const ALL_NETWORKS: [Network; 4] = [
    Network::Mainnet,
    Network::Testnet,
    Network::Devnet,
    Network::Regtest,
];

impl Network {
    /// Network identifier as used on the command line and in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "main",
            Network::Testnet => "test",
            Network::Devnet => "dev",
            Network::Regtest => "regtest",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParamsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Mainnet),
            "test" | "testnet" => Ok(Network::Testnet),
            "dev" | "devnet" => Ok(Network::Devnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(ParamsError::UnknownNetwork(raw.trim().to_string())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamsError {
    UnknownNetwork(String),
    DeploymentUpdateNotAllowed(Network),
    InvalidDeploymentWindow,
}

impl std::fmt::Display for ParamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamsError::UnknownNetwork(name) => write!(f, "unknown chain '{name}'"),
            ParamsError::DeploymentUpdateNotAllowed(network) => write!(
                f,
                "deployment windows can only be changed on regtest (network is {})",
                network.as_str()
            ),
            ParamsError::InvalidDeploymentWindow => {
                write!(f, "deployment timeout must not precede its start time")
            }
        }
    }
}

impl std::error::Error for ParamsError {}

#[derive(Clone, Debug)]
pub struct ConsensusParams {
    pub network: Network,
    pub hash_genesis_block: Hash256,
    pub hash_devnet_genesis_block: Option<Hash256>,
    pub subsidy_halving_interval: i32,
    pub masternode_payments_start_block: i32,
    pub budget_payments_start_block: i32,
    pub superblock_start_block: i32,
    pub bip34_height: i32,
    pub bip65_height: i32,
    pub bip66_height: i32,
    pub dip0001_height: i32,
    pub pow_limit: [Hash256; NUM_ALGOS],
    pub pow_target_timespan: i64,
    pub pow_target_spacing: i64,
    pub pow_averaging_interval: i64,
    pub max_adjust_down: i64,
    pub max_adjust_up: i64,
    pub block_sequential_algo_max_count: i32,
    pub rule_change_activation_threshold: u32,
    pub miner_confirmation_window: u32,
    pub deployments: [Deployment; MAX_DEPLOYMENTS],
    pub minimum_chain_work: Hash256,
}

impl ConsensusParams {
    pub fn pow_limit_for(&self, algo: Algo) -> &Hash256 {
        &self.pow_limit[algo.as_usize()]
    }

    pub fn averaging_target_timespan(&self) -> i64 {
        self.pow_averaging_interval * self.pow_target_spacing
    }

    pub fn min_actual_timespan(&self, last_height: i32) -> i64 {
        let adjust = if last_height < BOOTSTRAP_RETARGET_HEIGHT {
            BOOTSTRAP_MAX_ADJUST
        } else {
            self.max_adjust_up
        };
        (self.averaging_target_timespan() * (100 - adjust)) / 100
    }

    pub fn max_actual_timespan(&self, last_height: i32) -> i64 {
        let adjust = if last_height < BOOTSTRAP_RETARGET_HEIGHT {
            BOOTSTRAP_MAX_ADJUST
        } else {
            self.max_adjust_down
        };
        (self.averaging_target_timespan() * (100 + adjust)) / 100
    }

    pub fn deployment(&self, pos: DeploymentPos) -> &Deployment {
        &self.deployments[pos.as_usize()]
    }
}

#[derive(Debug)]
pub enum HexError {
    InvalidLength,
    InvalidHex,
}

impl std::fmt::Display for HexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HexError::InvalidLength => write!(f, "invalid hex length"),
            HexError::InvalidHex => write!(f, "invalid hex string"),
        }
    }
}

impl std::error::Error for HexError {}

/// Parses display-order hex (most significant byte first) into little-endian storage.
pub fn hash256_from_hex(input: &str) -> Result<Hash256, HexError> {
    let mut hex = input.trim();
    if let Some(stripped) = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")) {
        hex = stripped;
    }

    if hex.is_empty() {
        return Err(HexError::InvalidLength);
    }
    if hex.len() > 64 {
        return Err(HexError::InvalidLength);
    }

    let padded = format!("{hex:0>64}");
    let mut bytes = [0u8; 32];
    for (i, byte_out) in bytes.iter_mut().enumerate() {
        let start = i * 2;
        *byte_out =
            u8::from_str_radix(&padded[start..start + 2], 16).map_err(|_| HexError::InvalidHex)?;
    }
    bytes.reverse();

    Ok(bytes)
}

pub fn hash256_to_hex(hash: &Hash256) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(64);
    for byte in hash.iter().rev() {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

pub fn consensus_params(network: Network) -> ConsensusParams {
    match network {
        Network::Mainnet => mainnet_consensus_params(),
        Network::Testnet => testnet_consensus_params(),
        Network::Devnet => devnet_consensus_params(),
        Network::Regtest => regtest_consensus_params(),
    }
}

/// Inputs to the hard-coded first block of a network.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GenesisParams {
    pub time: u32,
    pub nonce: u32,
    pub bits: u32,
    pub version: i32,
    pub reward: Amount,
    pub expected_merkle_root: Hash256,
}

#[derive(Clone, Debug)]
pub struct ChainParams {
    pub network: Network,
    pub consensus: ConsensusParams,
    pub genesis: GenesisParams,
    pub message_start: [u8; 4],
    pub default_port: u16,
    pub prune_after_height: u64,
    pub dns_seeds: &'static [&'static str],
}

pub fn chain_params(network: Network) -> ChainParams {
    match network {
        Network::Mainnet => mainnet_chain_params(),
        Network::Testnet => testnet_chain_params(),
        Network::Devnet => devnet_chain_params(),
        Network::Regtest => regtest_chain_params(),
    }
}

/// Rewrites a deployment window. Only the regression-test network allows this, and only
/// before any block has been validated against the parameters.
pub fn update_regtest_deployment(
    params: &mut ConsensusParams,
    pos: DeploymentPos,
    start_time: i64,
    timeout: i64,
) -> Result<(), ParamsError> {
    if params.network != Network::Regtest {
        return Err(ParamsError::DeploymentUpdateNotAllowed(params.network));
    }
    if timeout < start_time {
        return Err(ParamsError::InvalidDeploymentWindow);
    }
    let deployment = &mut params.deployments[pos.as_usize()];
    deployment.start_time = start_time;
    deployment.timeout = timeout;
    Ok(())
}

const GENESIS_MERKLE_ROOT_HEX: &str =
    "b12d180972699070d6b043024f034254051ea8dec67278c63f491a3a53b3eb71";
const BASE_POW_LIMIT_HEX: &str =
    "0000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const DEVNET_BASE_GENESIS_HEX: &str =
    "51a09a57cbf522567530fa803a013d106c6c1eeb8baf7cb6b5063b5743143fc4";

fn parse_hash(hex: &str, what: &str) -> Hash256 {
    hash256_from_hex(hex).unwrap_or_else(|err| panic!("{what}: {err}"))
}

fn uniform_pow_limit() -> [Hash256; NUM_ALGOS] {
    let limit = parse_hash(BASE_POW_LIMIT_HEX, "pow limit");
    [limit; NUM_ALGOS]
}

fn mainnet_consensus_params() -> ConsensusParams {
    let mut pow_limit = uniform_pow_limit();
    pow_limit[Algo::NeoScrypt.as_usize()] = parse_hash(
        "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        "mainnet neoscrypt pow limit",
    );

    ConsensusParams {
        network: Network::Mainnet,
        hash_genesis_block: parse_hash(
            "74ed490627766be4b602d4deb0bc7c96345984bcf718e4a6813cb6d8810684f2",
            "mainnet genesis hash",
        ),
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 1_051_200,
        masternode_payments_start_block: 22_000,
        budget_payments_start_block: 10_000_000,
        superblock_start_block: 10_000_001,
        bip34_height: 1,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 1,
        pow_limit,
        pow_target_timespan: 24 * 60 * 60,
        pow_target_spacing: 120,
        pow_averaging_interval: 10,
        max_adjust_down: 4,
        max_adjust_up: 4,
        block_sequential_algo_max_count: 10,
        rule_change_activation_threshold: 1_916,
        miner_confirmation_window: 2_016,
        deployments: [Deployment {
            bit: 8,
            start_time: 1_199_145_601,
            timeout: 1_230_767_999,
        }],
        minimum_chain_work: [0u8; 32],
    }
}

fn testnet_consensus_params() -> ConsensusParams {
    ConsensusParams {
        network: Network::Testnet,
        hash_genesis_block: parse_hash(
            "0a874e921adbe90f37abefef32f159d81bfca39fb0e4a6922e3f9c9be88835fe",
            "testnet genesis hash",
        ),
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 1_051_200,
        masternode_payments_start_block: 130,
        budget_payments_start_block: 4_100,
        superblock_start_block: 4_200,
        bip34_height: 5,
        bip65_height: 10,
        bip66_height: 15,
        dip0001_height: 20,
        pow_limit: uniform_pow_limit(),
        pow_target_timespan: 24 * 60 * 60,
        pow_target_spacing: 120,
        pow_averaging_interval: 10,
        max_adjust_down: 4,
        max_adjust_up: 4,
        block_sequential_algo_max_count: 20,
        rule_change_activation_threshold: 1_512,
        miner_confirmation_window: 2_016,
        deployments: [Deployment {
            bit: 28,
            start_time: 1_199_145_601,
            timeout: 1_230_767_999,
        }],
        minimum_chain_work: parse_hash(
            "000000000000000000000000000000000000000000000000003be69c34b1244f",
            "testnet minimum chain work",
        ),
    }
}

fn devnet_consensus_params() -> ConsensusParams {
    ConsensusParams {
        network: Network::Devnet,
        hash_genesis_block: parse_hash(DEVNET_BASE_GENESIS_HEX, "devnet genesis hash"),
        // Filled in once the devnet genesis has been searched for.
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 210_240,
        masternode_payments_start_block: 40,
        budget_payments_start_block: 4_100,
        superblock_start_block: 4_200,
        bip34_height: 1,
        bip65_height: 1,
        bip66_height: 1,
        dip0001_height: 2,
        pow_limit: uniform_pow_limit(),
        pow_target_timespan: 24 * 60 * 60,
        pow_target_spacing: 120,
        pow_averaging_interval: 10,
        max_adjust_down: 4,
        max_adjust_up: 4,
        block_sequential_algo_max_count: 10,
        rule_change_activation_threshold: 1_512,
        miner_confirmation_window: 2_016,
        deployments: [Deployment {
            bit: 28,
            start_time: 1_199_145_601,
            timeout: 1_230_767_999,
        }],
        minimum_chain_work: [0u8; 32],
    }
}

fn regtest_consensus_params() -> ConsensusParams {
    ConsensusParams {
        network: Network::Regtest,
        hash_genesis_block: parse_hash(DEVNET_BASE_GENESIS_HEX, "regtest genesis hash"),
        hash_devnet_genesis_block: None,
        subsidy_halving_interval: 150,
        masternode_payments_start_block: 40,
        budget_payments_start_block: 1_000,
        superblock_start_block: 1_500,
        bip34_height: 100_000_000,
        bip65_height: 1_351,
        bip66_height: 1_251,
        dip0001_height: 2_000,
        pow_limit: uniform_pow_limit(),
        pow_target_timespan: 24 * 60 * 60,
        pow_target_spacing: 120,
        pow_averaging_interval: 10,
        max_adjust_down: 4,
        max_adjust_up: 4,
        block_sequential_algo_max_count: 10,
        rule_change_activation_threshold: 108,
        miner_confirmation_window: 144,
        deployments: [Deployment {
            bit: 28,
            start_time: 0,
            timeout: 999_999_999_999,
        }],
        minimum_chain_work: [0u8; 32],
    }
}

fn kepler_genesis(time: u32, nonce: u32, bits: u32) -> GenesisParams {
    GenesisParams {
        time,
        nonce,
        bits,
        version: 1,
        reward: 50 * COIN,
        expected_merkle_root: parse_hash(GENESIS_MERKLE_ROOT_HEX, "genesis merkle root"),
    }
}

const MAINNET_DNS_SEEDS: [&str; 2] = ["seed1.kepler.cash", "seed2.kepler.cash"];
const TESTNET_DNS_SEEDS: [&str; 1] = ["testseed.kepler.cash"];
const NO_DNS_SEEDS: [&str; 0] = [];

fn mainnet_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Mainnet,
        consensus: mainnet_consensus_params(),
        genesis: kepler_genesis(1_555_986_291, 36_257_733, 0x1e0f_fff0),
        message_start: [0xbf, 0xc6, 0xde, 0xbe],
        default_port: 12_102,
        prune_after_height: 100_000,
        dns_seeds: &MAINNET_DNS_SEEDS,
    }
}

fn testnet_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Testnet,
        consensus: testnet_consensus_params(),
        genesis: kepler_genesis(1_390_666_206, 3_861_367_235, 0x1e0f_fff0),
        message_start: [0xcd, 0x5a, 0xd6, 0xf8],
        default_port: 12_202,
        prune_after_height: 1_000,
        dns_seeds: &TESTNET_DNS_SEEDS,
    }
}

fn devnet_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Devnet,
        consensus: devnet_consensus_params(),
        genesis: kepler_genesis(1_417_713_337, 1_096_447, 0x207f_ffff),
        message_start: [0xe2, 0xca, 0xff, 0xce],
        default_port: 12_202,
        prune_after_height: 1_000,
        dns_seeds: &NO_DNS_SEEDS,
    }
}

fn regtest_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Regtest,
        consensus: regtest_consensus_params(),
        genesis: kepler_genesis(1_417_713_337, 1_096_447, 0x207f_ffff),
        message_start: [0xfc, 0xc1, 0xb7, 0xdc],
        default_port: 19_994,
        prune_after_height: 1_000,
        dns_seeds: &NO_DNS_SEEDS,
    }
}
