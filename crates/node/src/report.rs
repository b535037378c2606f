//! Serializable command outputs.

use std::fmt::Write as _;

use kepler_chainstate::SelectedNetwork;
use kepler_consensus::algo::ALL_ALGOS;
use kepler_consensus::deployments::ALL_DEPLOYMENTS;
use kepler_consensus::{block_subsidy, hash256_to_hex, Algo, Hash256};
use kepler_pow::difficulty::pow_limit_bits;
use kepler_pow::miner::MinedNonce;
use kepler_primitives::block::Block;

#[derive(Debug, serde::Serialize)]
pub struct PowLimitView {
    pub algo: &'static str,
    pub limit: String,
    pub bits: String,
}

#[derive(Debug, serde::Serialize)]
pub struct DeploymentView {
    pub name: &'static str,
    pub bit: u8,
    pub start_time: i64,
    pub timeout: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct ParamsReport {
    pub network: &'static str,
    pub devnet_name: Option<String>,
    pub genesis_hash: String,
    pub devnet_genesis_hash: Option<String>,
    pub message_start: String,
    pub default_port: u16,
    pub pow_target_spacing: i64,
    pub pow_averaging_interval: i64,
    pub max_adjust_up: i64,
    pub max_adjust_down: i64,
    pub block_sequential_algo_max_count: i32,
    pub subsidy_halving_interval: i32,
    pub first_block_subsidy: i64,
    pub pow_limits: Vec<PowLimitView>,
    pub rule_change_activation_threshold: u32,
    pub miner_confirmation_window: u32,
    pub deployments: Vec<DeploymentView>,
    pub dns_seeds: Vec<&'static str>,
}

impl ParamsReport {
    pub fn collect(selected: &SelectedNetwork) -> Self {
        let chain = &selected.chain;
        let params = selected.consensus();
        let pow_limits = ALL_ALGOS
            .iter()
            .map(|&algo| PowLimitView {
                algo: algo.name(),
                limit: hash256_to_hex(params.pow_limit_for(algo)),
                bits: format!("{:08x}", pow_limit_bits(params, algo)),
            })
            .collect();
        let deployments = ALL_DEPLOYMENTS
            .iter()
            .map(|&pos| {
                let deployment = params.deployment(pos);
                DeploymentView {
                    name: pos.name(),
                    bit: deployment.bit,
                    start_time: deployment.start_time,
                    timeout: deployment.timeout,
                }
            })
            .collect();

        Self {
            network: chain.network.as_str(),
            devnet_name: selected.devnet_name.clone(),
            genesis_hash: hash256_to_hex(&params.hash_genesis_block),
            devnet_genesis_hash: params.hash_devnet_genesis_block.as_ref().map(hash256_to_hex),
            message_start: hex_bytes(&chain.message_start),
            default_port: chain.default_port,
            pow_target_spacing: params.pow_target_spacing,
            pow_averaging_interval: params.pow_averaging_interval,
            max_adjust_up: params.max_adjust_up,
            max_adjust_down: params.max_adjust_down,
            block_sequential_algo_max_count: params.block_sequential_algo_max_count,
            subsidy_halving_interval: params.subsidy_halving_interval,
            first_block_subsidy: block_subsidy(selected.genesis.header.bits, 0, params, false),
            pow_limits,
            rule_change_activation_threshold: params.rule_change_activation_threshold,
            miner_confirmation_window: params.miner_confirmation_window,
            deployments,
            dns_seeds: chain.dns_seeds.to_vec(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "network: {}", self.network);
        if let Some(name) = &self.devnet_name {
            let _ = writeln!(out, "devnet name: {name}");
        }
        let _ = writeln!(out, "genesis: {}", self.genesis_hash);
        if let Some(hash) = &self.devnet_genesis_hash {
            let _ = writeln!(out, "devnet genesis: {hash}");
        }
        let _ = writeln!(out, "message start: {}", self.message_start);
        let _ = writeln!(out, "default port: {}", self.default_port);
        let _ = writeln!(
            out,
            "target spacing: {}s (averaging {} blocks, adjust up {}% down {}%)",
            self.pow_target_spacing,
            self.pow_averaging_interval,
            self.max_adjust_up,
            self.max_adjust_down
        );
        let _ = writeln!(
            out,
            "max sequential blocks per algorithm: {}",
            self.block_sequential_algo_max_count
        );
        let _ = writeln!(out, "subsidy halving interval: {}", self.subsidy_halving_interval);
        let _ = writeln!(out, "first block subsidy: {}", self.first_block_subsidy);
        for limit in &self.pow_limits {
            let _ = writeln!(out, "pow limit {}: {} ({})", limit.algo, limit.limit, limit.bits);
        }
        let _ = writeln!(
            out,
            "version bits: {}/{}",
            self.rule_change_activation_threshold, self.miner_confirmation_window
        );
        for deployment in &self.deployments {
            let _ = writeln!(
                out,
                "deployment {}: bit {} start {} timeout {}",
                deployment.name, deployment.bit, deployment.start_time, deployment.timeout
            );
        }
        for seed in &self.dns_seeds {
            let _ = writeln!(out, "seed: {seed}");
        }
        out.trim_end().to_string()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct BlockView {
    pub hash: String,
    pub prev_block: String,
    pub merkle_root: String,
    pub version: i32,
    pub algo: &'static str,
    pub time: u32,
    pub bits: String,
    pub nonce: u32,
}

impl BlockView {
    pub fn from_block(block: &Block) -> Self {
        let header = &block.header;
        Self {
            hash: hash256_to_hex(&block.hash()),
            prev_block: hash256_to_hex(&header.prev_block),
            merkle_root: hash256_to_hex(&header.merkle_root),
            version: header.version,
            algo: header.algo().name(),
            time: header.time,
            bits: format!("{:08x}", header.bits),
            nonce: header.nonce,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct GenesisReport {
    pub network: &'static str,
    pub genesis: BlockView,
    pub devnet_name: Option<String>,
    pub devnet_genesis: Option<BlockView>,
    pub tip_height: i32,
    pub chain_work: String,
}

impl GenesisReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "network: {}", self.network);
        write_block(&mut out, "genesis", &self.genesis);
        if let (Some(name), Some(block)) = (&self.devnet_name, &self.devnet_genesis) {
            write_block(&mut out, name, block);
        }
        let _ = writeln!(out, "tip height: {}", self.tip_height);
        let _ = write!(out, "chain work: {}", self.chain_work);
        out
    }
}

fn write_block(out: &mut String, label: &str, block: &BlockView) {
    let _ = writeln!(
        out,
        "{label}: {} (merkle {}, time {}, bits {}, nonce {}, version {})",
        block.hash, block.merkle_root, block.time, block.bits, block.nonce, block.version
    );
}

#[derive(Debug, serde::Serialize)]
pub struct MinedView {
    pub nonce: u32,
    pub pow_hash: String,
    pub block_hash: String,
}

#[derive(Debug, serde::Serialize)]
pub struct MineReport {
    pub network: &'static str,
    pub algo: &'static str,
    pub bits: String,
    pub start: u32,
    pub count: u32,
    pub found: Option<MinedView>,
}

impl MineReport {
    pub fn new(
        network: &'static str,
        algo: Algo,
        bits: u32,
        start: u32,
        count: u32,
        found: Option<(MinedNonce, Hash256)>,
    ) -> Self {
        Self {
            network,
            algo: algo.name(),
            bits: format!("{bits:08x}"),
            start,
            count,
            found: found.map(|(mined, block_hash)| MinedView {
                nonce: mined.nonce,
                pow_hash: hash256_to_hex(&mined.pow_hash),
                block_hash: hash256_to_hex(&block_hash),
            }),
        }
    }

    pub fn render_text(&self) -> String {
        let header = format!(
            "{} {} bits {} nonces {}..+{}",
            self.network, self.algo, self.bits, self.start, self.count
        );
        match &self.found {
            Some(found) => format!(
                "{header}\nnonce: {}\npow hash: {}\nblock hash: {}",
                found.nonce, found.pow_hash, found.block_hash
            ),
            None => format!("{header}\nno nonce found"),
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
