//! `keplerd` library: network selection, genesis verification and diagnostics.

pub mod cli;
pub mod conf;
pub mod report;

use kepler_chainstate::network::select_chain;
use kepler_chainstate::SelectedNetwork;
use kepler_consensus::params::{chain_params, update_regtest_deployment, ChainParams};
use kepler_consensus::hash256_to_hex;
use kepler_pow::difficulty::pow_limit_bits;
use kepler_pow::miner::mine_nonce;
use kepler_pow::validation::IdentityHasher;

use crate::cli::{parse_args, usage, CliAction, Command, Config};
use crate::report::{BlockView, GenesisReport, MineReport, ParamsReport};

pub fn run_entry() -> Result<(), String> {
    match parse_args()? {
        CliAction::PrintHelp => {
            println!("{}", usage());
            Ok(())
        }
        CliAction::PrintVersion => {
            println!("keplerd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::Run(config) => {
            kepler_log::init(config.log);
            kepler_log::log_info!(
                "keplerd {} starting ({} network)",
                env!("CARGO_PKG_VERSION"),
                config.network.as_str()
            );
            let output = execute(&config)?;
            println!("{output}");
            Ok(())
        }
    }
}

/// Consensus parameters for `config`, with any `--vbparams` overrides applied.
pub fn configured_chain(config: &Config) -> Result<ChainParams, String> {
    let mut chain = chain_params(config.network);
    for vb in &config.vbparams {
        update_regtest_deployment(&mut chain.consensus, vb.deployment, vb.start_time, vb.timeout)
            .map_err(|err| err.to_string())?;
        kepler_log::log_info!(
            "deployment {} window set to {}..{}",
            vb.deployment.name(),
            vb.start_time,
            vb.timeout
        );
    }
    Ok(chain)
}

/// Runs the selected command and returns what should be printed.
pub fn execute(config: &Config) -> Result<String, String> {
    let chain = configured_chain(config)?;
    let selected =
        select_chain(chain, config.devnet_suffix.as_deref()).map_err(|err| err.to_string())?;

    match config.command {
        Command::Params => {
            let report = ParamsReport::collect(&selected);
            render(config, &report, ParamsReport::render_text)
        }
        Command::VerifyGenesis => {
            let report = verify_genesis(&selected)?;
            render(config, &report, GenesisReport::render_text)
        }
        Command::MineGenesis => {
            let report = mine_genesis(&selected, config);
            render(config, &report, MineReport::render_text)
        }
    }
}

fn render<T: serde::Serialize>(
    config: &Config,
    report: &T,
    text: impl Fn(&T) -> String,
) -> Result<String, String> {
    if config.json {
        serde_json::to_string_pretty(report).map_err(|err| err.to_string())
    } else {
        Ok(text(report))
    }
}

fn verify_genesis(selected: &SelectedNetwork) -> Result<GenesisReport, String> {
    let index = selected.seed_index().map_err(|err| err.to_string())?;
    let tip = index
        .best_tip()
        .ok_or_else(|| "header index is empty after seeding".to_string())?;
    let tip = index.node(tip);
    Ok(GenesisReport {
        network: selected.network().as_str(),
        genesis: BlockView::from_block(&selected.genesis),
        devnet_name: selected.devnet_name.clone(),
        devnet_genesis: selected.devnet_genesis.as_ref().map(BlockView::from_block),
        tip_height: tip.height,
        chain_work: format!("{:#x}", tip.chain_work),
    })
}

/// Re-targets the genesis header at one algorithm's limit and grinds its nonce with the
/// double-SHA256 stand-in hasher.
fn mine_genesis(selected: &SelectedNetwork, config: &Config) -> MineReport {
    let params = selected.consensus();
    let options = config.mine;
    let mut header = selected.genesis.header.clone();
    header.set_algo(options.algo);
    header.bits = pow_limit_bits(params, options.algo);

    let end = options.start.saturating_add(options.count);
    kepler_log::log_info!(
        "mining {} genesis header, nonces {}..{}",
        options.algo.name(),
        options.start,
        end
    );
    let found = mine_nonce(&header, &IdentityHasher, params, options.start..end).map(|mined| {
        header.nonce = mined.nonce;
        let block_hash = header.hash();
        kepler_log::log_info!(
            "found nonce {} (block {})",
            mined.nonce,
            hash256_to_hex(&block_hash)
        );
        (mined, block_hash)
    });
    if found.is_none() {
        kepler_log::log_warn!("no nonce in {}..{} meets the target", options.start, end);
    }

    MineReport::new(
        selected.network().as_str(),
        options.algo,
        header.bits,
        options.start,
        options.count,
        found,
    )
}
