mod common;

use common::LinearChain;
use kepler_consensus::algo::{Algo, ALL_ALGOS};
use kepler_consensus::params::{consensus_params, Network};
use kepler_pow::get_next_work_required;

fn next_bits(chain: &LinearChain, algo: Algo) -> u32 {
    let params = consensus_params(Network::Mainnet);
    get_next_work_required(chain, chain.tip(), algo, &params).expect("retarget")
}

fn all_next_bits(chain: &LinearChain) -> Vec<u32> {
    ALL_ALGOS.iter().map(|algo| next_bits(chain, *algo)).collect()
}

fn single_algo_chain(count: u32) -> LinearChain {
    let mut chain = LinearChain::default();
    for height in 0..count {
        chain.push(1, 1_600_000_000 + height * 120, 0x1d0f_ffff);
    }
    chain
}

#[test]
fn single_algo_history_matches_cpp() {
    let chain = single_algo_chain(9);
    assert_eq!(next_bits(&chain, Algo::NeoScrypt), 0x1e0f_ffff);
    assert_eq!(next_bits(&chain, Algo::Argon2d), 0x1f00_ffff);

    for count in [10, 11] {
        let chain = single_algo_chain(count);
        assert_eq!(next_bits(&chain, Algo::NeoScrypt), 0x1d0c_cccc, "count {count}");
        assert_eq!(next_bits(&chain, Algo::Argon2d), 0x1f00_ffff, "count {count}");
    }
}

#[test]
fn round_robin_bootstrap_clamp_matches_cpp() {
    for count in [30, 31] {
        let chain = LinearChain::round_robin(count, 0x1c0f_fff0, 40);
        assert_eq!(all_next_bits(&chain), vec![0x1c0c_ccc0; 3], "count {count}");
    }
}

#[test]
fn round_robin_after_bootstrap_matches_cpp() {
    for count in [3_001, 3_010] {
        let chain = LinearChain::round_robin(count, 0x1c0f_fff0, 40);
        assert_eq!(all_next_bits(&chain), vec![0x1c0f_5c19; 3], "count {count}");
    }
}

#[test]
fn slow_blocks_ease_difficulty() {
    let chain = LinearChain::round_robin(30, 0x1c0f_fff0, 400);
    assert_eq!(all_next_bits(&chain), vec![0x1c13_3320; 3]);

    let chain = LinearChain::round_robin(3_010, 0x1c0f_fff0, 400);
    assert_eq!(all_next_bits(&chain), vec![0x1c10_a3c6; 3]);
}

#[test]
fn eased_target_is_capped_per_algorithm() {
    let chain = LinearChain::round_robin(30, 0x1e0f_ffff, 400);
    assert_eq!(all_next_bits(&chain), vec![0x1e0f_ffff, 0x1e13_3332, 0x1e13_3332]);
}
