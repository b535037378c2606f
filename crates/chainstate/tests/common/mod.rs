#![allow(dead_code)]

use kepler_chainstate::{BlockId, BlockIndex};
use kepler_consensus::algo::{version_with_algo, Algo};
use kepler_consensus::{ConsensusParams, Hash256};
use kepler_pow::difficulty::get_next_work_required;
use kepler_primitives::block::BlockHeader;

/// Accepts every header; the tests here exercise index rules, not hash functions.
pub fn pass_all(_: Algo, _: &[u8]) -> Hash256 {
    [0u8; 32]
}

pub fn fail_all(_: Algo, _: &[u8]) -> Hash256 {
    [0xffu8; 32]
}

/// Header on top of `parent` carrying the bits the index expects for `algo`.
pub fn next_header(
    index: &BlockIndex,
    params: &ConsensusParams,
    parent: BlockId,
    algo: Algo,
    time: u32,
) -> BlockHeader {
    let bits = get_next_work_required(index, Some(parent), algo, params).expect("retarget");
    BlockHeader {
        version: version_with_algo(4, algo),
        prev_block: index.node(parent).hash,
        merkle_root: [0u8; 32],
        time,
        bits,
        nonce: 0,
    }
}

/// Extends `parent` with one accepted header per entry of `algos`, `spacing` seconds apart.
pub fn extend(
    index: &mut BlockIndex,
    params: &ConsensusParams,
    mut parent: BlockId,
    algos: &[Algo],
    spacing: u32,
) -> Vec<BlockId> {
    let mut ids = Vec::with_capacity(algos.len());
    for &algo in algos {
        let time = index.node(parent).header.time + spacing;
        let header = next_header(index, params, parent, algo, time);
        parent = index
            .accept_header(&header, &pass_all, params)
            .expect("accept header");
        ids.push(parent);
    }
    ids
}
