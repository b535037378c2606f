//! Brute-force nonce search for diagnostics and test fixtures.
//!
//! Nothing on a validation path calls into this module.

use std::ops::Range;

use kepler_consensus::{ConsensusParams, Hash256};
use kepler_primitives::block::BlockHeader;
use rayon::prelude::*;

use crate::validation::{check_proof_of_work, PowHasher};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinedNonce {
    pub nonce: u32,
    pub pow_hash: Hash256,
}

/// Searches `nonces` for the lowest nonce whose algorithm hash meets `header.bits`.
///
/// The range is split across the rayon pool; `find_first` keeps the answer deterministic.
pub fn mine_nonce<H: PowHasher + Sync + ?Sized>(
    header: &BlockHeader,
    hasher: &H,
    params: &ConsensusParams,
    nonces: Range<u32>,
) -> Option<MinedNonce> {
    let algo = header.algo();
    let bits = header.bits;
    let template = header.consensus_encode();

    nonces.into_par_iter().find_map_first(|nonce| {
        let mut bytes = template;
        bytes[76..80].copy_from_slice(&nonce.to_le_bytes());
        let pow_hash = hasher.pow_hash(algo, &bytes);
        check_proof_of_work(&pow_hash, algo, bits, params).then_some(MinedNonce { nonce, pow_hash })
    })
}
