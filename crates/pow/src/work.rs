//! Cross-algorithm chain work.
//!
//! A block's proof is the geometric mean of the work of all algorithms near it, so a chain
//! cannot gain weight by concentrating hash power on a single algorithm.

use kepler_consensus::algo::{Algo, ALL_ALGOS, NUM_ALGOS};
use kepler_consensus::constants::{GEOMETRIC_MEAN_SHIFT, WORK_DECAY_WINDOW};
use kepler_consensus::ConsensusParams;
use primitive_types::U256;

use crate::chain::ChainIndexView;
use crate::difficulty::decode_compact;

const NTH_ROOT_SEED_BITS: usize = 8;
const NTH_ROOT_MAX_ITERATIONS: usize = 20;

/// Expected hashes for `bits`: `2^256 / (target + 1)`, or zero for an unusable target.
pub fn block_proof_base(bits: u32) -> U256 {
    let (target, negative, overflow) = decode_compact(bits);
    if negative || overflow || target.is_zero() {
        return U256::zero();
    }
    // 2^256 does not fit, but equals ((2^256 - target - 1) / (target + 1)) + 1.
    match target.checked_add(U256::one()) {
        Some(divisor) => (!target / divisor) + U256::one(),
        None => U256::one(),
    }
}

/// Base work of the newest `algo` block at or before `id`, reduced by 1% per block of
/// distance. Zero past the decay window.
pub fn prev_work_for_algo_with_decay<V: ChainIndexView + ?Sized>(
    view: &V,
    id: V::Id,
    algo: Algo,
) -> U256 {
    let mut distance: i64 = 0;
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if distance > WORK_DECAY_WINDOW {
            return U256::zero();
        }
        if view.algo(current) == algo {
            let base = block_proof_base(view.bits(current));
            let remaining = U256::from((WORK_DECAY_WINDOW - distance) as u64);
            let (scaled, _) = base.overflowing_mul(remaining);
            return scaled / U256::from(WORK_DECAY_WINDOW as u64);
        }
        cursor = view.prev(current);
        distance += 1;
    }
    U256::zero()
}

fn wrapping_pow(base: U256, exp: u32) -> U256 {
    let mut out = U256::one();
    for _ in 0..exp {
        out = out.overflowing_mul(base).0;
    }
    out
}

/// Integer `root`-th root of `value`, rounded down.
///
/// Seeds the top eight bits by bisection, then runs bracketed Newton steps.
///
/// # Panics
///
/// Panics if `root <= 1`.
pub fn nth_root(root: u32, value: U256) -> U256 {
    assert!(root > 1, "nth_root requires root > 1");
    if value.is_zero() {
        return U256::zero();
    }

    let root_bits = (value.bits() + root as usize - 1) / root as usize;
    let start_bits = root_bits.min(NTH_ROOT_SEED_BITS);
    let upper = value >> ((root_bits - start_bits) * root as usize);

    let mut cur = U256::zero();
    for i in (0..start_bits).rev() {
        let next = cur + (U256::one() << i);
        if wrapping_pow(next, root) <= upper {
            cur = next;
        }
    }
    if root_bits == start_bits {
        return cur;
    }
    cur = cur << (root_bits - start_bits);

    let root_value = U256::from(root);
    let mut terminate: i8 = 0;
    let mut negative_delta = false;
    for _ in 0..NTH_ROOT_MAX_ITERATIONS {
        let denominator = wrapping_pow(cur, root - 1);
        if denominator.is_zero() {
            return cur;
        }
        let quotient = value / denominator;
        if cur > quotient {
            negative_delta = true;
        }
        if cur == quotient {
            return cur;
        }

        let delta;
        if negative_delta {
            delta = cur - quotient;
            if terminate == 1 {
                return cur - U256::one();
            }
            negative_delta = false;
            if delta <= root_value {
                cur -= U256::one();
                terminate = -1;
                continue;
            }
            negative_delta = true;
        } else {
            delta = quotient - cur;
            if terminate == -1 {
                return cur;
            }
            if delta <= root_value {
                cur += U256::one();
                terminate = 1;
                continue;
            }
        }

        let step = delta / root_value;
        cur = if negative_delta {
            cur.overflowing_sub(step).0
        } else {
            cur.overflowing_add(step).0
        };
        terminate = 0;
    }
    cur
}

/// Geometric mean of the block's own base work and the decayed work of the other
/// algorithms, scaled by 2^8. Algorithms with no recent block contribute nothing.
pub fn geometric_mean_prev_work<V: ChainIndexView + ?Sized>(view: &V, id: V::Id) -> U256 {
    let own_algo = view.algo(id);
    let mut work = nth_root(NUM_ALGOS as u32, block_proof_base(view.bits(id)));

    for algo in ALL_ALGOS {
        if algo == own_algo {
            continue;
        }
        let alt = prev_work_for_algo_with_decay(view, id, algo);
        if !alt.is_zero() {
            work = work.overflowing_mul(nth_root(NUM_ALGOS as u32, alt)).0;
        }
    }

    work << GEOMETRIC_MEAN_SHIFT
}

/// Work credited to a block when summing chain work.
pub fn block_proof<V: ChainIndexView + ?Sized>(view: &V, id: V::Id) -> U256 {
    geometric_mean_prev_work(view, id)
}

/// Seconds at the tip's current work rate that separate the chain work of `to` and `from`.
/// Saturates at `i64::MAX` in either direction.
pub fn block_proof_equivalent_time<V: ChainIndexView + ?Sized>(
    view: &V,
    to: V::Id,
    from: V::Id,
    tip: V::Id,
    params: &ConsensusParams,
) -> i64 {
    let to_work = view.chain_work(to);
    let from_work = view.chain_work(from);
    let (diff, sign) = if to_work > from_work {
        (to_work - from_work, 1i64)
    } else {
        (from_work - to_work, -1i64)
    };

    let tip_proof = block_proof(view, tip);
    if tip_proof.is_zero() {
        return sign * i64::MAX;
    }
    let spacing = U256::from(params.pow_target_spacing.max(0) as u64);
    let r = diff.overflowing_mul(spacing).0 / tip_proof;
    if r.bits() > 63 {
        return sign * i64::MAX;
    }
    sign * r.low_u64() as i64
}
