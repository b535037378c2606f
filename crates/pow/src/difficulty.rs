//! Difficulty and compact target utilities.

use kepler_consensus::algo::Algo;
use kepler_consensus::{ConsensusParams, Hash256};
use primitive_types::U256;

use crate::chain::{last_block_for_algo, ChainIndexView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    Negative,
    Overflow,
}

impl std::fmt::Display for CompactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompactError::Negative => write!(f, "compact target has negative sign bit"),
            CompactError::Overflow => write!(f, "compact target overflows 256-bit range"),
        }
    }
}

impl std::error::Error for CompactError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyError {
    ZeroTimespan,
}

impl std::fmt::Display for DifficultyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DifficultyError::ZeroTimespan => write!(f, "averaging target timespan is zero"),
        }
    }
}

impl std::error::Error for DifficultyError {}

/// Expands compact bits the way `arith_uint256::SetCompact` does.
///
/// Returns the (possibly truncated) value together with the negative and overflow flags.
pub fn decode_compact(bits: u32) -> (U256, bool, bool) {
    let size = bits >> 24;
    let mut word = bits & 0x007f_ffff;

    let value = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - 3)) as usize
    };

    let negative = word != 0 && (bits & 0x0080_0000) != 0;
    let overflow =
        word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    (value, negative, overflow)
}

pub fn compact_to_u256(bits: u32) -> Result<U256, CompactError> {
    let (value, negative, overflow) = decode_compact(bits);
    if negative {
        return Err(CompactError::Negative);
    }
    if overflow {
        return Err(CompactError::Overflow);
    }
    Ok(value)
}

pub fn u256_to_compact(value: U256) -> u32 {
    if value.is_zero() {
        return 0;
    }

    let mut size = value.bits().div_ceil(8) as u32;
    let mut compact: u32;

    if size <= 3 {
        compact = value.low_u32() << (8 * (3 - size));
    } else {
        let shift = 8 * (size - 3) as usize;
        compact = (value >> shift).low_u32();
    }

    // The mantissa's top bit is the sign; move it into the exponent instead.
    if (compact & 0x0080_0000) != 0 {
        compact >>= 8;
        size += 1;
    }

    (size << 24) | (compact & 0x007f_ffff)
}

pub fn compact_to_target(bits: u32) -> Result<Hash256, CompactError> {
    Ok(compact_to_u256(bits)?.to_little_endian())
}

pub fn target_to_compact(target: &Hash256) -> u32 {
    u256_to_compact(U256::from_little_endian(target))
}

pub fn hash_meets_target(hash: &Hash256, target: &Hash256) -> bool {
    U256::from_little_endian(hash) <= U256::from_little_endian(target)
}

pub fn pow_limit_bits(params: &ConsensusParams, algo: Algo) -> u32 {
    target_to_compact(params.pow_limit_for(algo))
}

/// Compact target required for the next `algo` block on top of `last`.
///
/// Only blocks of the same algorithm are sampled: the newest one and the
/// `pow_averaging_interval - 1` before it. Their median-time-past span is clamped and
/// scales the newest target. Any shortfall in history yields the algorithm's limit.
pub fn get_next_work_required<V: ChainIndexView + ?Sized>(
    view: &V,
    last: Option<V::Id>,
    algo: Algo,
    params: &ConsensusParams,
) -> Result<u32, DifficultyError> {
    let pow_limit = U256::from_little_endian(params.pow_limit_for(algo));
    let limit_bits = u256_to_compact(pow_limit);

    let Some(last) = last else {
        return Ok(limit_bits);
    };
    let Some(prev) = last_block_for_algo(view, Some(last), algo) else {
        return Ok(limit_bits);
    };

    let mut first = prev;
    for _ in 1..params.pow_averaging_interval {
        match last_block_for_algo(view, view.prev(first), algo) {
            Some(id) => first = id,
            None => return Ok(limit_bits),
        }
    }

    let target_timespan = params.averaging_target_timespan();
    if target_timespan <= 0 {
        return Err(DifficultyError::ZeroTimespan);
    }

    let last_height = view.height(last);
    let mut actual_timespan = view.median_time_past(prev) - view.median_time_past(first);
    // Lower bound first, then upper.
    let min_timespan = params.min_actual_timespan(last_height);
    let max_timespan = params.max_actual_timespan(last_height);
    if actual_timespan < min_timespan {
        actual_timespan = min_timespan;
    }
    if actual_timespan > max_timespan {
        actual_timespan = max_timespan;
    }

    let (prev_target, _, _) = decode_compact(view.bits(prev));
    // arith_uint256 multiplication wraps; a clamped timespan is never negative.
    let (scaled, _) = prev_target.overflowing_mul(U256::from(actual_timespan.max(0) as u64));
    let mut next = scaled / U256::from(target_timespan as u64);
    if next > pow_limit {
        next = pow_limit;
    }

    Ok(u256_to_compact(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::test_chain::VecChain;
    use kepler_consensus::params::{consensus_params, Network};

    #[test]
    fn decode_compact_flags_match_arith_uint256() {
        assert_eq!(decode_compact(0x0180_0000), (U256::zero(), false, false));
        assert_eq!(decode_compact(0x0480_0000), (U256::zero(), false, false));
        let (_, negative, overflow) = decode_compact(0x0492_3456);
        assert!(negative && !overflow);
        let (_, negative, overflow) = decode_compact(0xff12_3456);
        assert!(!negative && overflow);
        assert_eq!(decode_compact(0x0112_3456).0, U256::from(0x12u32));
        assert_eq!(decode_compact(0x0212_3456).0, U256::from(0x1234u32));
        assert_eq!(decode_compact(0x2200_0001), (U256::one() << 248usize, false, false));
        assert!(decode_compact(0x2300_0001).2);
    }

    #[test]
    fn strict_decode_rejects_flags() {
        assert_eq!(compact_to_u256(0x0492_3456), Err(CompactError::Negative));
        assert_eq!(compact_to_u256(0xff12_3456), Err(CompactError::Overflow));
        assert_eq!(compact_to_u256(0x0080_0000), Ok(U256::zero()));
    }

    #[test]
    fn encode_shifts_sign_bit_into_exponent() {
        assert_eq!(u256_to_compact(U256::from(0x80u32)), 0x0200_8000);
        assert_eq!(u256_to_compact(U256::from(0x1234_5678u32)), 0x0412_3456);
        assert_eq!(u256_to_compact(U256::zero()), 0);
    }

    #[test]
    fn pow_limit_compacts_match_cpp() {
        let params = consensus_params(Network::Mainnet);
        assert_eq!(pow_limit_bits(&params, Algo::NeoScrypt), 0x1e0f_ffff);
        assert_eq!(pow_limit_bits(&params, Algo::Argon2d), 0x1f00_ffff);
        assert_eq!(pow_limit_bits(&params, Algo::RainforestV2), 0x1f00_ffff);
    }

    #[test]
    fn empty_chain_gets_pow_limit() {
        let params = consensus_params(Network::Mainnet);
        let chain = VecChain::default();
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::Argon2d, &params),
            Ok(0x1f00_ffff)
        );
    }

    #[test]
    fn short_history_gets_pow_limit() {
        let params = consensus_params(Network::Mainnet);
        let mut chain = VecChain::default();
        for h in 0..9u32 {
            chain.push(1, 1_600_000_000 + h * 120, 0x1d0f_ffff);
        }
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::NeoScrypt, &params),
            Ok(0x1e0f_ffff)
        );

        chain.push(1, 1_600_000_000 + 9 * 120, 0x1d0f_ffff);
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::NeoScrypt, &params),
            Ok(0x1d0c_cccc)
        );
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::Argon2d, &params),
            Ok(0x1f00_ffff)
        );
    }

    #[test]
    fn zero_timespan_is_reported() {
        let mut params = consensus_params(Network::Regtest);
        params.pow_target_spacing = 0;
        let mut chain = VecChain::default();
        for h in 0..12u32 {
            chain.push(1, h, 0x207f_ffff);
        }
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::NeoScrypt, &params),
            Err(DifficultyError::ZeroTimespan)
        );
    }

    #[test]
    fn crossed_timespan_bounds_take_the_upper_bound() {
        let mut params = consensus_params(Network::Mainnet);
        params.max_adjust_up = 0;
        params.max_adjust_down = -50;
        let mut chain = VecChain::default();
        for h in 0..3_000u32 {
            chain.push(1, 1_600_000_000 + h * 120, 0x1d0f_ffff);
        }
        assert!(params.min_actual_timespan(2_999) > params.max_actual_timespan(2_999));
        assert_eq!(
            get_next_work_required(&chain, chain.tip(), Algo::NeoScrypt, &params),
            Ok(0x1d07_ffff)
        );
    }
}
