//! Block subsidy schedule.

use crate::money::{Amount, COIN};
use crate::params::{ConsensusParams, Network};

/// Last main-net height that derives difficulty from the bare mantissa.
const LEGACY_DIFFICULTY_HEIGHT: i32 = 4_500;
const FIRST_ERA_END: i32 = 5_465;
const SECOND_ERA_END: i32 = 17_000;
const SECOND_ERA_LOW_DIFF_END: i32 = 24_000;

/// Difficulty relative to the `0x1d00ffff` reference target.
pub fn bits_to_difficulty(bits: u32) -> f64 {
    let mut shift = (bits >> 24) & 0xff;
    let mut difficulty = f64::from(0x0000_ffffu32) / f64::from(bits & 0x00ff_ffff);
    while shift < 29 {
        difficulty *= 256.0;
        shift += 1;
    }
    while shift > 29 {
        difficulty /= 256.0;
        shift -= 1;
    }
    difficulty
}

/// Subsidy of the block built on top of `prev_height`, whose target was `prev_bits`.
///
/// With `superblock_part_only` set only the budget share is returned; otherwise the miner
/// share (total minus budget) is returned.
pub fn block_subsidy(
    prev_bits: u32,
    prev_height: i32,
    params: &ConsensusParams,
    superblock_part_only: bool,
) -> Amount {
    let difficulty =
        if prev_height <= LEGACY_DIFFICULTY_HEIGHT && params.network == Network::Mainnet {
            f64::from(0x0000_ffffu32) / f64::from(prev_bits & 0x00ff_ffff)
        } else {
            bits_to_difficulty(prev_bits)
        };

    let base_coins = if prev_height < FIRST_ERA_END {
        (1111.0 / ((difficulty + 1.0) * (difficulty + 1.0))).clamp(1.0, 500.0)
    } else if prev_height < SECOND_ERA_END
        || (difficulty <= 75.0 && prev_height < SECOND_ERA_LOW_DIFF_END)
    {
        let scaled = (difficulty + 51.0) / 6.0;
        (11111.0 / (scaled * scaled)).clamp(25.0, 500.0)
    } else {
        let scaled = (difficulty + 2600.0) / 9.0;
        (2222222.0 / (scaled * scaled)).clamp(5.0, 25.0)
    };

    let mut subsidy = base_coins as Amount * COIN;

    let interval = params.subsidy_halving_interval;
    if interval > 0 {
        let mut height = interval;
        while height <= prev_height {
            subsidy -= subsidy / 14;
            height = match height.checked_add(interval) {
                Some(next) => next,
                None => break,
            };
        }
    }

    let superblock_part = if prev_height >= params.budget_payments_start_block {
        subsidy / 10
    } else {
        0
    };

    if superblock_part_only {
        superblock_part
    } else {
        subsidy - superblock_part
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::consensus_params;

    fn fixture_params() -> ConsensusParams {
        let mut params = consensus_params(Network::Mainnet);
        params.subsidy_halving_interval = 210_240;
        params
    }

    #[test]
    fn block_subsidy_matches_cpp() {
        let params = fixture_params();
        let cases: [(u32, i32, Amount); 8] = [
            (0x1c4a_47c4, 4_249, 50_000_000_000),
            (0x1c4a_47c4, 4_501, 5_600_000_000),
            (0x1c29_ec00, 5_464, 2_100_000_000),
            (0x1c29_ec00, 5_465, 12_200_000_000),
            (0x1c08_ba34, 17_588, 6_100_000_000),
            (0x1b10_cf42, 99_999, 500_000_000),
            (0x1b11_548e, 210_239, 500_000_000),
            (0x1b10_d50b, 210_240, 464_285_715),
        ];
        for (bits, height, expected) in cases {
            assert_eq!(
                block_subsidy(bits, height, &params, false),
                expected,
                "height {height}"
            );
        }
    }

    #[test]
    fn superblock_part_starts_at_budget_height() {
        let mut params = fixture_params();
        params.budget_payments_start_block = 100_000;

        assert_eq!(block_subsidy(0x1b10_cf42, 99_999, &params, true), 0);
        let total = 500_000_000;
        assert_eq!(block_subsidy(0x1b10_cf42, 100_000, &params, true), total / 10);
        assert_eq!(
            block_subsidy(0x1b10_cf42, 100_000, &params, false),
            total - total / 10
        );
    }

    #[test]
    fn reference_target_is_difficulty_one() {
        assert_eq!(bits_to_difficulty(0x1d00_ffff), 1.0);
        assert_eq!(bits_to_difficulty(0x1c00_ffff), 256.0);
    }
}
