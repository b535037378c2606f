//! Consensus-wide constants shared across validation.

/// Number of prior blocks whose timestamps form the median time past.
pub const MEDIAN_TIME_SPAN: usize = 11;
/// Blocks after which another algorithm's last work no longer counts.
pub const WORK_DECAY_WINDOW: i64 = 100;
/// Left shift applied to the geometric mean of per-algorithm work.
pub const GEOMETRIC_MEAN_SHIFT: usize = 8;
/// Block version used for devnet genesis blocks.
pub const DEVNET_GENESIS_VERSION: i32 = 4;
