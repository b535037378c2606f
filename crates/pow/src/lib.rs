//! Multi-algorithm proof-of-work: retargeting, validation, and chain work.

pub mod chain;
pub mod difficulty;
pub mod miner;
pub mod validation;
pub mod work;

pub use chain::{last_block_for_algo, ChainIndexView};
pub use difficulty::{get_next_work_required, CompactError, DifficultyError};
pub use validation::{check_proof_of_work, validate_pow_header, IdentityHasher, PowError, PowHasher};
pub use work::{block_proof, block_proof_equivalent_time, nth_root};
