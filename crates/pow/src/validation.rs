use kepler_consensus::algo::Algo;
use kepler_consensus::{ConsensusParams, Hash256};
use kepler_primitives::block::BlockHeader;
use kepler_primitives::hash::sha256d;
use primitive_types::U256;

use crate::difficulty::{decode_compact, CompactError};

/// Computes the proof-of-work hash of a serialized header for one algorithm slot.
///
/// The NeoScrypt, Argon2d and RainforestV2 functions live outside this crate; callers
/// plug them in through this trait.
pub trait PowHasher {
    fn pow_hash(&self, algo: Algo, header_bytes: &[u8]) -> Hash256;
}

impl<F> PowHasher for F
where
    F: Fn(Algo, &[u8]) -> Hash256,
{
    fn pow_hash(&self, algo: Algo, header_bytes: &[u8]) -> Hash256 {
        self(algo, header_bytes)
    }
}

/// Uses the block identity hash (double SHA-256) for every algorithm.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher;

impl PowHasher for IdentityHasher {
    fn pow_hash(&self, _algo: Algo, header_bytes: &[u8]) -> Hash256 {
        sha256d(header_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowError {
    InvalidBits(&'static str),
    HashMismatch,
    Compact(CompactError),
}

impl std::fmt::Display for PowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowError::InvalidBits(message) => write!(f, "{message}"),
            PowError::HashMismatch => write!(f, "pow hash does not meet target"),
            PowError::Compact(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PowError {}

impl From<CompactError> for PowError {
    fn from(err: CompactError) -> Self {
        PowError::Compact(err)
    }
}

/// Range-checks `bits` against the algorithm limit, then compares `hash` to the target.
pub fn check_pow_hash(
    hash: &Hash256,
    algo: Algo,
    bits: u32,
    params: &ConsensusParams,
) -> Result<(), PowError> {
    let (target, negative, overflow) = decode_compact(bits);
    if negative {
        return Err(CompactError::Negative.into());
    }
    if overflow {
        return Err(CompactError::Overflow.into());
    }
    if target.is_zero() {
        return Err(PowError::InvalidBits("pow target is zero"));
    }

    let pow_limit = U256::from_little_endian(params.pow_limit_for(algo));
    if target > pow_limit {
        return Err(PowError::InvalidBits("pow target above limit"));
    }

    if U256::from_little_endian(hash) > target {
        return Err(PowError::HashMismatch);
    }

    Ok(())
}

pub fn check_proof_of_work(
    hash: &Hash256,
    algo: Algo,
    bits: u32,
    params: &ConsensusParams,
) -> bool {
    check_pow_hash(hash, algo, bits, params).is_ok()
}

pub fn validate_pow_header<H: PowHasher + ?Sized>(
    header: &BlockHeader,
    hasher: &H,
    params: &ConsensusParams,
) -> Result<(), PowError> {
    let algo = header.algo();
    let pow_hash = hasher.pow_hash(algo, &header.consensus_encode());
    check_pow_hash(&pow_hash, algo, header.bits, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kepler_consensus::params::{consensus_params, Network};

    fn u256_hash(value: U256) -> Hash256 {
        value.to_little_endian()
    }

    #[test]
    fn hash_equal_to_target_is_accepted() {
        let params = consensus_params(Network::Regtest);
        let target = U256::from(0xffffu32) << 224usize;
        assert!(check_proof_of_work(
            &u256_hash(target),
            Algo::NeoScrypt,
            0x1f00_ffff,
            &params
        ));
        assert!(!check_proof_of_work(
            &u256_hash(target + U256::one()),
            Algo::NeoScrypt,
            0x1f00_ffff,
            &params
        ));
    }

    #[test]
    fn target_above_network_floor_is_rejected() {
        let params = consensus_params(Network::Regtest);
        assert_eq!(
            check_pow_hash(&[0u8; 32], Algo::NeoScrypt, 0x207f_ffff, &params),
            Err(PowError::InvalidBits("pow target above limit"))
        );
    }

    #[test]
    fn invalid_bits_are_rejected() {
        let params = consensus_params(Network::Regtest);
        let zero_hash = [0u8; 32];
        assert_eq!(
            check_pow_hash(&zero_hash, Algo::Argon2d, 0x0480_0001, &params),
            Err(PowError::Compact(CompactError::Negative))
        );
        assert_eq!(
            check_pow_hash(&zero_hash, Algo::Argon2d, 0xff00_ffff, &params),
            Err(PowError::Compact(CompactError::Overflow))
        );
        assert_eq!(
            check_pow_hash(&zero_hash, Algo::Argon2d, 0x0100_0000, &params),
            Err(PowError::InvalidBits("pow target is zero"))
        );
    }

    #[test]
    fn limit_is_per_algorithm() {
        let params = consensus_params(Network::Mainnet);
        let zero_hash = [0u8; 32];
        assert!(check_proof_of_work(&zero_hash, Algo::Argon2d, 0x1f00_ffff, &params));
        assert_eq!(
            check_pow_hash(&zero_hash, Algo::NeoScrypt, 0x1f00_ffff, &params),
            Err(PowError::InvalidBits("pow target above limit"))
        );
        assert!(check_proof_of_work(&zero_hash, Algo::NeoScrypt, 0x1e0f_ffff, &params));
    }

    #[test]
    fn validate_header_dispatches_on_version_algo() {
        let params = consensus_params(Network::Regtest);
        let mut header = BlockHeader {
            version: 4,
            bits: 0x1f00_ffff,
            ..BlockHeader::default()
        };
        header.set_algo(Algo::RainforestV2);

        let seen = std::cell::Cell::new(None);
        let hasher = |algo: Algo, bytes: &[u8]| {
            assert_eq!(bytes.len(), 80);
            seen.set(Some(algo));
            [0u8; 32]
        };
        validate_pow_header(&header, &hasher, &params).expect("zero hash passes");
        assert_eq!(seen.get(), Some(Algo::RainforestV2));

        let failing = |_: Algo, _: &[u8]| [0xffu8; 32];
        assert_eq!(
            validate_pow_header(&header, &failing, &params),
            Err(PowError::HashMismatch)
        );
    }
}
