//! Proof-of-work algorithm slots and their encoding in the block version.

/// Number of proof-of-work algorithms currently assigned.
pub const NUM_ALGOS: usize = 3;

/// Reserved version bits selecting the algorithm slot (up to 8 slots).
pub const BLOCK_VERSION_ALGO: i32 = 7 << 9;
pub const BLOCK_VERSION_SLOT2: i32 = 1 << 9;
pub const BLOCK_VERSION_SLOT3: i32 = 2 << 9;

const BASE_VERSION_MASK: i32 = 0x0000_00ff;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Algo {
    NeoScrypt = 0,
    Argon2d = 1,
    RainforestV2 = 2,
}

pub const ALL_ALGOS: [Algo; NUM_ALGOS] = [Algo::NeoScrypt, Algo::Argon2d, Algo::RainforestV2];

impl Algo {
    pub const fn as_usize(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        ALL_ALGOS.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Algo::NeoScrypt => "neoscrypt",
            Algo::Argon2d => "argon2d",
            Algo::RainforestV2 => "rainforest",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "neoscrypt" => Some(Algo::NeoScrypt),
            "1" | "argon2d" | "argon2d-4096" => Some(Algo::Argon2d),
            "2" | "rainforest" | "rainforestv2" => Some(Algo::RainforestV2),
            _ => None,
        }
    }

    /// Version bits that select this slot.
    pub const fn version_bits(self) -> i32 {
        match self {
            Algo::NeoScrypt => 0,
            Algo::Argon2d => BLOCK_VERSION_SLOT2,
            Algo::RainforestV2 => BLOCK_VERSION_SLOT3,
        }
    }
}

/// Unassigned slots fall back to the first algorithm.
pub fn algo_from_version(version: i32) -> Algo {
    match version & BLOCK_VERSION_ALGO {
        BLOCK_VERSION_SLOT2 => Algo::Argon2d,
        BLOCK_VERSION_SLOT3 => Algo::RainforestV2,
        _ => Algo::NeoScrypt,
    }
}

pub fn version_with_algo(version: i32, algo: Algo) -> i32 {
    version | algo.version_bits()
}

pub fn base_version(version: i32) -> i32 {
    version & BASE_VERSION_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bits_select_slots() {
        assert_eq!(algo_from_version(4), Algo::NeoScrypt);
        assert_eq!(algo_from_version(4 | (1 << 9)), Algo::Argon2d);
        assert_eq!(algo_from_version(4 | (2 << 9)), Algo::RainforestV2);
    }

    #[test]
    fn unassigned_slots_fall_back_to_neoscrypt() {
        for slot in 3..8 {
            assert_eq!(algo_from_version(0x2000_0000 | (slot << 9)), Algo::NeoScrypt);
        }
    }

    #[test]
    fn set_algo_then_decode() {
        for algo in ALL_ALGOS {
            let version = version_with_algo(0x2000_0004, algo);
            assert_eq!(algo_from_version(version), algo);
            assert_eq!(base_version(version), 4);
        }
    }

    #[test]
    fn parse_names_and_indices() {
        assert_eq!(Algo::parse("Argon2d"), Some(Algo::Argon2d));
        assert_eq!(Algo::parse("2"), Some(Algo::RainforestV2));
        assert_eq!(Algo::parse("sha256"), None);
        assert_eq!(Algo::from_index(3), None);
    }
}
