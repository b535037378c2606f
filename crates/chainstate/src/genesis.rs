//! Construction of the hard-coded first blocks.

use kepler_consensus::constants::DEVNET_GENESIS_VERSION;
use kepler_consensus::money::Amount;
use kepler_consensus::params::ChainParams;
use kepler_consensus::{hash256_to_hex, ConsensusParams, Hash256};
use kepler_pow::difficulty::{
    compact_to_target, compact_to_u256, hash_meets_target, pow_limit_bits,
};
use kepler_primitives::block::{Block, BlockHeader};
use kepler_primitives::script::{push_data, push_int, push_script_num, OP_CHECKSIG, OP_RETURN};
use kepler_primitives::transaction::{Transaction, TxIn, TxOut};

pub const GENESIS_TIMESTAMP: &str = "XX/05/2019 NOTICIA";

const GENESIS_OUTPUT_PUBKEY: [u8; 65] = [
    0x04, 0xb8, 0xbb, 0xf7, 0xe3, 0x64, 0x19, 0xf9, 0x6f, 0xc9, 0x9b, 0x7d, 0x9d, 0x04, 0xa6, 0x2e,
    0x8d, 0x9a, 0x28, 0xf6, 0xc8, 0xdc, 0x54, 0x8e, 0x7b, 0x9b, 0x84, 0xb4, 0x4c, 0x38, 0x06, 0x93,
    0xb7, 0x6e, 0x73, 0x0f, 0x28, 0xd1, 0x88, 0x94, 0xbc, 0x05, 0xa0, 0xa7, 0x2d, 0x5b, 0xb8, 0xe3,
    0x52, 0x21, 0xdc, 0x0d, 0x37, 0x5f, 0x85, 0x52, 0xc9, 0x48, 0x59, 0x95, 0xf6, 0x0a, 0x94, 0xd2,
    0x3a,
];

/// Bitcoin's genesis bits, pushed as a script number at the head of every genesis coinbase.
const GENESIS_COINBASE_BITS: i64 = 486_604_799;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    EmptyDevnetName,
    InvalidTarget(u32),
    NonceSpaceExhausted(String),
    HashMismatch { expected: Hash256, actual: Hash256 },
    MerkleMismatch { expected: Hash256, actual: Hash256 },
}

impl std::fmt::Display for GenesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenesisError::EmptyDevnetName => write!(f, "devnet name must not be empty"),
            GenesisError::InvalidTarget(bits) => {
                write!(f, "genesis bits {bits:#010x} do not decode to a target")
            }
            GenesisError::NonceSpaceExhausted(name) => {
                write!(f, "could not find devnet genesis block for {name}")
            }
            GenesisError::HashMismatch { expected, actual } => write!(
                f,
                "genesis hash mismatch (expected {}, got {})",
                hash256_to_hex(expected),
                hash256_to_hex(actual)
            ),
            GenesisError::MerkleMismatch { expected, actual } => write!(
                f,
                "genesis merkle root mismatch (expected {}, got {})",
                hash256_to_hex(expected),
                hash256_to_hex(actual)
            ),
        }
    }
}

impl std::error::Error for GenesisError {}

fn single_coinbase_block(
    script_sig: Vec<u8>,
    output_script: Vec<u8>,
    reward: Amount,
    header: BlockHeader,
) -> Block {
    let coinbase = Transaction {
        version: 1,
        vin: vec![TxIn::coinbase(script_sig)],
        vout: vec![TxOut {
            value: reward,
            script_pubkey: output_script,
        }],
        lock_time: 0,
    };
    let mut block = Block {
        header,
        transactions: vec![coinbase],
    };
    block.header.merkle_root = block.merkle_root();
    block
}

pub fn build_genesis(
    timestamp_payload: &[u8],
    output_script: Vec<u8>,
    time: u32,
    nonce: u32,
    bits: u32,
    version: i32,
    reward: Amount,
) -> Block {
    let mut script_sig = Vec::with_capacity(timestamp_payload.len() + 8);
    push_script_num(&mut script_sig, GENESIS_COINBASE_BITS);
    push_script_num(&mut script_sig, 4);
    push_data(&mut script_sig, timestamp_payload);

    single_coinbase_block(
        script_sig,
        output_script,
        reward,
        BlockHeader {
            version,
            prev_block: [0u8; 32],
            merkle_root: [0u8; 32],
            time,
            bits,
            nonce,
        },
    )
}

pub fn genesis_output_script() -> Vec<u8> {
    let mut script = Vec::with_capacity(GENESIS_OUTPUT_PUBKEY.len() + 2);
    push_data(&mut script, &GENESIS_OUTPUT_PUBKEY);
    script.push(OP_CHECKSIG);
    script
}

pub fn kepler_genesis(time: u32, nonce: u32, bits: u32, version: i32, reward: Amount) -> Block {
    build_genesis(
        GENESIS_TIMESTAMP.as_bytes(),
        genesis_output_script(),
        time,
        nonce,
        bits,
        version,
        reward,
    )
}

/// Second genesis block of a named devnet, chained on top of the regular genesis.
pub fn devnet_genesis(
    prev_hash: Hash256,
    devnet_name: &str,
    time: u32,
    nonce: u32,
    bits: u32,
    reward: Amount,
) -> Block {
    // Height one, as BIP34 would push it, then the name.
    let mut script_sig = Vec::with_capacity(devnet_name.len() + 2);
    push_int(&mut script_sig, 1);
    push_data(&mut script_sig, devnet_name.as_bytes());

    single_coinbase_block(
        script_sig,
        vec![OP_RETURN],
        reward,
        BlockHeader {
            version: DEVNET_GENESIS_VERSION,
            prev_block: prev_hash,
            merkle_root: [0u8; 32],
            time,
            bits,
            nonce,
        },
    )
}

/// Grinds nonces from zero until the devnet genesis passes proof of work under `params`.
///
/// The parent's bits are kept unless they decode above the floor of the devnet header's
/// algorithm, in which case the floor is used.
pub fn find_devnet_genesis(
    params: &ConsensusParams,
    prev_block: &Block,
    devnet_name: &str,
    reward: Amount,
) -> Result<Block, GenesisError> {
    if devnet_name.is_empty() {
        return Err(GenesisError::EmptyDevnetName);
    }
    let prev_bits = prev_block.header.bits;
    let prev_target =
        compact_to_u256(prev_bits).map_err(|_| GenesisError::InvalidTarget(prev_bits))?;
    let mut block = devnet_genesis(
        prev_block.hash(),
        devnet_name,
        prev_block.header.time.wrapping_add(1),
        0,
        prev_bits,
        reward,
    );

    let algo = block.header.algo();
    let floor_bits = pow_limit_bits(params, algo);
    let floor = compact_to_u256(floor_bits).map_err(|_| GenesisError::InvalidTarget(floor_bits))?;
    if prev_target > floor {
        block.header.bits = floor_bits;
    }
    let bits = block.header.bits;
    let target = compact_to_target(bits).map_err(|_| GenesisError::InvalidTarget(bits))?;
    if target == [0u8; 32] {
        return Err(GenesisError::InvalidTarget(bits));
    }

    for nonce in 0..u32::MAX {
        block.header.nonce = nonce;
        if hash_meets_target(&block.hash(), &target) {
            return Ok(block);
        }
    }

    kepler_log::log_error!("could not find devnet genesis block for {devnet_name}");
    Err(GenesisError::NonceSpaceExhausted(devnet_name.to_string()))
}

/// Builds the genesis block of `chain` and checks it against the recorded hash and root.
pub fn network_genesis(chain: &ChainParams) -> Result<Block, GenesisError> {
    let inputs = &chain.genesis;
    let block = kepler_genesis(
        inputs.time,
        inputs.nonce,
        inputs.bits,
        inputs.version,
        inputs.reward,
    );

    let merkle_root = block.header.merkle_root;
    if merkle_root != inputs.expected_merkle_root {
        return Err(GenesisError::MerkleMismatch {
            expected: inputs.expected_merkle_root,
            actual: merkle_root,
        });
    }
    let hash = block.hash();
    if hash != chain.consensus.hash_genesis_block {
        return Err(GenesisError::HashMismatch {
            expected: chain.consensus.hash_genesis_block,
            actual: hash,
        });
    }
    Ok(block)
}
