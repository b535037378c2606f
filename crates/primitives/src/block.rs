//! Block header and block types.

use kepler_consensus::algo::{algo_from_version, base_version, version_with_algo, Algo};
use kepler_consensus::Hash256;

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::sha256d;
use crate::merkle::merkle_root;
use crate::transaction::Transaction;

pub const CURRENT_VERSION: i32 = 4;
pub const HEADER_SIZE: usize = 80;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn algo(&self) -> Algo {
        algo_from_version(self.version)
    }

    pub fn set_algo(&mut self, algo: Algo) {
        self.version = version_with_algo(self.version, algo);
    }

    pub fn base_version(&self) -> i32 {
        base_version(self.version)
    }

    pub fn consensus_encode(&self) -> [u8; HEADER_SIZE] {
        let mut encoder = Encoder::with_capacity(HEADER_SIZE);
        Encodable::consensus_encode(self, &mut encoder);
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&encoder.into_inner());
        out
    }

    /// Block identity: double SHA-256 of the 80 serialized bytes.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }

    pub fn consensus_decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        crate::encoding::decode(bytes)
    }
}

impl Encodable for BlockHeader {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_i32_le(self.version);
        encoder.write_hash_le(&self.prev_block);
        encoder.write_hash_le(&self.merkle_root);
        encoder.write_u32_le(self.time);
        encoder.write_u32_le(self.bits);
        encoder.write_u32_le(self.nonce);
    }
}

impl Decodable for BlockHeader {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        Ok(Self {
            version: decoder.read_i32_le()?,
            prev_block: decoder.read_hash_le()?,
            merkle_root: decoder.read_hash_le()?,
            time: decoder.read_u32_le()?,
            bits: decoder.read_u32_le()?,
            nonce: decoder.read_u32_le()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn merkle_root(&self) -> Hash256 {
        let txids: Vec<Hash256> = self.transactions.iter().map(Transaction::txid).collect();
        merkle_root(&txids)
    }

    pub fn consensus_encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        Encodable::consensus_encode(&self.header, &mut encoder);
        encoder.write_varint(self.transactions.len() as u64);
        for tx in &self.transactions {
            Encodable::consensus_encode(tx, &mut encoder);
        }
        encoder.into_inner()
    }

    pub fn consensus_decode(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        let mut decoder = Decoder::new(bytes);
        let header = <BlockHeader as Decodable>::consensus_decode(&mut decoder)
            .map_err(BlockDecodeError::Header)?;
        let count = decoder.read_varint()?;
        let count = usize::try_from(count).map_err(|_| DecodeError::SizeTooLarge)?;
        let mut transactions = Vec::with_capacity(count.min(decoder.remaining()));
        for index in 0..count {
            let tx = <Transaction as Decodable>::consensus_decode(&mut decoder)
                .map_err(|error| BlockDecodeError::Transaction { index, error })?;
            transactions.push(tx);
        }
        if !decoder.is_empty() {
            return Err(BlockDecodeError::Decode(DecodeError::TrailingBytes));
        }
        Ok(Self {
            header,
            transactions,
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum BlockDecodeError {
    Header(DecodeError),
    Transaction { index: usize, error: DecodeError },
    Decode(DecodeError),
}

impl From<DecodeError> for BlockDecodeError {
    fn from(error: DecodeError) -> Self {
        BlockDecodeError::Decode(error)
    }
}

impl std::fmt::Display for BlockDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockDecodeError::Header(error) => write!(f, "block header: {error}"),
            BlockDecodeError::Transaction { index, error } => {
                write!(f, "transaction {index}: {error}")
            }
            BlockDecodeError::Decode(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for BlockDecodeError {}
