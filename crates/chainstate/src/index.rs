//! In-memory header index.
//!
//! Nodes live in one arena and refer to each other by `BlockId`. A node never owns its
//! predecessor; height, skip link and chain work are fixed when the node is inserted.

use std::collections::HashMap;

use kepler_consensus::algo::Algo;
use kepler_consensus::{hash256_to_hex, ConsensusParams, Hash256};
use kepler_pow::chain::ChainIndexView;
use kepler_pow::difficulty::{get_next_work_required, DifficultyError};
use kepler_pow::validation::{validate_pow_header, PowError, PowHasher};
use kepler_pow::work::block_proof;
use kepler_primitives::block::BlockHeader;
use primitive_types::U256;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BlockId(u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct BlockIndexNode {
    pub hash: Hash256,
    pub header: BlockHeader,
    pub prev: Option<BlockId>,
    pub skip: Option<BlockId>,
    pub height: i32,
    pub chain_work: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    MissingHeader,
    InvalidHeader(&'static str),
    Pow(PowError),
    Difficulty(DifficultyError),
    Full,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::MissingHeader => write!(f, "missing header"),
            IndexError::InvalidHeader(message) => write!(f, "{message}"),
            IndexError::Pow(err) => write!(f, "{err}"),
            IndexError::Difficulty(err) => write!(f, "{err}"),
            IndexError::Full => write!(f, "block index is full"),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<PowError> for IndexError {
    fn from(err: PowError) -> Self {
        IndexError::Pow(err)
    }
}

impl From<DifficultyError> for IndexError {
    fn from(err: DifficultyError) -> Self {
        IndexError::Difficulty(err)
    }
}

#[derive(Default)]
pub struct BlockIndex {
    nodes: Vec<BlockIndexNode>,
    by_hash: HashMap<Hash256, BlockId>,
    best: Option<BlockId>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids are only handed out by this index, so a foreign id is a caller bug.
    pub fn node(&self, id: BlockId) -> &BlockIndexNode {
        &self.nodes[id.index()]
    }

    pub fn lookup(&self, hash: &Hash256) -> Option<BlockId> {
        self.by_hash.get(hash).copied()
    }

    pub fn get(&self, hash: &Hash256) -> Option<&BlockIndexNode> {
        self.lookup(hash).map(|id| self.node(id))
    }

    pub fn genesis(&self) -> Option<BlockId> {
        (!self.nodes.is_empty()).then_some(BlockId(0))
    }

    /// Tip with the most chain work; on equal work the first one seen stays.
    pub fn best_tip(&self) -> Option<BlockId> {
        self.best
    }

    /// Ids from the genesis block up to `tip`, in height order.
    pub fn branch(&self, tip: BlockId) -> Vec<BlockId> {
        let mut ids = Vec::with_capacity(self.node(tip).height as usize + 1);
        let mut cursor = Some(tip);
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.node(id).prev;
        }
        ids.reverse();
        ids
    }

    /// Links a header under its known parent without running any consensus rule.
    ///
    /// Only an empty index accepts a header with a null parent.
    pub fn insert_header(&mut self, header: &BlockHeader) -> Result<BlockId, IndexError> {
        let hash = header.hash();
        if let Some(existing) = self.lookup(&hash) {
            return Ok(existing);
        }
        let parent = self.resolve_parent(header)?;
        self.push_node(hash, header, parent)
    }

    /// Runs the contextual header rules and links the header on success.
    ///
    /// The network genesis and, on a devnet, its second genesis are authenticated by hash
    /// alone. Every other header must extend a known parent, carry the retarget bits for
    /// its algorithm, be newer than the parent's median time past, keep the sequential
    /// algorithm rule and satisfy proof of work under `hasher`.
    pub fn accept_header<H: PowHasher + ?Sized>(
        &mut self,
        header: &BlockHeader,
        hasher: &H,
        params: &ConsensusParams,
    ) -> Result<BlockId, IndexError> {
        let hash = header.hash();
        if let Some(existing) = self.lookup(&hash) {
            return Ok(existing);
        }

        let Some(parent) = self.resolve_parent(header)? else {
            if hash != params.hash_genesis_block {
                kepler_log::log_warn!(
                    "rejected genesis header {}: expected {}",
                    hash256_to_hex(&hash),
                    hash256_to_hex(&params.hash_genesis_block)
                );
                return Err(IndexError::InvalidHeader("genesis hash mismatch"));
            }
            return self.push_node(hash, header, None);
        };

        let height = self.node(parent).height + 1;
        if i64::from(header.time) <= self.median_time_past(parent) {
            return Err(IndexError::InvalidHeader("block timestamp too early"));
        }

        if height == 1 {
            if let Some(devnet_genesis) = params.hash_devnet_genesis_block {
                if hash != devnet_genesis {
                    return Err(IndexError::InvalidHeader("devnet genesis hash mismatch"));
                }
                return self.push_node(hash, header, Some(parent));
            }
        }

        let algo = header.algo();
        let expected_bits = get_next_work_required(&*self, Some(parent), algo, params)?;
        if header.bits != expected_bits {
            kepler_log::log_warn!(
                "unexpected difficulty bits at height {}: expected {:#x}, got {:#x}",
                height,
                expected_bits,
                header.bits
            );
            return Err(IndexError::InvalidHeader("unexpected difficulty bits"));
        }

        if self.exceeds_sequential_limit(parent, algo, params.block_sequential_algo_max_count) {
            kepler_log::log_debug!(
                "rejected header {}: too many sequential {} blocks",
                hash256_to_hex(&hash),
                algo.name()
            );
            return Err(IndexError::InvalidHeader("too many sequential blocks of one algorithm"));
        }

        validate_pow_header(header, hasher, params)?;

        self.push_node(hash, header, Some(parent))
    }

    /// True when the `max_count` blocks ending at `parent` were all mined with `algo`.
    fn exceeds_sequential_limit(&self, parent: BlockId, algo: Algo, max_count: i32) -> bool {
        if max_count <= 0 {
            return false;
        }
        let mut cursor = Some(parent);
        for _ in 0..max_count {
            match cursor {
                Some(id) if self.algo(id) == algo => cursor = self.node(id).prev,
                _ => return false,
            }
        }
        true
    }

    fn resolve_parent(&self, header: &BlockHeader) -> Result<Option<BlockId>, IndexError> {
        if header.prev_block == [0u8; 32] {
            if !self.nodes.is_empty() {
                return Err(IndexError::InvalidHeader("second root header"));
            }
            return Ok(None);
        }
        self.lookup(&header.prev_block)
            .map(Some)
            .ok_or(IndexError::MissingHeader)
    }

    fn push_node(
        &mut self,
        hash: Hash256,
        header: &BlockHeader,
        prev: Option<BlockId>,
    ) -> Result<BlockId, IndexError> {
        let raw = u32::try_from(self.nodes.len()).map_err(|_| IndexError::Full)?;
        let id = BlockId(raw);
        let (height, parent_work) = match prev {
            Some(parent) => {
                let node = self.node(parent);
                (node.height + 1, node.chain_work)
            }
            None => (0, U256::zero()),
        };
        let skip = prev.and_then(|parent| self.ancestor(parent, get_skip_height(height)));

        self.nodes.push(BlockIndexNode {
            hash,
            header: header.clone(),
            prev,
            skip,
            height,
            chain_work: U256::zero(),
        });
        // The proof reads this node's own bits and the branch below it.
        let proof = block_proof(&*self, id);
        let chain_work = parent_work.overflowing_add(proof).0;
        self.nodes[id.index()].chain_work = chain_work;
        self.by_hash.insert(hash, id);

        let is_better = match self.best {
            Some(best) => chain_work > self.node(best).chain_work,
            None => true,
        };
        if is_better {
            self.best = Some(id);
        }

        kepler_log::log_debug!(
            "indexed header {} at height {} ({})",
            hash256_to_hex(&hash),
            height,
            header.algo().name()
        );
        Ok(id)
    }
}

impl ChainIndexView for BlockIndex {
    type Id = BlockId;

    fn prev(&self, id: BlockId) -> Option<BlockId> {
        self.node(id).prev
    }

    fn height(&self, id: BlockId) -> i32 {
        self.node(id).height
    }

    fn bits(&self, id: BlockId) -> u32 {
        self.node(id).header.bits
    }

    fn time(&self, id: BlockId) -> u32 {
        self.node(id).header.time
    }

    fn version(&self, id: BlockId) -> i32 {
        self.node(id).header.version
    }

    fn chain_work(&self, id: BlockId) -> U256 {
        self.node(id).chain_work
    }

    fn ancestor(&self, id: BlockId, height: i32) -> Option<BlockId> {
        let mut walk = id;
        let mut walk_height = self.node(walk).height;
        if height < 0 || height > walk_height {
            return None;
        }
        while walk_height > height {
            let node = self.node(walk);
            let skip_height = get_skip_height(walk_height);
            let prev_skip_height = get_skip_height(walk_height - 1);
            let use_skip = match node.skip {
                Some(_) if skip_height == height => true,
                Some(_) => {
                    skip_height > height
                        && !(prev_skip_height < skip_height - 2 && prev_skip_height >= height)
                }
                None => false,
            };
            if use_skip {
                walk = node.skip?;
                walk_height = skip_height;
            } else {
                walk = node.prev?;
                walk_height -= 1;
            }
        }
        Some(walk)
    }
}

fn invert_lowest_one(value: i32) -> i32 {
    value & value.saturating_sub(1)
}

fn get_skip_height(height: i32) -> i32 {
    if height < 2 {
        0
    } else if (height & 1) != 0 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}
