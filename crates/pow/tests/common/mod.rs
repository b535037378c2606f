#![allow(dead_code)]

use kepler_consensus::algo::{version_with_algo, Algo};
use kepler_pow::work::block_proof;
use kepler_pow::ChainIndexView;
use primitive_types::U256;

pub struct Header {
    pub version: i32,
    pub time: u32,
    pub bits: u32,
    pub work: U256,
}

/// Linear header chain; ids are heights.
#[derive(Default)]
pub struct LinearChain {
    pub headers: Vec<Header>,
}

impl LinearChain {
    pub fn push(&mut self, version: i32, time: u32, bits: u32) -> usize {
        self.headers.push(Header {
            version,
            time,
            bits,
            work: U256::zero(),
        });
        let id = self.headers.len() - 1;
        let parent = match id.checked_sub(1) {
            Some(parent) => self.headers[parent].work,
            None => U256::zero(),
        };
        let proof = block_proof(self, id);
        self.headers[id].work = parent.overflowing_add(proof).0;
        id
    }

    pub fn tip(&self) -> Option<usize> {
        self.headers.len().checked_sub(1)
    }

    /// `count` blocks cycling through the algorithms, one every `spacing` seconds.
    pub fn round_robin(count: u32, bits: u32, spacing: u32) -> Self {
        let slots = [Algo::NeoScrypt, Algo::Argon2d, Algo::RainforestV2];
        let mut chain = Self::default();
        for height in 0..count {
            let algo = slots[(height % 3) as usize];
            chain.push(
                version_with_algo(1, algo),
                1_600_000_000 + height * spacing,
                bits,
            );
        }
        chain
    }
}

impl ChainIndexView for LinearChain {
    type Id = usize;

    fn prev(&self, id: usize) -> Option<usize> {
        id.checked_sub(1)
    }

    fn height(&self, id: usize) -> i32 {
        id as i32
    }

    fn bits(&self, id: usize) -> u32 {
        self.headers[id].bits
    }

    fn time(&self, id: usize) -> u32 {
        self.headers[id].time
    }

    fn version(&self, id: usize) -> i32 {
        self.headers[id].version
    }

    fn chain_work(&self, id: usize) -> U256 {
        self.headers[id].work
    }
}
