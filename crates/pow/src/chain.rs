//! Read-only view over an indexed chain of block headers.

use kepler_consensus::algo::{algo_from_version, Algo};
use kepler_consensus::constants::MEDIAN_TIME_SPAN;
use primitive_types::U256;

/// Predecessor links plus the header fields difficulty and work rules read.
///
/// Implementors own the storage; ids are cheap handles into it.
pub trait ChainIndexView {
    type Id: Copy + Eq;

    fn prev(&self, id: Self::Id) -> Option<Self::Id>;
    fn height(&self, id: Self::Id) -> i32;
    fn bits(&self, id: Self::Id) -> u32;
    fn time(&self, id: Self::Id) -> u32;
    fn version(&self, id: Self::Id) -> i32;
    fn chain_work(&self, id: Self::Id) -> U256;

    fn algo(&self, id: Self::Id) -> Algo {
        algo_from_version(self.version(id))
    }

    /// Block at `height` on the branch ending at `id`. The default walks predecessors one
    /// at a time; indexes with skip links override it.
    fn ancestor(&self, id: Self::Id, height: i32) -> Option<Self::Id> {
        if height < 0 || height > self.height(id) {
            return None;
        }
        let mut cursor = id;
        while self.height(cursor) > height {
            cursor = self.prev(cursor)?;
        }
        Some(cursor)
    }

    /// Median of the last eleven block times ending at `id`, fewer near genesis.
    fn median_time_past(&self, id: Self::Id) -> i64 {
        let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if times.len() == MEDIAN_TIME_SPAN {
                break;
            }
            times.push(i64::from(self.time(current)));
            cursor = self.prev(current);
        }
        times.sort_unstable();
        times[times.len() / 2]
    }
}

/// Walks back from `from` (inclusive) to the nearest block mined with `algo`.
pub fn last_block_for_algo<V: ChainIndexView + ?Sized>(
    view: &V,
    from: Option<V::Id>,
    algo: Algo,
) -> Option<V::Id> {
    let mut cursor = from;
    while let Some(id) = cursor {
        if view.algo(id) == algo {
            return Some(id);
        }
        cursor = view.prev(id);
    }
    None
}
