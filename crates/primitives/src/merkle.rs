use kepler_consensus::Hash256;

use crate::hash::sha256d;

/// Bitcoin merkle root over transaction ids; odd layers duplicate their last entry.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut layer = leaves.to_vec();
    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            if let Some(last) = layer.last().copied() {
                layer.push(last);
            }
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| {
                let mut buf = [0u8; 64];
                buf[..32].copy_from_slice(&pair[0]);
                buf[32..].copy_from_slice(&pair[1]);
                sha256d(&buf)
            })
            .collect();
    }
    layer[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(left);
        buf.extend_from_slice(right);
        sha256d(&buf)
    }

    #[test]
    fn single_leaf_is_root() {
        let leaf = [7u8; 32];
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn odd_layer_duplicates_last() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        let expected = hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &c));
        assert_eq!(merkle_root(&[a, b, c]), expected);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
    }
}
