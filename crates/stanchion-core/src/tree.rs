//! Flat-array Merkle tree over one attestation round's commitments.
//!
//! The tree is a single contiguous store of optional hashes indexed by
//! computed offsets, not a pointer graph. Leaves occupy the first slots,
//! each level's parents follow, and the last slot is the root. A node with
//! no right sibling is combined with itself, at every level, which keeps
//! construction total for any leaf count.

use crate::{
    error::{CoreError, Result},
    hash::CommitmentHash,
    proof::CommitmentMerkleProof,
};

/// Number of leaf-level slots for `n` leaves.
///
/// Two for a single leaf (the degenerate tree still has one combination
/// level), otherwise `n` rounded up to the next power of two.
fn next_pow(n: usize) -> usize {
    n.next_power_of_two().max(2)
}

/// Binary hash tree over an ordered list of commitment hashes.
///
/// Construction is deterministic: the same leaf sequence always yields the
/// same store and root. The tree is immutable once built; a changed leaf set
/// means a new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentMerkleTree {
    num_leaves: usize,
    commitments: Vec<CommitmentHash>,
    store: Vec<Option<CommitmentHash>>,
    root: CommitmentHash,
}

impl CommitmentMerkleTree {
    /// Builds the tree over the given leaves.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CommitmentListEmpty` for an empty leaf list.
    pub fn new(commitments: Vec<CommitmentHash>) -> Result<Self> {
        if commitments.is_empty() {
            return Err(CoreError::CommitmentListEmpty);
        }

        let store = build_store(&commitments);
        // Leaf 0 is always present, so the root slot is populated for any
        // non-empty input.
        let root = store.last().copied().flatten().unwrap_or_default();

        Ok(Self { num_leaves: commitments.len(), commitments, store, root })
    }

    /// Number of leaves the tree was built over.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// The tree root.
    pub fn root(&self) -> CommitmentHash {
        self.root
    }

    /// The commitment at a leaf position.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PositionOutOfRange` when `position` is not below
    /// the leaf count.
    pub fn commitment(&self, position: usize) -> Result<CommitmentHash> {
        if position >= self.num_leaves {
            return Err(CoreError::PositionOutOfRange {
                position,
                num_leaves: self.num_leaves,
            });
        }
        Ok(self.commitments[position])
    }

    /// All leaf commitments in position order.
    pub fn commitments(&self) -> &[CommitmentHash] {
        &self.commitments
    }

    /// The full store: leaves, intermediary nodes and root.
    pub fn store(&self) -> &[Option<CommitmentHash>] {
        &self.store
    }

    /// Derives the inclusion proof for one leaf position.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PositionOutOfRange` for positions at or beyond
    /// the leaf count.
    pub fn merkle_proof(&self, position: usize) -> Result<CommitmentMerkleProof> {
        if position >= self.num_leaves {
            return Err(CoreError::PositionOutOfRange {
                position,
                num_leaves: self.num_leaves,
            });
        }
        CommitmentMerkleProof::from_store(&self.store, position)
    }

    /// Derives the inclusion proof for every leaf position in order.
    pub fn merkle_proofs(&self) -> Result<Vec<CommitmentMerkleProof>> {
        (0..self.num_leaves).map(|position| self.merkle_proof(position)).collect()
    }
}

/// Builds the linear tree store for the given leaves.
///
/// The store holds `2 * next_pow(n) - 1` slots. Leaves fill the first `n`,
/// the bottom-up pass then combines consecutive pairs left to right, one
/// level at a time, writing each parent to the next offset:
/// no left child → empty parent; no right child → the left child combined
/// with itself; otherwise the combination of both children.
fn build_store(leaves: &[CommitmentHash]) -> Vec<Option<CommitmentHash>> {
    let padded = next_pow(leaves.len());
    let size = 2 * padded - 1;

    let mut store: Vec<Option<CommitmentHash>> = vec![None; size];
    for (i, leaf) in leaves.iter().enumerate() {
        store[i] = Some(*leaf);
    }

    let mut offset = padded;
    let mut i = 0;
    while i < size - 1 {
        store[offset] = match (store[i], store[i + 1]) {
            (None, _) => None,
            (Some(left), None) => Some(left.combine(&left)),
            (Some(left), Some(right)) => Some(left.combine(&right)),
        };
        offset += 1;
        i += 2;
    }

    store
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> CommitmentHash {
        CommitmentHash::new([byte; 32])
    }

    #[test]
    fn empty_leaf_list_is_rejected() {
        assert_eq!(CommitmentMerkleTree::new(vec![]).unwrap_err(), CoreError::CommitmentListEmpty);
    }

    #[test]
    fn single_leaf_builds_one_self_duplicated_level() {
        let h0 = leaf(0x10);
        let tree = CommitmentMerkleTree::new(vec![h0]).unwrap();

        assert_eq!(tree.store().len(), 3);
        assert_eq!(tree.store()[0], Some(h0));
        assert_eq!(tree.store()[1], None);
        assert_eq!(tree.root(), h0.combine(&h0));
    }

    #[test]
    fn store_shape_for_five_leaves() {
        let leaves: Vec<_> = (0u8..5).map(leaf).collect();
        let tree = CommitmentMerkleTree::new(leaves.clone()).unwrap();

        // 5 leaves pad to 8 slots: 15 store entries in total.
        assert_eq!(tree.store().len(), 15);
        for (i, l) in leaves.iter().enumerate() {
            assert_eq!(tree.store()[i], Some(*l));
        }
        // Padded leaf slots stay empty, as does the parent of two empties.
        assert_eq!(tree.store()[5], None);
        assert_eq!(tree.store()[6], None);
        assert_eq!(tree.store()[7], None);
        assert_eq!(tree.store()[11], None);
        assert_eq!(tree.store()[14], Some(tree.root()));
    }

    #[test]
    fn five_leaf_root_duplicates_odd_nodes_at_every_level() {
        let h: Vec<_> = (0u8..5).map(leaf).collect();
        let tree = CommitmentMerkleTree::new(h.clone()).unwrap();

        let h01 = h[0].combine(&h[1]);
        let h23 = h[2].combine(&h[3]);
        let h44 = h[4].combine(&h[4]);
        let left = h01.combine(&h23);
        let right = h44.combine(&h44);

        assert_eq!(tree.root(), left.combine(&right));
    }

    #[test]
    fn power_of_two_leaf_count_is_not_padded() {
        let leaves: Vec<_> = (0u8..4).map(leaf).collect();
        let tree = CommitmentMerkleTree::new(leaves).unwrap();

        assert_eq!(tree.store().len(), 7);
        assert!(tree.store().iter().all(Option::is_some));
    }

    #[test]
    fn construction_is_deterministic() {
        let leaves: Vec<_> = (0u8..7).map(leaf).collect();
        let a = CommitmentMerkleTree::new(leaves.clone()).unwrap();
        let b = CommitmentMerkleTree::new(leaves).unwrap();

        assert_eq!(a.root(), b.root());
        assert_eq!(a.store(), b.store());
    }

    #[test]
    fn commitment_accessor_checks_bounds() {
        let tree = CommitmentMerkleTree::new((0u8..3).map(leaf).collect()).unwrap();

        assert_eq!(tree.commitment(2).unwrap(), leaf(2));
        assert_eq!(
            tree.commitment(3).unwrap_err(),
            CoreError::PositionOutOfRange { position: 3, num_leaves: 3 }
        );
    }
}
