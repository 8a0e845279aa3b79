//! Inclusion proofs: derivation from a built tree store and verification.
//!
//! A proof is the ordered list of sibling operations that recomputes the
//! root from one leaf. Each op records the sibling hash and which side the
//! accumulator goes on; replaying the ops level by level reproduces exactly
//! the pairing performed during construction.

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    hash::CommitmentHash,
};

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProofOp {
    /// `true`: the accumulator is the left operand (`combine(acc, sibling)`);
    /// `false`: the sibling is (`combine(sibling, acc)`).
    pub append: bool,

    /// The sibling hash for this level. A node with no right sibling carries
    /// itself here.
    pub commitment: CommitmentHash,
}

/// Inclusion proof for one leaf of a commitment tree.
///
/// `ops` has one entry per tree level, minimum one even for a single-leaf
/// tree. Exactly one proof exists per leaf position per tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentMerkleProof {
    /// Root the proof resolves to.
    pub merkle_root: CommitmentHash,

    /// Leaf position the proof belongs to.
    pub client_position: i32,

    /// The leaf commitment itself.
    pub commitment: CommitmentHash,

    /// Sibling operations, leaf level first.
    pub ops: Vec<MerkleProofOp>,
}

impl CommitmentMerkleProof {
    /// Derives the proof for `position` from a built tree store.
    ///
    /// Walks the store level by level: at each level the sibling of the
    /// current index joins the ops (the node itself when the right slot is
    /// empty), then the walk moves to the parent level by advancing the
    /// offset past the current level and halving the in-level position.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PositionOutOfRange` when `position` is beyond the
    /// leaf level or its slot is empty.
    pub fn from_store(store: &[Option<CommitmentHash>], position: usize) -> Result<Self> {
        if store.is_empty() {
            return Err(CoreError::PositionOutOfRange { position, num_leaves: 0 });
        }

        let leaf_slots = store.len() / 2 + 1;
        let occupied = || store[..leaf_slots].iter().flatten().count();

        if position >= leaf_slots {
            return Err(CoreError::PositionOutOfRange { position, num_leaves: occupied() });
        }
        let Some(leaf) = store[position] else {
            return Err(CoreError::PositionOutOfRange { position, num_leaves: occupied() });
        };

        let mut ops = Vec::new();
        let mut offset = 0;
        let mut depth = leaf_slots;
        let mut depth_position = position;
        let mut index = position;

        while depth > 1 {
            let Some(current) = store[index] else {
                // The walk only visits ancestors of a present leaf; an empty
                // slot here means the store is not a built tree.
                return Err(CoreError::PositionOutOfRange { position, num_leaves: occupied() });
            };

            let op = if index % 2 == 0 {
                // Left side: pair with the right sibling, or with the node
                // itself when the level ends here.
                MerkleProofOp { append: true, commitment: store[index + 1].unwrap_or(current) }
            } else {
                MerkleProofOp { append: false, commitment: store[index - 1].unwrap_or(current) }
            };
            ops.push(op);

            offset += depth;
            depth /= 2;
            depth_position /= 2;
            index = offset + (depth_position % depth);
        }

        let merkle_root = store.last().copied().flatten().unwrap_or_default();

        Ok(Self {
            merkle_root,
            client_position: position as i32,
            commitment: leaf,
            ops,
        })
    }

    /// Replays the proof and compares the result against the root.
    ///
    /// Fails closed: any truncated, reordered or substituted op sequence
    /// yields a different accumulator and the proof is rejected.
    pub fn verify(&self) -> bool {
        let mut acc = self.commitment;
        for op in &self.ops {
            acc = if op.append {
                acc.combine(&op.commitment)
            } else {
                op.commitment.combine(&acc)
            };
        }
        acc == self.merkle_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::CommitmentMerkleTree;

    fn leaf(byte: u8) -> CommitmentHash {
        CommitmentHash::new([byte; 32])
    }

    #[test]
    fn proof_ops_serialize_as_append_and_hex() {
        let op = MerkleProofOp { append: true, commitment: leaf(0x42) };
        let json = serde_json::to_value(op).unwrap();

        assert_eq!(json["append"], true);
        assert_eq!(json["commitment"], "42".repeat(32));
    }

    #[test]
    fn verify_replays_ops_in_order() {
        let tree = CommitmentMerkleTree::new((0u8..5).map(leaf).collect()).unwrap();

        for position in 0..5 {
            let proof = tree.merkle_proof(position).unwrap();
            assert!(proof.verify(), "proof for position {position} must verify");
        }
    }

    #[test]
    fn tampered_sibling_is_rejected() {
        let tree = CommitmentMerkleTree::new((0u8..5).map(leaf).collect()).unwrap();

        let mut proof = tree.merkle_proof(2).unwrap();
        proof.ops[1].commitment = leaf(0xEE);
        assert!(!proof.verify());
    }

    #[test]
    fn flipped_op_side_is_rejected() {
        let tree = CommitmentMerkleTree::new((0u8..4).map(leaf).collect()).unwrap();

        let mut proof = tree.merkle_proof(1).unwrap();
        proof.ops[0].append = !proof.ops[0].append;
        assert!(!proof.verify());
    }

    #[test]
    fn empty_padded_slot_has_no_proof() {
        let tree = CommitmentMerkleTree::new((0u8..5).map(leaf).collect()).unwrap();

        // Positions 5..8 exist as padded slots but hold no leaf.
        for position in 5..8 {
            let err = CommitmentMerkleProof::from_store(tree.store(), position).unwrap_err();
            assert_eq!(err, CoreError::PositionOutOfRange { position, num_leaves: 5 });
        }
    }
}
