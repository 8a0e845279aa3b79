//! Commitment aggregate: the Merkle tree of one attestation round.

use crate::{
    error::{CoreError, Result},
    hash::CommitmentHash,
    models::MerkleCommitment,
    proof::CommitmentMerkleProof,
    tree::CommitmentMerkleTree,
};

/// The full ordered leaf set of one attestation round plus its tree.
///
/// Immutable once built; a changed leaf set means a freshly built
/// commitment. The *empty* commitment is the zero value used where no round
/// exists yet: its root is the zero hash and its row and proof sets are
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Commitment {
    tree: Option<CommitmentMerkleTree>,
}

impl Commitment {
    /// Builds the round commitment over the ordered leaf hashes.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CommitmentListEmpty` for an empty leaf list.
    pub fn new(commitments: Vec<CommitmentHash>) -> Result<Self> {
        if commitments.is_empty() {
            return Err(CoreError::CommitmentListEmpty);
        }
        Ok(Self { tree: Some(CommitmentMerkleTree::new(commitments)?) })
    }

    /// The empty commitment: no leaves, zero root.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the empty commitment.
    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }

    /// The attested root, or the zero hash for the empty commitment.
    pub fn commitment_hash(&self) -> CommitmentHash {
        self.tree.as_ref().map(CommitmentMerkleTree::root).unwrap_or_default()
    }

    /// Number of client positions in the round.
    pub fn num_commitments(&self) -> usize {
        self.tree.as_ref().map_or(0, CommitmentMerkleTree::num_leaves)
    }

    /// The leaf commitment at one client position.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PositionOutOfRange` when the position is not
    /// below the leaf count (always, for the empty commitment).
    pub fn commitment(&self, position: usize) -> Result<CommitmentHash> {
        match &self.tree {
            Some(tree) => tree.commitment(position),
            None => Err(CoreError::PositionOutOfRange { position, num_leaves: 0 }),
        }
    }

    /// Persistable `(root, position, leaf)` rows, one per client position.
    pub fn merkle_commitments(&self) -> Vec<MerkleCommitment> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let merkle_root = tree.root();
        tree.commitments()
            .iter()
            .enumerate()
            .map(|(position, commitment)| MerkleCommitment {
                merkle_root,
                client_position: position as i32,
                commitment: *commitment,
            })
            .collect()
    }

    /// The inclusion proof for one client position.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PositionOutOfRange` when the position is not
    /// below the leaf count (always, for the empty commitment).
    pub fn merkle_proof(&self, position: usize) -> Result<CommitmentMerkleProof> {
        match &self.tree {
            Some(tree) => tree.merkle_proof(position),
            None => Err(CoreError::PositionOutOfRange { position, num_leaves: 0 }),
        }
    }

    /// Inclusion proofs for every client position in order.
    pub fn merkle_proofs(&self) -> Result<Vec<CommitmentMerkleProof>> {
        match &self.tree {
            Some(tree) => tree.merkle_proofs(),
            None => Ok(Vec::new()),
        }
    }
}
