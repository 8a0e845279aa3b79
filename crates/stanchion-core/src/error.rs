//! Error types and result handling for commitment operations.
//!
//! Defines the closed error taxonomy for Merkle tree construction, proof
//! derivation and commitment aggregation. Every failure carries structured
//! fields so callers match on variants, never on formatted text.

/// Errors that can occur while building commitments, trees and proofs.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Requested leaf or proof position does not exist in the tree.
    #[error("position {position} out of range for merkle tree with {num_leaves} leaves")]
    PositionOutOfRange {
        /// The requested leaf position.
        position: usize,
        /// Number of leaves in the tree.
        num_leaves: usize,
    },

    /// No client commitments were available when a fresh round was requested.
    #[error("client commitment list is empty")]
    CommitmentListEmpty,

    /// The client position sequence has a gap; reports the first missing
    /// index. Aggregation aborts entirely, no partial commitment is built.
    #[error("latest commitment missing for client position {position}")]
    LatestCommitmentMissing {
        /// First client position with no commitment.
        position: i32,
    },

    /// A confirmed attestation was submitted without a commitment.
    #[error("attestation commitment not defined")]
    CommitmentNotDefined,

    /// A hash string was not 64 lowercase hex characters.
    #[error("invalid commitment hash {value:?}: {reason}")]
    InvalidHash {
        /// The offending input, truncated for display.
        value: String,
        /// Why the input was rejected.
        reason: String,
    },
}

impl CoreError {
    /// Check whether the caller can recover by correcting its request.
    ///
    /// Out-of-range positions and malformed hashes are caller input issues;
    /// an empty or gapped commitment set clears up once clients catch up.
    /// `CommitmentNotDefined` is an integration bug and is not recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::PositionOutOfRange { .. }
            | Self::CommitmentListEmpty
            | Self::LatestCommitmentMissing { .. }
            | Self::InvalidHash { .. } => true,
            Self::CommitmentNotDefined => false,
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_positions() {
        let err = CoreError::PositionOutOfRange { position: 7, num_leaves: 5 };
        assert_eq!(err.to_string(), "position 7 out of range for merkle tree with 5 leaves");

        let err = CoreError::LatestCommitmentMissing { position: 1 };
        assert_eq!(err.to_string(), "latest commitment missing for client position 1");
    }

    #[test]
    fn recoverability_classification() {
        assert!(CoreError::CommitmentListEmpty.is_recoverable());
        assert!(CoreError::PositionOutOfRange { position: 0, num_leaves: 0 }.is_recoverable());
        assert!(!CoreError::CommitmentNotDefined.is_recoverable());
    }
}
