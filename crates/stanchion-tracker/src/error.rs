//! Error types for tracker operations.

use stanchion_core::{CommitmentHash, CoreError};
use stanchion_store::StoreError;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors surfaced by the attestation tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The tracked latest attestation does not match the requested
    /// confirmation state.
    #[error("latest attestation does not match requested confirmation state")]
    AttestationGet,

    /// No merkle commitment rows exist for the requested attestation.
    #[error("no merkle commitments found for attestation {txid}")]
    MerkleCommitmentGet {
        /// The txid that had no persisted rows.
        txid: CommitmentHash,
    },

    /// Domain-level failure while aggregating or expanding a commitment.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence failure, propagated verbatim from the storage layer.
    #[error(transparent)]
    Storage(#[from] StoreError),
}
