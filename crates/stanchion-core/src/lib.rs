//! Core domain types for commitment attestation.
//!
//! Provides the 32-byte commitment hash primitive, the flat-array Merkle
//! tree built over one attestation round's client commitments, per-leaf
//! inclusion proofs, and the attestation lifecycle model. All other crates
//! depend on these foundational types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attestation;
pub mod commitment;
pub mod error;
pub mod hash;
pub mod models;
pub mod proof;
pub mod tree;

pub use attestation::{Attestation, AttestationInfo};
pub use commitment::Commitment;
pub use error::{CoreError, Result};
pub use hash::CommitmentHash;
pub use models::{ClientCommitment, MerkleCommitment};
pub use proof::{CommitmentMerkleProof, MerkleProofOp};
pub use tree::CommitmentMerkleTree;
