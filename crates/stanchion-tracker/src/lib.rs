//! Attestation lifecycle tracking for the commitment anchoring service.
//!
//! Coordinates one attestation round at a time: freezing client commitments
//! into a round commitment, tracking the broadcast attestation and, on
//! confirmation, persisting the round's tree rows, per-leaf inclusion
//! proofs and attestation record as one unit.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use storage::{PostgresTrackerStorage, TrackerStorage};
pub use tracker::AttestationTracker;
