//! Shared test fixtures for the attestation workspace.
//!
//! Deterministic digests and commitment-set builders used by unit and
//! integration tests across crates. Everything here is reproducible: no
//! randomness, no wall clock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;

pub use fixtures::{
    attestation_info, client_commitments, commitment_hash, fixture_hash, FIXTURE_DIGESTS,
};
