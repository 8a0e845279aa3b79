//! Deterministic digest fixtures and builders.

use stanchion_core::{AttestationInfo, ClientCommitment, CommitmentHash};

/// Well-known leaf digests used across tree and tracker tests.
pub const FIXTURE_DIGESTS: [&str; 5] = [
    "1a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
    "2a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
    "3a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
    "4a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
    "5a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
];

/// One of the well-known fixture digests.
///
/// # Panics
///
/// Panics when `index` is outside the fixture table; test-only code.
pub fn fixture_hash(index: usize) -> CommitmentHash {
    FIXTURE_DIGESTS[index].parse().expect("fixture digests are valid hex")
}

/// A synthetic digest filled with one repeated byte.
pub fn commitment_hash(byte: u8) -> CommitmentHash {
    CommitmentHash::new([byte; 32])
}

/// Client commitments at contiguous positions `0..n` over the given leaves.
pub fn client_commitments(leaves: &[CommitmentHash]) -> Vec<ClientCommitment> {
    leaves
        .iter()
        .enumerate()
        .map(|(position, leaf)| ClientCommitment::new(*leaf, position as i32))
        .collect()
}

/// Chain data for a confirmed attestation with fixed block fields.
pub fn attestation_info(txid: CommitmentHash) -> AttestationInfo {
    AttestationInfo {
        txid,
        block_hash: commitment_hash(0xB1),
        amount: 1,
        time: 1_542_121_293,
    }
}
