//! Structural tests for proof derivation and verification.
//!
//! Pins the exact op sequence produced for trees of 5, 4, 3 and 1 leaves,
//! including the self-duplication pairing for odd leaf counts, and the
//! fail-closed behavior for truncated op lists and out-of-range positions.

use stanchion_core::{CommitmentHash, CommitmentMerkleProof, CommitmentMerkleTree, CoreError};

fn hash(hex: &str) -> CommitmentHash {
    hex.parse().expect("valid fixture hash")
}

fn fixture_leaves(n: usize) -> Vec<CommitmentHash> {
    [
        "1a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
        "2a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
        "3a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
        "4a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
        "5a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7",
    ][..n]
        .iter()
        .map(|hex| hash(hex))
        .collect()
}

#[test]
fn proofs_for_five_commitments() {
    let h = fixture_leaves(5);

    let h01 = h[0].combine(&h[1]);
    let h23 = h[2].combine(&h[3]);
    let h44 = h[4].combine(&h[4]);
    let h0123 = h01.combine(&h23);
    let h4444 = h44.combine(&h44);
    let root = h0123.combine(&h4444);

    let tree = CommitmentMerkleTree::new(h.clone()).unwrap();
    assert_eq!(tree.root(), root);

    let proof0 = tree.merkle_proof(0).unwrap();
    assert_eq!(proof0.commitment, h[0]);
    assert_eq!(proof0.merkle_root, root);
    assert_eq!(proof0.client_position, 0);
    assert_eq!(proof0.ops.len(), 3);
    assert!(proof0.ops[0].append);
    assert_eq!(proof0.ops[0].commitment, h[1]);
    assert!(proof0.ops[1].append);
    assert_eq!(proof0.ops[1].commitment, h23);
    assert!(proof0.ops[2].append);
    assert_eq!(proof0.ops[2].commitment, h4444);

    let proof1 = tree.merkle_proof(1).unwrap();
    assert_eq!(proof1.commitment, h[1]);
    assert_eq!(proof1.ops.len(), 3);
    assert!(!proof1.ops[0].append);
    assert_eq!(proof1.ops[0].commitment, h[0]);
    assert!(proof1.ops[1].append);
    assert_eq!(proof1.ops[1].commitment, h23);
    assert!(proof1.ops[2].append);
    assert_eq!(proof1.ops[2].commitment, h4444);

    let proof2 = tree.merkle_proof(2).unwrap();
    assert_eq!(proof2.commitment, h[2]);
    assert_eq!(proof2.ops.len(), 3);
    assert!(proof2.ops[0].append);
    assert_eq!(proof2.ops[0].commitment, h[3]);
    assert!(!proof2.ops[1].append);
    assert_eq!(proof2.ops[1].commitment, h01);
    assert!(proof2.ops[2].append);
    assert_eq!(proof2.ops[2].commitment, h4444);

    let proof3 = tree.merkle_proof(3).unwrap();
    assert_eq!(proof3.commitment, h[3]);
    assert_eq!(proof3.ops.len(), 3);
    assert!(!proof3.ops[0].append);
    assert_eq!(proof3.ops[0].commitment, h[2]);
    assert!(!proof3.ops[1].append);
    assert_eq!(proof3.ops[1].commitment, h01);
    assert!(proof3.ops[2].append);
    assert_eq!(proof3.ops[2].commitment, h4444);

    // The trailing odd leaf pairs with itself at the leaf level and again
    // one level up.
    let proof4 = tree.merkle_proof(4).unwrap();
    assert_eq!(proof4.commitment, h[4]);
    assert_eq!(proof4.ops.len(), 3);
    assert!(proof4.ops[0].append);
    assert_eq!(proof4.ops[0].commitment, h[4]);
    assert!(proof4.ops[1].append);
    assert_eq!(proof4.ops[1].commitment, h44);
    assert!(!proof4.ops[2].append);
    assert_eq!(proof4.ops[2].commitment, h0123);

    // Padded and out-of-range positions produce no proof.
    for position in [5, 6, 7, 8, 20] {
        assert!(tree.merkle_proof(position).is_err());
    }
}

#[test]
fn proofs_for_four_commitments() {
    let h = fixture_leaves(4);

    let h01 = h[0].combine(&h[1]);
    let h23 = h[2].combine(&h[3]);
    let root = h01.combine(&h23);

    let tree = CommitmentMerkleTree::new(h.clone()).unwrap();
    assert_eq!(tree.root(), root);

    let proof0 = tree.merkle_proof(0).unwrap();
    assert_eq!(proof0.ops.len(), 2);
    assert!(proof0.ops[0].append);
    assert_eq!(proof0.ops[0].commitment, h[1]);
    assert!(proof0.ops[1].append);
    assert_eq!(proof0.ops[1].commitment, h23);

    let proof1 = tree.merkle_proof(1).unwrap();
    assert_eq!(proof1.ops.len(), 2);
    assert!(!proof1.ops[0].append);
    assert_eq!(proof1.ops[0].commitment, h[0]);
    assert!(proof1.ops[1].append);
    assert_eq!(proof1.ops[1].commitment, h23);

    let proof2 = tree.merkle_proof(2).unwrap();
    assert_eq!(proof2.ops.len(), 2);
    assert!(proof2.ops[0].append);
    assert_eq!(proof2.ops[0].commitment, h[3]);
    assert!(!proof2.ops[1].append);
    assert_eq!(proof2.ops[1].commitment, h01);

    let proof3 = tree.merkle_proof(3).unwrap();
    assert_eq!(proof3.ops.len(), 2);
    assert!(!proof3.ops[0].append);
    assert_eq!(proof3.ops[0].commitment, h[2]);
    assert!(!proof3.ops[1].append);
    assert_eq!(proof3.ops[1].commitment, h01);

    for position in [4, 5, 6, 7] {
        assert!(tree.merkle_proof(position).is_err());
    }
}

#[test]
fn proofs_for_three_commitments() {
    let h = fixture_leaves(3);

    let h01 = h[0].combine(&h[1]);
    let h22 = h[2].combine(&h[2]);
    let root = h01.combine(&h22);

    let tree = CommitmentMerkleTree::new(h.clone()).unwrap();
    assert_eq!(tree.root(), root);

    let proof0 = tree.merkle_proof(0).unwrap();
    assert_eq!(proof0.ops.len(), 2);
    assert!(proof0.ops[0].append);
    assert_eq!(proof0.ops[0].commitment, h[1]);
    assert!(proof0.ops[1].append);
    assert_eq!(proof0.ops[1].commitment, h22);

    let proof1 = tree.merkle_proof(1).unwrap();
    assert_eq!(proof1.ops.len(), 2);
    assert!(!proof1.ops[0].append);
    assert_eq!(proof1.ops[0].commitment, h[0]);
    assert!(proof1.ops[1].append);
    assert_eq!(proof1.ops[1].commitment, h22);

    let proof2 = tree.merkle_proof(2).unwrap();
    assert_eq!(proof2.ops.len(), 2);
    assert!(proof2.ops[0].append);
    assert_eq!(proof2.ops[0].commitment, h[2]);
    assert!(!proof2.ops[1].append);
    assert_eq!(proof2.ops[1].commitment, h01);

    assert!(tree.merkle_proof(3).is_err());
    assert!(tree.merkle_proof(9).is_err());
}

#[test]
fn proof_for_single_commitment() {
    let h = fixture_leaves(1);
    let root = h[0].combine(&h[0]);

    let tree = CommitmentMerkleTree::new(h.clone()).unwrap();
    assert_eq!(tree.root(), root);

    // A single leaf still gets one self-duplication level.
    let proof0 = tree.merkle_proof(0).unwrap();
    assert_eq!(proof0.commitment, h[0]);
    assert_eq!(proof0.merkle_root, root);
    assert_eq!(proof0.ops.len(), 1);
    assert!(proof0.ops[0].append);
    assert_eq!(proof0.ops[0].commitment, h[0]);

    assert_eq!(
        tree.merkle_proof(1).unwrap_err(),
        CoreError::PositionOutOfRange { position: 1, num_leaves: 1 }
    );
    assert!(tree.merkle_proof(4).is_err());
}

#[test]
fn verification_fails_closed_on_truncated_ops() {
    let tree = CommitmentMerkleTree::new(fixture_leaves(5)).unwrap();

    for position in 0..5 {
        let proof = tree.merkle_proof(position).unwrap();
        assert!(proof.verify(), "untampered proof for position {position}");

        let mut truncated = proof.clone();
        truncated.ops.remove(0);
        assert!(!truncated.verify(), "truncated proof for position {position}");
    }
}

#[test]
fn verification_fails_on_foreign_leaf() {
    let tree = CommitmentMerkleTree::new(fixture_leaves(4)).unwrap();
    let mut proof = tree.merkle_proof(0).unwrap();

    proof.commitment = hash("5a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7");
    assert!(!proof.verify());
}

#[test]
fn derivation_over_raw_store_matches_tree_methods() {
    let tree = CommitmentMerkleTree::new(fixture_leaves(5)).unwrap();
    let proofs = tree.merkle_proofs().unwrap();

    assert_eq!(proofs.len(), 5);
    for (position, proof) in proofs.iter().enumerate() {
        let direct = CommitmentMerkleProof::from_store(tree.store(), position).unwrap();
        assert_eq!(&direct, proof);
    }
}
