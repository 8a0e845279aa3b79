//! Attestation lifecycle tracker.
//!
//! Owns the single "latest attestation" of the service and drives each
//! round from candidate selection through broadcast bookkeeping to
//! confirmation. One attestation round is in flight at a time; the external
//! pipeline polls clients, decides when to broadcast and detects
//! confirmation, and calls back into the tracker at each step.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use stanchion_core::{Attestation, Commitment, CommitmentHash, CoreError};

use crate::{
    error::{Result, TrackerError},
    storage::TrackerStorage,
};

/// Tracks the latest attestation and persists confirmed rounds.
///
/// All state lives behind a single `RwLock`, so readers observe either the
/// fully-old or fully-new attestation, never a partially applied update.
/// Storage is injected as a trait object; production wires the PostgreSQL
/// adapter, tests the in-memory mock.
pub struct AttestationTracker {
    storage: Arc<dyn TrackerStorage>,
    latest: RwLock<Attestation>,
}

impl AttestationTracker {
    /// Creates a tracker with no attestation tracked yet.
    pub fn new(storage: Arc<dyn TrackerStorage>) -> Self {
        Self { storage, latest: RwLock::new(Attestation::default()) }
    }

    /// Freezes the current client commitments into a fresh round commitment.
    ///
    /// Reads every client's current commitment, requires the position
    /// sequence to be exactly `0..n`, and builds the round's Merkle tree.
    ///
    /// # Errors
    ///
    /// `CoreError::CommitmentListEmpty` when no client commitments exist;
    /// `CoreError::LatestCommitmentMissing` with the first gap position when
    /// the sequence is not contiguous; storage errors verbatim.
    pub async fn client_commitment(&self) -> Result<Commitment> {
        let mut commitments = self.storage.client_commitments().await?;
        if commitments.is_empty() {
            return Err(CoreError::CommitmentListEmpty.into());
        }

        commitments.sort_by_key(|c| c.client_position);
        for (i, commitment) in commitments.iter().enumerate() {
            if commitment.client_position != i as i32 {
                return Err(CoreError::LatestCommitmentMissing { position: i as i32 }.into());
            }
        }

        let leaves = commitments.into_iter().map(|c| c.commitment).collect();
        let commitment = Commitment::new(leaves)?;

        debug!(
            root = %commitment.commitment_hash(),
            leaves = commitment.num_commitments(),
            "Built candidate commitment from client set"
        );
        Ok(commitment)
    }

    /// Root of the tracked latest attestation's commitment.
    ///
    /// `confirmed` filters on confirmation state: `Some(want)` fails with
    /// `AttestationGet` when the tracked attestation's state differs from
    /// `want`; `None` never filters. While nothing is tracked yet (zero
    /// txid) the persisted latest root is consulted instead, and the zero
    /// hash is returned without error when the store is empty too.
    ///
    /// # Errors
    ///
    /// `TrackerError::AttestationGet` on a state mismatch; storage errors
    /// verbatim.
    pub async fn latest_commitment_hash(
        &self,
        confirmed: Option<bool>,
    ) -> Result<CommitmentHash> {
        let latest = self.latest.read().await;

        if let Some(want) = confirmed {
            if latest.confirmed != want {
                return Err(TrackerError::AttestationGet);
            }
        }

        if latest.txid.is_zero() {
            // Nothing tracked this run; recover the last persisted root.
            let include_unconfirmed = confirmed != Some(true);
            return Ok(self.storage.latest_merkle_root(include_unconfirmed).await?);
        }

        Ok(latest.commitment_hash())
    }

    /// Replaces the tracked latest attestation.
    ///
    /// An unconfirmed attestation becomes the in-flight candidate and is
    /// held in memory only; it may lack a commitment when it merely books a
    /// broadcast txid. A confirmed attestation must carry its commitment:
    /// the tracker derives the proof for every client position and persists
    /// the attestation record, its chain info, the leaf rows and the proof
    /// rows before the in-memory state moves forward. A persistence failure
    /// aborts the whole update and leaves the previous state in place; all
    /// writes are idempotent, so the call is retried wholesale.
    ///
    /// # Errors
    ///
    /// `CoreError::CommitmentNotDefined` for a confirmed attestation without
    /// a commitment; storage errors verbatim.
    pub async fn update_latest(&self, attestation: Attestation) -> Result<()> {
        if !attestation.confirmed {
            info!(txid = %attestation.txid, "Tracking unconfirmed attestation");
            *self.latest.write().await = attestation;
            return Ok(());
        }

        let Some(commitment) = attestation.commitment.as_ref() else {
            return Err(CoreError::CommitmentNotDefined.into());
        };

        let merkle_commitments = commitment.merkle_commitments();
        let merkle_proofs = commitment.merkle_proofs()?;

        // Hold the write guard across persistence so readers never observe
        // a round that is half written.
        let mut latest = self.latest.write().await;

        self.storage.save_attestation(attestation.clone()).await?;
        if let Some(info) = attestation.info.clone() {
            self.storage.save_attestation_info(info).await?;
        }
        self.storage.save_merkle_commitments(merkle_commitments).await?;
        self.storage.save_merkle_proofs(merkle_proofs).await?;

        info!(
            txid = %attestation.txid,
            root = %attestation.commitment_hash(),
            positions = commitment.num_commitments(),
            "Confirmed attestation persisted"
        );
        *latest = attestation;
        Ok(())
    }

    /// The commitment attested by `txid`.
    ///
    /// The tracked latest attestation is served directly, including the
    /// empty commitment for the zero txid while nothing is tracked.
    /// Anything else is rebuilt from the persisted leaf rows.
    ///
    /// # Errors
    ///
    /// `TrackerError::MerkleCommitmentGet` when no rows exist for the txid;
    /// storage errors verbatim.
    pub async fn attestation_commitment(&self, txid: CommitmentHash) -> Result<Commitment> {
        {
            let latest = self.latest.read().await;
            if txid == latest.txid {
                return Ok(latest.commitment.clone().unwrap_or_default());
            }
        }

        let rows = self.storage.attestation_merkle_commitments(txid).await?;
        if rows.is_empty() {
            return Err(TrackerError::MerkleCommitmentGet { txid });
        }

        let leaves = rows.into_iter().map(|row| row.commitment).collect();
        Ok(Commitment::new(leaves)?)
    }
}
