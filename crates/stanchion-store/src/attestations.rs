//! Repository for attestation and attestation-info rows.

use std::sync::Arc;

use sqlx::PgPool;
use stanchion_core::{Attestation, AttestationInfo, CommitmentHash};

use crate::error::Result;

/// Repository for attestation records.
///
/// One row per attestation transaction, keyed by txid, carrying the attested
/// merkle root and the confirmation flag. Chain data for confirmed
/// attestations lives in the companion `attestation_info` table.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts or updates the attestation record.
    ///
    /// Upsert keyed by txid, so a retried confirmation round overwrites
    /// rather than duplicates.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    pub async fn upsert(&self, attestation: &Attestation) -> Result<()> {
        tracing::debug!(
            txid = %attestation.txid,
            merkle_root = %attestation.commitment_hash(),
            confirmed = attestation.confirmed,
            "Saving attestation"
        );

        sqlx::query(
            r"
            INSERT INTO attestations (txid, merkle_root, confirmed)
            VALUES ($1, $2, $3)
            ON CONFLICT (txid)
            DO UPDATE SET merkle_root = $2, confirmed = $3
            ",
        )
        .bind(attestation.txid)
        .bind(attestation.commitment_hash())
        .bind(attestation.confirmed)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Inserts or updates the chain data for a confirmed attestation.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    pub async fn upsert_info(&self, info: &AttestationInfo) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO attestation_info (txid, block_hash, amount, attested_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (txid)
            DO UPDATE SET block_hash = $2, amount = $3, attested_at = $4
            ",
        )
        .bind(info.txid)
        .bind(info.block_hash)
        .bind(info.amount)
        .bind(info.time)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Merkle root of the most recently stored attestation.
    ///
    /// Unconfirmed rows are skipped unless `include_unconfirmed` is set.
    /// Returns the zero hash when nothing qualifies.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn latest_merkle_root(&self, include_unconfirmed: bool) -> Result<CommitmentHash> {
        let root: Option<CommitmentHash> = sqlx::query_scalar(
            r"
            SELECT merkle_root FROM attestations
            WHERE confirmed OR $1
            ORDER BY inserted_at DESC
            LIMIT 1
            ",
        )
        .bind(include_unconfirmed)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(root.unwrap_or_default())
    }

    /// Merkle root attested by a specific transaction, if stored.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_merkle_root(&self, txid: CommitmentHash) -> Result<Option<CommitmentHash>> {
        let root: Option<CommitmentHash> = sqlx::query_scalar(
            r"
            SELECT merkle_root FROM attestations
            WHERE txid = $1
            ",
        )
        .bind(txid)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(root)
    }
}
