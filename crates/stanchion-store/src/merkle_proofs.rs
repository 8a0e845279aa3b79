//! Repository for persisted inclusion proof rows.

use std::sync::Arc;

use sqlx::PgPool;
use stanchion_core::CommitmentMerkleProof;

use crate::error::Result;

/// Repository for inclusion proof rows.
///
/// One row per `(merkle_root, client_position)` pair with the op sequence
/// stored as an ordered JSONB array of `{append, commitment}` objects.
/// Proofs are written when an attestation confirms and served to clients by
/// the external query surface.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Saves every proof of one attestation round in a single transaction.
    ///
    /// Upserts keyed by `(merkle_root, client_position)` keep a retried
    /// round idempotent.
    ///
    /// # Errors
    ///
    /// Returns error if op serialization or any write fails; no row of the
    /// batch is kept on failure.
    pub async fn save_all(&self, proofs: &[CommitmentMerkleProof]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for proof in proofs {
            let ops = serde_json::to_value(&proof.ops)?;

            sqlx::query(
                r"
                INSERT INTO merkle_proofs (merkle_root, client_position, commitment, ops)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (merkle_root, client_position)
                DO UPDATE SET commitment = $3, ops = $4
                ",
            )
            .bind(proof.merkle_root)
            .bind(proof.client_position)
            .bind(proof.commitment)
            .bind(ops)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(rows = proofs.len(), "Saved merkle proof batch");
        Ok(())
    }
}
