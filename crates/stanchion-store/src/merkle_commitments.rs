//! Repository for persisted merkle commitment rows.

use std::sync::Arc;

use sqlx::PgPool;
use stanchion_core::{CommitmentHash, MerkleCommitment};

use crate::error::Result;

/// Repository for merkle commitment rows.
///
/// One row per `(merkle_root, client_position)` pair of a confirmed
/// attestation round. The row set for a root is sufficient to rebuild the
/// round's tree, so historic commitments stay provable after the in-memory
/// round has moved on.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Saves every row of one attestation round in a single transaction.
    ///
    /// Rows are upserts keyed by `(merkle_root, client_position)`, so a
    /// retried round is written wholesale without duplication.
    ///
    /// # Errors
    ///
    /// Returns error if any write fails; no row of the batch is kept.
    pub async fn save_all(&self, commitments: &[MerkleCommitment]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for row in commitments {
            sqlx::query(
                r"
                INSERT INTO merkle_commitments (merkle_root, client_position, commitment)
                VALUES ($1, $2, $3)
                ON CONFLICT (merkle_root, client_position)
                DO UPDATE SET commitment = $3
                ",
            )
            .bind(row.merkle_root)
            .bind(row.client_position)
            .bind(row.commitment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(rows = commitments.len(), "Saved merkle commitment batch");
        Ok(())
    }

    /// Rows for one merkle root, in position order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_for_root(&self, merkle_root: CommitmentHash) -> Result<Vec<MerkleCommitment>> {
        let rows = sqlx::query_as::<_, MerkleCommitment>(
            r"
            SELECT merkle_root, client_position, commitment
            FROM merkle_commitments
            WHERE merkle_root = $1
            ORDER BY client_position ASC
            ",
        )
        .bind(merkle_root)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows)
    }
}
