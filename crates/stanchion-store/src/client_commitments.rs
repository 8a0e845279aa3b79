//! Repository for current client commitments.

use std::sync::Arc;

use sqlx::PgPool;
use stanchion_core::ClientCommitment;

use crate::error::Result;

/// Repository for the current commitment of each connected client.
///
/// One row per client position, overwritten as clients submit fresh
/// commitments through the external ingestion surface. The tracker reads
/// the whole set when freezing a new attestation round.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// All current client commitments in position order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self) -> Result<Vec<ClientCommitment>> {
        let rows = sqlx::query_as::<_, ClientCommitment>(
            r"
            SELECT commitment, client_position
            FROM client_commitments
            ORDER BY client_position ASC
            ",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts or replaces one client's current commitment.
    ///
    /// Called by the ingestion surface whenever a client submits a new
    /// state commitment.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    pub async fn upsert(&self, commitment: &ClientCommitment) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO client_commitments (client_position, commitment, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (client_position)
            DO UPDATE SET commitment = $2, updated_at = NOW()
            ",
        )
        .bind(commitment.client_position)
        .bind(commitment.commitment)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }
}
