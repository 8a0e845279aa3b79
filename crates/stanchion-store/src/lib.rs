//! PostgreSQL persistence layer implementing the repository pattern.
//!
//! The repository layer translates between domain models and database rows.
//! All database access goes through these repositories; hash values are
//! stored as 32 raw bytes and proof op sequences as ordered JSONB arrays.
//! Every write is an upsert so a failed confirmation round can be retried
//! wholesale without duplicating rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use sqlx::PgPool;

pub mod attestations;
pub mod client_commitments;
pub mod error;
pub mod merkle_commitments;
pub mod merkle_proofs;

pub use error::{Result, StoreError};

/// Container for all repository instances providing unified database access.
///
/// Manages a shared connection pool and gives type-safe access to each
/// table's repository.
#[derive(Clone)]
pub struct Storage {
    /// Repository for attestation and attestation-info rows.
    pub attestations: Arc<attestations::Repository>,

    /// Repository for merkle commitment rows.
    pub merkle_commitments: Arc<merkle_commitments::Repository>,

    /// Repository for inclusion proof rows.
    pub merkle_proofs: Arc<merkle_proofs::Repository>,

    /// Repository for current client commitments.
    pub client_commitments: Arc<client_commitments::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    ///
    /// All repositories share the same pool with `Arc` for efficient
    /// resource usage.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self {
            attestations: Arc::new(attestations::Repository::new(pool.clone())),
            merkle_commitments: Arc::new(merkle_commitments::Repository::new(pool.clone())),
            merkle_proofs: Arc::new(merkle_proofs::Repository::new(pool.clone())),
            client_commitments: Arc::new(client_commitments::Repository::new(pool)),
        }
    }

    /// Performs a health check on the database connection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection is unhealthy or the
    /// query times out.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) =
            sqlx::query_as("SELECT 1").fetch_one(&*self.attestations.pool()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        // Verifies the container wires up without a live connection;
        // actual query behavior is covered by integration environments.
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _storage = Storage::new(pool);
    }
}
