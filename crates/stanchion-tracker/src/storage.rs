//! Storage abstraction layer for the attestation tracker.
//!
//! Provides a trait-based contract over persistence operations so tracker
//! logic is testable without a database. Production uses the concrete
//! `stanchion_store::Storage` behind an adapter while tests provide the
//! in-memory implementation from [`mock`].

use std::{future::Future, pin::Pin, sync::Arc};

use stanchion_core::{
    Attestation, AttestationInfo, ClientCommitment, CommitmentHash, CommitmentMerkleProof,
    MerkleCommitment,
};
use stanchion_store::{Result, StoreError};

/// Persistence operations required by the attestation tracker.
///
/// Abstracts every database interaction of the attestation lifecycle:
/// reading the current client commitments, recording confirmed rounds and
/// resolving historic rounds by txid. Enables both the production
/// PostgreSQL implementation and lightweight test doubles behind one
/// object-safe interface.
pub trait TrackerStorage: Send + Sync + 'static {
    /// Saves or replaces the attestation record for its txid.
    fn save_attestation(
        &self,
        attestation: Attestation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Saves the chain data of a confirmed attestation.
    fn save_attestation_info(
        &self,
        info: AttestationInfo,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Saves the per-position leaf rows of a confirmed round.
    fn save_merkle_commitments(
        &self,
        commitments: Vec<MerkleCommitment>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Saves the per-position inclusion proofs of a confirmed round.
    fn save_merkle_proofs(
        &self,
        proofs: Vec<CommitmentMerkleProof>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Merkle root of the most recently stored attestation, the zero hash
    /// when nothing qualifies. Unconfirmed attestations count only when
    /// `include_unconfirmed` is set.
    fn latest_merkle_root(
        &self,
        include_unconfirmed: bool,
    ) -> Pin<Box<dyn Future<Output = Result<CommitmentHash>> + Send + '_>>;

    /// Current commitments of all connected clients; may be empty.
    fn client_commitments(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ClientCommitment>>> + Send + '_>>;

    /// Leaf rows of the attestation with the given txid, in position order.
    /// Empty when the txid is unknown.
    fn attestation_merkle_commitments(
        &self,
        txid: CommitmentHash,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MerkleCommitment>>> + Send + '_>>;
}

/// Production storage implementation using PostgreSQL.
///
/// Wraps the concrete `stanchion_store::Storage` to implement
/// `TrackerStorage`. All database operations go through the repository
/// layer.
pub struct PostgresTrackerStorage {
    storage: Arc<stanchion_store::Storage>,
}

impl PostgresTrackerStorage {
    /// Creates a new PostgreSQL storage adapter.
    pub fn new(storage: Arc<stanchion_store::Storage>) -> Self {
        Self { storage }
    }
}

impl TrackerStorage for PostgresTrackerStorage {
    fn save_attestation(
        &self,
        attestation: Attestation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.attestations.upsert(&attestation).await })
    }

    fn save_attestation_info(
        &self,
        info: AttestationInfo,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.attestations.upsert_info(&info).await })
    }

    fn save_merkle_commitments(
        &self,
        commitments: Vec<MerkleCommitment>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.merkle_commitments.save_all(&commitments).await })
    }

    fn save_merkle_proofs(
        &self,
        proofs: Vec<CommitmentMerkleProof>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.merkle_proofs.save_all(&proofs).await })
    }

    fn latest_merkle_root(
        &self,
        include_unconfirmed: bool,
    ) -> Pin<Box<dyn Future<Output = Result<CommitmentHash>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move {
            storage.attestations.latest_merkle_root(include_unconfirmed).await
        })
    }

    fn client_commitments(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ClientCommitment>>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.client_commitments.list().await })
    }

    fn attestation_merkle_commitments(
        &self,
        txid: CommitmentHash,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MerkleCommitment>>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move {
            // Rows are keyed by root; resolve through the attestation record.
            match storage.attestations.find_merkle_root(txid).await? {
                Some(root) => storage.merkle_commitments.find_for_root(root).await,
                None => Ok(Vec::new()),
            }
        })
    }
}

pub mod mock {
    //! In-memory storage implementation for testing.
    //!
    //! Deterministic substitute for the PostgreSQL layer: stores rows in
    //! `RwLock`-guarded vectors, supports error injection, and exposes
    //! snapshot accessors for asserting what a tracker run persisted.

    use std::{future::Future, pin::Pin, sync::Arc};

    use tokio::sync::RwLock;

    use super::{
        Attestation, AttestationInfo, ClientCommitment, CommitmentHash, CommitmentMerkleProof,
        MerkleCommitment, Result, StoreError, TrackerStorage,
    };

    /// In-memory tracker storage for tests.
    #[derive(Default)]
    pub struct MemoryTrackerStorage {
        attestations: Arc<RwLock<Vec<Attestation>>>,
        attestation_info: Arc<RwLock<Vec<AttestationInfo>>>,
        merkle_commitments: Arc<RwLock<Vec<MerkleCommitment>>>,
        merkle_proofs: Arc<RwLock<Vec<CommitmentMerkleProof>>>,
        client_commitments: Arc<RwLock<Vec<ClientCommitment>>>,
        save_error: Arc<RwLock<Option<String>>>,
    }

    impl MemoryTrackerStorage {
        /// Creates empty in-memory storage.
        pub fn new() -> Self {
            Self::default()
        }

        /// Replaces the current client commitment set.
        pub async fn set_client_commitments(&self, commitments: Vec<ClientCommitment>) {
            *self.client_commitments.write().await = commitments;
        }

        /// Injects an error for the next save operation.
        pub async fn inject_save_error(&self, error: impl Into<String>) {
            *self.save_error.write().await = Some(error.into());
        }

        /// Snapshot of stored attestation records.
        pub async fn saved_attestations(&self) -> Vec<Attestation> {
            self.attestations.read().await.clone()
        }

        /// Snapshot of stored attestation chain data.
        pub async fn saved_attestation_info(&self) -> Vec<AttestationInfo> {
            self.attestation_info.read().await.clone()
        }

        /// Snapshot of stored merkle commitment rows.
        pub async fn saved_merkle_commitments(&self) -> Vec<MerkleCommitment> {
            self.merkle_commitments.read().await.clone()
        }

        /// Snapshot of stored inclusion proofs.
        pub async fn saved_merkle_proofs(&self) -> Vec<CommitmentMerkleProof> {
            self.merkle_proofs.read().await.clone()
        }

        async fn take_injected_error(&self) -> Option<StoreError> {
            self.save_error.write().await.take().map(StoreError::Database)
        }
    }

    impl TrackerStorage for MemoryTrackerStorage {
        fn save_attestation(
            &self,
            attestation: Attestation,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                if let Some(err) = self.take_injected_error().await {
                    return Err(err);
                }
                let mut attestations = self.attestations.write().await;
                match attestations.iter().position(|a| a.txid == attestation.txid) {
                    Some(i) => attestations[i] = attestation,
                    None => attestations.push(attestation),
                }
                Ok(())
            })
        }

        fn save_attestation_info(
            &self,
            info: AttestationInfo,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                if let Some(err) = self.take_injected_error().await {
                    return Err(err);
                }
                let mut infos = self.attestation_info.write().await;
                match infos.iter().position(|i| i.txid == info.txid) {
                    Some(i) => infos[i] = info,
                    None => infos.push(info),
                }
                Ok(())
            })
        }

        fn save_merkle_commitments(
            &self,
            commitments: Vec<MerkleCommitment>,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                if let Some(err) = self.take_injected_error().await {
                    return Err(err);
                }
                let mut rows = self.merkle_commitments.write().await;
                for commitment in commitments {
                    match rows.iter().position(|r| {
                        r.merkle_root == commitment.merkle_root
                            && r.client_position == commitment.client_position
                    }) {
                        Some(i) => rows[i] = commitment,
                        None => rows.push(commitment),
                    }
                }
                Ok(())
            })
        }

        fn save_merkle_proofs(
            &self,
            proofs: Vec<CommitmentMerkleProof>,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async move {
                if let Some(err) = self.take_injected_error().await {
                    return Err(err);
                }
                let mut rows = self.merkle_proofs.write().await;
                for proof in proofs {
                    match rows.iter().position(|r| {
                        r.merkle_root == proof.merkle_root
                            && r.client_position == proof.client_position
                    }) {
                        Some(i) => rows[i] = proof,
                        None => rows.push(proof),
                    }
                }
                Ok(())
            })
        }

        fn latest_merkle_root(
            &self,
            include_unconfirmed: bool,
        ) -> Pin<Box<dyn Future<Output = Result<CommitmentHash>> + Send + '_>> {
            Box::pin(async move {
                let attestations = self.attestations.read().await;
                let latest = attestations
                    .iter()
                    .rev()
                    .find(|a| a.confirmed || include_unconfirmed)
                    .map(Attestation::commitment_hash)
                    .unwrap_or_default();
                Ok(latest)
            })
        }

        fn client_commitments(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ClientCommitment>>> + Send + '_>> {
            Box::pin(async move { Ok(self.client_commitments.read().await.clone()) })
        }

        fn attestation_merkle_commitments(
            &self,
            txid: CommitmentHash,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<MerkleCommitment>>> + Send + '_>> {
            Box::pin(async move {
                let attestations = self.attestations.read().await;
                let Some(root) =
                    attestations.iter().find(|a| a.txid == txid).map(Attestation::commitment_hash)
                else {
                    return Ok(Vec::new());
                };

                let mut rows: Vec<MerkleCommitment> = self
                    .merkle_commitments
                    .read()
                    .await
                    .iter()
                    .filter(|r| r.merkle_root == root)
                    .copied()
                    .collect();
                rows.sort_by_key(|r| r.client_position);
                Ok(rows)
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use stanchion_core::Commitment;

        use super::*;

        fn hash(byte: u8) -> CommitmentHash {
            CommitmentHash::new([byte; 32])
        }

        #[tokio::test]
        async fn save_attestation_replaces_same_txid() {
            let storage = MemoryTrackerStorage::new();
            let commitment = Commitment::new(vec![hash(0x01)]).unwrap();

            let mut attestation = Attestation::new(hash(0xA0), Some(commitment));
            storage.save_attestation(attestation.clone()).await.unwrap();

            attestation.confirmed = true;
            storage.save_attestation(attestation).await.unwrap();

            let saved = storage.saved_attestations().await;
            assert_eq!(saved.len(), 1);
            assert!(saved[0].confirmed);
        }

        #[tokio::test]
        async fn latest_merkle_root_respects_confirmation_filter() {
            let storage = MemoryTrackerStorage::new();
            let commitment = Commitment::new(vec![hash(0x01)]).unwrap();
            let root = commitment.commitment_hash();

            storage
                .save_attestation(Attestation::new(hash(0xA0), Some(commitment)))
                .await
                .unwrap();

            assert!(storage.latest_merkle_root(false).await.unwrap().is_zero());
            assert_eq!(storage.latest_merkle_root(true).await.unwrap(), root);
        }

        #[tokio::test]
        async fn injected_error_fails_exactly_one_save() {
            let storage = MemoryTrackerStorage::new();
            storage.inject_save_error("connection reset").await;

            let attestation = Attestation::new(hash(0xA0), None);
            assert!(storage.save_attestation(attestation.clone()).await.is_err());
            assert!(storage.save_attestation(attestation).await.is_ok());
        }

        #[tokio::test]
        async fn unknown_txid_yields_no_rows() {
            let storage = MemoryTrackerStorage::new();
            let rows =
                storage.attestation_merkle_commitments(hash(0x09)).await.unwrap();
            assert!(rows.is_empty());
        }
    }
}
