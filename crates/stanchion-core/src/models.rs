//! Client commitment and persisted merkle row types.

use serde::{Deserialize, Serialize};

use crate::hash::CommitmentHash;

/// One client's commitment for the current attestation round.
///
/// Collected externally by polling connected clients. Raw positions are not
/// required to be contiguous; aggregation into a round rejects any gap in
/// the `0..n` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCommitment {
    /// The client's commitment digest.
    pub commitment: CommitmentHash,

    /// Fixed leaf position assigned to the client.
    pub client_position: i32,
}

impl ClientCommitment {
    /// Creates a client commitment at the given position.
    pub fn new(commitment: CommitmentHash, client_position: i32) -> Self {
        Self { commitment, client_position }
    }
}

/// Persisted merkle commitment row, keyed by `(merkle_root, client_position)`.
///
/// One row per leaf of a confirmed attestation round; the set of rows for a
/// root is sufficient to rebuild the round's tree and proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleCommitment {
    /// Root of the attested tree this leaf belongs to.
    pub merkle_root: CommitmentHash,

    /// Leaf position within the tree.
    pub client_position: i32,

    /// The leaf digest itself.
    pub commitment: CommitmentHash,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for MerkleCommitment {
    fn from_row(row: &sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            merkle_root: row.try_get("merkle_root")?,
            client_position: row.try_get("client_position")?,
            commitment: row.try_get("commitment")?,
        })
    }
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ClientCommitment {
    fn from_row(row: &sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            commitment: row.try_get("commitment")?,
            client_position: row.try_get("client_position")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_commitment_serializes_position_and_hex() {
        let commitment = ClientCommitment::new(CommitmentHash::new([0x5Au8; 32]), 3);
        let json = serde_json::to_value(&commitment).unwrap();

        assert_eq!(json["client_position"], 3);
        assert_eq!(json["commitment"], "5a".repeat(32));
    }
}
