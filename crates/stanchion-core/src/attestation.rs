//! Attestation lifecycle model.
//!
//! An attestation is one on-chain transaction carrying a commitment root.
//! It starts unconfirmed with a txid and the commitment being attested, and
//! becomes confirmed once chain data for the transaction is available.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{commitment::Commitment, hash::CommitmentHash};

/// Chain-reported data for a confirmed attestation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationInfo {
    /// Attestation transaction id.
    pub txid: CommitmentHash,

    /// Hash of the block containing the transaction.
    pub block_hash: CommitmentHash,

    /// Transaction output amount in base units.
    pub amount: i64,

    /// Block time as unix seconds.
    pub time: i64,
}

impl AttestationInfo {
    /// The block time as a wall-clock timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.time, 0).unwrap_or_else(Utc::now)
    }
}

/// One attestation round tracked from broadcast to confirmation.
///
/// The default value (zero txid, no commitment, unconfirmed) stands for "no
/// attestation yet". An unconfirmed attestation may carry no commitment,
/// which covers bookkeeping of a txid whose round has not been frozen. A
/// confirmed attestation without a commitment is invalid and rejected by the
/// tracker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attestation {
    /// Transaction id of the attestation, zero while none exists.
    pub txid: CommitmentHash,

    /// The commitment attested by this transaction.
    pub commitment: Option<Commitment>,

    /// Whether the transaction has been confirmed on chain.
    pub confirmed: bool,

    /// Chain data, present once confirmed.
    pub info: Option<AttestationInfo>,
}

impl Attestation {
    /// Creates a new unconfirmed attestation for a broadcast txid.
    pub fn new(txid: CommitmentHash, commitment: Option<Commitment>) -> Self {
        Self { txid, commitment, confirmed: false, info: None }
    }

    /// Marks the attestation confirmed with its chain data.
    pub fn confirm(&mut self, info: AttestationInfo) {
        self.confirmed = true;
        self.info = Some(info);
    }

    /// Root of the attested commitment, or the zero hash when none is set.
    ///
    /// Degrading to zero keeps reads of the in-flight state total even for
    /// a commitment-less unconfirmed attestation.
    pub fn commitment_hash(&self) -> CommitmentHash {
        self.commitment.as_ref().map(Commitment::commitment_hash).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commitment() -> Commitment {
        Commitment::new(vec![CommitmentHash::new([0x77; 32])]).unwrap()
    }

    #[test]
    fn new_attestation_starts_unconfirmed() {
        let txid = CommitmentHash::new([0x01; 32]);
        let attestation = Attestation::new(txid, Some(commitment()));

        assert_eq!(attestation.txid, txid);
        assert!(!attestation.confirmed);
        assert!(attestation.info.is_none());
        assert_eq!(attestation.commitment_hash(), commitment().commitment_hash());
    }

    #[test]
    fn default_attestation_means_none_yet() {
        let attestation = Attestation::default();

        assert!(attestation.txid.is_zero());
        assert!(attestation.commitment.is_none());
        assert!(!attestation.confirmed);
        assert!(attestation.commitment_hash().is_zero());
    }

    #[test]
    fn confirm_records_chain_info() {
        let txid = CommitmentHash::new([0x01; 32]);
        let mut attestation = Attestation::new(txid, Some(commitment()));

        attestation.confirm(AttestationInfo {
            txid,
            block_hash: CommitmentHash::new([0x02; 32]),
            amount: 1,
            time: 1_542_121_293,
        });

        assert!(attestation.confirmed);
        let info = attestation.info.as_ref().unwrap();
        assert_eq!(info.timestamp().timestamp(), 1_542_121_293);
    }
}
