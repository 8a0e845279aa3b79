//! 32-byte commitment hash primitive and node combination.
//!
//! Every value the system hashes, stores or attests is a `CommitmentHash`.
//! Tree nodes are combined by double SHA-256 over the concatenation of the
//! two children, with no domain separation between levels, so a proof can be
//! replayed with nothing but the leaf and the sibling sequence.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Byte length of a commitment hash.
pub const HASH_SIZE: usize = 32;

/// A 32-byte commitment digest.
///
/// Displays as a 64-character lowercase hex string, serializes as that hex
/// string in textual encodings and as 32 raw bytes in the database. The
/// all-zero hash is the sentinel for "no attestation / empty commitment".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitmentHash([u8; HASH_SIZE]);

impl CommitmentHash {
    /// The all-zero sentinel hash.
    pub const ZERO: Self = Self([0u8; HASH_SIZE]);

    /// Wraps raw digest bytes.
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character lowercase hex string.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidHash` when the input is not exactly 32
    /// bytes of valid hex.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHash {
            value: s.chars().take(80).collect(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes).map_err(|_| CoreError::InvalidHash {
            value: s.chars().take(80).collect(),
            reason: format!("expected {} bytes, got {}", HASH_SIZE, bytes.len()),
        })
    }

    /// Wraps a byte slice, failing when it is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let bytes: [u8; HASH_SIZE] =
            bytes.try_into().map_err(|_| CoreError::InvalidHash {
                value: hex::encode(&bytes[..bytes.len().min(40)]),
                reason: format!("expected {} bytes, got {}", HASH_SIZE, bytes.len()),
            })?;
        Ok(Self(bytes))
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Combines two sibling nodes into their parent hash.
    ///
    /// Double SHA-256 over the 64-byte concatenation `self || right`. The
    /// same primitive applies at every tree level; a node without a right
    /// sibling is combined with itself.
    pub fn combine(&self, right: &Self) -> Self {
        let mut first = Sha256::new();
        first.update(self.0);
        first.update(right.0);
        let digest = Sha256::digest(first.finalize());
        Self(digest.into())
    }
}

impl fmt::Display for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CommitmentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitmentHash({})", self.to_hex())
    }
}

impl Default for CommitmentHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for CommitmentHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CommitmentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitmentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

impl sqlx::Type<PgDb> for CommitmentHash {
    fn type_info() -> PgTypeInfo {
        <Vec<u8> as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for CommitmentHash {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let bytes = <Vec<u8> as sqlx::Decode<PgDb>>::decode(value)?;
        Self::from_bytes(&bytes).map_err(Into::into)
    }
}

impl sqlx::Encode<'_, PgDb> for CommitmentHash {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Vec<u8> as sqlx::Encode<PgDb>>::encode_by_ref(&self.0.to_vec(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "1a39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7";

    #[test]
    fn hex_round_trip() {
        let hash = CommitmentHash::from_hex(HEX).unwrap();
        assert_eq!(hash.to_hex(), HEX);
        assert_eq!(hash.to_string(), HEX);
        assert_eq!(HEX.parse::<CommitmentHash>().unwrap(), hash);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(CommitmentHash::from_hex("abcd").is_err());
        assert!(CommitmentHash::from_hex("zz39e34e881d9a1e6cdc3418b54aa57747106bc75e9e84426661f27f98ada3b7").is_err());
        assert!(CommitmentHash::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn zero_sentinel() {
        assert!(CommitmentHash::ZERO.is_zero());
        assert!(CommitmentHash::default().is_zero());
        assert!(!CommitmentHash::from_hex(HEX).unwrap().is_zero());
        assert_eq!(CommitmentHash::ZERO.to_hex(), "0".repeat(64));
    }

    #[test]
    fn combine_is_deterministic_and_order_sensitive() {
        let a = CommitmentHash::new([0x11; HASH_SIZE]);
        let b = CommitmentHash::new([0x22; HASH_SIZE]);

        assert_eq!(a.combine(&b), a.combine(&b));
        assert_ne!(a.combine(&b), b.combine(&a));
        assert_ne!(a.combine(&a), a, "self combination must not be the identity");
    }

    #[test]
    fn combine_is_double_sha256() {
        let a = CommitmentHash::new([0xAA; HASH_SIZE]);
        let b = CommitmentHash::new([0xBB; HASH_SIZE]);

        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(a.as_bytes());
        concat[32..].copy_from_slice(b.as_bytes());
        let expected: [u8; 32] = Sha256::digest(Sha256::digest(concat)).into();

        assert_eq!(a.combine(&b), CommitmentHash::new(expected));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let hash = CommitmentHash::from_hex(HEX).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{HEX}\""));

        let back: CommitmentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
