//! Persisted order records and the checksummed snapshot envelope used for
//! startup rehydration.

use crate::definitions::Account;
use crate::order::{ExecutionReport, OrderInfo};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors sealing or opening an order snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The records could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    /// The payload could not be deserialized.
    #[error("snapshot deserialization failed: {0}")]
    Deserialization(String),

    /// The payload does not match its checksum.
    #[error("snapshot checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        /// The checksum recorded in the envelope.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },
}

/// Everything the core needs to re-establish one live order: its info, its
/// full report stream in sequence order, and the owning account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOrderRecord {
    /// The account the order belongs to.
    pub account: Account,
    /// The order's submission record.
    pub info: OrderInfo,
    /// The order's reports, in sequence order.
    pub reports: Vec<ExecutionReport>,
}

/// A serialized batch of order records with an integrity checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshotPackage {
    checksum: String,
    payload: String,
}

impl OrderSnapshotPackage {
    /// Serializes `records` and seals them with a SHA-256 checksum.
    pub fn seal(records: &[AccountOrderRecord]) -> Result<Self, SnapshotError> {
        let payload = serde_json::to_string(records)
            .map_err(|error| SnapshotError::Serialization(error.to_string()))?;
        let checksum = Self::digest(&payload);
        Ok(OrderSnapshotPackage { checksum, payload })
    }

    /// Verifies the checksum and deserializes the records.
    pub fn open(&self) -> Result<Vec<AccountOrderRecord>, SnapshotError> {
        let actual = Self::digest(&self.payload);
        if actual != self.checksum {
            return Err(SnapshotError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual,
            });
        }
        serde_json::from_str(&self.payload)
            .map_err(|error| SnapshotError::Deserialization(error.to_string()))
    }

    fn digest(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}
