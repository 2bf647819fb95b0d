//! Content fingerprints used to detect out-of-band changes to a record set.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::codec::{self, RecordType};

/// SHA-256 hex digest of the normalized RDATA, joined with newlines.
///
/// The ttl is not part of the fingerprint: it is compared separately and a ttl
/// change is never treated as drift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(record_type: RecordType, rdata: &[String]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(codec::normalize(record_type, rdata).join("\n").as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The server holds content that neither the last applied state nor the current
/// configuration explains. Never resolved automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{record_type} record {host} in zone {zone} diverged from its last applied state: {reason}; manual intervention required")]
pub struct DivergenceError {
    pub zone: String,
    pub host: String,
    pub record_type: RecordType,
    pub reason: String,
}
