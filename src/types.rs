use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    codec::{self, RecordFields, RecordType, ValidationError},
    fingerprint::Fingerprint,
};

pub type TTL = u32;

/// All records sharing a zone, host and type, with their rendered RDATA.
///
/// Built fresh from declared fields via [`codec::render`] or from a server response,
/// and replaced rather than mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordSet {
    pub zone: String,
    pub host: String,
    pub record_type: RecordType,
    pub ttl: TTL,
    pub rdata: Vec<String>,
}

impl RecordSet {
    /// The RDATA in canonical comparable form.
    pub fn normalized(&self) -> Vec<String> {
        codec::normalize(self.record_type, &self.rdata)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.record_type, &self.rdata)
    }

    /// True if both sets would serve the same answers with the same ttl.
    pub fn same_content(&self, other: &RecordSet) -> bool {
        self.record_type == other.record_type
            && self.ttl == other.ttl
            && self.normalized() == other.normalized()
    }

    /// Copy of this set carrying different RDATA.
    pub fn with_rdata(&self, rdata: Vec<String>) -> RecordSet {
        RecordSet {
            rdata,
            ..self.clone()
        }
    }
}

impl Display for RecordSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} (zone {}): [{}]",
            self.host,
            self.ttl,
            self.record_type,
            self.zone,
            self.rdata.join(", ")
        )
    }
}

/// A record as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    pub zone: String,
    pub host: String,
    pub ttl: TTL,
    pub fields: RecordFields,
}

impl RecordConfig {
    pub fn record_type(&self) -> RecordType {
        self.fields.record_type()
    }

    pub fn render(&self) -> Result<RecordSet, ValidationError> {
        codec::render(self)
    }
}

/// What a caller persists between operations: the last applied record set and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordState {
    pub record: RecordSet,
    pub fingerprint: Fingerprint,
}

impl RecordState {
    pub fn new(record: RecordSet) -> Self {
        let fingerprint = record.fingerprint();
        RecordState {
            record,
            fingerprint,
        }
    }
}
