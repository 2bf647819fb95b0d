#[cfg(test)]
use mockall::automock;

use http::StatusCode;
use thiserror::Error;

use crate::{codec::RecordType, types::RecordSet};

/// A provider is the DNS record API that ultimately serves the records.
/// It exposes one record set per (zone, host, type) and plain create/update/delete calls.
///
/// Implementations must report API failures as [`ProviderError::Api`] with the HTTP
/// status, so that not-found and conflict responses can be told apart.
#[cfg_attr(test, automock)]
pub trait Provider {
    /// Returns the record set currently served for `host` in `zone`.
    /// A missing record set is an API error with status 404.
    fn get_record(
        &self,
        zone: &str,
        host: &str,
        record_type: RecordType,
    ) -> Result<RecordSet, ProviderError>;

    fn create_record(&self, record: &RecordSet) -> Result<(), ProviderError>;

    fn update_record(&self, record: &RecordSet) -> Result<(), ProviderError>;

    fn delete_record(&self, record: &RecordSet) -> Result<(), ProviderError>;
}

/// Generic error returned by a provider action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The API answered with an error status.
    #[error("API error {status}: {message}")]
    Api { status: StatusCode, message: String },
    /// Anything that is not an API response: transport failures, malformed bodies, ...
    #[error("{0}")]
    Internal(String),
}

impl ProviderError {
    pub fn api(status: StatusCode, message: impl Into<String>) -> Self {
        ProviderError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            ProviderError::Internal(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }
}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        ProviderError::Internal(s)
    }
}
