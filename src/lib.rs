//! Main crate for `edgedns_records`, the record reconciliation core of an edge DNS provider client.
//!
//! Declared records are validated and rendered into presentation-format RDATA by the
//! [`codec`], compared against what the DNS API currently serves, and written back
//! through a [`provider::Provider`] with bounded retries.
//!
//! The following modules might be of interest if you want to add new functionality:
//! - [`codec`] holds the per-type registry. Supporting a new record type starts there
//! - [`plan`] decides which write is needed, including the order-preserving MX merge
//! - [`engine`] wraps everything into the create/read/update/delete/import lifecycle

#![allow(clippy::uninlined_format_args)]

pub mod codec;
pub mod config;
pub mod engine;
pub mod fingerprint;
pub mod lock;
pub mod plan;
pub mod provider;
pub mod retry;
pub mod soa;
pub mod types;

pub use codec::{RecordFields, RecordType};
pub use config::{EngineConfig, RetryPolicy};
pub use engine::{EngineError, RecordEngine};
pub use lock::LockRegistry;
pub use provider::{Provider, ProviderError};
pub use types::{RecordConfig, RecordSet, RecordState};
