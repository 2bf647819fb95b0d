//! Record lifecycle operations: create, read, update, delete and import.
//!
//! Every operation validates its input before touching the network, then holds the
//! record type's lock from the first read of server state until the post-write
//! read-back.

use std::time::Instant;

use http::StatusCode;
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    codec::{self, DecodeError, RecordFields, RecordType, ValidationError},
    config::EngineConfig,
    fingerprint::DivergenceError,
    lock::LockRegistry,
    plan::{
        mx::{self, MergeError, PriorityMismatchError},
        Plan,
    },
    provider::{Provider, ProviderError},
    retry::{RetryError, RetryExecutor},
    soa::{self, SerialManager},
    types::{RecordConfig, RecordSet, RecordState},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    PriorityMismatch(#[from] PriorityMismatchError),
    #[error(transparent)]
    Divergence(#[from] DivergenceError),
    #[error(transparent)]
    Retry(#[from] RetryError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<MergeError> for EngineError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::PriorityMismatch(e) => EngineError::PriorityMismatch(e),
            MergeError::Decode(e) => EngineError::Decode(e),
            MergeError::Validation(e) => EngineError::Validation(e),
        }
    }
}

impl EngineError {
    /// True if the record set does not exist on the server.
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::Provider(e) | EngineError::Retry(RetryError::Provider(e)) => {
                e.is_not_found()
            }
            _ => false,
        }
    }
}

/// Runs record operations against a [`Provider`].
pub struct RecordEngine<'a, P: Provider + ?Sized> {
    provider: &'a P,
    locks: &'a LockRegistry,
    config: EngineConfig,
}

impl<'a, P: Provider + ?Sized> RecordEngine<'a, P> {
    pub fn new(provider: &'a P, locks: &'a LockRegistry, config: EngineConfig) -> Self {
        RecordEngine {
            provider,
            locks,
            config,
        }
    }

    /// Creates the declared record set, merging into whatever the server already holds.
    pub fn create(&self, config: &RecordConfig) -> Result<RecordState, EngineError> {
        let desired = config.render()?;
        let deadline = self.deadline();
        let _guard = self.locks.lock(desired.record_type);

        let current = self.fetch(&desired.zone, &desired.host, desired.record_type)?;
        let desired = self.reconcile(desired, config, None, current.as_ref())?;
        self.apply(Plan::generate(desired, current.as_ref()), deadline)?;
        self.read_back(config)
    }

    /// Reads the record set back and checks it against the last applied state.
    ///
    /// Returns `None` if the record set no longer exists, so the caller can drop its state.
    pub fn read(
        &self,
        config: &RecordConfig,
        last: &RecordState,
    ) -> Result<Option<RecordState>, EngineError> {
        let declared = config.render()?;
        let _guard = self.locks.lock(declared.record_type);

        let remote = match self.fetch(&declared.zone, &declared.host, declared.record_type)? {
            Some(remote) => remote,
            None => {
                info!("{} record {} is gone", declared.record_type, declared.host);
                return Ok(None);
            }
        };
        if remote.fingerprint() == last.fingerprint {
            debug!("{} record {} unchanged", declared.record_type, declared.host);
            return Ok(Some(RecordState::new(remote)));
        }

        match &config.fields {
            RecordFields::Soa(fields) => {
                soa::check_stable(&remote, &last.record, fields)?;
            }
            RecordFields::Mx(fields) => {
                let expected = mx::merge(&remote.rdata, None, fields);
                if expected.ok() != Some(remote.normalized()) {
                    return Err(divergence(&remote, "MX entries differ from configuration").into());
                }
            }
            _ => {
                if remote.normalized() != declared.normalized() {
                    return Err(divergence(&remote, "content differs from configuration").into());
                }
            }
        }
        info!(
            "{} record {} changed on the server but matches configuration",
            declared.record_type, declared.host
        );
        Ok(Some(RecordState::new(remote)))
    }

    /// Applies a changed configuration. Zone, host and type cannot change.
    pub fn update(
        &self,
        previous: &RecordConfig,
        desired: &RecordConfig,
    ) -> Result<RecordState, EngineError> {
        let record_type = desired.record_type();
        if previous.record_type() != record_type {
            return Err(ValidationError::new(record_type, "type", "cannot change on update").into());
        }
        if previous.zone != desired.zone {
            return Err(ValidationError::new(record_type, "zone", "cannot change on update").into());
        }
        if previous.host != desired.host {
            return Err(ValidationError::new(record_type, "host", "cannot change on update").into());
        }

        let rendered = desired.render()?;
        let deadline = self.deadline();
        let _guard = self.locks.lock(record_type);

        let current = self.fetch(&rendered.zone, &rendered.host, record_type)?;
        let rendered = self.reconcile(rendered, desired, Some(previous), current.as_ref())?;
        self.apply(Plan::generate(rendered, current.as_ref()), deadline)?;
        self.read_back(desired)
    }

    /// Removes the declared record set. A record set that is already gone is not an error.
    pub fn delete(&self, config: &RecordConfig) -> Result<(), EngineError> {
        let declared = config.render()?;
        let deadline = self.deadline();
        let _guard = self.locks.lock(declared.record_type);

        let current = match declared.record_type {
            RecordType::Mx => {
                match self.fetch(&declared.zone, &declared.host, declared.record_type)? {
                    Some(current) => Some(current),
                    None => {
                        info!("MX record {} already gone", declared.host);
                        return Ok(());
                    }
                }
            }
            _ => None,
        };
        self.apply(Plan::delete(declared, current.as_ref())?, deadline)
    }

    /// Builds a configuration and state from a record set that already exists on the server.
    pub fn import(
        &self,
        zone: &str,
        host: &str,
        record_type: RecordType,
    ) -> Result<(RecordConfig, RecordState), EngineError> {
        let _guard = self.locks.lock(record_type);
        let remote = self.fetch(zone, host, record_type)?.ok_or_else(|| {
            ProviderError::api(
                StatusCode::NOT_FOUND,
                format!("no {} record for {} in zone {}", record_type, host, zone),
            )
        })?;
        let config = RecordConfig {
            zone: zone.to_owned(),
            host: host.to_owned(),
            ttl: remote.ttl,
            fields: codec::decode(record_type, &remote.rdata)?,
        };
        info!("Imported {}", remote);
        Ok((config, RecordState::new(remote)))
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.operation_timeout.map(|t| Instant::now() + t)
    }

    // The server's record set, None on 404
    fn fetch(
        &self,
        zone: &str,
        host: &str,
        record_type: RecordType,
    ) -> Result<Option<RecordSet>, EngineError> {
        match self.provider.get_record(zone, host, record_type) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // Adjusts a rendered record set to the server's current state
    fn reconcile(
        &self,
        rendered: RecordSet,
        config: &RecordConfig,
        previous: Option<&RecordConfig>,
        current: Option<&RecordSet>,
    ) -> Result<RecordSet, EngineError> {
        match &config.fields {
            RecordFields::Mx(fields) => {
                let previous = previous.and_then(|p| match &p.fields {
                    RecordFields::Mx(f) => Some(f),
                    _ => None,
                });
                let current = current.map(|c| c.rdata.as_slice()).unwrap_or_default();
                let rdata = mx::merge(current, previous, fields)?;
                Ok(rendered.with_rdata(rdata))
            }
            RecordFields::Soa(fields) => {
                let stamped = RecordFields::Soa(soa::stamp(fields, current)?);
                Ok(rendered.with_rdata(stamped.encode()?))
            }
            _ => Ok(rendered),
        }
    }

    fn apply(&self, plan: Plan, deadline: Option<Instant>) -> Result<(), EngineError> {
        let executor =
            RetryExecutor::new(self.provider, &self.config.retry).with_deadline(deadline);
        for action in plan {
            info!("Applying {}", action);
            executor.run(action, |pending| self.refresh(pending))?;
        }
        Ok(())
    }

    // Rebuilds a request after the server asked for a higher SOA serial
    fn refresh(&self, pending: &RecordSet) -> Result<RecordSet, EngineError> {
        match pending.record_type {
            RecordType::Soa => SerialManager::new(self.provider).refresh(pending),
            _ => {
                warn!(
                    "Serial race reported for {} record {}, retrying unchanged",
                    pending.record_type, pending.host
                );
                Ok(pending.clone())
            }
        }
    }

    fn read_back(&self, config: &RecordConfig) -> Result<RecordState, EngineError> {
        let applied = self
            .fetch(&config.zone, &config.host, config.record_type())?
            .ok_or_else(|| {
                ProviderError::api(
                    StatusCode::NOT_FOUND,
                    format!(
                        "{} record {} missing after write",
                        config.record_type(),
                        config.host
                    ),
                )
            })?;
        Ok(RecordState::new(applied))
    }
}

fn divergence(remote: &RecordSet, reason: &str) -> DivergenceError {
    DivergenceError {
        zone: remote.zone.to_owned(),
        host: remote.host.to_owned(),
        record_type: remote.record_type,
        reason: reason.to_owned(),
    }
}
