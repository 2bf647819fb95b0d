//! Executes planned writes and retries them on the API's transient conflict signals.

use std::{
    thread,
    time::{Duration, Instant},
};

use http::StatusCode;
use log::{debug, warn};
use thiserror::Error;

use crate::{
    config::RetryPolicy,
    plan::Action,
    provider::{Provider, ProviderError},
    types::RecordSet,
};

/// Message the API sends when a zone write carries a stale SOA serial.
pub const SOA_SERIAL_MESSAGE: &str = "SOA serial number must be incremented";

/// True if the server rejected a write because the zone's SOA serial must be bumped first.
///
/// The API exposes no structured code for this condition, so the message text is the
/// only signal. Replace this with a status or error code check once one exists.
pub fn requires_serial_increment(error: &ProviderError) -> bool {
    match error {
        ProviderError::Api { message, .. } => message
            .to_ascii_lowercase()
            .contains(&SOA_SERIAL_MESSAGE.to_ascii_lowercase()),
        ProviderError::Internal(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// Delete of a record set that is already gone.
    AlreadyAbsent,
    Conflict,
    SerialRace,
    Fatal,
}

fn classify(action: &Action, error: &ProviderError) -> Disposition {
    let status = match error.status() {
        Some(status) if status.as_u16() >= 400 => status,
        _ => return Disposition::Fatal,
    };
    if requires_serial_increment(error) {
        Disposition::SerialRace
    } else if status == StatusCode::CONFLICT {
        Disposition::Conflict
    } else if status == StatusCode::NOT_FOUND && action.is_delete() {
        Disposition::AlreadyAbsent
    } else {
        Disposition::Fatal
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("giving up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: ProviderError },
    #[error("operation deadline passed after {attempts} attempts, last error: {last}")]
    DeadlineExceeded { attempts: u32, last: ProviderError },
}

/// Runs one [`Action`] against a provider under a [`RetryPolicy`].
pub struct RetryExecutor<'a, P: Provider + ?Sized> {
    provider: &'a P,
    policy: &'a RetryPolicy,
    deadline: Option<Instant>,
}

impl<'a, P: Provider + ?Sized> RetryExecutor<'a, P> {
    pub fn new(provider: &'a P, policy: &'a RetryPolicy) -> Self {
        RetryExecutor {
            provider,
            policy,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    fn attempt(&self, action: &Action) -> Result<(), ProviderError> {
        match action {
            Action::Create(r) => self.provider.create_record(r),
            Action::Update(r) => self.provider.update_record(r),
            Action::Delete(r) => self.provider.delete_record(r),
        }
    }

    /// Executes `action`, retrying conflicts and SOA serial races.
    ///
    /// On a serial race the request is rebuilt with `refresh` before the next attempt;
    /// the request of any later attempt may therefore differ from the first one.
    pub fn run<F, E>(&self, action: Action, mut refresh: F) -> Result<(), E>
    where
        F: FnMut(&RecordSet) -> Result<RecordSet, E>,
        E: From<RetryError>,
    {
        let mut action = action;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let error = match self.attempt(&action) {
                Ok(()) => {
                    debug!("{} succeeded after {} attempt(s)", action, attempts);
                    return Ok(());
                }
                Err(e) => e,
            };

            let disposition = classify(&action, &error);
            let backoff = match disposition {
                Disposition::AlreadyAbsent => {
                    debug!("Record {} is already gone", action.record());
                    return Ok(());
                }
                Disposition::Fatal => return Err(RetryError::Provider(error).into()),
                Disposition::Conflict => self.policy.conflict_backoff,
                Disposition::SerialRace => self.policy.serial_backoff,
            };

            if attempts > self.policy.max_retries {
                warn!("{} failed {} times, giving up: {}", action, attempts, error);
                return Err(RetryError::Exhausted {
                    attempts,
                    last: error,
                }
                .into());
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                warn!("Deadline passed while retrying {}: {}", action, error);
                return Err(RetryError::DeadlineExceeded {
                    attempts,
                    last: error,
                }
                .into());
            }

            if disposition == Disposition::SerialRace {
                let refreshed = refresh(action.record())?;
                debug!("Re-rendered request after serial race: {}", refreshed);
                action = action.with_record(refreshed);
            }
            warn!(
                "Attempt {} of {} failed ({}), retrying in {:?}",
                attempts, action, error, backoff
            );
            sleep(backoff);
        }
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::RecordType, provider::MockProvider};

    fn record(rdata: &str) -> RecordSet {
        RecordSet {
            zone: "example.com".to_owned(),
            host: "example.com".to_owned(),
            record_type: RecordType::Soa,
            ttl: 300,
            rdata: vec![rdata.to_owned()],
        }
    }

    fn keep(r: &RecordSet) -> Result<RecordSet, RetryError> {
        Ok(r.clone())
    }

    #[test]
    fn should_match_serial_message_case_insensitively() {
        assert!(requires_serial_increment(&ProviderError::api(
            StatusCode::BAD_REQUEST,
            "Error: soa Serial Number must be incremented (was 4)"
        )));
        assert!(!requires_serial_increment(&ProviderError::Internal(
            SOA_SERIAL_MESSAGE.to_owned()
        )));
    }

    #[test]
    fn should_retry_conflicts_five_times() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_record()
            .times(6)
            .returning(|_| Err(ProviderError::api(StatusCode::CONFLICT, "zone is locked")));
        let policy = RetryPolicy::immediate(5);

        let err = RetryExecutor::new(&provider, &policy)
            .run(Action::Create(record("x")), keep)
            .unwrap_err();
        assert_eq!(
            err,
            RetryError::Exhausted {
                attempts: 6,
                last: ProviderError::api(StatusCode::CONFLICT, "zone is locked"),
            }
        );
    }

    #[test]
    fn should_succeed_after_transient_conflict() {
        let mut provider = MockProvider::new();
        let mut calls = 0;
        provider.expect_update_record().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ProviderError::api(StatusCode::CONFLICT, "busy"))
            } else {
                Ok(())
            }
        });
        let policy = RetryPolicy::immediate(5);
        RetryExecutor::new(&provider, &policy)
            .run(Action::Update(record("x")), keep)
            .unwrap();
    }

    #[test]
    fn should_not_retry_fatal_errors() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_record()
            .times(1)
            .returning(|_| Err(ProviderError::Internal("connection reset".to_owned())));
        provider
            .expect_update_record()
            .times(1)
            .returning(|_| Err(ProviderError::api(StatusCode::BAD_REQUEST, "bad target")));
        provider
            .expect_delete_record()
            .times(1)
            .returning(|_| Err(ProviderError::api(StatusCode::FOUND, "moved")));
        let policy = RetryPolicy::immediate(5);
        let executor = RetryExecutor::new(&provider, &policy);

        for action in [
            Action::Create(record("x")),
            Action::Update(record("x")),
            Action::Delete(record("x")),
        ] {
            assert!(matches!(
                executor.run(action, keep),
                Err(RetryError::Provider(_))
            ));
        }
    }

    #[test]
    fn should_treat_missing_record_as_deleted() {
        let mut provider = MockProvider::new();
        provider
            .expect_delete_record()
            .times(1)
            .returning(|_| Err(ProviderError::api(StatusCode::NOT_FOUND, "Record not found")));
        provider
            .expect_update_record()
            .times(1)
            .returning(|_| Err(ProviderError::api(StatusCode::NOT_FOUND, "Record not found")));
        let policy = RetryPolicy::immediate(5);
        let executor = RetryExecutor::new(&provider, &policy);

        executor.run(Action::Delete(record("x")), keep).unwrap();
        assert!(executor.run(Action::Update(record("x")), keep).is_err());
    }

    #[test]
    fn should_refresh_request_on_serial_race() {
        let mut provider = MockProvider::new();
        provider
            .expect_update_record()
            .times(2)
            .returning(|r: &RecordSet| {
                if r.rdata[0] == "stale" {
                    Err(ProviderError::api(StatusCode::BAD_REQUEST, SOA_SERIAL_MESSAGE))
                } else {
                    Ok(())
                }
            });
        let policy = RetryPolicy::immediate(5);
        let mut refreshed = 0;
        RetryExecutor::new(&provider, &policy)
            .run(Action::Update(record("stale")), |r: &RecordSet| {
                refreshed += 1;
                Ok::<_, RetryError>(r.with_rdata(vec!["fresh".to_owned()]))
            })
            .unwrap();
        assert_eq!(refreshed, 1);
    }

    #[test]
    fn should_stop_at_deadline() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_record()
            .times(1)
            .returning(|_| Err(ProviderError::api(StatusCode::CONFLICT, "busy")));
        let policy = RetryPolicy::immediate(5);

        let err = RetryExecutor::new(&provider, &policy)
            .with_deadline(Some(Instant::now()))
            .run(Action::Create(record("x")), keep)
            .unwrap_err();
        assert!(matches!(
            err,
            RetryError::DeadlineExceeded { attempts: 1, .. }
        ));
    }
}
