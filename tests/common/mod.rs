// In-memory stand-in for the DNS record API used by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use edgedns_records::{
    codec::{self, RecordFields},
    plan::Action,
    provider::{Provider, ProviderError},
    retry::SOA_SERIAL_MESSAGE,
    soa, RecordType, RecordSet,
};
use http::StatusCode;
use parking_lot::Mutex;

type Key = (String, String, RecordType);

fn key(zone: &str, host: &str, record_type: RecordType) -> Key {
    (zone.to_owned(), host.to_owned(), record_type)
}

/// Serves record sets from memory, logs successful writes and rejects SOA writes
/// that do not raise the serial, like the real API.
#[derive(Default)]
pub struct FakeProvider {
    records: Mutex<HashMap<Key, RecordSet>>,
    writes: Mutex<Vec<Action>>,
    failures: Mutex<VecDeque<ProviderError>>,
    bump_soa: Mutex<bool>,
    gets: Mutex<usize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a record set on the server without logging a write.
    pub fn seed(&self, record: RecordSet) {
        self.records.lock().insert(
            key(&record.zone, &record.host, record.record_type),
            record,
        );
    }

    pub fn remove(&self, zone: &str, host: &str, record_type: RecordType) {
        self.records.lock().remove(&key(zone, host, record_type));
    }

    pub fn record(&self, zone: &str, host: &str, record_type: RecordType) -> Option<RecordSet> {
        self.records.lock().get(&key(zone, host, record_type)).cloned()
    }

    pub fn writes(&self) -> Vec<Action> {
        self.writes.lock().clone()
    }

    pub fn gets(&self) -> usize {
        *self.gets.lock()
    }

    /// The next `n` writes fail with `error`.
    pub fn fail_next_writes(&self, n: usize, error: ProviderError) {
        self.failures.lock().extend(std::iter::repeat(error).take(n));
    }

    /// Simulates another writer raising the SOA serial right before the next write.
    pub fn bump_soa_before_next_write(&self) {
        *self.bump_soa.lock() = true;
    }

    fn write(&self, action: Action) -> Result<(), ProviderError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let record = action.record().clone();
        let k = key(&record.zone, &record.host, record.record_type);
        let mut records = self.records.lock();

        if std::mem::take(&mut *self.bump_soa.lock()) {
            let soa_key = key(&record.zone, &record.zone, RecordType::Soa);
            if let Some(current) = records.get(&soa_key).cloned() {
                records.insert(soa_key, bump_serial(&current));
            }
        }
        if record.record_type == RecordType::Soa && !action.is_delete() {
            if let Some(current) = records.get(&k) {
                let stored = soa::serial_of(current).map_err(|e| e.to_string())?;
                let written = soa::serial_of(&record).map_err(|e| e.to_string())?;
                if written <= stored {
                    return Err(ProviderError::api(StatusCode::BAD_REQUEST, SOA_SERIAL_MESSAGE));
                }
            }
        }

        match &action {
            Action::Create(_) => {
                records.insert(k, record);
            }
            Action::Update(_) => {
                if !records.contains_key(&k) {
                    return Err(not_found());
                }
                records.insert(k, record);
            }
            Action::Delete(_) => {
                if records.remove(&k).is_none() {
                    return Err(not_found());
                }
            }
        }
        self.writes.lock().push(action);
        Ok(())
    }
}

impl Provider for FakeProvider {
    fn get_record(
        &self,
        zone: &str,
        host: &str,
        record_type: RecordType,
    ) -> Result<RecordSet, ProviderError> {
        *self.gets.lock() += 1;
        self.record(zone, host, record_type).ok_or_else(not_found)
    }

    fn create_record(&self, record: &RecordSet) -> Result<(), ProviderError> {
        self.write(Action::Create(record.clone()))
    }

    fn update_record(&self, record: &RecordSet) -> Result<(), ProviderError> {
        self.write(Action::Update(record.clone()))
    }

    fn delete_record(&self, record: &RecordSet) -> Result<(), ProviderError> {
        self.write(Action::Delete(record.clone()))
    }
}

pub fn not_found() -> ProviderError {
    ProviderError::api(StatusCode::NOT_FOUND, "Record not found")
}

pub fn bump_serial(record: &RecordSet) -> RecordSet {
    match codec::decode(RecordType::Soa, &record.rdata) {
        Ok(RecordFields::Soa(mut fields)) => {
            fields.serial += 1;
            let rdata = RecordFields::Soa(fields).encode().unwrap();
            record.with_rdata(rdata)
        }
        other => panic!("not an SOA record: {:?}", other),
    }
}
