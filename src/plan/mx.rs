//! MX merge: reconcile declared MX targets against the entries the server already serves.
//!
//! The server may hold MX hosts that this configuration does not own (added by
//! another tool or by hand). Those are flushed through with their priorities
//! untouched, while the owned hosts are placed in declared order and renumbered.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use thiserror::Error;

use crate::codec::{DecodeError, MxEntry, MxFields, ValidationError};

/// A declared or flushed MX entry would break the non-decreasing priority order
/// the API requires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("MX host {host} with priority {priority} cannot follow {previous_host} with priority {previous}")]
pub struct PriorityMismatchError {
    pub host: String,
    pub priority: u16,
    pub previous_host: String,
    pub previous: u16,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error(transparent)]
    PriorityMismatch(#[from] PriorityMismatchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Server order and priorities, consumed by a single merge.
#[derive(Debug, Default)]
struct MergeState {
    order: Vec<String>,
    priority: HashMap<String, u16>,
}

impl MergeState {
    fn from_rdata(rdata: &[String]) -> Result<Self, DecodeError> {
        let mut state = MergeState::default();
        for entry in rdata {
            let entry = MxEntry::parse(entry)?;
            if state.priority.contains_key(&entry.host) {
                continue;
            }
            state.order.push(entry.host.clone());
            state.priority.insert(entry.host, entry.priority);
        }
        Ok(state)
    }

    fn forget(&mut self, host: &str) {
        if self.priority.remove(host).is_some() {
            self.order.retain(|h| h != host);
        }
    }
}

// Output accumulator keeping priorities non-decreasing
#[derive(Default)]
struct Merged(Vec<MxEntry>);

impl Merged {
    fn push(&mut self, entry: MxEntry) -> Result<(), PriorityMismatchError> {
        if let Some(last) = self.0.last() {
            if entry.priority < last.priority {
                return Err(PriorityMismatchError {
                    host: entry.host,
                    priority: entry.priority,
                    previous_host: last.host.clone(),
                    previous: last.priority,
                });
            }
        }
        trace!("MX merge: placing {}", entry);
        self.0.push(entry);
        Ok(())
    }
}

/// Merges `desired` into the server's `current` MX RDATA.
///
/// `previous` is the last applied configuration, if any. Hosts it declared that
/// `desired` no longer does are dropped from the server baseline before merging.
pub fn merge(
    current: &[String],
    previous: Option<&MxFields>,
    desired: &MxFields,
) -> Result<Vec<String>, MergeError> {
    let mut state = MergeState::from_rdata(current)?;
    let declared = desired.declared()?;
    let owned: HashSet<&str> = declared.iter().map(|d| d.host.as_str()).collect();

    if let Some(previous) = previous.filter(|p| p.targets != desired.targets) {
        for host in previous.hosts()? {
            if !owned.contains(host.as_str()) {
                debug!("MX merge: {} is no longer declared, removing it", host);
                state.forget(&host);
            }
        }
    }

    let mut merged = Merged::default();
    let mut cursor = 0;
    let mut next_default = desired.priority;

    for target in &declared {
        match state.order.iter().position(|h| *h == target.host) {
            Some(pos) if pos >= cursor => {
                // copy through the unowned hosts the server lists first
                for host in &state.order[cursor..pos] {
                    if owned.contains(host.as_str()) {
                        continue;
                    }
                    merged.push(MxEntry::new(state.priority[host], host))?;
                }
                cursor = pos + 1;
            }
            _ => trace!("MX merge: inserting {}", target.host),
        }
        let priority = match target.pinned {
            Some(p) => p,
            None => {
                let p = next_default;
                next_default = next_default.saturating_add(desired.priority_increment);
                p
            }
        };
        merged.push(MxEntry::new(priority, &target.host))?;
    }

    for host in &state.order[cursor.min(state.order.len())..] {
        if !owned.contains(host.as_str()) {
            merged.push(MxEntry::new(state.priority[host], host))?;
        }
    }

    Ok(merged.0.iter().map(MxEntry::to_string).collect())
}
