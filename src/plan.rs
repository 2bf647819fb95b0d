//! Plans decide which write, if any, brings the server in line with a declared record set.

pub mod mx;

use std::{collections::HashSet, fmt::Display};

use log::{debug, info};

use crate::{
    codec::{DecodeError, MxEntry, RecordType},
    types::RecordSet,
};

/// A single write against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create(RecordSet),
    Update(RecordSet),
    Delete(RecordSet),
}

impl Action {
    pub fn record(&self) -> &RecordSet {
        match self {
            Action::Create(r) | Action::Update(r) | Action::Delete(r) => r,
        }
    }

    /// The same kind of action carrying a different record. Used when a retry has to
    /// re-render the request.
    pub fn with_record(&self, record: RecordSet) -> Action {
        match self {
            Action::Create(_) => Action::Create(record),
            Action::Update(_) => Action::Update(record),
            Action::Delete(_) => Action::Delete(record),
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Action::Delete(_))
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create(r) => write!(f, "CREATE {}", r),
            Action::Update(r) => write!(f, "UPDATE {}", r),
            Action::Delete(r) => write!(f, "DELETE {}", r),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    /// Plans the write that turns `current` into `desired`.
    ///
    /// Nothing is planned when the server already serves the desired content.
    pub fn generate(desired: RecordSet, current: Option<&RecordSet>) -> Plan {
        let action = match current {
            None => {
                info!("No {} record for {}, creating", desired.record_type, desired.host);
                Action::Create(desired)
            }
            Some(current) if current.same_content(&desired) => {
                info!("No action needed for {} {}", desired.record_type, desired.host);
                return Plan::default();
            }
            Some(current) => {
                debug!("Current {} differs from desired {}", current, desired);
                info!("Found outdated {} record for {}, updating", desired.record_type, desired.host);
                Action::Update(desired)
            }
        };
        Plan {
            actions: vec![action],
        }
    }

    /// Plans the removal of a declared record set.
    ///
    /// For MX only the declared hosts are removed: if the server's `current` set holds
    /// hosts this configuration does not own, they are kept by updating the set to
    /// just those entries.
    pub fn delete(declared: RecordSet, current: Option<&RecordSet>) -> Result<Plan, DecodeError> {
        let action = match current {
            Some(current) if declared.record_type == RecordType::Mx => {
                let owned = declared
                    .rdata
                    .iter()
                    .map(|r| MxEntry::parse(r).map(|e| e.host))
                    .collect::<Result<HashSet<_>, _>>()?;
                let mut remaining = Vec::new();
                for entry in &current.rdata {
                    let entry = MxEntry::parse(entry)?;
                    if !owned.contains(&entry.host) {
                        remaining.push(entry.to_string());
                    }
                }
                if remaining.is_empty() {
                    Action::Delete(declared)
                } else {
                    info!(
                        "Keeping {} MX host(s) not owned by this configuration on {}",
                        remaining.len(),
                        declared.host
                    );
                    Action::Update(current.with_rdata(remaining))
                }
            }
            _ => Action::Delete(declared),
        };
        Ok(Plan {
            actions: vec![action],
        })
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
