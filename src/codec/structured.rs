use std::{collections::HashSet, fmt::Display};

use serde::{Deserialize, Serialize};

use super::{
    ensure,
    text::{ensure_trailing_dot, tokenize, RdataReader},
    DecodeError, FieldCodec, RecordType, ValidationError,
};

/// Fields of an MX record set.
///
/// Each target is either a bare host, which takes the running default priority, or
/// `"<priority> <host>"` with the priority pinned. The default starts at `priority`
/// and grows by `priority_increment` after every target that uses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MxFields {
    pub targets: Vec<String>,
    pub priority: u16,
    pub priority_increment: u16,
}

/// One declared MX target, host normalized to FQDN form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredMx {
    pub host: String,
    pub pinned: Option<u16>,
}

/// One rendered MX entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MxEntry {
    pub priority: u16,
    pub host: String,
}

impl MxEntry {
    pub fn new(priority: u16, host: &str) -> Self {
        MxEntry {
            priority,
            host: ensure_trailing_dot(host),
        }
    }

    /// Parses a `"<priority> <host>"` RDATA entry.
    pub fn parse(rdata: &str) -> Result<Self, DecodeError> {
        let mut reader = RdataReader::entry(RecordType::Mx, rdata);
        let priority = reader.number("priority")?;
        let host = reader.text("host")?;
        reader.finish()?;
        Ok(MxEntry::new(priority, &host))
    }
}

impl Display for MxEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.priority, self.host)
    }
}

impl MxFields {
    /// Parses the declared targets.
    pub fn declared(&self) -> Result<Vec<DeclaredMx>, ValidationError> {
        self.targets
            .iter()
            .map(|target| {
                let tokens = tokenize(target);
                match tokens.as_slice() {
                    [host] => Ok(DeclaredMx {
                        host: ensure_trailing_dot(host),
                        pinned: None,
                    }),
                    [priority, host] => {
                        let priority = priority.parse().map_err(|_| {
                            ValidationError::new(
                                RecordType::Mx,
                                "target",
                                format!("priority in '{}' must be a number from 0 to 65535", target),
                            )
                        })?;
                        Ok(DeclaredMx {
                            host: ensure_trailing_dot(host),
                            pinned: Some(priority),
                        })
                    }
                    _ => Err(ValidationError::new(
                        RecordType::Mx,
                        "target",
                        format!("'{}' must be '<host>' or '<priority> <host>'", target),
                    )),
                }
            })
            .collect()
    }

    /// Hosts named by the declared targets.
    pub fn hosts(&self) -> Result<Vec<String>, ValidationError> {
        Ok(self.declared()?.into_iter().map(|d| d.host).collect())
    }

    // Declared targets with the default priority sequence applied
    fn resolve(&self) -> Result<Vec<MxEntry>, ValidationError> {
        let mut next_default = self.priority;
        Ok(self
            .declared()?
            .into_iter()
            .map(|d| {
                let priority = d.pinned.unwrap_or_else(|| {
                    let p = next_default;
                    next_default = next_default.saturating_add(self.priority_increment);
                    p
                });
                MxEntry::new(priority, &d.host)
            })
            .collect())
    }
}

impl FieldCodec for MxFields {
    fn validate(&self, record_type: RecordType) -> Result<(), ValidationError> {
        ensure(
            !self.targets.is_empty(),
            record_type,
            "target",
            "requires at least one entry",
        )?;
        let entries = self.resolve()?;

        let mut seen = HashSet::new();
        for entry in &entries {
            ensure(
                seen.insert(entry.host.as_str()),
                record_type,
                "target",
                &format!("host {} is listed more than once", entry.host),
            )?;
        }
        // the API keeps order and priority aligned
        for pair in entries.windows(2) {
            ensure(
                pair[0].priority <= pair[1].priority,
                record_type,
                "priority",
                &format!(
                    "{} ({}) would follow {} ({}); priorities must not decrease",
                    pair[1].host, pair[1].priority, pair[0].host, pair[0].priority
                ),
            )?;
        }
        Ok(())
    }

    fn encode(&self, _record_type: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(self.resolve()?.iter().map(MxEntry::to_string).collect())
    }

    fn decode(_record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let targets = rdata
            .iter()
            .map(|r| MxEntry::parse(r).map(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MxFields {
            targets,
            priority: 0,
            priority_increment: 0,
        })
    }
}

fn unique_hosts(targets: &[String], record_type: RecordType) -> Result<(), ValidationError> {
    ensure(
        !targets.is_empty(),
        record_type,
        "target",
        "requires at least one entry",
    )?;
    let mut seen = HashSet::new();
    for target in targets {
        let host = ensure_trailing_dot(target);
        ensure(host != ".", record_type, "target", "empty host")?;
        ensure(
            seen.insert(host.clone()),
            record_type,
            "target",
            &format!("host {} is listed more than once", host),
        )?;
    }
    Ok(())
}

/// Fields of an SRV record set: every target shares priority, weight and port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SrvFields {
    pub targets: Vec<String>,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

impl FieldCodec for SrvFields {
    fn validate(&self, record_type: RecordType) -> Result<(), ValidationError> {
        unique_hosts(&self.targets, record_type)?;
        ensure(self.port != 0, record_type, "port", "is required")
    }

    fn encode(&self, _record_type: RecordType) -> Result<Vec<String>, ValidationError> {
        let mut rdata = self
            .targets
            .iter()
            .map(|t| {
                format!(
                    "{} {} {} {}",
                    self.priority,
                    self.weight,
                    self.port,
                    ensure_trailing_dot(t)
                )
            })
            .collect::<Vec<_>>();
        rdata.sort();
        Ok(rdata)
    }

    fn decode(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut shared = None;
        let mut targets = Vec::with_capacity(rdata.len());
        for entry in rdata {
            let mut reader = RdataReader::entry(record_type, entry);
            let numbers: (u16, u16, u16) = (
                reader.number("priority")?,
                reader.number("weight")?,
                reader.number("port")?,
            );
            targets.push(ensure_trailing_dot(&reader.text("target")?));
            reader.finish()?;
            match shared {
                None => shared = Some(numbers),
                Some(s) if s != numbers => {
                    return Err(DecodeError::new(
                        record_type,
                        "entries disagree on priority, weight or port",
                    ))
                }
                Some(_) => {}
            }
        }
        let (priority, weight, port) =
            shared.ok_or_else(|| DecodeError::new(record_type, "no entries"))?;
        targets.sort();
        Ok(SrvFields {
            targets,
            priority,
            weight,
            port,
        })
    }
}

/// Fields of an AFSDB record set: every target shares the subtype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AfsdbFields {
    pub targets: Vec<String>,
    pub subtype: u16,
}

impl FieldCodec for AfsdbFields {
    fn validate(&self, record_type: RecordType) -> Result<(), ValidationError> {
        unique_hosts(&self.targets, record_type)?;
        ensure(self.subtype != 0, record_type, "subtype", "is required")
    }

    fn encode(&self, _record_type: RecordType) -> Result<Vec<String>, ValidationError> {
        let mut rdata = self
            .targets
            .iter()
            .map(|t| format!("{} {}", self.subtype, ensure_trailing_dot(t)))
            .collect::<Vec<_>>();
        rdata.sort();
        Ok(rdata)
    }

    fn decode(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut subtype = None;
        let mut targets = Vec::with_capacity(rdata.len());
        for entry in rdata {
            let mut reader = RdataReader::entry(record_type, entry);
            let s: u16 = reader.number("subtype")?;
            targets.push(ensure_trailing_dot(&reader.text("target")?));
            reader.finish()?;
            if *subtype.get_or_insert(s) != s {
                return Err(DecodeError::new(record_type, "entries disagree on subtype"));
            }
        }
        let subtype = subtype.ok_or_else(|| DecodeError::new(record_type, "no entries"))?;
        targets.sort();
        Ok(AfsdbFields { targets, subtype })
    }
}
