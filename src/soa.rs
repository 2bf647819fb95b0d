//! SOA serial handling: every write to a zone's SOA carries a serial above the server's.

use std::cmp::Ordering;

use log::{debug, info};

use crate::{
    codec::{FieldCodec, RecordType, SoaFields},
    engine::EngineError,
    fingerprint::DivergenceError,
    provider::Provider,
    types::RecordSet,
};

/// Compares two serials in RFC 1982 serial number arithmetic.
///
/// Returns `None` for the one undefined case, two serials exactly 2^31 apart.
pub fn compare_serials(a: u32, b: u32) -> Option<Ordering> {
    if a == b {
        return Some(Ordering::Equal);
    }
    match b.wrapping_sub(a) {
        d if d < 1 << 31 => Some(Ordering::Less),
        d if d > 1 << 31 => Some(Ordering::Greater),
        _ => None,
    }
}

/// The serial that follows `current`, or 1 for a zone without SOA.
pub fn next_serial(current: Option<u32>) -> u32 {
    current.map_or(1, |s| s.wrapping_add(1))
}

/// Reads the serial from SOA RDATA.
pub fn serial_of(record: &RecordSet) -> Result<u32, EngineError> {
    Ok(fields_of(record)?.serial)
}

fn fields_of(record: &RecordSet) -> Result<SoaFields, EngineError> {
    Ok(SoaFields::decode(RecordType::Soa, &record.rdata)?)
}

/// Re-stamps SOA writes from the server's current serial.
pub struct SerialManager<'a, P: Provider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: Provider + ?Sized> SerialManager<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        SerialManager { provider }
    }

    /// The serial the server currently holds for the zone, `None` if it has no SOA.
    pub fn current(&self, zone: &str, host: &str) -> Result<Option<u32>, EngineError> {
        match self.provider.get_record(zone, host, RecordType::Soa) {
            Ok(record) => serial_of(&record).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-reads the server's serial and re-renders a pending SOA write with the next one.
    pub fn refresh(&self, pending: &RecordSet) -> Result<RecordSet, EngineError> {
        let serial = next_serial(self.current(&pending.zone, &pending.host)?);
        let fields = SoaFields {
            serial,
            ..fields_of(pending)?
        };
        info!("Re-stamping SOA for zone {} with serial {}", pending.zone, serial);
        Ok(pending.with_rdata(fields.encode(RecordType::Soa)?))
    }
}

/// Stamps declared SOA fields with the serial following the server's `current` record.
pub fn stamp(declared: &SoaFields, current: Option<&RecordSet>) -> Result<SoaFields, EngineError> {
    let remote = current.map(serial_of).transpose()?;
    let serial = next_serial(remote);
    if declared.serial != serial {
        debug!(
            "Declared SOA serial {} replaced by {}",
            declared.serial, serial
        );
    }
    Ok(SoaFields {
        serial,
        ..declared.clone()
    })
}

/// Checks a remote SOA against the last applied one.
///
/// A serial at or above the last applied one is expected, since other zone writes
/// bump it. A lower serial cannot be explained. Non-serial fields that moved away
/// from the last applied values are drift unless they now match the declaration,
/// while fields that only differ from the declaration are a pending local change.
pub fn check_stable(
    remote: &RecordSet,
    last: &RecordSet,
    declared: &SoaFields,
) -> Result<(), EngineError> {
    let fields = fields_of(remote)?;
    let applied = fields_of(last)?;
    let divergence = |reason: String| DivergenceError {
        zone: remote.zone.to_owned(),
        host: remote.host.to_owned(),
        record_type: RecordType::Soa,
        reason,
    };

    match compare_serials(fields.serial, applied.serial) {
        Some(Ordering::Equal | Ordering::Greater) => {}
        _ => {
            return Err(divergence(format!(
                "serial went back from {} to {}",
                applied.serial, fields.serial
            ))
            .into())
        }
    }
    match (
        applied.first_difference(&fields),
        declared.first_difference(&fields),
    ) {
        (Some(field), Some(_)) => {
            Err(divergence(format!("{} changed outside of configuration", field)).into())
        }
        (None, Some(field)) => {
            debug!("SOA {} differs from configuration, update pending", field);
            Ok(())
        }
        _ => Ok(()),
    }
}
