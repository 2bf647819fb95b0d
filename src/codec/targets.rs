use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::{
    ensure,
    text::{ensure_trailing_dot, expand_ipv6, quote_text, tokenize},
    DecodeError, FieldCodec, RecordType, ValidationError,
};

/// Fields of the simple list types: one independent target per RDATA entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub targets: Vec<String>,
}

impl Targets {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Targets {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

// Normalizes one target into the form the API returns for the given type
fn normalize_target(record_type: RecordType, target: &str) -> Result<String, String> {
    let trimmed = target.trim();
    match record_type {
        RecordType::A => trimmed
            .parse::<Ipv4Addr>()
            .map(|a| a.to_string())
            .map_err(|_| format!("'{}' is not an IPv4 address", trimmed)),
        RecordType::Aaaa => trimmed
            .parse::<Ipv6Addr>()
            .map(|a| expand_ipv6(&a))
            .map_err(|_| format!("'{}' is not an IPv6 address", trimmed)),
        RecordType::Cname | RecordType::Ns | RecordType::Ptr => {
            if trimmed.is_empty() {
                Err("empty domain name".to_owned())
            } else {
                Ok(ensure_trailing_dot(trimmed))
            }
        }
        RecordType::Loc => normalize_loc(trimmed),
        RecordType::Txt | RecordType::Spf => Ok(quote_text(target)),
        RecordType::Caa => normalize_caa(trimmed),
        _ => {
            if trimmed.is_empty() {
                Err("empty target".to_owned())
            } else {
                Ok(trimmed.to_owned())
            }
        }
    }
}

// "<flags> <tag> <value>", with the value always re-quoted
fn normalize_caa(target: &str) -> Result<String, String> {
    let tokens = tokenize(target);
    if tokens.len() < 3 {
        return Err(format!("'{}' must have the form '<flags> <tag> <value>'", target));
    }
    let flags: u8 = tokens[0]
        .parse()
        .map_err(|_| format!("CAA flags '{}' must be a number from 0 to 255", tokens[0]))?;
    let value = tokens[2..].join(" ");
    Ok(format!("{} {} \"{}\"", flags, tokens[1], value))
}

// Altitude, size and precisions follow the longitude hemisphere and are
// rendered in meters with two decimals.
fn normalize_loc(target: &str) -> Result<String, String> {
    let tokens = tokenize(target);
    let is = |t: &String, a: &str, b: &str| t.eq_ignore_ascii_case(a) || t.eq_ignore_ascii_case(b);

    let lat = tokens.iter().position(|t| is(t, "N", "S"));
    let lon = tokens.iter().position(|t| is(t, "E", "W"));
    let lon = match (lat, lon) {
        (Some(lat), Some(lon)) if lat < lon && lon + 1 < tokens.len() => lon,
        _ => {
            return Err(format!(
                "'{}' must contain latitude, longitude and altitude",
                target
            ))
        }
    };

    let mut out = tokens[..=lon]
        .iter()
        .map(|t| t.to_uppercase())
        .collect::<Vec<_>>();
    // the degree/minute/second tokens are numbers, the hemisphere letters were uppercased
    for t in &mut out {
        if t.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        if t.parse::<f64>().is_err() {
            return Err(format!("LOC coordinate '{}' is not a number", t));
        }
    }
    for meters in &tokens[lon + 1..] {
        let value = meters.trim_end_matches(['m', 'M']);
        let value: f64 = value
            .parse()
            .map_err(|_| format!("LOC distance '{}' is not a number", meters))?;
        out.push(format!("{:.2}m", value));
    }
    Ok(out.join(" "))
}

impl FieldCodec for Targets {
    fn validate(&self, record_type: RecordType) -> Result<(), ValidationError> {
        ensure(
            !self.targets.is_empty(),
            record_type,
            "target",
            "requires at least one entry",
        )?;
        for target in &self.targets {
            normalize_target(record_type, target)
                .map_err(|reason| ValidationError::new(record_type, "target", reason))?;
        }
        Ok(())
    }

    fn encode(&self, record_type: RecordType) -> Result<Vec<String>, ValidationError> {
        let mut rdata = self
            .targets
            .iter()
            .map(|t| normalize_target(record_type, t))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ValidationError::new(record_type, "target", reason))?;
        rdata.sort();
        Ok(rdata)
    }

    fn decode(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut targets = rdata
            .iter()
            .map(|r| normalize_target(record_type, r))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| DecodeError::new(record_type, reason))?;
        targets.sort();
        Ok(Targets { targets })
    }
}
