//! The record-type codec turns typed, per-type configuration fields into
//! RFC 1035 presentation-format RDATA and back.
//!
//! Every supported type is listed exactly once in the registry below, which maps the
//! type mnemonic to the structure holding its fields. Each structure implements
//! [`FieldCodec`], so supporting another type means adding one registry line and one impl.
//!
//! The types fall into three families:
//! - [`Targets`]: simple lists where every target is normalized on its own and the
//!   result is sorted (A, AAAA, CNAME, LOC, NS, PTR, SPF, TXT, CAA, AKAMAICDN)
//! - repeating structured types where targets share numeric fields ([`MxFields`],
//!   [`SrvFields`], [`AfsdbFields`])
//! - composite types rendering exactly one RDATA string (SOA, DNSKEY, DS, ...)

mod composite;
mod structured;
mod targets;
pub(crate) mod text;

pub use composite::{
    AkamaiTlcFields, CertFields, DnskeyFields, DsFields, HinfoFields, NaptrFields,
    Nsec3Fields, Nsec3ParamFields, RpFields, RrsigFields, SoaFields, SshfpFields, SvcbFields,
    TlsaFields,
};
pub use structured::{AfsdbFields, DeclaredMx, MxEntry, MxFields, SrvFields};
pub use targets::Targets;

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{RecordConfig, RecordSet};

/// Validation, rendering and parsing for the fields of one record type.
pub trait FieldCodec: Sized {
    /// Checks that every field the type requires is present and in range.
    fn validate(&self, record_type: RecordType) -> Result<(), ValidationError>;
    /// Renders the fields into presentation-format RDATA strings.
    fn encode(&self, record_type: RecordType) -> Result<Vec<String>, ValidationError>;
    /// Parses presentation-format RDATA back into fields.
    fn decode(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError>;
}

/// A required field is missing or out of range. Raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {record_type} record: '{field}' {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub record_type: RecordType,
    pub reason: String,
}

impl ValidationError {
    pub fn new(record_type: RecordType, field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError {
            field,
            record_type,
            reason: reason.into(),
        }
    }
}

/// RDATA received from the server could not be parsed as the given type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode {record_type} RDATA: {reason}")]
pub struct DecodeError {
    pub record_type: RecordType,
    pub reason: String,
}

impl DecodeError {
    pub fn new(record_type: RecordType, reason: impl Into<String>) -> Self {
        DecodeError {
            record_type,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown record type '{0}'")]
pub struct UnknownRecordType(pub String);

/// Fails with `reason` on `field` unless `cond` holds.
pub(crate) fn ensure(
    cond: bool,
    record_type: RecordType,
    field: &'static str,
    reason: &str,
) -> Result<(), ValidationError> {
    if cond {
        Ok(())
    } else {
        Err(ValidationError::new(record_type, field, reason))
    }
}

pub(crate) fn require(
    value: &str,
    record_type: RecordType,
    field: &'static str,
) -> Result<(), ValidationError> {
    ensure(!value.trim().is_empty(), record_type, field, "is required")
}

macro_rules! record_registry {
    ($($variant:ident => $mnemonic:literal : $fields:ty),+ $(,)?) => {
        /// DNS resource record types understood by the codec.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum RecordType {
            $(#[serde(rename = $mnemonic)] $variant,)+
        }

        impl RecordType {
            /// Every supported type, in registry order.
            pub const ALL: &'static [RecordType] = &[$(RecordType::$variant),+];

            pub fn mnemonic(&self) -> &'static str {
                match self {
                    $(RecordType::$variant => $mnemonic,)+
                }
            }
        }

        impl FromStr for RecordType {
            type Err = UnknownRecordType;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($mnemonic) {
                        return Ok(RecordType::$variant);
                    }
                )+
                Err(UnknownRecordType(s.to_owned()))
            }
        }

        /// The typed configuration fields of a record, one variant per [`RecordType`].
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum RecordFields {
            $(#[serde(rename = $mnemonic)] $variant($fields),)+
        }

        impl RecordFields {
            pub fn record_type(&self) -> RecordType {
                match self {
                    $(RecordFields::$variant(_) => RecordType::$variant,)+
                }
            }

            pub fn validate(&self) -> Result<(), ValidationError> {
                match self {
                    $(RecordFields::$variant(f) => f.validate(RecordType::$variant),)+
                }
            }

            pub fn encode(&self) -> Result<Vec<String>, ValidationError> {
                match self {
                    $(RecordFields::$variant(f) => f.encode(RecordType::$variant),)+
                }
            }

            pub fn decode(record_type: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
                match record_type {
                    $(RecordType::$variant => {
                        <$fields as FieldCodec>::decode(record_type, rdata).map(RecordFields::$variant)
                    })+
                }
            }
        }
    };
}

record_registry! {
    A => "A": Targets,
    Aaaa => "AAAA": Targets,
    Afsdb => "AFSDB": AfsdbFields,
    AkamaiCdn => "AKAMAICDN": Targets,
    AkamaiTlc => "AKAMAITLC": AkamaiTlcFields,
    Caa => "CAA": Targets,
    Cert => "CERT": CertFields,
    Cname => "CNAME": Targets,
    Dnskey => "DNSKEY": DnskeyFields,
    Ds => "DS": DsFields,
    Hinfo => "HINFO": HinfoFields,
    Https => "HTTPS": SvcbFields,
    Loc => "LOC": Targets,
    Mx => "MX": MxFields,
    Naptr => "NAPTR": NaptrFields,
    Ns => "NS": Targets,
    Nsec3 => "NSEC3": Nsec3Fields,
    Nsec3Param => "NSEC3PARAM": Nsec3ParamFields,
    Ptr => "PTR": Targets,
    Rp => "RP": RpFields,
    Rrsig => "RRSIG": RrsigFields,
    Soa => "SOA": SoaFields,
    Spf => "SPF": Targets,
    Srv => "SRV": SrvFields,
    Sshfp => "SSHFP": SshfpFields,
    Svcb => "SVCB": SvcbFields,
    Tlsa => "TLSA": TlsaFields,
    Txt => "TXT": Targets,
}

impl RecordType {
    /// Types whose RDATA order carries meaning and must never be re-sorted.
    pub fn order_significant(&self) -> bool {
        matches!(self, RecordType::Mx)
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Validates a declared configuration and renders its RDATA.
pub fn render(config: &RecordConfig) -> Result<RecordSet, ValidationError> {
    let record_type = config.record_type();
    require(&config.zone, record_type, "zone")?;
    require(&config.host, record_type, "host")?;
    ensure(config.ttl > 0, record_type, "ttl", "must be greater than zero")?;
    config.fields.validate()?;

    let rdata = config.fields.encode()?;
    trace!("Rendered {} {}: {:?}", record_type, config.host, rdata);
    Ok(RecordSet {
        zone: config.zone.to_owned(),
        host: config.host.to_owned(),
        record_type,
        ttl: config.ttl,
        rdata,
    })
}

/// Parses presentation-format RDATA into the typed fields of `record_type`.
pub fn decode(record_type: RecordType, rdata: &[String]) -> Result<RecordFields, DecodeError> {
    RecordFields::decode(record_type, rdata)
}

/// Brings raw RDATA into the canonical form used for comparison and fingerprinting.
///
/// Entries that parse are re-rendered by the codec. Anything else is compared with
/// collapsed whitespace, sorted unless the type's order is significant.
pub fn normalize(record_type: RecordType, rdata: &[String]) -> Vec<String> {
    if let Ok(encoded) = decode(record_type, rdata).and_then(|fields| {
        fields
            .encode()
            .map_err(|e| DecodeError::new(record_type, e.to_string()))
    }) {
        return encoded;
    }
    let mut collapsed = rdata
        .iter()
        .map(|r| text::collapse_whitespace(r))
        .collect_vec();
    if !record_type.order_significant() {
        collapsed.sort();
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(fields: RecordFields) -> RecordConfig {
        RecordConfig {
            zone: "example.com".to_owned(),
            host: "www.example.com".to_owned(),
            ttl: 300,
            fields,
        }
    }

    fn rdata(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("mx".parse::<RecordType>(), Ok(RecordType::Mx));
        assert_eq!("Nsec3Param".parse::<RecordType>(), Ok(RecordType::Nsec3Param));
        assert_eq!(
            "WKS".parse::<RecordType>(),
            Err(UnknownRecordType("WKS".to_owned()))
        );
        assert_eq!(RecordType::AkamaiCdn.to_string(), "AKAMAICDN");
        assert_eq!(RecordType::ALL.len(), 28);
    }

    #[test]
    fn fields_deserialize_from_tagged_json() {
        let fields: RecordFields = serde_json::from_str(
            r#"{"type":"SRV","targets":["sip.example.com"],"priority":10,"weight":5,"port":5060}"#,
        )
        .unwrap();
        assert_eq!(fields.record_type(), RecordType::Srv);
        assert_eq!(
            fields.encode().unwrap(),
            vec!["10 5 5060 sip.example.com.".to_owned()]
        );
    }

    #[test]
    fn render_rejects_missing_identity() {
        let mut c = config(RecordFields::A(Targets::new(["192.0.2.1"])));
        c.ttl = 0;
        assert_eq!(render(&c).unwrap_err().field, "ttl");

        let mut c = config(RecordFields::A(Targets::new(["192.0.2.1"])));
        c.host = " ".to_owned();
        assert_eq!(render(&c).unwrap_err().field, "host");
    }

    #[test]
    fn render_runs_type_validation_first() {
        let c = config(RecordFields::Dnskey(DnskeyFields {
            flags: 42,
            protocol: 3,
            algorithm: 8,
            key: "AwEAAa==".to_owned(),
        }));
        let err = render(&c).unwrap_err();
        assert_eq!(err.field, "flags");
        assert_eq!(err.record_type, RecordType::Dnskey);
    }

    #[test]
    fn normalize_reorders_simple_types_only() {
        assert_eq!(
            normalize(RecordType::A, &rdata(&["192.0.2.2", "192.0.2.1"])),
            rdata(&["192.0.2.1", "192.0.2.2"])
        );
        assert_eq!(
            normalize(RecordType::Mx, &rdata(&["20 b.example.com", "10 a.example.com."])),
            rdata(&["20 b.example.com.", "10 a.example.com."])
        );
    }

    #[test]
    fn normalize_falls_back_to_collapsed_whitespace() {
        assert_eq!(
            normalize(RecordType::Sshfp, &rdata(&["1  1   not-enough", "x"])),
            rdata(&["1 1 not-enough", "x"])
        );
    }

    fn dns_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,10}(\\.[a-z][a-z0-9]{0,10}){1,3}\\."
    }

    fn blob() -> impl Strategy<Value = String> {
        "[A-Za-z0-9+/]{8,40}={0,2}"
    }

    fn round_trips(fields: RecordFields) {
        let rdata = fields.encode().unwrap();
        assert_eq!(decode(fields.record_type(), &rdata).unwrap(), fields);
    }

    proptest! {
        #[test]
        fn a_round_trips(addrs in prop::collection::btree_set(any::<[u8; 4]>(), 1..6)) {
            let targets = addrs
                .iter()
                .map(|o| std::net::Ipv4Addr::from(*o).to_string())
                .sorted()
                .collect_vec();
            round_trips(RecordFields::A(Targets { targets }));
        }

        #[test]
        fn aaaa_round_trips(segments in prop::collection::btree_set(any::<[u16; 8]>(), 1..4)) {
            let targets = segments
                .iter()
                .map(|s| text::expand_ipv6(&std::net::Ipv6Addr::from(*s)))
                .sorted()
                .collect_vec();
            round_trips(RecordFields::Aaaa(Targets { targets }));
        }

        #[test]
        fn txt_round_trips(texts in prop::collection::btree_set("[ -~]{0,40}", 1..4)) {
            let targets = texts.iter().map(|t| text::quote_text(t)).sorted().collect_vec();
            round_trips(RecordFields::Txt(Targets { targets }));
        }

        #[test]
        fn soa_round_trips(
            name_server in dns_name(),
            email_address in dns_name(),
            serial in any::<u32>(),
            refresh in 1u32..=u32::MAX,
            retry in 1u32..=u32::MAX,
            expiry in 1u32..=u32::MAX,
            nxdomain_ttl in 1u32..=u32::MAX,
        ) {
            round_trips(RecordFields::Soa(SoaFields {
                name_server, email_address, serial, refresh, retry, expiry, nxdomain_ttl,
            }));
        }

        #[test]
        fn srv_round_trips(
            hosts in prop::collection::btree_set(dns_name(), 1..4),
            priority in any::<u16>(),
            weight in any::<u16>(),
            port in 1u16..=u16::MAX,
        ) {
            round_trips(RecordFields::Srv(SrvFields {
                targets: hosts.into_iter().collect(),
                priority,
                weight,
                port,
            }));
        }

        #[test]
        fn mx_round_trips(hosts in prop::collection::vec((any::<u16>(), dns_name()), 1..5)) {
            let targets = hosts
                .iter()
                .unique_by(|(_, h)| h.clone())
                .map(|(p, h)| format!("{} {}", p, h))
                .collect_vec();
            round_trips(RecordFields::Mx(MxFields { targets, priority: 0, priority_increment: 0 }));
        }

        #[test]
        fn dnskey_round_trips(
            flags in prop::sample::select(vec![0u16, 256, 257]),
            protocol in 1u8..=u8::MAX,
            algorithm in 1u8..=u8::MAX,
            key in blob(),
        ) {
            round_trips(RecordFields::Dnskey(DnskeyFields { flags, protocol, algorithm, key }));
        }

        #[test]
        fn naptr_round_trips(
            order in 0u32..=65535,
            preference in any::<u16>(),
            service in "[A-Z0-9+]{1,10}",
            regexp in "![a-z^$.*]{1,10}![a-z:@.]{1,10}!",
            replacement in dns_name(),
        ) {
            round_trips(RecordFields::Naptr(NaptrFields {
                order,
                preference,
                flagsnaptr: "S".to_owned(),
                service,
                regexp,
                replacement,
            }));
        }

        #[test]
        fn tlsa_round_trips(
            usage in 0u8..=3,
            selector in 0u8..=1,
            match_type in 0u8..=2,
            certificate in "[0-9A-F]{8,64}",
        ) {
            round_trips(RecordFields::Tlsa(TlsaFields { usage, selector, match_type, certificate }));
        }

        #[test]
        fn name_targets_round_trip(
            record_type in prop::sample::select(vec![RecordType::Cname, RecordType::Ns, RecordType::Ptr]),
            hosts in prop::collection::btree_set(dns_name(), 1..4),
        ) {
            let targets = Targets { targets: hosts.into_iter().collect() };
            let fields = match record_type {
                RecordType::Cname => RecordFields::Cname(targets),
                RecordType::Ns => RecordFields::Ns(targets),
                _ => RecordFields::Ptr(targets),
            };
            round_trips(fields);
        }

        #[test]
        fn akamaicdn_round_trips(edges in prop::collection::btree_set("[a-z0-9][a-z0-9.-]{0,20}", 1..3)) {
            round_trips(RecordFields::AkamaiCdn(Targets { targets: edges.into_iter().collect() }));
        }

        #[test]
        fn loc_round_trips(
            lat in (0u8..90, 0u8..60, 0u16..60000, prop::sample::select(vec!["N", "S"])),
            lon in (0u8..180, 0u8..60, 0u16..60000, prop::sample::select(vec!["E", "W"])),
            altitude in -100000i32..4000000,
            precision in prop::collection::vec(0u32..9000000, 0..4),
        ) {
            let mut target = format!(
                "{} {} {}.{:03} {} {} {} {}.{:03} {} {}.00m",
                lat.0, lat.1, lat.2 / 1000, lat.2 % 1000, lat.3,
                lon.0, lon.1, lon.2 / 1000, lon.2 % 1000, lon.3,
                altitude,
            );
            for p in precision {
                target.push_str(&format!(" {}.00m", p));
            }
            round_trips(RecordFields::Loc(Targets { targets: vec![target] }));
        }

        #[test]
        fn spf_round_trips(texts in prop::collection::btree_set("[ -~]{0,40}", 1..4)) {
            let targets = texts.iter().map(|t| text::quote_text(t)).sorted().collect_vec();
            round_trips(RecordFields::Spf(Targets { targets }));
        }

        #[test]
        fn caa_round_trips(
            entries in prop::collection::btree_set(
                (any::<u8>(), "[a-z]{1,10}", "[a-z0-9.;=:@-]{1,20}"),
                1..4,
            ),
        ) {
            let targets = entries
                .iter()
                .map(|(flags, tag, value)| format!("{} {} \"{}\"", flags, tag, value))
                .sorted()
                .dedup()
                .collect_vec();
            round_trips(RecordFields::Caa(Targets { targets }));
        }

        #[test]
        fn afsdb_round_trips(
            hosts in prop::collection::btree_set(dns_name(), 1..4),
            subtype in 1u16..=u16::MAX,
        ) {
            round_trips(RecordFields::Afsdb(AfsdbFields {
                targets: hosts.into_iter().collect(),
                subtype,
            }));
        }

        #[test]
        fn ds_round_trips(
            keytag in 1u16..=u16::MAX,
            algorithm in 1u8..=u8::MAX,
            digest_type in 1u8..=u8::MAX,
            digest in "[0-9A-F]{8,64}",
        ) {
            round_trips(RecordFields::Ds(DsFields { keytag, algorithm, digest_type, digest }));
        }

        #[test]
        fn hinfo_round_trips(hardware in "[ -~]{1,20}", software in "[ -~]{1,20}") {
            round_trips(RecordFields::Hinfo(HinfoFields { hardware, software }));
        }

        #[test]
        fn nsec3_round_trips(
            algorithm in 1u8..=u8::MAX,
            flags in any::<u8>(),
            iterations in any::<u16>(),
            salt in "[0-9a-f]{2,16}",
            next_hashed_owner_name in "[0-9a-v]{32}",
            types in prop::collection::vec(
                prop::sample::select(vec!["A", "NS", "SOA", "MX", "TXT", "AAAA", "RRSIG"]),
                1..5,
            ),
        ) {
            round_trips(RecordFields::Nsec3(Nsec3Fields {
                algorithm,
                flags,
                iterations,
                salt,
                next_hashed_owner_name,
                type_bitmaps: types.join(" "),
            }));
        }

        #[test]
        fn nsec3param_round_trips(
            algorithm in 1u8..=u8::MAX,
            flags in any::<u8>(),
            iterations in any::<u16>(),
            salt in "[0-9a-f]{2,16}",
        ) {
            round_trips(RecordFields::Nsec3Param(Nsec3ParamFields { algorithm, flags, iterations, salt }));
        }

        #[test]
        fn rp_round_trips(mailbox in dns_name(), txt in dns_name()) {
            round_trips(RecordFields::Rp(RpFields { mailbox, txt }));
        }

        #[test]
        fn rrsig_round_trips(
            type_covered in prop::sample::select(vec!["A", "AAAA", "MX", "TXT", "DNSKEY"]),
            algorithm in 1u8..=u8::MAX,
            labels in any::<u8>(),
            original_ttl in any::<u32>(),
            expiration in "[0-9]{14}",
            inception in "[0-9]{14}",
            keytag in any::<u16>(),
            signer in dns_name(),
            signature in blob(),
        ) {
            round_trips(RecordFields::Rrsig(RrsigFields {
                type_covered: type_covered.to_owned(),
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                keytag,
                signer,
                signature,
            }));
        }

        #[test]
        fn sshfp_round_trips(
            algorithm in 1u8..=u8::MAX,
            fingerprint_type in 1u8..=u8::MAX,
            fingerprint in "[0-9a-f]{8,64}",
        ) {
            round_trips(RecordFields::Sshfp(SshfpFields { algorithm, fingerprint_type, fingerprint }));
        }

        #[test]
        fn cert_round_trips(
            cert_type in prop_oneof![
                prop::sample::select(vec!["PKIX", "SPKI", "PGP", "IPKIX", "ACPKIX"])
                    .prop_map(|m| (m.to_owned(), 0u16)),
                (1u16..=u16::MAX).prop_map(|v| (String::new(), v)),
            ],
            keytag in any::<u16>(),
            algorithm in any::<u8>(),
            certificate in blob(),
        ) {
            let (type_mnemonic, type_value) = cert_type;
            round_trips(RecordFields::Cert(CertFields {
                type_mnemonic,
                type_value,
                keytag,
                algorithm,
                certificate,
            }));
        }

        #[test]
        fn akamaitlc_round_trips(answer_type in "[A-Z]{1,6}", name in "[a-z0-9][a-z0-9.-]{0,30}") {
            round_trips(RecordFields::AkamaiTlc(AkamaiTlcFields { answer_type, dns_name: name }));
        }

        #[test]
        fn svcb_round_trips(
            svc_priority in 1u16..=u16::MAX,
            target_name in dns_name(),
            svc_params in prop::option::of("alpn=h2 port=[0-9]{2,4}"),
        ) {
            round_trips(RecordFields::Https(SvcbFields {
                svc_priority,
                target_name: target_name.clone(),
                svc_params: svc_params.unwrap_or_default(),
            }));
            round_trips(RecordFields::Svcb(SvcbFields {
                svc_priority: 0,
                target_name,
                svc_params: String::new(),
            }));
        }
    }
}
