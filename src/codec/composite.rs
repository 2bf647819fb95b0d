//! Types rendered as exactly one RDATA string, fields concatenated in RFC order.

use serde::{Deserialize, Serialize};

use super::{
    ensure, require,
    text::{
        collapse_whitespace, ensure_trailing_dot, escape_text, strip_whitespace, unescape_text,
        RdataReader,
    },
    DecodeError, FieldCodec, RecordType, ValidationError,
};

/// Start of authority. The serial is advisory on input: writes are always
/// re-stamped from the server's current serial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SoaFields {
    pub name_server: String,
    pub email_address: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expiry: u32,
    pub nxdomain_ttl: u32,
}

impl FieldCodec for SoaFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.name_server, rt, "name_server")?;
        require(&self.email_address, rt, "email_address")?;
        ensure(self.refresh != 0, rt, "refresh", "is required")?;
        ensure(self.retry != 0, rt, "retry", "is required")?;
        ensure(self.expiry != 0, rt, "expiry", "is required")?;
        ensure(self.nxdomain_ttl != 0, rt, "nxdomain_ttl", "is required")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {} {} {} {}",
            ensure_trailing_dot(&self.name_server),
            ensure_trailing_dot(&self.email_address),
            self.serial,
            self.refresh,
            self.retry,
            self.expiry,
            self.nxdomain_ttl
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = SoaFields {
            name_server: ensure_trailing_dot(&r.text("name_server")?),
            email_address: ensure_trailing_dot(&r.text("email_address")?),
            serial: r.number("serial")?,
            refresh: r.number("refresh")?,
            retry: r.number("retry")?,
            expiry: r.number("expiry")?,
            nxdomain_ttl: r.number("nxdomain_ttl")?,
        };
        r.finish()?;
        Ok(fields)
    }
}

impl SoaFields {
    /// Name of the first non-serial field that differs, comparing names in FQDN form.
    pub fn first_difference(&self, other: &SoaFields) -> Option<&'static str> {
        if ensure_trailing_dot(&self.name_server) != ensure_trailing_dot(&other.name_server) {
            Some("name_server")
        } else if ensure_trailing_dot(&self.email_address)
            != ensure_trailing_dot(&other.email_address)
        {
            Some("email_address")
        } else if self.refresh != other.refresh {
            Some("refresh")
        } else if self.retry != other.retry {
            Some("retry")
        } else if self.expiry != other.expiry {
            Some("expiry")
        } else if self.nxdomain_ttl != other.nxdomain_ttl {
            Some("nxdomain_ttl")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DnskeyFields {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub key: String,
}

impl FieldCodec for DnskeyFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(
            matches!(self.flags, 0 | 256 | 257),
            rt,
            "flags",
            "must be 0, 256 or 257",
        )?;
        ensure(self.protocol != 0, rt, "protocol", "is required")?;
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        require(&self.key, rt, "key")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {}",
            self.flags,
            self.protocol,
            self.algorithm,
            strip_whitespace(&self.key)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(DnskeyFields {
            flags: r.number("flags")?,
            protocol: r.number("protocol")?,
            algorithm: r.number("algorithm")?,
            key: r.rest(""),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DsFields {
    pub keytag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: String,
}

impl FieldCodec for DsFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(self.keytag != 0, rt, "keytag", "is required")?;
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        ensure(self.digest_type != 0, rt, "digest_type", "is required")?;
        require(&self.digest, rt, "digest")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {}",
            self.keytag,
            self.algorithm,
            self.digest_type,
            strip_whitespace(&self.digest)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(DsFields {
            keytag: r.number("keytag")?,
            algorithm: r.number("algorithm")?,
            digest_type: r.number("digest_type")?,
            digest: r.rest(""),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HinfoFields {
    pub hardware: String,
    pub software: String,
}

impl FieldCodec for HinfoFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.hardware, rt, "hardware")?;
        require(&self.software, rt, "software")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {}",
            escape_text(&self.hardware),
            escape_text(&self.software)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = HinfoFields {
            hardware: unescape_text(&r.text("hardware")?),
            software: unescape_text(&r.text("software")?),
        };
        r.finish()?;
        Ok(fields)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NaptrFields {
    pub order: u32,
    pub preference: u16,
    pub flagsnaptr: String,
    pub service: String,
    pub regexp: String,
    pub replacement: String,
}

impl FieldCodec for NaptrFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.flagsnaptr, rt, "flagsnaptr")?;
        require(&self.regexp, rt, "regexp")?;
        require(&self.replacement, rt, "replacement")?;
        require(&self.service, rt, "service")?;
        ensure(self.order <= 65535, rt, "order", "must be between 0 and 65535")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {} {} {}",
            self.order,
            self.preference,
            escape_text(&self.flagsnaptr),
            escape_text(&self.service),
            escape_text(&self.regexp),
            ensure_trailing_dot(&self.replacement)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = NaptrFields {
            order: r.number("order")?,
            preference: r.number("preference")?,
            flagsnaptr: unescape_text(&r.text("flagsnaptr")?),
            service: unescape_text(&r.text("service")?),
            regexp: unescape_text(&r.text("regexp")?),
            replacement: ensure_trailing_dot(&r.text("replacement")?),
        };
        r.finish()?;
        Ok(fields)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Nsec3Fields {
    pub algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: String,
    pub next_hashed_owner_name: String,
    pub type_bitmaps: String,
}

impl FieldCodec for Nsec3Fields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        require(&self.salt, rt, "salt")?;
        require(&self.next_hashed_owner_name, rt, "next_hashed_owner_name")?;
        require(&self.type_bitmaps, rt, "type_bitmaps")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {} {} {}",
            self.algorithm,
            self.flags,
            self.iterations,
            self.salt.trim(),
            self.next_hashed_owner_name.trim(),
            collapse_whitespace(&self.type_bitmaps)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(Nsec3Fields {
            algorithm: r.number("algorithm")?,
            flags: r.number("flags")?,
            iterations: r.number("iterations")?,
            salt: r.text("salt")?,
            next_hashed_owner_name: r.text("next_hashed_owner_name")?,
            type_bitmaps: r.rest(" "),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Nsec3ParamFields {
    pub algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: String,
}

impl FieldCodec for Nsec3ParamFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        require(&self.salt, rt, "salt")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {}",
            self.algorithm,
            self.flags,
            self.iterations,
            self.salt.trim()
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = Nsec3ParamFields {
            algorithm: r.number("algorithm")?,
            flags: r.number("flags")?,
            iterations: r.number("iterations")?,
            salt: r.text("salt")?,
        };
        r.finish()?;
        Ok(fields)
    }
}

/// Responsible person: a mailbox and the name of a TXT record with details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RpFields {
    pub mailbox: String,
    pub txt: String,
}

impl FieldCodec for RpFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.mailbox, rt, "mailbox")?;
        require(&self.txt, rt, "txt")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {}",
            ensure_trailing_dot(&self.mailbox),
            ensure_trailing_dot(&self.txt)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = RpFields {
            mailbox: ensure_trailing_dot(&r.text("mailbox")?),
            txt: ensure_trailing_dot(&r.text("txt")?),
        };
        r.finish()?;
        Ok(fields)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RrsigFields {
    pub type_covered: String,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: String,
    pub inception: String,
    pub keytag: u16,
    pub signer: String,
    pub signature: String,
}

impl FieldCodec for RrsigFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.type_covered, rt, "type_covered")?;
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        require(&self.expiration, rt, "expiration")?;
        require(&self.inception, rt, "inception")?;
        require(&self.signer, rt, "signer")?;
        require(&self.signature, rt, "signature")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {} {} {} {} {} {}",
            self.type_covered.trim().to_uppercase(),
            self.algorithm,
            self.labels,
            self.original_ttl,
            self.expiration.trim(),
            self.inception.trim(),
            self.keytag,
            ensure_trailing_dot(&self.signer),
            strip_whitespace(&self.signature)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(RrsigFields {
            type_covered: r.text("type_covered")?.to_uppercase(),
            algorithm: r.number("algorithm")?,
            labels: r.number("labels")?,
            original_ttl: r.number("original_ttl")?,
            expiration: r.text("expiration")?,
            inception: r.text("inception")?,
            keytag: r.number("keytag")?,
            signer: ensure_trailing_dot(&r.text("signer")?),
            signature: r.rest(""),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SshfpFields {
    pub algorithm: u8,
    pub fingerprint_type: u8,
    pub fingerprint: String,
}

impl FieldCodec for SshfpFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(self.algorithm != 0, rt, "algorithm", "is required")?;
        ensure(self.fingerprint_type != 0, rt, "fingerprint_type", "is required")?;
        require(&self.fingerprint, rt, "fingerprint")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {}",
            self.algorithm,
            self.fingerprint_type,
            strip_whitespace(&self.fingerprint)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(SshfpFields {
            algorithm: r.number("algorithm")?,
            fingerprint_type: r.number("fingerprint_type")?,
            fingerprint: r.rest(""),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsaFields {
    pub usage: u8,
    pub selector: u8,
    pub match_type: u8,
    pub certificate: String,
}

impl FieldCodec for TlsaFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        ensure(self.usage <= 3, rt, "usage", "must be between 0 and 3")?;
        ensure(self.selector <= 1, rt, "selector", "must be 0 or 1")?;
        ensure(self.match_type <= 2, rt, "match_type", "must be between 0 and 2")?;
        require(&self.certificate, rt, "certificate")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {} {} {}",
            self.usage,
            self.selector,
            self.match_type,
            strip_whitespace(&self.certificate)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(TlsaFields {
            usage: r.number("usage")?,
            selector: r.number("selector")?,
            match_type: r.number("match_type")?,
            certificate: r.rest(""),
        })
    }
}

/// Certificate record. The certificate type is given either as a mnemonic
/// (`PKIX`, `PGP`, ...) or as its numeric value, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CertFields {
    pub type_mnemonic: String,
    pub type_value: u16,
    pub keytag: u16,
    pub algorithm: u8,
    pub certificate: String,
}

impl FieldCodec for CertFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        let has_mnemonic = !self.type_mnemonic.trim().is_empty();
        ensure(
            has_mnemonic != (self.type_value != 0),
            rt,
            "type_mnemonic",
            "exactly one of type_mnemonic and type_value must be set",
        )?;
        require(&self.certificate, rt, "certificate")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        let cert_type = if self.type_mnemonic.trim().is_empty() {
            self.type_value.to_string()
        } else {
            self.type_mnemonic.trim().to_uppercase()
        };
        Ok(vec![format!(
            "{} {} {} {}",
            cert_type,
            self.keytag,
            self.algorithm,
            strip_whitespace(&self.certificate)
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let cert_type = r.text("type")?;
        let (type_mnemonic, type_value) = match cert_type.parse::<u16>() {
            Ok(value) => (String::new(), value),
            Err(_) => (cert_type.to_uppercase(), 0),
        };
        Ok(CertFields {
            type_mnemonic,
            type_value,
            keytag: r.number("keytag")?,
            algorithm: r.number("algorithm")?,
            certificate: r.rest(""),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AkamaiTlcFields {
    pub answer_type: String,
    pub dns_name: String,
}

impl FieldCodec for AkamaiTlcFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.answer_type, rt, "answer_type")?;
        require(&self.dns_name, rt, "dns_name")
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        Ok(vec![format!(
            "{} {}",
            self.answer_type.trim(),
            self.dns_name.trim()
        )])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        let fields = AkamaiTlcFields {
            answer_type: r.text("answer_type")?,
            dns_name: r.text("dns_name")?,
        };
        r.finish()?;
        Ok(fields)
    }
}

/// Service binding, shared by SVCB and HTTPS. Priority 0 is alias mode and
/// carries no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SvcbFields {
    pub svc_priority: u16,
    pub target_name: String,
    pub svc_params: String,
}

impl FieldCodec for SvcbFields {
    fn validate(&self, rt: RecordType) -> Result<(), ValidationError> {
        require(&self.target_name, rt, "target_name")?;
        ensure(
            self.svc_priority != 0 || self.svc_params.trim().is_empty(),
            rt,
            "svc_params",
            "must be empty in alias mode (svc_priority 0)",
        )
    }

    fn encode(&self, _rt: RecordType) -> Result<Vec<String>, ValidationError> {
        let mut rdata = format!(
            "{} {}",
            self.svc_priority,
            ensure_trailing_dot(&self.target_name)
        );
        let params = collapse_whitespace(&self.svc_params);
        if !params.is_empty() {
            rdata.push(' ');
            rdata.push_str(&params);
        }
        Ok(vec![rdata])
    }

    fn decode(rt: RecordType, rdata: &[String]) -> Result<Self, DecodeError> {
        let mut r = RdataReader::single(rt, rdata)?;
        Ok(SvcbFields {
            svc_priority: r.number("svc_priority")?,
            target_name: ensure_trailing_dot(&r.text("target_name")?),
            svc_params: r.rest(" "),
        })
    }
}
