use clap::{Parser, Subcommand, ValueEnum};
use edgedns_records::{types::TTL, RecordType};
use log::LevelFilter;

macro_rules! env_prefix {
    () => {
        "EDGEDNS_"
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Set the loglevel of the application
    #[arg(
        value_enum,
        short = 'l',
        long,
        global = true,
        default_value_t = Loglevel::Info,
        value_name = "LEVEL",
        env = concat!(env_prefix!(), "LOGLEVEL")
    )]
    pub loglevel: Loglevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Subcommand)]
pub enum Command {
    /// Validate typed record fields and print the rendered RDATA and its fingerprint
    Render {
        /// Zone the record belongs to
        #[arg(long, env = concat!(env_prefix!(), "ZONE"))]
        zone: String,
        /// Owner name of the record set
        #[arg(long)]
        host: String,
        #[arg(long, value_name = "TTL", default_value_t = 300)]
        ttl: TTL,
        /// Record fields as JSON, tagged with the record type, e.g. {"type":"A","targets":["192.0.2.1"]}
        #[arg(long, value_name = "JSON")]
        fields: String,
    },
    /// Decode presentation-format RDATA and print the typed fields as JSON
    Parse {
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        record_type: RecordType,
        /// One argument per RDATA entry
        #[arg(required = true)]
        rdata: Vec<String>,
    },
    /// Print the content fingerprint of RDATA
    Fingerprint {
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        record_type: RecordType,
        #[arg(required = true)]
        rdata: Vec<String>,
    },
    /// Merge declared MX fields into the MX entries a server currently holds
    MergeMx {
        /// MX fields as JSON, e.g. {"targets":["mx1.example.com"],"priority":10,"priority_increment":10}
        #[arg(long, value_name = "JSON")]
        fields: String,
        /// Previously applied MX fields as JSON, if the configuration changed
        #[arg(long, value_name = "JSON")]
        previous: Option<String>,
        /// Current "<priority> <host>" entries on the server
        current: Vec<String>,
    },
}

/// Used to set the applications loglevel
// This is essentially a re-creation of log:Level. However, that enum doesn't derive ValueEnum, so we have to do it manually here
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Loglevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<Loglevel> for LevelFilter {
    fn from(ll: Loglevel) -> Self {
        match ll {
            Loglevel::Error => LevelFilter::Error,
            Loglevel::Warn => LevelFilter::Warn,
            Loglevel::Info => LevelFilter::Info,
            Loglevel::Debug => LevelFilter::Debug,
            Loglevel::Trace => LevelFilter::Trace,
        }
    }
}
