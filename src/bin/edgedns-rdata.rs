mod cli;

use std::process::ExitCode;

use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info};
use thiserror::Error;

use edgedns_records::{
    codec::{self, DecodeError, MxFields, ValidationError},
    fingerprint::Fingerprint,
    plan::mx::{self, MergeError},
    RecordConfig, RecordFields,
};

use cli::{Cli, Command};

#[derive(Error, Debug)]
enum CliError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    Builder::new().filter_level(cli.loglevel.into()).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Render {
            zone,
            host,
            ttl,
            fields,
        } => {
            let fields: RecordFields = serde_json::from_str(&fields)?;
            let record = RecordConfig {
                zone,
                host,
                ttl,
                fields,
            }
            .render()?;
            info!("Rendered {}", record);
            for line in &record.rdata {
                println!("{}", line);
            }
            println!("fingerprint: {}", record.fingerprint());
        }
        Command::Parse { record_type, rdata } => {
            let fields = codec::decode(record_type, &rdata)?;
            debug!("Decoded {:?}", fields);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Command::Fingerprint { record_type, rdata } => {
            debug!("Normalized: {:?}", codec::normalize(record_type, &rdata));
            println!("{}", Fingerprint::of(record_type, &rdata));
        }
        Command::MergeMx {
            fields,
            previous,
            current,
        } => {
            let desired: MxFields = serde_json::from_str(&fields)?;
            let previous = previous
                .map(|p| serde_json::from_str::<MxFields>(&p))
                .transpose()?;
            for line in mx::merge(&current, previous.as_ref(), &desired)? {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
