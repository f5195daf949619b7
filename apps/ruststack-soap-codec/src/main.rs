//! RustStack SOAP codec - inspect S3 SOAP payloads from the command line.
//!
//! Parses the body payload of an S3 SOAP request or response against the
//! registered schemas and prints the decoded record as JSON, or re-serializes
//! it as canonical XML.
//!
//! # Usage
//!
//! ```text
//! ruststack-soap-codec <Operation> <request|response> [FILE] [--xml]
//! ruststack-soap-codec CreateBucket request create-bucket.xml
//! cat response.xml | ruststack-soap-codec ListBucket response --xml
//! ```
//!
//! The payload is read from `FILE`, or from stdin when `FILE` is omitted or `-`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLBIND_XML_DECLARATION` | `true` | Emit the XML declaration with `--xml` |
//! | `XMLBIND_MAX_DEPTH` | `64` | Maximum record nesting |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ruststack_s3_soap_model::{S3SoapOperation, build_registry};
use ruststack_xml_binding::{CodecConfig, from_xml, to_xml};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout carries only the decoded payload.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

/// Which message of an operation to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    Request,
    Response,
}

/// RustStack SOAP codec - decode S3 SOAP payloads.
#[derive(Debug, Parser)]
#[command(name = "ruststack-soap-codec")]
#[command(version, about, long_about = None)]
struct Args {
    /// S3 SOAP operation name (e.g., CreateBucket)
    #[arg(value_parser = parse_operation)]
    operation: S3SoapOperation,

    /// Decode the operation's request or response message
    #[arg(value_enum)]
    direction: Direction,

    /// Payload file; stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Re-emit canonical XML instead of JSON
    #[arg(long = "xml")]
    xml_output: bool,
}

impl Args {
    fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|path| *path != Path::new("-"))
    }
}

fn parse_operation(name: &str) -> std::result::Result<S3SoapOperation, String> {
    S3SoapOperation::from_name(name).ok_or_else(|| format!("unknown operation {name:?}"))
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn run(args: &Args, config: &CodecConfig) -> Result<Vec<u8>> {
    let registry = build_registry().context("failed to build S3 SOAP registry")?;
    let element = match args.direction {
        Direction::Request => args.operation.request_element(),
        Direction::Response => args.operation.response_element(),
    };

    let xml = read_input(args.input_path())?;
    debug!(bytes = xml.len(), %element, "decoding payload");
    let record = from_xml(&xml, &element, &element, &registry, config)
        .with_context(|| format!("failed to decode {element}"))?;
    info!(
        operation = %args.operation,
        fields = ?record.tracked_fields(),
        "decoded payload"
    );

    if args.xml_output {
        to_xml(&record, &element, &element, config)
            .with_context(|| format!("failed to encode {element}"))
    } else {
        let mut json = serde_json::to_vec_pretty(&record).context("failed to format JSON")?;
        json.push(b'\n');
        Ok(json)
    }
}

fn main() -> Result<()> {
    let config = CodecConfig::from_env();
    init_tracing(&config.log_level)?;

    let args = Args::parse();
    let output = run(&args, &config)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output).context("failed to write output")?;
    stdout.flush().context("failed to flush output")?;
    Ok(())
}
