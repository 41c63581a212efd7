//! Diagnostic logging for the command line host.
//!
//! Protocol lines own stdout, so every tracing layer writes to stderr or to
//! the trace file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use sh_core::ScriptHostError;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::cli_args::LogFormat;
use crate::error_map::map_cli_trace_file;

const LIBRARY_TARGETS: [&str; 5] = [
    "scripthost::runtime",
    "scripthost::executor",
    "scripthost::context",
    "scripthost::output",
    "scripthost::script",
];

pub(crate) fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn targets(level: LevelFilter) -> Targets {
    LIBRARY_TARGETS
        .iter()
        .fold(Targets::new().with_default(LevelFilter::WARN), |targets, target| {
            targets.with_target(*target, level)
        })
        .with_target("sh_cli", level)
}

/// Installs the global subscriber. A second call in the same process keeps
/// the first subscriber.
pub(crate) fn init(
    verbose: u8,
    format: LogFormat,
    trace_file: Option<&Path>,
) -> Result<(), ScriptHostError> {
    let targets = targets(level_for(verbose));
    let stderr_layer = format_layer(format).with_filter(targets.clone());

    let file_layer = match trace_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(map_cli_trace_file)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(targets),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

fn format_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}
