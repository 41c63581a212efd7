use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "sh-cli")]
#[command(about = "Script host command line runner")]
pub(crate) struct Cli {
    /// Raise diagnostic logging: -v for info, -vv for debug.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub(crate) log_format: LogFormat,
    /// Also append diagnostic logging to this file.
    #[arg(long = "trace-file", global = true)]
    pub(crate) trace_file: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Run(RunArgs),
    Check(CheckArgs),
    Test(TestArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "script")]
    pub(crate) script: PathBuf,
    #[arg(long = "bundle")]
    pub(crate) bundle: Option<PathBuf>,
    #[arg(long = "config-script")]
    pub(crate) config_script: Option<PathBuf>,
    #[arg(long = "search-path")]
    pub(crate) search_paths: Vec<PathBuf>,
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub(crate) arguments: Vec<String>,
    /// `name=value`; the value is read as JSON when it parses, else as text.
    #[arg(long = "var")]
    pub(crate) vars: Vec<String>,
    #[arg(long = "config")]
    pub(crate) config: Option<PathBuf>,
    /// Failure log written when the script fails to compile or run.
    #[arg(long = "log-file")]
    pub(crate) log_file: Option<PathBuf>,
    #[arg(long = "config-mode")]
    pub(crate) config_mode: bool,
    #[arg(long = "debug")]
    pub(crate) debug: bool,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "script")]
    pub(crate) script: PathBuf,
    #[arg(long = "config")]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct TestArgs {
    #[arg(long = "cases-dir")]
    pub(crate) cases_dir: PathBuf,
}
