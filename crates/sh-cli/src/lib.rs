use std::ffi::OsString;

use clap::Parser;
use sh_core::ScriptHostError;

mod cli_args;
mod commands;
mod error_map;
mod logging;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs, TestArgs};
pub(crate) use error_map::emit_error;

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, ScriptHostError> {
    logging::init(cli.verbose, cli.log_format, cli.trace_file.as_deref())?;
    match cli.command {
        Mode::Run(args) => commands::run_command(args),
        Mode::Check(args) => commands::check_command(args),
        Mode::Test(args) => commands::test_command(args),
    }
}
