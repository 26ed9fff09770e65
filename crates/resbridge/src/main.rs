mod cmd;
mod exit;
mod logging;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use crate::cmd::{Command, ConnectionArgs, Context};
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "resbridge",
    version,
    about = "Bulk data client for reservoir-model socket servers"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let cancel = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(cancel.clone())?;

    let ctx = Context {
        config: cli.connection.client_config()?,
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        cancel,
    };
    cmd::run(cli.command, &ctx)
}

fn install_ctrlc_handler(cancel: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
