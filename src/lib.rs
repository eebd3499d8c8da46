#![warn(missing_docs)]
//! Dok main components and helper functions used by `main`
use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub mod clipboard;
pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod output;
pub mod parse;
pub mod table;
pub use command::{CommandRunner, SystemCommandRunner};
pub use config::{AppConfig, Args};
pub use output::{Console, Terminal};

use clipboard::Platform;
use dispatch::{DispatchError, Dispatcher, GlobalFlags};

/// Setup logging to stderr, stdout being reserved to command output.
pub fn setup_tracing(level: &str) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_new(level).context("Initializing log filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// Dispatch the command line in `args` and return the process exit code.
pub fn run(
    args: &Args,
    config: &AppConfig,
    runner: &dyn CommandRunner,
    console: &mut dyn Console,
) -> i32 {
    let registry = commands::registry();
    let dispatcher = Dispatcher::new(&registry, config, runner, Platform::current());
    let flags = GlobalFlags {
        help: args.help,
        copy: args.copy,
    };
    match dispatcher.dispatch(flags, args.positionals(), console) {
        Ok(code) => {
            debug!("Exit code {}", code);
            code
        }
        Err(e) => {
            console.err(&e.to_string());
            if let DispatchError::CommandNotFound(_) = e {
                console.err("Run 'dok --help' for available commands.");
            }
            e.exit_code()
        }
    }
}
