//! Command registry and dispatcher.
//!
//! Commands are grouped in namespaces probed in registration order: the first
//! namespace knowing an alias wins. A resolved command runs after the engine
//! availability check unless it opts out with [`Command::requires_engine`].
//! With `--copy` the command output is captured and put in the clipboard once
//! the command returns.

use crate::clipboard::{copy_to_clipboard, Platform};
use crate::command::CommandRunner;
use crate::commands::update::UpdateError;
use crate::config::AppConfig;
use crate::engine::{Engine, EngineError};
use crate::output::{Capture, Console};
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required positional argument is missing.
    #[error("Error: {what} required")]
    MissingArgument {
        #[allow(missing_docs)]
        what: &'static str,
        #[allow(missing_docs)]
        usage: Option<&'static str>,
    },
    #[allow(missing_docs)]
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[allow(missing_docs)]
    #[error(transparent)]
    Update(#[from] UpdateError),
}

impl CommandError {
    /// Process exit code matching this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Engine(e) => e.exit_code(),
            _ => 1,
        }
    }
}

/// Errors stopping the dispatch before or instead of running a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[allow(missing_docs)]
    #[error("Error: command '{0}' not found")]
    CommandNotFound(String),
    /// The engine did not pass the availability check. Fatal for the whole run.
    #[error(transparent)]
    ToolUnavailable(EngineError),
}

impl DispatchError {
    /// Process exit code matching this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Everything a command needs to run.
pub struct Context<'a> {
    /// merged configuration
    pub config: &'a AppConfig,
    /// runner used for every external program
    pub runner: &'a dyn CommandRunner,
    /// where to print
    pub console: &'a mut dyn Console,
}

impl<'a> Context<'a> {
    /// Container engine configured for this run.
    pub fn engine(&self) -> Engine<'a> {
        Engine::new(&self.config.engine, &self.config.swarm_label, self.runner)
    }
}

/// A command reachable from the command line.
pub trait Command {
    /// Alias typed by the user.
    fn name(&self) -> &'static str;

    /// One line description.
    fn description(&self) -> &'static str;

    /// Usage synopsis.
    fn usage(&self) -> Option<&'static str> {
        None
    }

    /// Whether the engine availability check must pass before [`Command::run`].
    fn requires_engine(&self) -> bool {
        true
    }

    /// Run the command with the arguments following its alias and return the exit code.
    fn run(&self, ctx: &mut Context<'_>, args: &[String]) -> Result<i32, CommandError>;
}

/// Named group of commands.
pub struct Namespace {
    name: &'static str,
    commands: Vec<Box<dyn Command>>,
}

impl Namespace {
    /// Create a namespace holding `commands`.
    pub fn new(name: &'static str, commands: Vec<Box<dyn Command>>) -> Self {
        Namespace { name, commands }
    }

    fn find(&self, alias: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.name() == alias)
            .map(|c| c.as_ref() as &dyn Command)
    }
}

/// Ordered list of command namespaces.
#[derive(Default)]
pub struct Registry {
    namespaces: Vec<Namespace>,
}

impl Registry {
    /// Append `namespace` after the already registered ones.
    pub fn with(mut self, namespace: Namespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    /// First command named `alias`, probing namespaces in order.
    pub fn resolve(&self, alias: &str) -> Option<&dyn Command> {
        for namespace in &self.namespaces {
            match namespace.find(alias) {
                Some(command) => {
                    debug!("Resolved `{}` in namespace `{}`", alias, namespace.name);
                    return Some(command);
                }
                None => debug!("`{}` not in namespace `{}`", alias, namespace.name),
            }
        }
        None
    }

    /// Every registered command, in namespace order.
    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.namespaces
            .iter()
            .flat_map(|n| n.commands.iter().map(|c| c.as_ref() as &dyn Command))
    }

    /// Top level help text.
    pub fn usage(&self) -> Vec<String> {
        let mut lines: Vec<String> = [
            "",
            "dok - Docker CLI toolkit",
            "",
            "Usage:",
            "  dok <command> [args...]",
            "  dok --help",
            "  dok help <command>",
            "",
            "Global flags:",
            "  -c, --copy             Copy the command output to the clipboard",
            "  -v, --verbose          More logs (repeatable)",
            "  -q, --quiet            Fewer logs (repeatable)",
            "      --engine <prog>    Container engine program",
            "      --config <file>    Configuration file",
            "",
            "Commands:",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for command in self.commands() {
            let synopsis = command
                .usage()
                .and_then(|u| u.strip_prefix("dok "))
                .unwrap_or(command.name());
            lines.push(format!("  {:<21}{}", synopsis, command.description()));
        }
        lines.push(String::new());
        lines.push("Run 'dok help <command>' for more information on a specific command.".into());
        lines
    }
}

/// Flags changing how the dispatch happens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GlobalFlags {
    /// print the usage text
    pub help: bool,
    /// capture the output and copy it to the clipboard
    pub copy: bool,
}

/// Resolve aliases and run commands.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    config: &'a AppConfig,
    runner: &'a dyn CommandRunner,
    platform: Platform,
}

impl<'a> Dispatcher<'a> {
    #[allow(missing_docs)]
    pub fn new(
        registry: &'a Registry,
        config: &'a AppConfig,
        runner: &'a dyn CommandRunner,
        platform: Platform,
    ) -> Self {
        Dispatcher {
            registry,
            config,
            runner,
            platform,
        }
    }

    fn print_usage(&self, console: &mut dyn Console) -> i32 {
        for line in self.registry.usage() {
            console.out(&line);
        }
        0
    }

    fn print_command_help(
        &self,
        alias: &str,
        console: &mut dyn Console,
    ) -> Result<i32, DispatchError> {
        let command = self
            .registry
            .resolve(alias)
            .ok_or_else(|| DispatchError::CommandNotFound(alias.to_owned()))?;
        console.out("");
        console.out(&format!("{} - {}", command.name(), command.description()));
        if let Some(usage) = command.usage() {
            console.out("");
            console.out(&format!("Usage: {usage}"));
        }
        console.out("");
        Ok(0)
    }

    /// Run the command named by the first of `positionals` with the others as arguments.
    pub fn dispatch(
        &self,
        flags: GlobalFlags,
        positionals: &[String],
        console: &mut dyn Console,
    ) -> Result<i32, DispatchError> {
        let Some((alias, args)) = positionals.split_first() else {
            return Ok(self.print_usage(console));
        };
        if flags.help {
            return Ok(self.print_usage(console));
        }
        if alias == "help" {
            return match args.first() {
                Some(alias) => self.print_command_help(alias, console),
                None => Ok(self.print_usage(console)),
            };
        }

        let command = self
            .registry
            .resolve(alias)
            .ok_or_else(|| DispatchError::CommandNotFound(alias.to_owned()))?;

        if command.requires_engine() {
            Engine::new(&self.config.engine, &self.config.swarm_label, self.runner)
                .check_available()
                .map_err(DispatchError::ToolUnavailable)?;
        }

        if !flags.copy {
            return Ok(self.execute(command, args, console));
        }
        let mut capture = Capture::start(console);
        let code = self.execute(command, args, &mut capture);
        let text = capture.stop();
        if copy_to_clipboard(&text, self.platform, self.runner, console) {
            info!("Output copied to clipboard");
        }
        Ok(code)
    }

    fn execute(&self, command: &dyn Command, args: &[String], console: &mut dyn Console) -> i32 {
        debug!("Running `{}` with {:?}", command.name(), args);
        let mut ctx = Context {
            config: self.config,
            runner: self.runner,
            console,
        };
        match command.run(&mut ctx, args) {
            Ok(code) => code,
            Err(e) => {
                ctx.console.err(&e.to_string());
                if let CommandError::MissingArgument {
                    usage: Some(usage), ..
                } = &e
                {
                    ctx.console.err(&format!("Usage: {usage}"));
                }
                e.exit_code()
            }
        }
    }
}
