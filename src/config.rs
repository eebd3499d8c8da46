//! This module holds struct and helpers for parameters and configuration
use ::structopt::clap::AppSettings;
use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::engine::SWARM_SERVICE_LABEL;

/// Base URL where release binaries are published.
pub const DEFAULT_UPDATE_URL: &str =
    "https://raw.githubusercontent.com/Kiri23/dev-toolkit/main/denoDevToolkit";

// Courtesy of structopt_flags crate
/// Log verbosity moved up by `-v` and down by `-q`.
#[derive(structopt::StructOpt, Debug, Clone, Default, PartialEq, Eq)]
pub struct QuietVerbose {
    /// Increase the output's verbosity level
    ///
    /// Pass many times to increase verbosity level, up to 2.
    #[structopt(
        name = "quietverbose",
        long = "verbose",
        short = "v",
        parse(from_occurrences),
        conflicts_with = "quietquiet",
        global = true
    )]
    verbosity_level: u8,

    /// Decrease the output's verbosity level.
    ///
    /// Used once, it will only show warnings.
    /// Used three times, will silent the log completely
    #[structopt(
        name = "quietquiet",
        long = "quiet",
        short = "q",
        parse(from_occurrences),
        conflicts_with = "quietverbose",
        global = true
    )]
    quiet_level: u8,
}

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl QuietVerbose {
    /// Level filter obtained by moving from `base` by the number of `-v` and `-q`.
    ///
    /// ```
    /// use dok::config::QuietVerbose;
    /// assert_eq!(QuietVerbose::default().get_level_filter("info"), "info");
    /// ```
    pub fn get_level_filter(&self, base: &str) -> &'static str {
        let base = LEVELS
            .iter()
            .position(|l| l.eq_ignore_ascii_case(base.trim()))
            .unwrap_or(3) as i16;
        let level = base + self.verbosity_level.min(2) as i16 - self.quiet_level.min(3) as i16;
        LEVELS[level.clamp(0, LEVELS.len() as i16 - 1) as usize]
    }
}

#[derive(structopt::StructOpt, Debug, Default)]
/// Docker CLI toolkit
///
/// Compact listings of containers, swarm tasks and services.
/// Run `dok help` for the list of commands.
#[structopt(
    name = "dok",
    global_settings(&[AppSettings::ColoredHelp, AppSettings::ColorAuto, AppSettings::DisableHelpFlags])
)]
pub struct Args {
    /// Print usage
    #[structopt(short, long)]
    pub help: bool,

    /// Copy the command output to the clipboard
    #[structopt(short, long)]
    pub copy: bool,

    /// Configuration file
    ///
    /// Defaults to `dok/config.toml` in the user configuration directory.
    #[structopt(long, env = "DOK_CONFIG", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Container engine program
    #[structopt(long)]
    pub engine: Option<String>,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub verbose: QuietVerbose,

    /// Command alias followed by its arguments
    #[structopt(name = "COMMAND")]
    pub command: Vec<String>,
}

/// Settings merged from defaults, configuration file, environment and command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// container engine program
    pub engine: String,
    /// label identifying containers belonging to a swarm service
    pub swarm_label: String,
    /// base URL of the self update downloads
    pub update_url: String,
    /// base log level, adjusted by `-v` and `-q`
    pub verbose: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine: "docker".into(),
            swarm_label: SWARM_SERVICE_LABEL.into(),
            update_url: DEFAULT_UPDATE_URL.into(),
            verbose: "info".into(),
        }
    }
}

/// Command line values overriding the configuration.
#[derive(Serialize, Debug)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<String>,
}

/// Default configuration file location.
pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("net", "dok", "dok").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Args {
    /// Positional arguments, the command alias first.
    pub fn positionals(&self) -> &[String] {
        &self.command
    }

    /// Build the [`AppConfig`]: defaults, then configuration file, then `DOK_*`
    /// environment variables, then command line flags.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = self.config.clone().or_else(default_config_file) {
            debug!("Reading configuration from {:?}", path);
            figment = figment.merge(Toml::file(path));
        }
        let config: AppConfig = figment
            .merge(Env::prefixed("DOK_").ignore(&["config"]))
            .merge(Serialized::defaults(CliOverrides {
                engine: self.engine.clone(),
            }))
            .extract()
            .context("Loading configuration")?;
        debug!("Merge config and parameters : {:#?}", config);
        Ok(config)
    }
}
