//! `dok update`: replace the running binary with the latest published one.
//!
//! The binary matching the current OS and architecture is downloaded and
//! staged next to the executable, then renamed over it. When the executable
//! directory is not writable the rename is retried through `sudo mv`.

use crate::command::{CommandRunner, RunError};
use crate::dispatch::{Command, CommandError, Context};
use crate::output::Console;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors specific to the self update.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[allow(missing_docs)]
    #[error("Failed to download: HTTP {0}")]
    HttpStatus(u16),
    #[allow(missing_docs)]
    #[error("Failed to download: {0}")]
    Download(String),
    #[allow(missing_docs)]
    #[error("Update failed: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    /// `sudo mv` did not succeed
    #[error("Update failed")]
    Escalation(i32),
    #[allow(missing_docs)]
    #[error("Update failed: {0}")]
    Run(#[from] RunError),
}

impl From<ureq::Error> for UpdateError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => UpdateError::HttpStatus(code),
            e => UpdateError::Download(e.to_string()),
        }
    }
}

fn io_error(context: impl Into<String>) -> impl FnOnce(io::Error) -> UpdateError {
    let context = context.into();
    move |source| UpdateError::Io { context, source }
}

/// OS name used in release binary names.
pub fn os_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Architecture name used in release binary names.
pub fn arch_name(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "x64",
        _ => "arm64",
    }
}

/// Binary written on disk, ready to replace the executable.
#[derive(Debug, PartialEq, Eq)]
pub struct Staged {
    /// where the new binary is
    pub path: PathBuf,
    /// `false` when it had to go to the temp dir because the target directory is not writable
    pub beside_target: bool,
}

/// Self update of the binary at `target`.
pub struct Updater<'a> {
    base_url: String,
    os: String,
    arch: String,
    target: PathBuf,
    temp_dir: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Updater<'a> {
    /// Update `target` from `base_url` for the current platform.
    pub fn new(base_url: &str, target: PathBuf, runner: &'a dyn CommandRunner) -> Self {
        Updater {
            base_url: base_url.trim_end_matches('/').to_owned(),
            os: os_name(std::env::consts::OS).to_owned(),
            arch: arch_name(std::env::consts::ARCH).to_owned(),
            target,
            temp_dir: std::env::temp_dir(),
            runner,
        }
    }

    /// Use the binaries of another platform.
    pub fn for_platform(mut self, os: &str, arch: &str) -> Self {
        self.os = os_name(os).to_owned();
        self.arch = arch_name(arch).to_owned();
        self
    }

    /// Stage in `dir` when the target directory is not writable.
    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Name of the release binary for this platform.
    pub fn binary_name(&self) -> String {
        format!("dok-{}-{}", self.os, self.arch)
    }

    /// URL of the release binary for this platform.
    pub fn download_url(&self) -> String {
        format!("{}/{}", self.base_url, self.binary_name())
    }

    /// Fetch the release binary.
    pub fn download(&self) -> Result<Vec<u8>, UpdateError> {
        let url = self.download_url();
        let mut response = ureq::get(&url).call()?;
        let mut bytes = Vec::new();
        io::copy(&mut response.body_mut().as_reader(), &mut bytes)
            .map_err(|e| UpdateError::Download(e.to_string()))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    /// Write `bytes` as an executable file, next to the target if possible.
    pub fn stage(&self, bytes: &[u8]) -> Result<Staged, UpdateError> {
        if let Some(dir) = self.target.parent() {
            let path = dir.join(".dok_update");
            match write_executable(&path, bytes) {
                Ok(()) => {
                    return Ok(Staged {
                        path,
                        beside_target: true,
                    })
                }
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    debug!("{:?} is not writable, staging in {:?}", dir, self.temp_dir)
                }
                Err(e) => return Err(io_error(format!("Writing {path:?}"))(e)),
            }
        }
        let path = self.temp_dir.join("dok_update");
        write_executable(&path, bytes).map_err(io_error(format!("Writing {path:?}")))?;
        Ok(Staged {
            path,
            beside_target: false,
        })
    }

    /// Move `staged` over the target with `rename`, falling back to `sudo mv`
    /// when permission is denied.
    pub fn install_with<F>(
        &self,
        staged: &Staged,
        rename: F,
        console: &mut dyn Console,
    ) -> Result<(), UpdateError>
    where
        F: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        if staged.beside_target {
            match rename(&staged.path, &self.target) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    debug!("Rename denied: {}", e)
                }
                Err(e) => return Err(io_error(format!("Replacing {:?}", self.target))(e)),
            }
        }
        console.out("Requesting sudo privileges...");
        let code = self.runner.run_interactive(
            "sudo",
            vec![
                "mv".into(),
                staged.path.to_string_lossy().into_owned(),
                self.target.to_string_lossy().into_owned(),
            ],
        )?;
        if code == 0 {
            Ok(())
        } else {
            Err(UpdateError::Escalation(code))
        }
    }

    /// Move `staged` over the target.
    pub fn install(&self, staged: &Staged, console: &mut dyn Console) -> Result<(), UpdateError> {
        self.install_with(staged, |from, to| fs::rename(from, to), console)
    }

    /// Download, stage and install.
    pub fn update(&self, console: &mut dyn Console) -> Result<(), UpdateError> {
        console.out("Updating dok to the latest version...");
        console.out(&format!("Downloading: {}", self.binary_name()));
        console.out(&format!("From: {}", self.download_url()));
        let bytes = self.download()?;
        let staged = self.stage(&bytes)?;
        console.out(&format!("Replacing: {}", self.target.display()));
        self.install(&staged, console)?;
        info!("{} updated", self.target.display());
        console.out("Update successful!");
        Ok(())
    }
}

fn write_executable(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// `dok update`
pub struct Update;

impl Command for Update {
    fn name(&self) -> &'static str {
        "update"
    }

    fn description(&self) -> &'static str {
        "Update dok to the latest published version"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok update")
    }

    fn requires_engine(&self) -> bool {
        false
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &[String]) -> Result<i32, CommandError> {
        let target =
            std::env::current_exe().map_err(io_error("Locating the running executable"))?;
        Updater::new(&ctx.config.update_url, target, ctx.runner).update(ctx.console)?;
        Ok(0)
    }
}
