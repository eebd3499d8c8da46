//! Copy text to the clipboard.
//!
//! The platform copy helper is tried first (`pbcopy`, `xclip`, `clip`). On
//! linux, when `xclip` is missing or fails (no display, ssh session), the text
//! is sent with an OSC 52 escape sequence so that the terminal emulator sets
//! its own clipboard.

use crate::command::CommandRunner;
use crate::output::Console;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

/// Operating system families with a known clipboard mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    #[allow(missing_docs)]
    MacOs,
    #[allow(missing_docs)]
    Linux,
    #[allow(missing_docs)]
    Windows,
    /// Anything else
    Other,
}

impl Platform {
    /// Platform the binary was built for.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a [`std::env::consts::OS`] value to a [`Platform`].
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Copy command and its arguments, if any.
    fn copy_command(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            Platform::MacOs => Some(("pbcopy", &[][..])),
            Platform::Linux => Some(("xclip", &["-selection", "clipboard"][..])),
            Platform::Windows => Some(("clip", &[][..])),
            Platform::Other => None,
        }
    }
}

/// OSC 52 sequence asking the terminal to put `text` in the clipboard.
///
/// ```
/// assert_eq!(dok::clipboard::osc52("hi"), "\x1b]52;c;aGk=\x07");
/// ```
pub fn osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

fn copy_with_osc52(text: &str, console: &mut dyn Console) -> bool {
    debug!("Copying {} bytes with OSC 52", text.len());
    console.raw(osc52(text).as_bytes());
    true
}

/// Put `text` in the clipboard of `platform`. Returns `true` on success.
pub fn copy_to_clipboard(
    text: &str,
    platform: Platform,
    runner: &dyn CommandRunner,
    console: &mut dyn Console,
) -> bool {
    let Some((cmd, args)) = platform.copy_command() else {
        console.err("Clipboard copy not supported on this platform");
        return false;
    };
    let args = args.iter().map(|s| s.to_string()).collect();
    match runner.run_with_input(cmd, args, text) {
        Ok(output) if output.success() => true,
        Ok(output) => {
            warn!("{} exited with {}: {}", cmd, output.code, output.stderr.trim());
            if platform == Platform::Linux {
                return copy_with_osc52(text, console);
            }
            console.err(&format!(
                "Failed to copy to clipboard: {cmd} exited with {}",
                output.code
            ));
            false
        }
        Err(e) => {
            if platform == Platform::Linux {
                debug!("{}", e);
                return copy_with_osc52(text, console);
            }
            console.err(&format!("Failed to copy to clipboard: {e}"));
            false
        }
    }
}
