//! Output sinks used by every command.
//!
//! Commands never print directly: they write lines through a [`Console`].
//! [`Terminal`] is the default one. Wrapping it in a [`Capture`] records every
//! line while still forwarding it, which is how `--copy` collects the text to
//! put in the clipboard. The capture holds the only mutable borrow of the
//! wrapped console, so once [`Capture::stop`] returns the original console is
//! the sole sink again and captures cannot be nested.

use std::io::{self, ErrorKind, Write};
use tracing::{debug, warn};

/// Line oriented output sink with a normal and an error channel.
pub trait Console {
    /// Emit `line` on the normal channel.
    fn out(&mut self, line: &str);

    /// Emit `line` on the error channel.
    fn err(&mut self, line: &str);

    /// Write terminal control bytes as is. Never captured.
    fn raw(&mut self, bytes: &[u8]);
}

/// [`Console`] writing to the process stdout and stderr.
///
/// A stream closed by the reader (`dok ps | head -1`) is dropped silently and
/// never written to again.
#[derive(Debug, Default)]
pub struct Terminal {
    stdout_closed: bool,
    stderr_closed: bool,
}

/// Write `bytes` to `sink` unless it is already known to be `closed`.
fn emit(sink: &mut impl Write, bytes: &[u8], closed: &mut bool) {
    if *closed {
        return;
    }
    match sink.write_all(bytes).and_then(|_| sink.flush()) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("Output closed by reader");
            *closed = true;
        }
        Err(e) => warn!("Unable to write to terminal: {}", e),
    }
}

impl Console for Terminal {
    fn out(&mut self, line: &str) {
        let line = format!("{line}\n");
        emit(&mut io::stdout().lock(), line.as_bytes(), &mut self.stdout_closed);
    }

    fn err(&mut self, line: &str) {
        let line = format!("{line}\n");
        emit(&mut io::stderr().lock(), line.as_bytes(), &mut self.stderr_closed);
    }

    fn raw(&mut self, bytes: &[u8]) {
        emit(&mut io::stdout().lock(), bytes, &mut self.stdout_closed);
    }
}

/// [`Console`] keeping every line in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryConsole {
    /// Lines written on the normal channel
    pub out: Vec<String>,
    /// Lines written on the error channel
    pub err: Vec<String>,
    /// Raw bytes written with [`Console::raw`]
    pub raw: Vec<u8>,
}

impl MemoryConsole {
    /// Create an empty console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normal channel content, newline joined.
    pub fn stdout(&self) -> String {
        self.out.join("\n")
    }

    /// Error channel content, newline joined.
    pub fn stderr(&self) -> String {
        self.err.join("\n")
    }
}

impl Console for MemoryConsole {
    fn out(&mut self, line: &str) {
        self.out.push(line.to_owned());
    }

    fn err(&mut self, line: &str) {
        self.err.push(line.to_owned());
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.raw.extend_from_slice(bytes);
    }
}

/// A capture session over another [`Console`].
pub struct Capture<'a> {
    inner: &'a mut dyn Console,
    lines: Vec<String>,
}

impl<'a> Capture<'a> {
    /// Start capturing what is written to `inner`.
    pub fn start(inner: &'a mut dyn Console) -> Self {
        Capture {
            inner,
            lines: Vec::new(),
        }
    }

    /// Stop capturing, give `inner` back and return the captured lines joined by `\n`.
    pub fn stop(self) -> String {
        self.lines.join("\n")
    }
}

impl Console for Capture<'_> {
    fn out(&mut self, line: &str) {
        self.lines.push(line.to_owned());
        self.inner.out(line);
    }

    fn err(&mut self, line: &str) {
        self.lines.push(line.to_owned());
        self.inner.err(line);
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.inner.raw(bytes);
    }
}

#[cfg(test)]
mod capture_should {
    use super::*;

    #[test]
    fn record_both_channels_in_emission_order() {
        let mut console = MemoryConsole::new();
        let mut capture = Capture::start(&mut console);
        capture.out("first");
        capture.err("second");
        capture.out("third");
        assert_eq!(capture.stop(), "first\nsecond\nthird");
    }

    #[test]
    fn forward_lines_unchanged() {
        let mut console = MemoryConsole::new();
        let mut capture = Capture::start(&mut console);
        capture.out("table");
        capture.err("oops");
        capture.stop();
        assert_eq!(console.out, vec!["table"]);
        assert_eq!(console.err, vec!["oops"]);
    }

    #[test]
    fn leave_original_console_alone_once_stopped() {
        let mut console = MemoryConsole::new();
        let mut capture = Capture::start(&mut console);
        capture.out("during");
        let captured = capture.stop();
        console.out("after");
        assert_eq!(captured, "during");
        assert_eq!(console.out, vec!["during", "after"]);
    }

    #[test]
    fn not_record_raw_bytes() {
        let mut console = MemoryConsole::new();
        let mut capture = Capture::start(&mut console);
        capture.raw(b"\x1b]52;c;\x07");
        assert_eq!(capture.stop(), "");
        assert_eq!(console.raw, b"\x1b]52;c;\x07");
    }

    #[test]
    fn return_empty_text_when_nothing_was_written() {
        let mut console = MemoryConsole::new();
        assert_eq!(Capture::start(&mut console).stop(), "");
    }
}

#[cfg(test)]
mod terminal_should {
    use super::*;

    /// Writer failing every write with `kind`, counting the attempts.
    struct Failing {
        kind: ErrorKind,
        attempts: usize,
    }

    impl Write for Failing {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.attempts += 1;
            Err(io::Error::from(self.kind))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stop_writing_once_the_reader_is_gone() {
        let mut sink = Failing {
            kind: ErrorKind::BrokenPipe,
            attempts: 0,
        };
        let mut closed = false;
        emit(&mut sink, b"first\n", &mut closed);
        emit(&mut sink, b"second\n", &mut closed);
        assert!(closed);
        assert_eq!(sink.attempts, 1);
    }

    #[test]
    fn keep_writing_after_other_errors() {
        let mut sink = Failing {
            kind: ErrorKind::Other,
            attempts: 0,
        };
        let mut closed = false;
        emit(&mut sink, b"first\n", &mut closed);
        emit(&mut sink, b"second\n", &mut closed);
        assert!(!closed);
        assert_eq!(sink.attempts, 2);
    }

    #[test]
    fn write_lines_as_is() {
        let mut sink = Vec::new();
        let mut closed = false;
        emit(&mut sink, b"ID  NAME\n", &mut closed);
        assert_eq!(sink, b"ID  NAME\n");
    }
}
