//! Terminal line protocol.
//!
//! Everything the operator sees on stdout goes through here: the `> `
//! prompt, received messages (`< text`), loop errors (`err text`) and the
//! clean-close notice. Colour is decided once at startup and carried in a
//! [`Palette`] rather than in process-wide state.

use colored::Colorize;
use std::io::{self, Write};

use crate::base::NetError;

/// The input prompt.
pub const PROMPT: &str = "> ";

/// Colour switch plus the handful of colours the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A palette that never emits escape codes.
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, |s| s.red().to_string())
    }

    pub fn magenta(&self, text: &str) -> String {
        self.paint(text, |s| s.magenta().to_string())
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, |s| s.green().to_string())
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow().to_string())
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(text, |s| s.cyan().to_string())
    }

    fn paint(&self, text: &str, f: impl FnOnce(&str) -> String) -> String {
        if self.enabled {
            f(text)
        } else {
            text.to_string()
        }
    }
}

/// Handle on the process stdout that can be cloned into every printer.
///
/// Each `write_all` takes the stdout lock once, so a whole line from one
/// printer is never split by another.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutHandle;

impl Write for StdoutHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

fn emit<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    out.write_all(line.as_bytes())?;
    out.flush()
}

/// Print the bare prompt.
pub fn write_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    emit(out, PROMPT)
}

/// Print one received message and restore the prompt.
pub fn write_inbound<W: Write>(out: &mut W, palette: &Palette, msg: &[u8]) -> io::Result<()> {
    let text = String::from_utf8_lossy(msg);
    emit(out, &format!("\r< {}\n{}", palette.cyan(&text), PROMPT))
}

/// Print a non-fatal loop error and restore the prompt.
pub fn write_error<W: Write>(out: &mut W, palette: &Palette, err: &NetError) -> io::Result<()> {
    emit(out, &format!("\rerr {}\n{}", palette.red(&err.to_string()), PROMPT))
}

/// Print the notice shown when the peer closes the connection cleanly.
pub fn write_closed<W: Write>(out: &mut W, palette: &Palette, err: &NetError) -> io::Result<()> {
    emit(
        out,
        &format!(
            "\r✝ {} - connection closed by remote\n",
            palette.magenta(&err.to_string())
        ),
    )
}

/// `connecting to <url> [via <protocol>] from <origin>...`
pub fn write_connecting<W: Write>(
    out: &mut W,
    palette: &Palette,
    url: &str,
    protocol: Option<&str>,
    origin: &str,
) -> io::Result<()> {
    let line = match protocol {
        Some(protocol) => format!(
            "connecting to {} via {} from {}...\n",
            palette.yellow(url),
            palette.yellow(protocol),
            palette.yellow(origin)
        ),
        None => format!(
            "connecting to {} from {}...\n",
            palette.yellow(url),
            palette.yellow(origin)
        ),
    };
    emit(out, &line)
}

/// `successfully connected to <url>` followed by a blank line.
pub fn write_connected<W: Write>(out: &mut W, palette: &Palette, url: &str) -> io::Result<()> {
    emit(out, &format!("successfully connected to {}\n\n", palette.green(url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_palette_leaves_text_alone() {
        let palette = Palette::plain();
        assert_eq!(palette.red("x"), "x");
        assert_eq!(palette.cyan("hello"), "hello");
        assert!(!palette.is_enabled());
    }

    #[test]
    fn test_inbound_line() {
        let out = render(|w| write_inbound(w, &Palette::plain(), b"hello"));
        assert_eq!(out, "\r< hello\n> ");
    }

    #[test]
    fn test_inbound_invalid_utf8_is_lossy() {
        let out = render(|w| write_inbound(w, &Palette::plain(), &[0x68, 0xff, 0x69]));
        assert_eq!(out, "\r< h\u{fffd}i\n> ");
    }

    #[test]
    fn test_error_line() {
        let err = NetError::Write(tokio_tungstenite::tungstenite::Error::AlreadyClosed);
        let out = render(|w| write_error(w, &Palette::plain(), &err));
        assert!(out.starts_with("\rerr "));
        assert!(out.ends_with("\n> "));
    }

    #[test]
    fn test_closed_line() {
        let out = render(|w| write_closed(w, &Palette::plain(), &NetError::CleanClose));
        assert_eq!(out, "\r✝ EOF - connection closed by remote\n");
    }

    #[test]
    fn test_connecting_with_and_without_protocol() {
        let palette = Palette::plain();
        let with = render(|w| {
            write_connecting(w, &palette, "ws://h/ws", Some("chat"), "http://localhost/")
        });
        assert_eq!(with, "connecting to ws://h/ws via chat from http://localhost/...\n");

        let without = render(|w| write_connecting(w, &palette, "ws://h/ws", None, "http://o/"));
        assert_eq!(without, "connecting to ws://h/ws from http://o/...\n");
    }

    #[test]
    fn test_connected_line() {
        let out = render(|w| write_connected(w, &Palette::plain(), "ws://h/ws"));
        assert_eq!(out, "successfully connected to ws://h/ws\n\n");
    }
}
