//! Command line and client configuration.
//!
//! Flags follow the Go `flag` conventions the tool has always used
//! (`-url x`, `-url=x`, `-noColor`, `-noColor=false`); GNU style
//! (`--url x`) works too. [`normalize_args`] rewrites the single-dash long
//! form before `clap` sees it.

use clap::{ArgAction, Parser};

use crate::console::Palette;

pub const DEFAULT_URL: &str = "ws://localhost:1337/ws";
pub const DEFAULT_ORIGIN: &str = "http://localhost/";
pub const DEFAULT_READ_BUFFER: usize = 512;

/// Long flag names that may be written with a single dash.
const LONG_FLAGS: &[&str] = &[
    "url",
    "origin",
    "protocol",
    "insecureSkipVerify",
    "readBuffer",
    "noColor",
    "log",
    "help",
    "version",
];

/// Interactive WebSocket client.
#[derive(Debug, Clone, Parser)]
#[command(name = "wsd")]
#[command(about = "Interactive command-line WebSocket client")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// WebSocket server address to connect to
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Origin of WebSocket client
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// WebSocket subprotocol
    #[arg(long, default_value = "")]
    pub protocol: String,

    /// Skip TLS certificate verification
    #[arg(
        long = "insecureSkipVerify",
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub insecure_skip_verify: bool,

    /// Maximum bytes shown per received message (0 = whole message)
    #[arg(long = "readBuffer", default_value_t = DEFAULT_READ_BUFFER)]
    pub read_buffer: usize,

    /// Disable colored output
    #[arg(
        long = "noColor",
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub no_color: bool,

    /// Diagnostic log filter, written to stderr (e.g. `debug`, `wsd=trace`)
    #[arg(long, default_value = "warn")]
    pub log: String,

    /// Display version number
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub version: bool,
}

impl Cli {
    /// Parse from an argv-style iterator, accepting Go-style flags.
    pub fn parse_go_style<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Freeze the parsed flags into the configuration the client runs with.
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            url: self.url,
            origin: self.origin,
            protocol: Some(self.protocol).filter(|p| !p.is_empty()),
            insecure_skip_verify: self.insecure_skip_verify,
            read_limit: Some(self.read_buffer).filter(|n| *n > 0),
            palette: Palette::new(!self.no_color),
        }
    }
}

/// Rewrite `-name` / `-name=value` into `--name` / `--name=value` for the
/// known long flags. Everything after a bare `--` is left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().map(Into::into).enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let is_single_dash_long = arg.starts_with('-') && !arg.starts_with("--") && {
            let name = arg[1..].split('=').next().unwrap_or_default();
            LONG_FLAGS.contains(&name)
        };
        if is_single_dash_long {
            out.push(format!("-{arg}"));
        } else {
            out.push(arg);
        }
    }
    out
}

/// `<argv0> version <VERSION>`
pub fn version_line(argv0: &str) -> String {
    format!("{} version {}", argv0, crate::VERSION)
}

/// Immutable settings shared by the connector, the inspector and the printers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub origin: String,
    /// Offered as the sole subprotocol when set.
    pub protocol: Option<String>,
    pub insecure_skip_verify: bool,
    /// Received messages are cut to this many bytes; `None` keeps them whole.
    pub read_limit: Option<usize>,
    pub palette: Palette,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            protocol: None,
            insecure_skip_verify: false,
            read_limit: Some(DEFAULT_READ_BUFFER),
            palette: Palette::default(),
        }
    }
}
