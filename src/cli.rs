use std::ffi::OsStr;
use std::path::PathBuf;

use clap::Parser;

/// Serve static files from a web root over HTTP/1.0
#[derive(Parser, Debug, Default)]
#[command(name = "staticd", version, about)]
pub struct Args {
    /// Port to listen on
    #[arg(required_unless_present = "config")]
    pub port: Option<u16>,

    /// Directory the files are served from
    #[arg(value_name = "WEB_ROOT", required_unless_present = "config")]
    pub web_root: Option<PathBuf>,

    /// Maximum number of connections served at the same time
    #[arg(value_name = "THREAD_LIMIT", required_unless_present = "config")]
    pub thread_limit: Option<usize>,

    /// YAML settings file; positional arguments take precedence over it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// True when the command line asks for usage instead of a server: no
/// arguments at all, or the single-dash `-help` spelling clap does not know.
pub fn wants_usage<I, T>(args: I) -> bool
where
    I: IntoIterator<Item = T>,
    T: AsRef<OsStr>,
{
    match args.into_iter().nth(1) {
        None => true,
        Some(first) => first.as_ref() == "-help",
    }
}
