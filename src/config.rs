use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::cli::Args;
use crate::http::connection::Deadlines;

/// Server settings, fixed for the lifetime of the process.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// port: 8080
/// web_root: ./www
/// workers: 10
/// read_timeout_secs: 30
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub web_root: PathBuf,
    /// Size of the worker pool
    pub workers: usize,
    /// 0 disables the deadline
    pub read_timeout_secs: u64,
    /// 0 disables the deadline
    pub write_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            web_root: PathBuf::from("www"),
            workers: 10,
            read_timeout_secs: 30,
            write_timeout_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

impl Config {
    /// Defaults, then the `--config` file if any, then positional arguments.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(port) = args.port {
            cfg.port = port;
        }
        if let Some(web_root) = &args.web_root {
            cfg.web_root = web_root.clone();
        }
        if let Some(workers) = args.thread_limit {
            cfg.workers = workers;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("thread limit must be at least 1");
        }
        if !self.web_root.is_dir() {
            anyhow::bail!("web root {} is not a directory", self.web_root.display());
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            read: secs(self.read_timeout_secs),
            write: secs(self.write_timeout_secs),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}
