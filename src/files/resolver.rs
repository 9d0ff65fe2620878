//! Request target to file resolution
//!
//! Targets are joined under a canonical web root and the result is
//! canonicalized again, so `..` segments and symlinks that lead outside the
//! root resolve to `NotFound` instead of being served.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;

use crate::http::mime::ContentType;

/// Outcome of looking up a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A regular file, read fully into memory
    Found { body: Bytes, content_type: ContentType },
    /// Missing, not a regular file, outside the root, or unreadable
    NotFound,
}

/// Serves files from a single web root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    /// Canonical path of the web root
    root: PathBuf,
}

impl StaticFiles {
    /// Create a resolver for `web_root`, which must be an existing directory
    pub fn new(web_root: impl AsRef<Path>) -> Result<Self> {
        let web_root = web_root.as_ref();
        let root = std::fs::canonicalize(web_root)
            .with_context(|| format!("Cannot access web root {}", web_root.display()))?;

        if !root.is_dir() {
            anyhow::bail!("Web root {} is not a directory", web_root.display());
        }

        Ok(Self { root })
    }

    /// Canonical web root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a request target such as `/docs/index.html`
    pub async fn resolve(&self, target: &str) -> Resolved {
        let candidate = self.candidate(target);

        let canonical = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(path = %target, error = %e, "No such resource");
                return Resolved::NotFound;
            }
        };

        if !canonical.starts_with(&self.root) {
            tracing::warn!(
                path = %target,
                resolved = %canonical.display(),
                "Request target resolves outside the web root"
            );
            return Resolved::NotFound;
        }

        match tokio::fs::metadata(&canonical).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Resolved::NotFound,
        }

        match tokio::fs::read(&canonical).await {
            Ok(data) => Resolved::Found {
                body: Bytes::from(data),
                content_type: ContentType::from_path(&candidate),
            },
            Err(e) => {
                tracing::warn!(
                    file = %canonical.display(),
                    error = %e,
                    "Failed to read resource"
                );
                Resolved::NotFound
            }
        }
    }

    /// Filesystem path a target points at before any checks.
    ///
    /// Query strings and fragments are not part of the file name.
    fn candidate(&self, target: &str) -> PathBuf {
        let path = target
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');

        self.root.join(path)
    }
}
