//! Run configuration resolved once from CLI arguments and the environment.
//!
//! Every value has one precedence order: explicit argument, then the
//! runner environment, then a built-in default. Nothing below this module
//! reads the environment for configuration.

use crate::cli::Cli;
use crate::dirs::BaseDirs;
use crate::error::{Result, utf8_path};
use camino::Utf8PathBuf;
use common::Platform;
use std::fmt;

/// Environment variables consulted for the API token, highest priority first.
pub const TOKEN_VARS: [&str; 2] = ["API_GITHUB_ACCESS_TOKEN", "GH_TOKEN"];

/// Tool cache root provided by GitHub-hosted runners.
pub const TOOL_CACHE_VAR: &str = "RUNNER_TOOL_CACHE";

/// Scratch directory provided by GitHub-hosted runners.
pub const TEMP_VAR: &str = "RUNNER_TEMP";

/// A GitHub API token. Its `Debug` output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap `value`, treating an empty token as absent.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The raw token, for building request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// The raw version specifier.
    pub requested_version: String,
    /// The runner platform.
    pub platform: Platform,
    /// Token for the GitHub tag listing, if any.
    pub token: Option<ApiToken>,
    /// Root of the tool cache.
    pub tool_cache: Utf8PathBuf,
    /// Scratch directory for downloads and extraction.
    pub temp_dir: Utf8PathBuf,
}

impl Settings {
    /// Resolve settings from `cli`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SetupError::NonUtf8Path`] if a fallback
    /// directory is not valid UTF-8.
    pub fn resolve(
        cli: &Cli,
        lookup: impl Fn(&str) -> Option<String>,
        dirs: &dyn BaseDirs,
    ) -> Result<Self> {
        let lookup_set = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let token = cli
            .github_token
            .clone()
            .and_then(ApiToken::new)
            .or_else(|| {
                TOKEN_VARS
                    .into_iter()
                    .find_map(|name| lookup_set(name).and_then(ApiToken::new))
            });

        let tool_cache = match cli
            .tool_cache
            .clone()
            .or_else(|| lookup_set(TOOL_CACHE_VAR).map(Utf8PathBuf::from))
        {
            Some(dir) => dir,
            None => default_tool_cache(dirs)?,
        };

        let temp_dir = match cli
            .temp_dir
            .clone()
            .or_else(|| lookup_set(TEMP_VAR).map(Utf8PathBuf::from))
        {
            Some(dir) => dir,
            None => utf8_path(std::env::temp_dir())?,
        };

        Ok(Self {
            requested_version: cli.swift_version.clone(),
            platform: Platform::new(cli.os, cli.os_version.clone()),
            token,
            tool_cache,
            temp_dir,
        })
    }

    /// Resolve settings from `cli` and the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::resolve`].
    pub fn from_env(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Self> {
        Self::resolve(cli, |name| std::env::var(name).ok(), dirs)
    }
}

fn default_tool_cache(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    let base = dirs.cache_dir().unwrap_or_else(std::env::temp_dir);
    Ok(utf8_path(base)?.join("setup-swift").join("toolcache"))
}
