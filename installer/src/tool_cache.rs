//! Durable toolchain cache keyed by tool name and version.
//!
//! The layout matches the GitHub Actions hosted tool cache:
//! `<root>/<tool>/<version>/<arch>` holds the tree and a sibling
//! `<arch>.complete` file marks it as fully written.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};

/// Lookup and storage of installed toolchains.
#[cfg_attr(test, mockall::automock)]
pub trait ToolCache {
    /// Return the cached directory for `(tool, version)`, if complete.
    fn find(&self, tool: &str, version: &str) -> Option<Utf8PathBuf>;

    /// Move `source` into the cache under `(tool, version)` and return the
    /// cached directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the tree cannot be moved or marked complete.
    fn cache_dir(&self, source: &Utf8Path, tool: &str, version: &str) -> Result<Utf8PathBuf>;
}

/// [`ToolCache`] rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirToolCache {
    root: Utf8PathBuf,
    arch: String,
}

impl DirToolCache {
    /// Create a cache under `root` for the current architecture.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self::with_arch(root, host_arch())
    }

    /// Create a cache under `root` for `arch`.
    pub fn with_arch(root: impl Into<Utf8PathBuf>, arch: &str) -> Self {
        Self {
            root: root.into(),
            arch: arch.to_owned(),
        }
    }

    fn entry(&self, tool: &str, version: &str) -> (Utf8PathBuf, Utf8PathBuf) {
        let version_dir = self.root.join(tool).join(version);
        let marker = version_dir.join(format!("{}.complete", self.arch));
        (version_dir.join(&self.arch), marker)
    }
}

impl ToolCache for DirToolCache {
    fn find(&self, tool: &str, version: &str) -> Option<Utf8PathBuf> {
        let (dir, marker) = self.entry(tool, version);
        if dir.is_dir() && marker.is_file() {
            log::debug!("Found {tool} {version} in tool cache at {dir}");
            Some(dir)
        } else {
            log::debug!("{tool} {version} not in tool cache");
            None
        }
    }

    fn cache_dir(&self, source: &Utf8Path, tool: &str, version: &str) -> Result<Utf8PathBuf> {
        let (dir, marker) = self.entry(tool, version);
        log::debug!("Caching {source} as {tool} {version}");

        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::rename(source, &dir).is_err() {
            copy_tree(source, &dir)?;
        }
        std::fs::write(&marker, b"")?;
        Ok(dir)
    }
}

/// Architecture directory name used by the hosted tool cache.
#[must_use]
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}

/// Recursively copy `source` to `dest`, recreating symlinks as symlinks.
fn copy_tree(source: &Utf8Path, dest: &Utf8Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in source.read_dir_utf8()? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if file_type.is_dir() {
            copy_tree(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Utf8Path, target: &Utf8Path) -> std::io::Result<()> {
    let points_to = std::fs::read_link(link)?;
    std::os::unix::fs::symlink(points_to, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Utf8Path, target: &Utf8Path) -> std::io::Result<()> {
    std::fs::copy(link, target).map(|_| ())
}
