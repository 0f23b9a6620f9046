//! Directory resolution abstraction for platform-specific paths.

use std::path::PathBuf;

/// Source of per-user base directories, replaceable in tests.
pub trait BaseDirs {
    /// The per-user cache directory, if the platform defines one.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    dirs: directories_next::BaseDirs,
}

impl SystemBaseDirs {
    /// Look up the base directories of the current user.
    ///
    /// Returns `None` when no home directory can be determined.
    #[must_use]
    pub fn new() -> Option<Self> {
        directories_next::BaseDirs::new().map(|dirs| Self { dirs })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        Some(self.dirs.cache_dir().to_path_buf())
    }
}

/// [`BaseDirs`] for environments without a home directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseDirs;

impl BaseDirs for NoBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        None
    }
}
