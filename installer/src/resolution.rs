//! Version resolution.
//!
//! A requested specifier is first offered to the stable-release resolver and,
//! when that declines, to the snapshot resolver. The result tells the
//! installer which version to cache under and how to obtain the package.

use crate::error::{Result, SetupError};
use crate::package::Package;
use crate::snapshot::SnapshotResolver;
use common::Platform;

/// Maps published release versions to packages.
#[cfg_attr(test, mockall::automock)]
pub trait StableResolver {
    /// Return the concrete release version `requested` denotes on
    /// `platform`, or `None` when it is not a known release.
    ///
    /// This must not touch the network.
    fn version(&self, requested: &str, platform: &Platform) -> Option<String>;

    /// Build the package for a version previously returned by
    /// [`StableResolver::version`].
    ///
    /// # Errors
    ///
    /// Returns an error if no package exists for `version` on `platform`.
    fn package(&self, version: &str, platform: &Platform) -> Result<Package>;
}

/// A [`StableResolver`] that knows no releases, so every request falls
/// through to snapshot resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStableReleases;

impl StableResolver for NoStableReleases {
    fn version(&self, _requested: &str, _platform: &Platform) -> Option<String> {
        None
    }

    fn package(&self, version: &str, platform: &Platform) -> Result<Package> {
        Err(SetupError::NoPackage {
            requested: version.to_owned(),
            platform: platform.to_string(),
        })
    }
}

/// The outcome of resolving a version specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A stable release; the package is built only when needed.
    Stable {
        /// The concrete release version.
        version: String,
    },
    /// A development snapshot, already resolved to its package.
    Snapshot(Package),
}

impl Resolution {
    /// The version the toolchain is cached and activated under.
    #[must_use]
    pub fn version(&self) -> &str {
        match self {
            Self::Stable { version } => version,
            Self::Snapshot(package) => &package.version,
        }
    }

    /// Produce the package to download.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`StableResolver::package`].
    pub fn package(&self, stable: &dyn StableResolver, platform: &Platform) -> Result<Package> {
        match self {
            Self::Stable { version } => stable.package(version, platform),
            Self::Snapshot(package) => Ok(package.clone()),
        }
    }
}

/// Resolve `requested` on `platform`: stable releases first, then snapshots.
///
/// # Errors
///
/// Returns [`SetupError::NoPackage`] when neither resolver recognises the
/// specifier, and propagates transport and platform errors unchanged.
pub fn resolve(
    requested: &str,
    platform: &Platform,
    stable: &dyn StableResolver,
    snapshots: &SnapshotResolver<'_>,
) -> Result<Resolution> {
    if let Some(version) = stable.version(requested, platform) {
        log::debug!("{requested} is stable release {version}");
        return Ok(Resolution::Stable { version });
    }
    match snapshots.resolve(requested, platform)? {
        Some(package) => {
            log::debug!("{requested} resolved to snapshot {}", package.name);
            Ok(Resolution::Snapshot(package))
        }
        None => Err(SetupError::NoPackage {
            requested: requested.to_owned(),
            platform: platform.to_string(),
        }),
    }
}
