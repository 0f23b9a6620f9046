//! Per-platform toolchain installation.
//!
//! [`Installer::install`] drives every platform through the same sequence:
//!
//! 1. skip everything if the strategy reports the version already active;
//! 2. look the version up in the tool cache;
//! 3. on a miss, acquire keys, download, verify, and extract, then store the
//!    extracted tree in the cache;
//! 4. prepend `<toolchain>/usr/bin` to PATH and let the strategy activate it.
//!
//! The [`InstallStrategy`] implementations in [`linux`] and [`macos`] supply
//! the platform-specific steps. A failure before step 4 leaves the cache and
//! PATH untouched.

pub mod linux;
pub mod macos;

use crate::artefact::download::ArtefactDownloader;
use crate::artefact::extraction::ArchiveExtractor;
use crate::artefact::signature::SignatureVerifier;
use crate::command::CommandExecutor;
use crate::error::{Result, SetupError};
use crate::package::Package;
use crate::tool_cache::ToolCache;
use camino::{Utf8Path, Utf8PathBuf};
use common::{Environment, Os, Platform};

pub use linux::LinuxStrategy;
pub use macos::MacOsStrategy;

/// Files fetched for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    /// The toolchain archive.
    pub archive: Utf8PathBuf,
    /// Its detached signature, when the platform publishes one.
    pub signature: Option<Utf8PathBuf>,
}

/// Platform-specific steps of an installation.
pub trait InstallStrategy {
    /// Tool cache name, e.g. `swift-Ubuntu`.
    fn tool_name(&self) -> String;

    /// Whether `version` is already usable without installing anything.
    fn is_active(&self, _version: &str) -> bool {
        false
    }

    /// Prepare signature verification before any download.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing keys cannot be set up.
    fn acquire_keys(&self) -> Result<()> {
        Ok(())
    }

    /// Fetch the package into `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns a download error if any transfer fails.
    fn download(&self, package: &Package, work_dir: &Utf8Path) -> Result<Downloaded>;

    /// Check the downloaded files.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::SignatureMismatch`] if verification fails.
    fn verify(&self, _downloaded: &Downloaded) -> Result<()> {
        Ok(())
    }

    /// Unpack the download under `work_dir` and return the toolchain root,
    /// the directory containing `usr/bin`.
    ///
    /// # Errors
    ///
    /// Returns an extraction error if unpacking fails.
    fn extract(
        &self,
        package: &Package,
        downloaded: &Downloaded,
        work_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf>;

    /// Select the toolchain for later steps beyond adding it to PATH.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow environment cannot be updated.
    fn activate(&self, _version: &str, _env: &dyn Environment) -> Result<()> {
        Ok(())
    }
}

/// External services the strategies depend on.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// HTTP transfers.
    pub downloader: &'a (dyn ArtefactDownloader + Sync),
    /// Archive unpacking.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Signature verification.
    pub verifier: &'a dyn SignatureVerifier,
    /// External commands.
    pub executor: &'a dyn CommandExecutor,
}

/// Select the install strategy for `platform`.
///
/// # Errors
///
/// Returns [`SetupError::UnsupportedPlatform`] for Windows.
pub fn strategy_for<'a>(
    platform: &Platform,
    services: Services<'a>,
) -> Result<Box<dyn InstallStrategy + 'a>> {
    match platform.os() {
        Os::Ubuntu => Ok(Box::new(LinuxStrategy::new(platform.clone(), services))),
        Os::MacOs => Ok(Box::new(MacOsStrategy::new(platform.clone(), services))),
        Os::Windows => Err(SetupError::UnsupportedPlatform {
            platform: platform.to_string(),
        }),
    }
}

/// What an installation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installation {
    /// The requested toolchain was already selectable; nothing was installed.
    AlreadyActive,
    /// The toolchain was installed or taken from the cache and put on PATH.
    Installed {
        /// The cached toolchain root.
        root: Utf8PathBuf,
        /// The directory added to PATH.
        bin_dir: Utf8PathBuf,
        /// Whether the cache already held the toolchain.
        from_cache: bool,
    },
}

/// Drives an [`InstallStrategy`] against the tool cache and workflow
/// environment.
pub struct Installer<'a> {
    cache: &'a dyn ToolCache,
    env: &'a dyn Environment,
    temp_root: Utf8PathBuf,
}

impl<'a> Installer<'a> {
    /// Create an installer that unpacks under `temp_root`.
    pub fn new(
        cache: &'a dyn ToolCache,
        env: &'a dyn Environment,
        temp_root: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            cache,
            env,
            temp_root: temp_root.into(),
        }
    }

    /// Install `version`, calling `get_package` only on a cache miss.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step's error unchanged.
    pub fn install(
        &self,
        strategy: &dyn InstallStrategy,
        version: &str,
        get_package: impl FnOnce() -> Result<Package>,
    ) -> Result<Installation> {
        if strategy.is_active(version) {
            log::info!("Swift {version} is already active");
            strategy.activate(version, self.env)?;
            return Ok(Installation::AlreadyActive);
        }

        let tool = strategy.tool_name();
        let (root, from_cache) = match self.cache.find(&tool, version) {
            Some(root) => {
                log::debug!("Matching installation found");
                (root, true)
            }
            None => {
                log::debug!("No matching installation found");
                (self.fetch(strategy, &tool, version, get_package)?, false)
            }
        };

        log::debug!("Adding swift to path");
        let bin_dir = root.join("usr").join("bin");
        log::debug!("Swift binary path (exists={}): {bin_dir}", bin_dir.exists());
        self.env.add_path(&bin_dir)?;
        strategy.activate(version, self.env)?;
        log::info!("Swift {version} installed at {root}");

        Ok(Installation::Installed {
            root,
            bin_dir,
            from_cache,
        })
    }

    fn fetch(
        &self,
        strategy: &dyn InstallStrategy,
        tool: &str,
        version: &str,
        get_package: impl FnOnce() -> Result<Package>,
    ) -> Result<Utf8PathBuf> {
        strategy.acquire_keys()?;
        let package = get_package()?;

        std::fs::create_dir_all(&self.temp_root)?;
        let work = tempfile::Builder::new()
            .prefix("setup-swift-")
            .tempdir_in(&self.temp_root)?;
        let work_dir = crate::error::utf8_path(work.path().to_path_buf())?;

        let downloaded = strategy.download(&package, &work_dir)?;
        log::debug!("Swift download complete");
        strategy.verify(&downloaded)?;
        let extracted = strategy.extract(&package, &downloaded, &work_dir)?;
        log::debug!("Package extracted");
        let cached = self.cache.cache_dir(&extracted, tool, version)?;
        log::debug!("Package cached");
        Ok(cached)
    }
}

/// File name of the last URL segment, used as the local download name.
pub(crate) fn download_name(url: &str) -> &str {
    url.rsplit_once('/').map_or(url, |(_, name)| name)
}
