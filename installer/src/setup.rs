//! End-to-end setup: resolve, install, and confirm a toolchain.
//!
//! This module ties the resolvers, the install strategy for the runner
//! platform, and the post-install version check together. The binary
//! supplies the real services; tests supply stubs.

use crate::config::Settings;
use crate::error::Result;
use crate::install::{Installation, Installer, Services, strategy_for};
use crate::output::version_check_message;
use crate::resolution::{StableResolver, resolve};
use crate::snapshot::SnapshotResolver;
use crate::snapshot::tags::TagSource;
use crate::tool_cache::ToolCache;
use crate::toolchain::{SwiftProbe, VersionCheck};
use common::Environment;

/// Step output carrying the installed version.
pub const VERSION_OUTPUT: &str = "version";

/// Everything a setup run talks to.
pub struct SetupContext<'a> {
    /// Known stable releases.
    pub stable: &'a dyn StableResolver,
    /// Repository tags for snapshot lookup.
    pub tags: &'a dyn TagSource,
    /// Install strategy services.
    pub services: Services<'a>,
    /// Durable toolchain cache.
    pub cache: &'a dyn ToolCache,
    /// Workflow environment receiving PATH, variables, and outputs.
    pub env: &'a dyn Environment,
}

/// What a setup run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    /// The version installed or found active.
    pub version: String,
    /// How the toolchain was provided.
    pub installation: Installation,
    /// Whether the toolchain reports the expected version.
    pub check: VersionCheck,
}

/// Resolve and install the toolchain described by `settings`.
///
/// A version mismatch after installation is logged as an error but does not
/// fail the run.
///
/// # Errors
///
/// Returns the first resolution or installation error unchanged.
pub fn run_setup(settings: &Settings, context: &SetupContext<'_>) -> Result<SetupOutcome> {
    let platform = &settings.platform;
    log::info!(
        "Setting up Swift {} on {platform}",
        settings.requested_version
    );

    let strategy = strategy_for(platform, context.services)?;
    let snapshots = SnapshotResolver::new(context.tags);
    let resolution = resolve(
        &settings.requested_version,
        platform,
        context.stable,
        &snapshots,
    )?;
    let version = resolution.version().to_owned();

    let installer = Installer::new(context.cache, context.env, settings.temp_dir.clone());
    let installation = installer.install(strategy.as_ref(), &version, || {
        resolution.package(context.stable, platform)
    })?;

    let probe = SwiftProbe::new(context.services.executor);
    let actual = match &installation {
        Installation::AlreadyActive => probe.xcode_toolchain_version(&version),
        Installation::Installed { bin_dir, .. } => probe.installed_version(bin_dir),
    };
    let check = VersionCheck::compare(&version, actual);
    match &check {
        VersionCheck::Matches(installed) => {
            context.env.set_output(VERSION_OUTPUT, installed)?;
            log::info!("{}", version_check_message(&check));
        }
        VersionCheck::Mismatch { .. } => log::error!("{}", version_check_message(&check)),
    }

    Ok(SetupOutcome {
        version,
        installation,
        check,
    })
}
