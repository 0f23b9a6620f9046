//! Download coordinates for toolchain builds.

use crate::error::{Result, SetupError};
use crate::snapshot::Snapshot;
use common::{Os, Platform};

/// Root of the swift.org build archive.
pub const BUILDS_URL: &str = "https://swift.org/builds/";

/// Toolchain version reported by snapshots of the main branch.
pub const MAIN_VERSION: &str = "6.0";

/// A downloadable toolchain build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Absolute HTTPS URL of the archive.
    pub url: String,
    /// Build identifier, also the top-level directory inside the archive.
    pub name: String,
    /// Version the installed toolchain is cached and activated under.
    pub version: String,
    /// Whether the build is a published release rather than a snapshot.
    pub is_stable_release: bool,
}

/// Build identifier of a snapshot, e.g. `swift-5.10-DEVELOPMENT-SNAPSHOT-2024-08-02-a`.
#[must_use]
pub fn snapshot_identifier(snapshot: &Snapshot) -> String {
    if snapshot.is_main() {
        format!("swift-DEVELOPMENT-SNAPSHOT-{}-a", snapshot.date)
    } else {
        format!(
            "swift-{}-DEVELOPMENT-SNAPSHOT-{}-a",
            snapshot.branch, snapshot.date
        )
    }
}

/// Construct the package for `snapshot` on `platform`.
///
/// # Errors
///
/// Returns [`SetupError::UnsupportedPlatform`] for platforms without
/// snapshot builds.
///
/// # Examples
///
/// ```
/// use common::{Os, Platform};
/// use setup_swift::package::package_for;
/// use setup_swift::snapshot::Snapshot;
///
/// let snapshot = Snapshot::new("5.10", "2024-08-02");
/// let package = package_for(&snapshot, &Platform::new(Os::Ubuntu, "22.04"))?;
/// assert_eq!(package.version, "5.10");
/// assert!(package.url.ends_with("-ubuntu22.04.tar.gz"));
/// # Ok::<(), setup_swift::error::SetupError>(())
/// ```
pub fn package_for(snapshot: &Snapshot, platform: &Platform) -> Result<Package> {
    let identifier = snapshot_identifier(snapshot);
    let (segment, archive) = match platform.os() {
        Os::MacOs => ("xcode".to_owned(), format!("{identifier}-osx.pkg")),
        Os::Ubuntu => (
            format!("ubuntu{}", platform.version_digits()),
            format!("{identifier}-ubuntu{}.tar.gz", platform.version()),
        ),
        Os::Windows => {
            return Err(SetupError::UnsupportedPlatform {
                platform: platform.to_string(),
            });
        }
    };
    let branch_dir = if snapshot.is_main() {
        "development".to_owned()
    } else {
        format!("swift-{}-branch", snapshot.branch)
    };
    let url = format!("{BUILDS_URL}{branch_dir}/{segment}/{identifier}/{archive}");
    log::debug!("Snapshot package URL: {url}");

    let version = if snapshot.is_main() {
        MAIN_VERSION.to_owned()
    } else {
        snapshot.branch.clone()
    };
    Ok(Package {
        url,
        name: identifier,
        version,
        is_stable_release: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn main_snapshot_on_macos() {
        let package = package_for(
            &Snapshot::new("main", "2024-08-01"),
            &Platform::new(Os::MacOs, "14"),
        )
        .expect("macOS is supported");

        assert_eq!(
            package,
            Package {
                url: "https://swift.org/builds/development/xcode/swift-DEVELOPMENT-SNAPSHOT-2024-08-01-a/swift-DEVELOPMENT-SNAPSHOT-2024-08-01-a-osx.pkg".to_owned(),
                name: "swift-DEVELOPMENT-SNAPSHOT-2024-08-01-a".to_owned(),
                version: "6.0".to_owned(),
                is_stable_release: false,
            }
        );
    }

    #[test]
    fn branch_snapshot_on_ubuntu() {
        let package = package_for(
            &Snapshot::new("5.10", "2024-08-02"),
            &Platform::new(Os::Ubuntu, "22.04"),
        )
        .expect("Ubuntu is supported");

        assert_eq!(
            package.url,
            "https://swift.org/builds/swift-5.10-branch/ubuntu2204/swift-5.10-DEVELOPMENT-SNAPSHOT-2024-08-02-a/swift-5.10-DEVELOPMENT-SNAPSHOT-2024-08-02-a-ubuntu22.04.tar.gz"
        );
        assert_eq!(package.name, "swift-5.10-DEVELOPMENT-SNAPSHOT-2024-08-02-a");
        assert_eq!(package.version, "5.10");
        assert!(!package.is_stable_release);
    }

    #[test]
    fn windows_has_no_snapshot_builds() {
        let err = package_for(
            &Snapshot::new("main", "2024-08-01"),
            &Platform::new(Os::Windows, "2022"),
        )
        .expect_err("Windows is unsupported");
        assert!(matches!(err, SetupError::UnsupportedPlatform { .. }));
    }

    #[rstest]
    #[case::macos(Os::MacOs, "14")]
    #[case::ubuntu(Os::Ubuntu, "20.04")]
    fn urls_are_absolute_https(#[case] os: Os, #[case] version: &str) {
        let package = package_for(&Snapshot::new("5.9", "2023-09-01"), &Platform::new(os, version))
            .expect("supported platform");
        assert!(package.url.starts_with(BUILDS_URL));
    }

    #[test]
    fn distinct_snapshots_have_distinct_identifiers() {
        let snapshots = [
            Snapshot::new("main", "2024-08-01"),
            Snapshot::new("main", "2024-08-02"),
            Snapshot::new("5.10", "2024-08-01"),
            Snapshot::new("5.1", "2024-08-01"),
            Snapshot::new("6.0", "2024-08-01"),
        ];
        let identifiers: HashSet<String> = snapshots.iter().map(snapshot_identifier).collect();
        assert_eq!(identifiers.len(), snapshots.len());
    }
}
