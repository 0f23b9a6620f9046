//! macOS install strategy: Xcode toolchain packages.
//!
//! The `.pkg` download is a flat installer package. Its nested component
//! package holds a `Payload` archive with the toolchain tree. Releases and
//! snapshots have used two component names over time, so the candidates are
//! tried in order against what the expansion actually produced.

use super::{Downloaded, InstallStrategy, Services, download_name};
use crate::error::{Result, SetupError};
use crate::package::Package;
use crate::toolchain::{SwiftProbe, toolchain_name};
use camino::{Utf8Path, Utf8PathBuf};
use common::{Environment, Platform};

/// Variable `xcrun` reads to select the active toolchain.
pub const TOOLCHAINS_VAR: &str = "TOOLCHAINS";

/// Installs `.pkg` toolchains and selects them through `TOOLCHAINS`.
pub struct MacOsStrategy<'a> {
    platform: Platform,
    services: Services<'a>,
}

impl<'a> MacOsStrategy<'a> {
    /// Create the strategy for `platform`.
    #[must_use]
    pub const fn new(platform: Platform, services: Services<'a>) -> Self {
        Self { platform, services }
    }
}

/// Candidate `Payload` locations inside an expanded package, in probe order.
#[must_use]
pub fn payload_candidates(package: &Package) -> [String; 2] {
    let plain = format!("{}-package.pkg/Payload", package.name);
    let osx = format!("{}-osx-package.pkg/Payload", package.name);
    if package.is_stable_release {
        [plain, osx]
    } else {
        [osx, plain]
    }
}

impl InstallStrategy for MacOsStrategy<'_> {
    fn tool_name(&self) -> String {
        format!("swift-{}", self.platform.name())
    }

    fn is_active(&self, version: &str) -> bool {
        let active = SwiftProbe::new(self.services.executor).xcode_toolchain_version(version);
        log::debug!("Toolchain {} reports {active:?}", toolchain_name(version));
        active.as_deref() == Some(version)
    }

    fn download(&self, package: &Package, work_dir: &Utf8Path) -> Result<Downloaded> {
        log::debug!("Downloading swift for macOS");
        let archive = work_dir.join(download_name(&package.url));
        self.services.downloader.download(&package.url, &archive)?;
        Ok(Downloaded {
            archive,
            signature: None,
        })
    }

    fn extract(
        &self,
        package: &Package,
        downloaded: &Downloaded,
        work_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf> {
        log::debug!("Extracting package at {}", downloaded.archive);
        let expanded = work_dir.join("expanded");
        self.services
            .extractor
            .expand_package(&downloaded.archive, &expanded)?;

        let candidates = payload_candidates(package);
        let Some(payload) = candidates
            .iter()
            .map(|candidate| expanded.join(candidate))
            .find(|path| path.is_file())
        else {
            return Err(SetupError::MissingPayload {
                searched: candidates.join(", "),
            });
        };

        let dest = work_dir.join("payload");
        self.services.extractor.extract_payload(&payload, &dest)?;

        let osx_root = dest.join(format!("{}-osx", package.name));
        let root = if osx_root.is_dir() { osx_root } else { dest };
        let bin_dir = root.join("usr").join("bin");
        if !bin_dir.is_dir() {
            return Err(SetupError::MissingPayload {
                searched: bin_dir.to_string(),
            });
        }
        Ok(root)
    }

    fn activate(&self, version: &str, env: &dyn Environment) -> Result<()> {
        env.export_variable(TOOLCHAINS_VAR, &toolchain_name(version))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{Installation, Installer};
    use crate::test_utils::{
        ExpectedCall, StubDownloader, StubExecutor, StubExtractor, StubVerifier, failure_output,
        stdout_output,
    };
    use crate::tool_cache::MockToolCache;
    use common::{Os, WorkflowChange, WorkflowEnvironment};

    const NAME: &str = "swift-DEVELOPMENT-SNAPSHOT-2024-08-01-a";

    fn temp_utf8_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    fn snapshot_package() -> Package {
        Package {
            url: format!("https://swift.org/builds/development/xcode/{NAME}/{NAME}-osx.pkg"),
            name: NAME.to_owned(),
            version: "6.0".to_owned(),
            is_stable_release: false,
        }
    }

    fn xcrun_probe(output: std::process::Output) -> ExpectedCall {
        ExpectedCall::new(
            "xcrun",
            &["--toolchain", "swift 6.0", "--run", "swift", "--version"],
            Ok(output),
        )
    }

    #[test]
    fn snapshots_prefer_osx_component() {
        let candidates = payload_candidates(&snapshot_package());
        assert_eq!(candidates[0], format!("{NAME}-osx-package.pkg/Payload"));
        assert_eq!(candidates[1], format!("{NAME}-package.pkg/Payload"));
    }

    #[test]
    fn stable_releases_prefer_plain_component() {
        let package = Package {
            is_stable_release: true,
            ..snapshot_package()
        };
        assert_eq!(payload_candidates(&package)[0], format!("{NAME}-package.pkg/Payload"));
    }

    #[test]
    fn extract_uses_whichever_payload_exists() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", &format!("{NAME}-package.pkg/Payload"));
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(Vec::new());
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let downloaded = Downloaded {
            archive: dir.join(format!("{NAME}-osx.pkg")),
            signature: None,
        };

        let root = strategy
            .extract(&snapshot_package(), &downloaded, &dir)
            .expect("extracts");

        assert_eq!(root, dir.join("payload"));
        assert!(root.join("usr/bin/swift").is_file());
        assert_eq!(
            extractor.calls(),
            vec!["expand_package".to_owned(), "extract_payload".to_owned()]
        );
    }

    #[test]
    fn extract_prefers_osx_root_when_present() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", &format!("{NAME}-osx-package.pkg/Payload"))
            .with_payload_root(&format!("{NAME}-osx"));
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(Vec::new());
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let downloaded = Downloaded {
            archive: dir.join(format!("{NAME}-osx.pkg")),
            signature: None,
        };

        let root = strategy
            .extract(&snapshot_package(), &downloaded, &dir)
            .expect("extracts");

        assert_eq!(root, dir.join("payload").join(format!("{NAME}-osx")));
        assert!(root.join("usr/bin/swift").is_file());
    }

    #[test]
    fn payload_without_toolchain_tree_is_rejected() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", &format!("{NAME}-osx-package.pkg/Payload"))
            .with_empty_payload();
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(Vec::new());
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let downloaded = Downloaded {
            archive: dir.join(format!("{NAME}-osx.pkg")),
            signature: None,
        };

        let err = strategy
            .extract(&snapshot_package(), &downloaded, &dir)
            .expect_err("no toolchain tree");

        let SetupError::MissingPayload { searched } = err else {
            panic!("expected MissingPayload, got {err:?}");
        };
        assert_eq!(searched, dir.join("payload/usr/bin").to_string());
    }

    #[test]
    fn missing_payload_lists_candidates() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", "Distribution");
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(Vec::new());
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let downloaded = Downloaded {
            archive: dir.join("a.pkg"),
            signature: None,
        };

        let err = strategy
            .extract(&snapshot_package(), &downloaded, &dir)
            .expect_err("no payload");
        assert!(err.to_string().contains("-osx-package.pkg/Payload"));
    }

    #[test]
    fn active_toolchain_skips_install_but_is_selected() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", "unused");
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(vec![xcrun_probe(stdout_output(
            "Apple Swift version 6.0 (swiftlang-6.0.0.1 clang-1600.0.1)\n",
        ))]);
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let mut cache = MockToolCache::new();
        cache.expect_find().never();
        cache.expect_cache_dir().never();
        let env = WorkflowEnvironment::detached();

        let installation = Installer::new(&cache, &env, dir)
            .install(&strategy, "6.0", || Ok(snapshot_package()))
            .expect("already active");

        assert_eq!(installation, Installation::AlreadyActive);
        assert_eq!(downloader.count(), 0);
        assert_eq!(
            env.changes(),
            vec![WorkflowChange::ExportVariable {
                name: TOOLCHAINS_VAR.to_owned(),
                value: "swift 6.0".to_owned(),
            }]
        );
    }

    #[test]
    fn inactive_toolchain_is_installed_then_selected() {
        let (_temp, dir) = temp_utf8_dir();
        let downloader = StubDownloader::new();
        let extractor = StubExtractor::new("unused", &format!("{NAME}-osx-package.pkg/Payload"))
            .with_payload_root(&format!("{NAME}-osx"));
        let verifier = StubVerifier::accepting();
        let executor = StubExecutor::new(vec![xcrun_probe(failure_output(
            "xcrun: error: unable to find utility \"swift\"",
        ))]);
        let strategy = MacOsStrategy::new(
            Platform::new(Os::MacOs, "14"),
            Services {
                downloader: &downloader,
                extractor: &extractor,
                verifier: &verifier,
                executor: &executor,
            },
        );
        let cached = dir.join("cache/swift-macOS/6.0/arm64");
        let mut cache = MockToolCache::new();
        cache.expect_find().returning(|_, _| None);
        let stored = cached.clone();
        cache
            .expect_cache_dir()
            .withf(|source, tool, version| {
                source.as_str().ends_with(&format!("payload/{NAME}-osx"))
                    && tool == "swift-macOS"
                    && version == "6.0"
            })
            .times(1)
            .returning(move |_, _, _| Ok(stored.clone()));
        let env = WorkflowEnvironment::detached();

        let installation = Installer::new(&cache, &env, dir.join("tmp"))
            .install(&strategy, "6.0", || Ok(snapshot_package()))
            .expect("installs");

        assert!(matches!(installation, Installation::Installed { from_cache: false, .. }));
        assert_eq!(downloader.urls(), vec![snapshot_package().url]);
        assert_eq!(verifier.key_setups(), 0);
        assert_eq!(env.path_entries(), vec![cached.join("usr/bin")]);
        assert!(env.changes().contains(&WorkflowChange::ExportVariable {
            name: TOOLCHAINS_VAR.to_owned(),
            value: "swift 6.0".to_owned(),
        }));
    }
}
