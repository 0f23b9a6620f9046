//! Ubuntu install strategy: signed tarballs.

use super::{Downloaded, InstallStrategy, Services, download_name};
use crate::error::{Result, SetupError};
use crate::package::Package;
use camino::{Utf8Path, Utf8PathBuf};
use common::Platform;

/// Installs tarball toolchains after checking their GPG signatures.
pub struct LinuxStrategy<'a> {
    platform: Platform,
    services: Services<'a>,
}

impl<'a> LinuxStrategy<'a> {
    /// Create the strategy for `platform`.
    #[must_use]
    pub const fn new(platform: Platform, services: Services<'a>) -> Self {
        Self { platform, services }
    }

    /// Directory inside the unpacked archive that holds the toolchain.
    fn toolchain_dir(&self, package: &Package) -> String {
        if package.is_stable_release {
            package.name.clone()
        } else {
            format!("{}-ubuntu{}", package.name, self.platform.version())
        }
    }
}

impl InstallStrategy for LinuxStrategy<'_> {
    fn tool_name(&self) -> String {
        format!("swift-{}", self.platform.name())
    }

    fn acquire_keys(&self) -> Result<()> {
        self.services.verifier.setup_keys()
    }

    fn download(&self, package: &Package, work_dir: &Utf8Path) -> Result<Downloaded> {
        log::debug!("Downloading swift for linux");
        let archive = work_dir.join(download_name(&package.url));
        let signature = Utf8PathBuf::from(format!("{archive}.sig"));
        let signature_url = format!("{}.sig", package.url);
        let downloader = self.services.downloader;

        let (archive_result, signature_result) = std::thread::scope(|scope| {
            let signature_job = scope.spawn(|| downloader.download(&signature_url, &signature));
            let archive_result = downloader.download(&package.url, &archive);
            let signature_result = signature_job
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (archive_result, signature_result)
        });
        archive_result?;
        signature_result?;

        Ok(Downloaded {
            archive,
            signature: Some(signature),
        })
    }

    fn verify(&self, downloaded: &Downloaded) -> Result<()> {
        let Some(signature) = &downloaded.signature else {
            return Err(SetupError::SignatureMismatch {
                artefact: downloaded.archive.clone(),
                reason: "no signature was downloaded".to_owned(),
            });
        };
        self.services.verifier.verify(signature, &downloaded.archive)
    }

    fn extract(
        &self,
        package: &Package,
        downloaded: &Downloaded,
        work_dir: &Utf8Path,
    ) -> Result<Utf8PathBuf> {
        log::debug!("Extracting package");
        let dest = work_dir.join("extract");
        self.services
            .extractor
            .extract_tar_gz(&downloaded.archive, &dest)?;

        let root = dest.join(self.toolchain_dir(package));
        if !root.is_dir() {
            return Err(SetupError::MissingPayload {
                searched: root.to_string(),
            });
        }
        Ok(root)
    }
}
