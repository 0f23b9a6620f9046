//! Detached-signature verification for Linux toolchain archives.
//!
//! swift.org signs every Linux tarball. The signing keys are imported from
//! the published key bundle and refreshed from a keyserver before any
//! archive is checked.

use crate::artefact::download::ArtefactDownloader;
use crate::command::{CommandExecutor, run_checked, stderr_message};
use crate::error::{Result, SetupError};
use camino::{Utf8Path, Utf8PathBuf};

/// Published bundle of all swift.org signing keys.
pub const KEYS_URL: &str = "https://swift.org/keys/all-keys.asc";

/// Keyservers tried in order when refreshing the imported keys.
pub const KEYSERVERS: [&str; 3] = [
    "hkp://keyserver.ubuntu.com",
    "pgp.mit.edu",
    "keys.openpgp.org",
];

/// Checks artefacts against their detached signatures.
#[cfg_attr(test, mockall::automock)]
pub trait SignatureVerifier {
    /// Import and refresh the signing keys.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::KeySetup`] if the keys cannot be imported or no
    /// keyserver could refresh them.
    fn setup_keys(&self) -> Result<()>;

    /// Verify `artefact` against the detached `signature`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::SignatureMismatch`] if the signature does not
    /// match.
    fn verify(&self, signature: &Utf8Path, artefact: &Utf8Path) -> Result<()>;
}

/// [`SignatureVerifier`] backed by the system `gpg`.
pub struct GpgVerifier<'a, E: CommandExecutor> {
    executor: E,
    downloader: &'a (dyn ArtefactDownloader + Sync),
    work_dir: Utf8PathBuf,
}

impl<'a, E: CommandExecutor> GpgVerifier<'a, E> {
    /// Create a verifier that stores the key bundle under `work_dir`.
    pub fn new(
        executor: E,
        downloader: &'a (dyn ArtefactDownloader + Sync),
        work_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            executor,
            downloader,
            work_dir: work_dir.into(),
        }
    }

    fn import_keys(&self) -> Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        let bundle = self.work_dir.join("all-keys.asc");
        self.downloader
            .download(KEYS_URL, &bundle)
            .map_err(|err| SetupError::KeySetup {
                reason: err.to_string(),
            })?;
        run_checked(&self.executor, "gpg", &["--import", bundle.as_str()]).map_err(|err| {
            SetupError::KeySetup {
                reason: err.to_string(),
            }
        })?;
        Ok(())
    }

    fn refresh_keys(&self) -> Result<()> {
        let mut failures = Vec::new();
        for server in KEYSERVERS {
            match run_checked(
                &self.executor,
                "gpg",
                &["--keyserver", server, "--refresh-keys", "Swift"],
            ) {
                Ok(_) => {
                    log::debug!("Refreshed signing keys from {server}");
                    return Ok(());
                }
                Err(err) => {
                    log::warn!("Refreshing keys from {server} failed: {err}");
                    failures.push(server);
                }
            }
        }
        Err(SetupError::KeySetup {
            reason: format!("no keyserver could refresh the keys (tried {})", failures.join(", ")),
        })
    }
}

impl<E: CommandExecutor> SignatureVerifier for GpgVerifier<'_, E> {
    fn setup_keys(&self) -> Result<()> {
        log::debug!("Fetching verification keys");
        self.import_keys()?;
        self.refresh_keys()
    }

    fn verify(&self, signature: &Utf8Path, artefact: &Utf8Path) -> Result<()> {
        log::debug!("Verifying {artefact}");
        let output = self.executor.run(
            "gpg",
            &["--verify", "--quiet", signature.as_str(), artefact.as_str()],
        )?;
        if output.status.success() {
            return Ok(());
        }
        Err(SetupError::SignatureMismatch {
            artefact: artefact.to_owned(),
            reason: stderr_message(&output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        ExpectedCall, StubDownloader, StubExecutor, failure_output, success_output,
    };

    fn refresh(server: &str, output: std::process::Output) -> ExpectedCall {
        ExpectedCall::new(
            "gpg",
            &["--keyserver", server, "--refresh-keys", "Swift"],
            Ok(output),
        )
    }

    fn work_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    #[test]
    fn setup_keys_imports_bundle_then_refreshes() {
        let (_temp, dir) = work_dir();
        let bundle = dir.join("all-keys.asc");
        let downloader = StubDownloader::new();
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("gpg", &["--import", bundle.as_str()], Ok(success_output())),
            refresh(KEYSERVERS[0], success_output()),
        ]);
        let verifier = GpgVerifier::new(executor, &downloader, dir.clone());

        verifier.setup_keys().expect("keys set up");

        assert_eq!(downloader.urls(), vec![KEYS_URL.to_owned()]);
        verifier.executor.assert_finished();
    }

    #[test]
    fn setup_keys_falls_through_failing_keyservers() {
        let (_temp, dir) = work_dir();
        let bundle = dir.join("all-keys.asc");
        let downloader = StubDownloader::new();
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("gpg", &["--import", bundle.as_str()], Ok(success_output())),
            refresh(KEYSERVERS[0], failure_output("keyserver receive failed")),
            refresh(KEYSERVERS[1], failure_output("keyserver receive failed")),
            refresh(KEYSERVERS[2], success_output()),
        ]);
        let verifier = GpgVerifier::new(executor, &downloader, dir.clone());

        verifier.setup_keys().expect("third keyserver succeeds");
        verifier.executor.assert_finished();
    }

    #[test]
    fn setup_keys_fails_when_every_keyserver_fails() {
        let (_temp, dir) = work_dir();
        let bundle = dir.join("all-keys.asc");
        let downloader = StubDownloader::new();
        let mut calls = vec![ExpectedCall::new(
            "gpg",
            &["--import", bundle.as_str()],
            Ok(success_output()),
        )];
        calls.extend(KEYSERVERS.iter().map(|server| refresh(server, failure_output("timeout"))));
        let verifier = GpgVerifier::new(StubExecutor::new(calls), &downloader, dir.clone());

        let err = verifier.setup_keys().expect_err("all keyservers fail");
        assert!(matches!(err, SetupError::KeySetup { .. }));
        assert!(err.to_string().contains("keys.openpgp.org"));
    }

    #[test]
    fn setup_keys_fails_when_bundle_is_missing() {
        let (_temp, dir) = work_dir();
        let downloader = StubDownloader::failing_on(KEYS_URL);
        let verifier = GpgVerifier::new(StubExecutor::new(Vec::new()), &downloader, dir.clone());

        let err = verifier.setup_keys().expect_err("bundle download fails");
        assert!(matches!(err, SetupError::KeySetup { .. }));
    }

    #[test]
    fn verify_reports_bad_signature() {
        let (_temp, dir) = work_dir();
        let downloader = StubDownloader::new();
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "gpg",
            &["--verify", "--quiet", "/tmp/swift.tar.gz.sig", "/tmp/swift.tar.gz"],
            Ok(failure_output("gpg: BAD signature from \"Swift 5.x Release Signing Key\"")),
        )]);
        let verifier = GpgVerifier::new(executor, &downloader, dir.clone());

        let err = verifier
            .verify(
                Utf8Path::new("/tmp/swift.tar.gz.sig"),
                Utf8Path::new("/tmp/swift.tar.gz"),
            )
            .expect_err("signature rejected");
        assert!(
            matches!(err, SetupError::SignatureMismatch { ref reason, .. } if reason.contains("BAD signature"))
        );
    }

    #[test]
    fn verify_accepts_good_signature() {
        let (_temp, dir) = work_dir();
        let downloader = StubDownloader::new();
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "gpg",
            &["--verify", "--quiet", "/tmp/a.sig", "/tmp/a"],
            Ok(success_output()),
        )]);
        let verifier = GpgVerifier::new(executor, &downloader, dir.clone());

        verifier
            .verify(Utf8Path::new("/tmp/a.sig"), Utf8Path::new("/tmp/a"))
            .expect("signature accepted");
    }
}
