//! Shared test utilities for the installer crate.
//!
//! The stubs here record what they were asked to do so tests can assert
//! on side effects, e.g. that a cache hit performs zero downloads.

use crate::artefact::download::{ArtefactDownloader, DownloadError};
use crate::artefact::extraction::{ArchiveExtractor, ExtractionError};
use crate::artefact::signature::SignatureVerifier;
use crate::command::CommandExecutor;
use crate::error::{Result, SetupError};
use crate::snapshot::tags::{Tag, TagSource};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "gpg").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Describe an invocation of `cmd` with `args` answered by `result`.
    #[must_use]
    pub fn new(cmd: &str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.to_owned(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(SetupError::StubMismatch {
                message: format!("unexpected command invocation: {cmd} {}", args.join(" ")),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(SetupError::StubMismatch {
                message: format!(
                    "expected `{} {}`, got `{cmd} {}`",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        call.result
    }
}

/// Serves canned tag pages and records which pages were requested.
#[derive(Debug, Default)]
pub struct StubTagSource {
    pages: Vec<Vec<Tag>>,
    requested: Mutex<Vec<u32>>,
}

impl StubTagSource {
    /// Serve `pages` in order; page `n` (1-based) is `pages[n - 1]`.
    #[must_use]
    pub fn new(pages: Vec<Vec<Tag>>) -> Self {
        Self {
            pages,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Build pages from tag names.
    #[must_use]
    pub fn from_names(pages: &[&[&str]]) -> Self {
        Self::new(
            pages
                .iter()
                .map(|page| page.iter().map(|name| Tag::new(name)).collect())
                .collect(),
        )
    }

    /// Page numbers requested so far, in order.
    #[must_use]
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested
            .lock()
            .map(|pages| pages.clone())
            .unwrap_or_default()
    }
}

impl TagSource for StubTagSource {
    fn page(&self, number: u32, per_page: u32) -> std::result::Result<Vec<Tag>, DownloadError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(number);
        }
        let index = usize::try_from(number.saturating_sub(1)).unwrap_or(usize::MAX);
        let limit = usize::try_from(per_page).unwrap_or(usize::MAX);
        Ok(self
            .pages
            .get(index)
            .map(|page| page.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Writes fixed bytes for every download and records requested URLs.
#[derive(Debug, Default)]
pub struct StubDownloader {
    failing_url: Option<String>,
    urls: Mutex<Vec<String>>,
}

impl StubDownloader {
    /// A downloader whose every request succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A downloader that answers 404 for `url` and succeeds otherwise.
    #[must_use]
    pub fn failing_on(url: &str) -> Self {
        Self {
            failing_url: Some(url.to_owned()),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far, in order of arrival.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|urls| urls.clone()).unwrap_or_default()
    }

    /// Number of downloads performed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.urls().len()
    }
}

impl ArtefactDownloader for StubDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> std::result::Result<(), DownloadError> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_owned());
        }
        if self.failing_url.as_deref() == Some(url) {
            return Err(DownloadError::NotFound {
                url: url.to_owned(),
            });
        }
        std::fs::write(dest, url.as_bytes())?;
        Ok(())
    }
}

/// Materialises a fake toolchain tree instead of unpacking archives.
///
/// Tarball extraction creates `<dest>/<root>/usr/bin/swift`. Package
/// expansion creates an empty `<dest>/<payload>` file and payload
/// extraction creates `<dest>/usr/bin/swift`, or
/// `<dest>/<payload root>/usr/bin/swift` when a payload root is set.
#[derive(Debug)]
pub struct StubExtractor {
    root: String,
    payload: String,
    payload_root: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    /// Extract tarballs into `root` and packages with a payload at `payload`.
    #[must_use]
    pub fn new(root: &str, payload: &str) -> Self {
        Self {
            root: root.to_owned(),
            payload: payload.to_owned(),
            payload_root: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Nest the unpacked payload tree under `root`.
    #[must_use]
    pub fn with_payload_root(mut self, root: &str) -> Self {
        self.payload_root = Some(root.to_owned());
        self
    }

    /// Unpack nothing from payloads, leaving the toolchain tree absent.
    #[must_use]
    pub fn with_empty_payload(mut self) -> Self {
        self.payload_root = Some(String::new());
        self
    }

    /// Names of the extraction operations performed, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_owned());
        }
    }
}

fn write_fake_swift(bin_dir: &Utf8Path) -> std::io::Result<()> {
    std::fs::create_dir_all(bin_dir)?;
    std::fs::write(bin_dir.join("swift"), b"#!/bin/sh\n")
}

impl ArchiveExtractor for StubExtractor {
    fn extract_tar_gz(
        &self,
        _archive: &Utf8Path,
        dest: &Utf8Path,
    ) -> std::result::Result<(), ExtractionError> {
        self.record("extract_tar_gz");
        write_fake_swift(&dest.join(&self.root).join("usr").join("bin"))?;
        Ok(())
    }

    fn expand_package(
        &self,
        _package: &Utf8Path,
        dest: &Utf8Path,
    ) -> std::result::Result<(), ExtractionError> {
        self.record("expand_package");
        let payload = dest.join(&self.payload);
        if let Some(parent) = payload.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(payload, b"payload")?;
        Ok(())
    }

    fn extract_payload(
        &self,
        _payload: &Utf8Path,
        dest: &Utf8Path,
    ) -> std::result::Result<(), ExtractionError> {
        self.record("extract_payload");
        match self.payload_root.as_deref() {
            None => write_fake_swift(&dest.join("usr").join("bin"))?,
            Some("") => std::fs::create_dir_all(dest)?,
            Some(root) => write_fake_swift(&dest.join(root).join("usr").join("bin"))?,
        }
        Ok(())
    }
}

/// Verifier with a fixed verdict that records what it checked.
#[derive(Debug, Default)]
pub struct StubVerifier {
    reject: bool,
    key_setups: Mutex<usize>,
    verified: Mutex<Vec<(Utf8PathBuf, Utf8PathBuf)>>,
}

impl StubVerifier {
    /// A verifier that accepts every signature.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A verifier that rejects every signature.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Number of times keys were set up.
    #[must_use]
    pub fn key_setups(&self) -> usize {
        self.key_setups.lock().map(|count| *count).unwrap_or_default()
    }

    /// `(signature, artefact)` pairs passed to `verify`, in call order.
    #[must_use]
    pub fn verified(&self) -> Vec<(Utf8PathBuf, Utf8PathBuf)> {
        self.verified
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl SignatureVerifier for StubVerifier {
    fn setup_keys(&self) -> Result<()> {
        if let Ok(mut count) = self.key_setups.lock() {
            *count += 1;
        }
        Ok(())
    }

    fn verify(&self, signature: &Utf8Path, artefact: &Utf8Path) -> Result<()> {
        if let Ok(mut verified) = self.verified.lock() {
            verified.push((signature.to_owned(), artefact.to_owned()));
        }
        if self.reject {
            return Err(SetupError::SignatureMismatch {
                artefact: artefact.to_owned(),
                reason: "BAD signature from \"Swift Automatic Signing Key\"".to_owned(),
            });
        }
        Ok(())
    }
}
