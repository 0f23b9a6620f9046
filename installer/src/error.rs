//! Error types for the setup-swift installer.
//!
//! Each layer owns a narrow error enum ([`DownloadError`],
//! [`ExtractionError`]); [`SetupError`] wraps them unchanged so failures
//! propagate to the binary without being reinterpreted.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use camino::Utf8PathBuf;
use common::WorkflowError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or installing a toolchain.
#[derive(Debug, Error)]
pub enum SetupError {
    /// No download layout exists for the requested platform.
    #[error("cannot create download URL for unsupported platform {platform}")]
    UnsupportedPlatform {
        /// The platform that was requested.
        platform: String,
    },

    /// Neither a stable release nor a snapshot matched the request.
    #[error("couldn't form a package for requested version {requested} on {platform}")]
    NoPackage {
        /// The raw version specifier.
        requested: String,
        /// The platform that was requested.
        platform: String,
    },

    /// A network transfer failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Unpacking an archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The signing keys could not be imported or refreshed.
    #[error("failed to set up signing keys: {reason}")]
    KeySetup {
        /// Description of the failure.
        reason: String,
    },

    /// The detached signature does not match the downloaded archive.
    #[error("signature verification failed for {artefact}: {reason}")]
    SignatureMismatch {
        /// The archive that failed verification.
        artefact: Utf8PathBuf,
        /// Output reported by the verifier.
        reason: String,
    },

    /// An external command could not be run or exited unsuccessfully.
    #[error("{program} failed: {message}")]
    Command {
        /// The program that was invoked.
        program: String,
        /// Description of the failure.
        message: String,
    },

    /// An unpacked archive lacks the expected toolchain contents.
    #[error("toolchain contents not found after unpacking; looked for {searched}")]
    MissingPayload {
        /// The paths that were tried.
        searched: String,
    },

    /// A filesystem path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// Writing a workflow file failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched call.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`SetupError`].
pub type Result<T> = std::result::Result<T, SetupError>;

/// Convert a std path into a UTF-8 path.
///
/// # Errors
///
/// Returns [`SetupError::NonUtf8Path`] if the path is not valid UTF-8.
pub fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| SetupError::NonUtf8Path { path })
}
