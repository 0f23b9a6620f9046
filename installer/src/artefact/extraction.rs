//! Archive extraction for toolchain artefacts.
//!
//! Linux tarballs are unpacked natively with `flate2` and `tar`, with path
//! traversal protection. macOS installer packages are expanded with `xar`
//! and their nested `Payload` with the system `tar`, which understands the
//! cpio payload format.

use crate::command::{CommandExecutor, SystemCommandExecutor, run_checked};
use camino::Utf8Path;
use flate2::read::GzDecoder;
use std::path::{Component, Path};

/// Trait for unpacking toolchain archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use setup_swift::artefact::extraction::SystemExtractor;
/// use setup_swift::command::SystemCommandExecutor;
///
/// let extractor = SystemExtractor::new(SystemCommandExecutor);
/// // Use extractor.extract_tar_gz(archive_path, dest_dir) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Unpack a gzip-compressed tarball into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape `dest`, [`ExtractionError::EmptyArchive`] if the archive has no
    /// entries, and [`ExtractionError::Io`] on I/O failures.
    fn extract_tar_gz(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError>;

    /// Expand a flat installer package (`.pkg`) into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Command`] if the expansion tool fails.
    fn expand_package(&self, package: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError>;

    /// Unpack an installer package `Payload` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Command`] if the unpacking tool fails.
    fn extract_payload(&self, payload: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no files")]
    EmptyArchive,

    /// An external extraction tool failed.
    #[error("extraction with {program} failed: {message}")]
    Command {
        /// The tool that was invoked.
        program: String,
        /// Description of the failure.
        message: String,
    },
}

/// Default extractor: native tar.gz handling plus system `xar` and `tar`.
#[derive(Debug, Clone, Default)]
pub struct SystemExtractor<E = SystemCommandExecutor> {
    executor: E,
}

impl<E: CommandExecutor> SystemExtractor<E> {
    /// Create an extractor running external tools through `executor`.
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    fn run_tool(&self, program: &str, args: &[&str]) -> Result<(), ExtractionError> {
        run_checked(&self.executor, program, args)
            .map(|_| ())
            .map_err(|err| ExtractionError::Command {
                program: program.to_owned(),
                message: err.to_string(),
            })
    }
}

impl<E: CommandExecutor> ArchiveExtractor for SystemExtractor<E> {
    fn extract_tar_gz(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        log::debug!("Extracting {archive} into {dest}");
        let file = std::fs::File::open(archive)?;
        let mut tarball = tar::Archive::new(GzDecoder::new(file));
        let mut entries = 0_usize;

        for entry_result in tarball.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();

            validate_entry_path(&entry_path)?;

            let dest_path = dest.as_std_path().join(&entry_path);
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            entry.unpack(&dest_path)?;
            entries += 1;
        }

        if entries == 0 {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(())
    }

    fn expand_package(&self, package: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        log::debug!("Expanding installer package {package}");
        std::fs::create_dir_all(dest)?;
        self.run_tool("xar", &["-x", "-C", dest.as_str(), "-f", package.as_str()])
    }

    fn extract_payload(&self, payload: &Utf8Path, dest: &Utf8Path) -> Result<(), ExtractionError> {
        log::debug!("Extracting payload {payload}");
        std::fs::create_dir_all(dest)?;
        self.run_tool("tar", &["-x", "-f", payload.as_str(), "-C", dest.as_str()])
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}
