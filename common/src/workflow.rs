//! GitHub Actions workflow environment mutation.
//!
//! Steps on a runner communicate with later steps through files named by the
//! `GITHUB_PATH`, `GITHUB_ENV`, and `GITHUB_OUTPUT` variables. The
//! [`Environment`] trait abstracts those writes so installers can be tested
//! without a runner; [`WorkflowEnvironment`] is the runner implementation and
//! also records every change in memory.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Variable naming the file that collects PATH additions.
pub const GITHUB_PATH: &str = "GITHUB_PATH";
/// Variable naming the file that collects exported variables.
pub const GITHUB_ENV: &str = "GITHUB_ENV";
/// Variable naming the file that collects step outputs.
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Errors raised while writing workflow files.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Appending to a workflow file failed.
    #[error("failed to write workflow file {path}: {source}")]
    Io {
        /// The workflow file being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A variable or output name cannot be encoded in a workflow file.
    #[error("invalid workflow name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

/// A single environment change requested by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowChange {
    /// A directory prepended to PATH.
    AddPath(Utf8PathBuf),
    /// An environment variable exported to later steps.
    ExportVariable {
        /// Variable name.
        name: String,
        /// Variable value.
        value: String,
    },
    /// A step output.
    SetOutput {
        /// Output name.
        name: String,
        /// Output value.
        value: String,
    },
}

/// Mutations a step may apply to the workflow environment.
pub trait Environment {
    /// Prepend `dir` to PATH for later steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow file cannot be written.
    fn add_path(&self, dir: &Utf8Path) -> Result<(), WorkflowError>;

    /// Export `name=value` to later steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be written.
    fn export_variable(&self, name: &str, value: &str) -> Result<(), WorkflowError>;

    /// Set the step output `name` to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be written.
    fn set_output(&self, name: &str, value: &str) -> Result<(), WorkflowError>;
}

/// Locations of the workflow command files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowFiles {
    /// File receiving PATH additions.
    pub path: Option<Utf8PathBuf>,
    /// File receiving exported variables.
    pub env: Option<Utf8PathBuf>,
    /// File receiving step outputs.
    pub output: Option<Utf8PathBuf>,
}

impl WorkflowFiles {
    /// Read the file locations from an environment lookup.
    ///
    /// Unset, empty, or non-UTF-8 values leave the location unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use common::workflow::WorkflowFiles;
    ///
    /// let files = WorkflowFiles::from_lookup(|key| {
    ///     (key == "GITHUB_PATH").then(|| "/tmp/path".to_owned())
    /// });
    /// assert_eq!(files.path.as_deref().map(|p| p.as_str()), Some("/tmp/path"));
    /// assert!(files.env.is_none());
    /// ```
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(Utf8PathBuf::from)
        };
        Self {
            path: read(GITHUB_PATH),
            env: read(GITHUB_ENV),
            output: read(GITHUB_OUTPUT),
        }
    }
}

/// Runner-backed [`Environment`] that appends to workflow files.
///
/// When a file location is unset the change is only logged and recorded,
/// which keeps local runs side-effect free.
#[derive(Debug, Default)]
pub struct WorkflowEnvironment {
    files: WorkflowFiles,
    changes: Mutex<Vec<WorkflowChange>>,
}

impl WorkflowEnvironment {
    /// Create an environment writing to the given files.
    #[must_use]
    pub fn new(files: WorkflowFiles) -> Self {
        Self {
            files,
            changes: Mutex::new(Vec::new()),
        }
    }

    /// Create an environment that writes nothing and only records changes.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Create an environment from the process environment variables.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::new(WorkflowFiles::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Return every change applied so far, in order.
    #[must_use]
    pub fn changes(&self) -> Vec<WorkflowChange> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the directories added to PATH, in order.
    #[must_use]
    pub fn path_entries(&self) -> Vec<Utf8PathBuf> {
        self.changes()
            .into_iter()
            .filter_map(|change| match change {
                WorkflowChange::AddPath(dir) => Some(dir),
                WorkflowChange::ExportVariable { .. } | WorkflowChange::SetOutput { .. } => None,
            })
            .collect()
    }

    fn record(&self, change: WorkflowChange) {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(change);
    }
}

impl Environment for WorkflowEnvironment {
    fn add_path(&self, dir: &Utf8Path) -> Result<(), WorkflowError> {
        match &self.files.path {
            Some(file) => append(file, &format!("{dir}\n"))?,
            None => info!("{GITHUB_PATH} is not set; add {dir} to PATH manually"),
        }
        debug!("Added {dir} to PATH");
        self.record(WorkflowChange::AddPath(dir.to_owned()));
        Ok(())
    }

    fn export_variable(&self, name: &str, value: &str) -> Result<(), WorkflowError> {
        validate_name(name)?;
        match &self.files.env {
            Some(file) => append(file, &key_value_command(name, value))?,
            None => info!("{GITHUB_ENV} is not set; export {name}={value} manually"),
        }
        self.record(WorkflowChange::ExportVariable {
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }

    fn set_output(&self, name: &str, value: &str) -> Result<(), WorkflowError> {
        validate_name(name)?;
        match &self.files.output {
            Some(file) => append(file, &key_value_command(name, value))?,
            None => info!("{GITHUB_OUTPUT} is not set; output {name}={value}"),
        }
        self.record(WorkflowChange::SetOutput {
            name: name.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), WorkflowError> {
    if name.is_empty() || name.contains(['=', '\n', '\r']) {
        return Err(WorkflowError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Encode `name=value` in the workflow file-command format.
///
/// Multi-line values use the heredoc form with a delimiter that does not
/// occur in the value.
///
/// # Examples
///
/// ```
/// use common::workflow::key_value_command;
///
/// assert_eq!(key_value_command("TOOLCHAINS", "swift 5.10"), "TOOLCHAINS=swift 5.10\n");
/// assert!(key_value_command("NOTES", "a\nb").starts_with("NOTES<<ghadelimiter_"));
/// ```
#[must_use]
pub fn key_value_command(name: &str, value: &str) -> String {
    if !value.contains(['\n', '\r']) {
        return format!("{name}={value}\n");
    }
    let mut delimiter = heredoc_delimiter();
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn heredoc_delimiter() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or_default();
    format!("ghadelimiter_{}_{nanos}", std::process::id())
}

fn append(file: &Utf8Path, contents: &str) -> Result<(), WorkflowError> {
    let to_error = |source| WorkflowError::Io {
        path: file.to_owned(),
        source,
    };
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(to_error)?;
    handle.write_all(contents.as_bytes()).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn files_in(dir: &Utf8Path) -> WorkflowFiles {
        WorkflowFiles {
            path: Some(dir.join("path")),
            env: Some(dir.join("env")),
            output: Some(dir.join("output")),
        }
    }

    fn temp_utf8_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, path)
    }

    #[test]
    fn add_path_appends_one_line_per_directory() {
        let (_temp, dir) = temp_utf8_dir();
        let environment = WorkflowEnvironment::new(files_in(&dir));

        environment
            .add_path(Utf8Path::new("/opt/swift/usr/bin"))
            .expect("first add");
        environment
            .add_path(Utf8Path::new("/opt/other/bin"))
            .expect("second add");

        let written = std::fs::read_to_string(dir.join("path")).expect("read path file");
        assert_eq!(written, "/opt/swift/usr/bin\n/opt/other/bin\n");
        assert_eq!(environment.path_entries().len(), 2);
    }

    #[test]
    fn export_variable_writes_key_value_line() {
        let (_temp, dir) = temp_utf8_dir();
        let environment = WorkflowEnvironment::new(files_in(&dir));

        environment
            .export_variable("TOOLCHAINS", "swift 6.0")
            .expect("export");

        let written = std::fs::read_to_string(dir.join("env")).expect("read env file");
        assert_eq!(written, "TOOLCHAINS=swift 6.0\n");
    }

    #[test]
    fn set_output_writes_output_file() {
        let (_temp, dir) = temp_utf8_dir();
        let environment = WorkflowEnvironment::new(files_in(&dir));

        environment.set_output("version", "5.10").expect("output");

        let written = std::fs::read_to_string(dir.join("output")).expect("read output file");
        assert_eq!(written, "version=5.10\n");
    }

    #[test]
    fn detached_environment_only_records() {
        let environment = WorkflowEnvironment::detached();
        environment
            .add_path(Utf8Path::new("/toolchain/usr/bin"))
            .expect("add");
        environment
            .export_variable("TOOLCHAINS", "swift 5.10")
            .expect("export");

        assert_eq!(
            environment.changes(),
            vec![
                WorkflowChange::AddPath(Utf8PathBuf::from("/toolchain/usr/bin")),
                WorkflowChange::ExportVariable {
                    name: "TOOLCHAINS".to_owned(),
                    value: "swift 5.10".to_owned(),
                },
            ]
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::equals("A=B")]
    #[case::newline("A\nB")]
    fn rejects_unencodable_names(#[case] name: &str) {
        let environment = WorkflowEnvironment::detached();
        let result = environment.export_variable(name, "value");
        assert!(matches!(result, Err(WorkflowError::InvalidName { .. })));
        assert!(environment.changes().is_empty());
    }

    #[test]
    fn multiline_values_use_heredoc_form() {
        let encoded = key_value_command("NOTES", "first\nsecond");
        let mut lines = encoded.lines();
        let header = lines.next().expect("header line");
        let delimiter = header.strip_prefix("NOTES<<").expect("heredoc header");
        assert_eq!(lines.next(), Some("first"));
        assert_eq!(lines.next(), Some("second"));
        assert_eq!(lines.next(), Some(delimiter));
    }

    #[test]
    fn empty_locations_are_ignored() {
        let files = WorkflowFiles::from_lookup(|_| Some("  ".to_owned()));
        assert_eq!(files, WorkflowFiles::default());
    }
}
