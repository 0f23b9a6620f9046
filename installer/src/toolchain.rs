//! Installed toolchain probing.
//!
//! Reads the version a `swift` binary reports so the installer can skip
//! toolchains that are already selectable and confirm what it installed.

use crate::command::CommandExecutor;
use camino::Utf8Path;
use once_cell::sync::Lazy;
use regex::Regex;

static SWIFT_VERSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"Swift version (\d+\.\d+(?:\.\d+)?)").ok());

/// Extract `X.Y[.Z]` from `swift --version` output.
///
/// # Examples
///
/// ```
/// use setup_swift::toolchain::parse_swift_version;
///
/// let output = "Apple Swift version 5.10 (swiftlang-5.10.0.13 clang-1500.3.9.4)";
/// assert_eq!(parse_swift_version(output).as_deref(), Some("5.10"));
/// assert_eq!(parse_swift_version("swift: command not found"), None);
/// ```
#[must_use]
pub fn parse_swift_version(output: &str) -> Option<String> {
    let captures = SWIFT_VERSION.as_ref()?.captures(output)?;
    captures.get(1).map(|version| version.as_str().to_owned())
}

/// Name under which `xcrun` knows the toolchain for `version`.
#[must_use]
pub fn toolchain_name(version: &str) -> String {
    format!("swift {version}")
}

/// Runs `swift --version` in its various forms.
pub struct SwiftProbe<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> SwiftProbe<'a> {
    /// Create a probe running commands through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Version of the `swift` binary in `bin_dir`.
    #[must_use]
    pub fn installed_version(&self, bin_dir: &Utf8Path) -> Option<String> {
        let swift = bin_dir.join("swift");
        self.version_of(swift.as_str(), &["--version"])
    }

    /// Version of the toolchain `xcrun` selects for `version`, if installed.
    #[must_use]
    pub fn xcode_toolchain_version(&self, version: &str) -> Option<String> {
        let name = toolchain_name(version);
        self.version_of(
            "xcrun",
            &["--toolchain", name.as_str(), "--run", "swift", "--version"],
        )
    }

    fn version_of(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.executor.run(program, args) {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                parse_swift_version(&stdout).or_else(|| parse_swift_version(&stderr))
            }
            Ok(output) => {
                log::debug!("{program} exited with {}", output.status);
                None
            }
            Err(err) => {
                log::debug!("{err}");
                None
            }
        }
    }
}

/// Result of comparing the requested version with the installed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// The toolchain reports the requested version.
    Matches(String),
    /// The toolchain reports another version, or none at all.
    Mismatch {
        /// Version that was requested.
        requested: String,
        /// Version the toolchain reported.
        actual: Option<String>,
    },
}

impl VersionCheck {
    /// Compare `requested` with the `actual` reported version.
    #[must_use]
    pub fn compare(requested: &str, actual: Option<String>) -> Self {
        match actual {
            Some(actual) if actual == requested => Self::Matches(actual),
            actual => Self::Mismatch {
                requested: requested.to_owned(),
                actual,
            },
        }
    }
}
