//! Messages the binary prints to the user.

use crate::toolchain::VersionCheck;
use std::io::Write;

/// Where failures should be reported.
pub const ISSUES_URL: &str = "https://github.com/swift-actions/setup-swift/issues";

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Render a fatal error together with its chain of causes.
///
/// # Examples
///
/// ```
/// use setup_swift::output::failure_message;
///
/// let err = std::io::Error::other("disk full");
/// let message = failure_message(&err);
/// assert!(message.starts_with("Unexpected error, unable to continue."));
/// assert!(message.contains("disk full"));
/// ```
#[must_use]
pub fn failure_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = format!(
        "Unexpected error, unable to continue. Please report at {ISSUES_URL}\n{err}"
    );
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    message
}

/// Describe the outcome of the post-install version check.
#[must_use]
pub fn version_check_message(check: &VersionCheck) -> String {
    match check {
        VersionCheck::Matches(version) => format!("Swift {version} is ready"),
        VersionCheck::Mismatch { requested, actual } => format!(
            "Failed to setup requested swift version. requested: {requested}, actual: {}",
            actual.as_deref().unwrap_or("unknown")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::download::DownloadError;
    use crate::error::SetupError;

    #[test]
    fn failure_message_includes_causes() {
        let err = SetupError::from(DownloadError::Io(std::io::Error::other("disk full")));
        let message = failure_message(&err);
        assert!(message.contains(ISSUES_URL));
        assert!(message.contains("I/O error writing download: disk full"));
        assert!(message.contains("caused by: disk full"));
    }

    #[test]
    fn mismatch_names_both_versions() {
        let message = version_check_message(&VersionCheck::Mismatch {
            requested: "6.0".to_owned(),
            actual: Some("5.10".to_owned()),
        });
        assert!(message.contains("requested: 6.0"));
        assert!(message.contains("actual: 5.10"));
    }

    #[test]
    fn mismatch_without_version_says_unknown() {
        let message = version_check_message(&VersionCheck::Mismatch {
            requested: "6.0".to_owned(),
            actual: None,
        });
        assert!(message.ends_with("actual: unknown"));
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut stderr = Vec::new();
        write_stderr_line(&mut stderr, "hello");
        assert_eq!(stderr, b"hello\n");
    }
}
