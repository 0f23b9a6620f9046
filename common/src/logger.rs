//! `log` backend rendering records as GitHub Actions workflow commands.
//!
//! Debug records become `::debug::` lines, warnings and errors become
//! `::warning::` and `::error::` annotations, and info records are printed
//! verbatim so they appear in the step log.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Logger writing workflow commands to standard output.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowLogger {
    level: LevelFilter,
}

impl WorkflowLogger {
    /// Create a logger accepting records up to `level`.
    #[must_use]
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for WorkflowLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record.level(), &record.args().to_string());
        let mut stdout = std::io::stdout().lock();
        if writeln!(stdout, "{line}").is_err() {
            // Nowhere left to report a broken stdout.
        }
    }

    fn flush(&self) {
        if std::io::stdout().flush().is_err() {
            // Best-effort.
        }
    }
}

/// Install [`WorkflowLogger`] as the global logger.
///
/// # Errors
///
/// Returns an error if a global logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(WorkflowLogger::new(level)))?;
    log::set_max_level(level);
    Ok(())
}

/// Choose the log level from CLI verbosity and the runner debug flag.
///
/// # Examples
///
/// ```
/// use common::logger::level_for;
/// use log::LevelFilter;
///
/// assert_eq!(level_for(0, false, false), LevelFilter::Info);
/// assert_eq!(level_for(1, false, false), LevelFilter::Debug);
/// assert_eq!(level_for(0, false, true), LevelFilter::Debug);
/// assert_eq!(level_for(0, true, true), LevelFilter::Warn);
/// ```
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool, runner_debug: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbosity {
        0 if runner_debug => LevelFilter::Debug,
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Render one record as a workflow command line.
///
/// # Examples
///
/// ```
/// use common::logger::format_record;
/// use log::Level;
///
/// assert_eq!(format_record(Level::Debug, "cache miss"), "::debug::cache miss");
/// assert_eq!(format_record(Level::Error, "50% done\n"), "::error::50%25 done%0A");
/// assert_eq!(format_record(Level::Info, "Swift installed"), "Swift installed");
/// ```
#[must_use]
pub fn format_record(level: Level, message: &str) -> String {
    match level {
        Level::Error => format!("::error::{}", escape_data(message)),
        Level::Warn => format!("::warning::{}", escape_data(message)),
        Level::Info => message.to_owned(),
        Level::Debug | Level::Trace => format!("::debug::{}", escape_data(message)),
    }
}

/// Escape a workflow command payload.
#[must_use]
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::warning(Level::Warn, "refresh failed", "::warning::refresh failed")]
    #[case::trace(Level::Trace, "page 2", "::debug::page 2")]
    #[case::carriage_return(Level::Debug, "a\r\nb", "::debug::a%0D%0Ab")]
    fn formats_records_as_workflow_commands(
        #[case] level: Level,
        #[case] message: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(format_record(level, message), expected);
    }

    #[test]
    fn info_records_are_not_escaped() {
        assert_eq!(format_record(Level::Info, "100%"), "100%");
    }

    #[rstest]
    #[case::double_verbose(2, false, false, LevelFilter::Trace)]
    #[case::quiet_wins(3, true, false, LevelFilter::Warn)]
    #[case::runner_debug_with_verbose(1, false, true, LevelFilter::Debug)]
    fn picks_level(
        #[case] verbosity: u8,
        #[case] quiet: bool,
        #[case] runner_debug: bool,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(level_for(verbosity, quiet, runner_debug), expected);
    }

    #[test]
    fn logger_respects_level() {
        let logger = WorkflowLogger::new(LevelFilter::Info);
        let debug = Metadata::builder().level(Level::Debug).build();
        let warn = Metadata::builder().level(Level::Warn).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&warn));
    }
}
