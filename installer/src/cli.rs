//! CLI argument definitions for setup-swift.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;
use common::Os;

/// Install a Swift toolchain on a CI runner.
#[derive(Parser, Debug, Clone)]
#[command(name = "setup-swift")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install a Swift toolchain on a CI runner.\n\n",
    "The requested version is resolved to a downloadable build, fetched from ",
    "swift.org, verified where signatures are published, stored in the runner ",
    "tool cache, and added to PATH for later workflow steps.\n\n",
    "Development snapshots are requested as <branch>-snapshot, which selects ",
    "the newest snapshot of the branch, or <branch>-snapshot-<date>.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Newest main-branch snapshot on Ubuntu 22.04:\n",
    "    $ setup-swift --swift-version main-snapshot --os ubuntu --os-version 22.04\n\n",
    "  A dated release-branch snapshot on macOS:\n",
    "    $ setup-swift --swift-version 5.10-snapshot-2024-03-13 --os macos --os-version 14\n\n",
    "ENVIRONMENT:\n",
    "  API_GITHUB_ACCESS_TOKEN, GH_TOKEN   token for the GitHub tag listing\n",
    "  RUNNER_TOOL_CACHE, RUNNER_TEMP      tool cache and scratch directories\n",
    "  GITHUB_PATH, GITHUB_ENV, GITHUB_OUTPUT  workflow command files\n",
    "  RUNNER_DEBUG                        enable debug logging when set to 1",
))]
pub struct Cli {
    /// Swift version or snapshot specifier to install.
    #[arg(long, value_name = "SPEC")]
    pub swift_version: String,

    /// Runner operating system.
    #[arg(long, value_name = "OS", value_parser = parse_os)]
    pub os: Os,

    /// Runner operating system version, e.g. 22.04.
    #[arg(long, value_name = "VERSION")]
    pub os_version: String,

    /// GitHub API token used for tag lookups [default: from environment].
    #[arg(long, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Tool cache root [default: RUNNER_TOOL_CACHE or platform cache dir].
    #[arg(long, value_name = "DIR")]
    pub tool_cache: Option<Utf8PathBuf>,

    /// Scratch directory for downloads [default: RUNNER_TEMP or system temp].
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

fn parse_os(value: &str) -> Result<Os, String> {
    value.parse::<Os>().map_err(|err| err.to_string())
}
