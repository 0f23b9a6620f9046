//! Development snapshot resolution.
//!
//! A version specifier such as `5.7-snapshot-2022-08-30` names a snapshot
//! directly. One without a date, such as `5.7-snapshot`, names the newest
//! snapshot of that branch, which is located by scanning the repository tag
//! list page by page.

pub mod tags;

use crate::error::Result;
use crate::package::{Package, package_for};
use common::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use tags::{Tag, TagSource};

/// Branch name used by snapshots cut from the main development line.
pub const MAIN_BRANCH: &str = "main";

/// Number of tags requested per page.
pub const PAGE_SIZE: u32 = 100;

static SNAPSHOT_TAG: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"swift(?:-(\d+)\.(\d+))?-DEVELOPMENT-SNAPSHOT-(\d{4}-\d{2}-\d{2})").ok()
});

/// A development snapshot build: the branch it was cut from and its date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    /// `main` or a `<major>.<minor>` release branch.
    pub branch: String,
    /// Build date, `YYYY-MM-DD` for snapshots found by tag lookup.
    pub date: String,
}

impl Snapshot {
    /// Create a snapshot for `branch` built on `date`.
    #[must_use]
    pub fn new(branch: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            date: date.into(),
        }
    }

    /// Whether the snapshot was cut from the main development line.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.branch == MAIN_BRANCH
    }
}

/// What a raw version specifier asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRequest {
    /// The specifier contains no `-` and is not a snapshot request.
    NotSnapshot,
    /// The newest snapshot of the branch, found by tag lookup.
    Latest {
        /// Branch to look up.
        branch: String,
    },
    /// A fully specified snapshot.
    Exact(Snapshot),
}

impl SnapshotRequest {
    /// Split a specifier of the form `<branch>-<keyword>[-<date>]`.
    ///
    /// The branch is everything before the first `-`. When a second `-`
    /// follows, everything after it is the date, taken verbatim. The keyword
    /// between the two is not checked.
    ///
    /// # Examples
    ///
    /// ```
    /// use setup_swift::snapshot::{Snapshot, SnapshotRequest};
    ///
    /// assert_eq!(
    ///     SnapshotRequest::parse("5.7-snapshot-2022-08-30"),
    ///     SnapshotRequest::Exact(Snapshot::new("5.7", "2022-08-30")),
    /// );
    /// assert_eq!(
    ///     SnapshotRequest::parse("main-snapshot"),
    ///     SnapshotRequest::Latest { branch: "main".to_owned() },
    /// );
    /// assert_eq!(SnapshotRequest::parse("5.10"), SnapshotRequest::NotSnapshot);
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let Some((branch, rest)) = spec.split_once('-') else {
            return Self::NotSnapshot;
        };
        match rest.split_once('-') {
            Some((_keyword, date)) => Self::Exact(Snapshot::new(branch, date)),
            None => Self::Latest {
                branch: branch.to_owned(),
            },
        }
    }
}

/// Parse a snapshot tag name into its branch and date.
///
/// Tags of the form `swift-<major>.<minor>-DEVELOPMENT-SNAPSHOT-<date>` belong
/// to the `<major>.<minor>` branch; `swift-DEVELOPMENT-SNAPSHOT-<date>`
/// belongs to `main`. Anything else yields `None`.
#[must_use]
pub fn parse_tag(tag: &Tag) -> Option<Snapshot> {
    let captures = SNAPSHOT_TAG.as_ref()?.captures(&tag.name)?;
    let date = captures.get(3)?.as_str();
    let branch = match (captures.get(1), captures.get(2)) {
        (Some(major), Some(minor)) => format!("{}.{}", major.as_str(), minor.as_str()),
        _ => MAIN_BRANCH.to_owned(),
    };
    Some(Snapshot::new(branch, date))
}

/// Resolves version specifiers to snapshots and snapshot packages.
pub struct SnapshotResolver<'a> {
    tags: &'a dyn TagSource,
}

impl<'a> SnapshotResolver<'a> {
    /// Create a resolver that looks up undated snapshots in `tags`.
    #[must_use]
    pub fn new(tags: &'a dyn TagSource) -> Self {
        Self { tags }
    }

    /// Resolve `spec` to a snapshot, consulting the tag list only when the
    /// specifier carries no date.
    ///
    /// # Errors
    ///
    /// Returns a download error if a tag page cannot be fetched.
    pub fn snapshot(&self, spec: &str) -> Result<Option<Snapshot>> {
        match SnapshotRequest::parse(spec) {
            SnapshotRequest::NotSnapshot => Ok(None),
            SnapshotRequest::Exact(snapshot) => Ok(Some(snapshot)),
            SnapshotRequest::Latest { branch } => self.latest(&branch),
        }
    }

    /// Find the first snapshot tag of `branch` in tag-list order.
    ///
    /// Pages are read sequentially until a match, or until a page shorter
    /// than [`PAGE_SIZE`] shows the list is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a download error if a tag page cannot be fetched.
    pub fn latest(&self, branch: &str) -> Result<Option<Snapshot>> {
        if branch.is_empty() {
            return Ok(None);
        }
        let mut number = 1_u32;
        loop {
            let page = self.tags.page(number, PAGE_SIZE)?;
            if let Some(snapshot) = page
                .iter()
                .filter_map(parse_tag)
                .find(|snapshot| snapshot.branch == branch)
            {
                log::debug!("Found snapshot {} on tags page {number}", snapshot.date);
                return Ok(Some(snapshot));
            }
            if page.len() < PAGE_SIZE as usize {
                log::debug!("No {branch} snapshot after {number} tag pages");
                return Ok(None);
            }
            number = number.saturating_add(1);
        }
    }

    /// Resolve `spec` all the way to a downloadable package for `platform`.
    ///
    /// # Errors
    ///
    /// Returns a download error if a tag page cannot be fetched and
    /// `UnsupportedPlatform` if `platform` has no snapshot builds.
    pub fn resolve(&self, spec: &str, platform: &Platform) -> Result<Option<Package>> {
        self.snapshot(spec)?
            .map(|snapshot| package_for(&snapshot, platform))
            .transpose()
    }
}
