//! Paginated listing of `swiftlang/swift` repository tags.

use crate::artefact::download::{DownloadError, get_text};
use crate::config::ApiToken;
use serde::Deserialize;

/// Tag listing endpoint of the Swift compiler repository.
pub const TAGS_URL: &str = "https://api.github.com/repos/swiftlang/swift/tags";

/// A repository tag. Only the name is read from the API response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    /// The tag name, e.g. `swift-5.9-DEVELOPMENT-SNAPSHOT-2023-09-01-a`.
    pub name: String,
}

impl Tag {
    /// Create a tag with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

/// Read-only, paginated source of repository tags.
///
/// Pages are 1-based and returned in the source's own order.
#[cfg_attr(test, mockall::automock)]
pub trait TagSource {
    /// Fetch page `number` holding at most `per_page` tags.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the page cannot be fetched or decoded.
    fn page(&self, number: u32, per_page: u32) -> Result<Vec<Tag>, DownloadError>;
}

/// [`TagSource`] backed by the GitHub REST API.
#[derive(Debug, Clone, Default)]
pub struct GitHubTagSource {
    token: Option<ApiToken>,
}

impl GitHubTagSource {
    /// Create a tag source, authenticating with `token` when present.
    #[must_use]
    pub const fn new(token: Option<ApiToken>) -> Self {
        Self { token }
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Accept", "application/vnd.github+json".to_owned())];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {}", token.expose())));
        }
        headers
    }
}

impl TagSource for GitHubTagSource {
    fn page(&self, number: u32, per_page: u32) -> Result<Vec<Tag>, DownloadError> {
        let url = format!("{TAGS_URL}?per_page={per_page}&page={number}");
        log::debug!("Fetching tags page {number}");
        let body = get_text(&url, &self.headers())?;
        decode_tags(&url, &body)
    }
}

fn decode_tags(url: &str, body: &str) -> Result<Vec<Tag>, DownloadError> {
    serde_json::from_str(body).map_err(|err| DownloadError::Decode {
        url: url.to_owned(),
        reason: err.to_string(),
    })
}
