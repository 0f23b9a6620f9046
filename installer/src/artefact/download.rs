//! HTTP transfers for toolchain archives, signatures, and API listings.
//!
//! Provides a trait-based abstraction for downloading files so the install
//! pipeline can be exercised without network access.

use camino::Utf8Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Connection timeout for all requests.
///
/// Toolchain archives run to hundreds of megabytes, so there is no global
/// request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every request; the GitHub API rejects anonymous agents.
const USER_AGENT: &str = concat!("setup-swift/", env!("CARGO_PKG_VERSION"));

/// Trait for downloading files by URL.
///
/// Implementations must be shareable across threads because the Linux
/// strategy fetches an archive and its signature at the same time.
///
/// # Examples
///
/// ```
/// use setup_swift::artefact::download::HttpDownloader;
///
/// let downloader = HttpDownloader;
/// // Use downloader.download(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError>;
}

/// Errors arising from HTTP transfers.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The response body could not be decoded.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// Description of the decoding failure.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<(), DownloadError> {
        log::debug!("Downloading {url}");
        let response = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(())
    }
}

/// GET `url` with extra headers and return the body as a string.
pub(crate) fn get_text(url: &str, headers: &[(&str, String)]) -> Result<String, DownloadError> {
    let mut request = http_agent().get(url).header("User-Agent", USER_AGENT);
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }
    let response = request.call().map_err(|e| map_ureq_error(url, &e))?;
    response
        .into_body()
        .read_to_string()
        .map_err(|e| DownloadError::HttpError {
            url: url.to_owned(),
            reason: e.to_string(),
        })
}

/// Shared `ureq` agent with connection timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://swift.org/builds/missing.pkg", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(403);
        let mapped = map_ureq_error("https://api.github.com/repos/swiftlang/swift/tags", &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
        assert!(mapped.to_string().contains("api.github.com"));
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(USER_AGENT.starts_with("setup-swift/"));
    }
}
