//! Parser for extracting a file's share name and id from its URL.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, ShareError};

/// Browser-facing file URL: `https://host/<share>/v/<fileid>`.
static VIEW_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/\s]+/([a-zA-Z0-9_-]+)/v/(\d+)/?(?:[?#].*)?$")
        .expect("Invalid view URL regex")
});

/// API file URL: `https://host/<version>/files/<share>/<fileid>[/...]`.
static API_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/\s]+/(?:[^/\s]+/)*files/([a-zA-Z0-9_-]+)/(\d+)(?:/[^?#]*)?(?:[?#].*)?$")
        .expect("Invalid API URL regex")
});

/// Short form: `<share>/<fileid>`.
static SHORT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_-]+)/(\d+)$").expect("Invalid short form regex"));

/// Extract `(sharename, fileid)` from a file URL.
///
/// Supports the following forms:
/// - `https://ge.tt/<share>/v/<fileid>`
/// - `https://open.ge.tt/1/files/<share>/<fileid>/blob`
/// - `<share>/<fileid>`
///
/// # Examples
///
/// ```
/// use share_file::url_parser::parse_file_url;
///
/// let (share, id) = parse_file_url("https://ge.tt/9Yh3cXe/v/2").unwrap();
/// assert_eq!(share, "9Yh3cXe");
/// assert_eq!(id, 2);
/// ```
pub fn parse_file_url(url: &str) -> Result<(String, u64)> {
    let trimmed = url.trim();

    for regex in [&*VIEW_URL_REGEX, &*API_URL_REGEX, &*SHORT_REGEX] {
        if let Some(captures) = regex.captures(trimmed) {
            let share = captures.get(1).map(|m| m.as_str().to_string());
            let fileid = captures.get(2).and_then(|m| m.as_str().parse::<u64>().ok());
            if let (Some(share), Some(fileid)) = (share, fileid) {
                return Ok((share, fileid));
            }
        }
    }

    Err(ShareError::InvalidFileUrl(url.to_string()))
}
