//! Data models for the file-sharing service's API payloads.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ShareError};

/// Metadata for a single file as returned by the service.
///
/// Every field is optional on the wire; anything missing keeps its
/// default (empty string, `0`, `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    pub filename: String,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub fileid: u64,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub downloads: u64,
    pub readystate: String,
    pub url: String,
    #[serde(alias = "getUrl")]
    pub download: String,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub size: u64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub created: i64,
    pub sharename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadUrls>,
}

/// Transient upload endpoints attached to a freshly created file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadUrls {
    pub puturl: Option<String>,
    pub posturl: Option<String>,
}

/// The service sends integers either as JSON numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn deserialize_lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<NumberOrString> = Option::deserialize(deserializer)?;
    match opt {
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Text(s)) if s.is_empty() => Ok(0),
        Some(NumberOrString::Text(s)) => s.parse::<i64>().map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}

fn deserialize_lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_lenient_i64(deserializer)?;
    u64::try_from(value).map_err(serde::de::Error::custom)
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Error body returned by the service on failed calls.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// Credentials used to log in a [`User`](crate::auth::User).
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub apikey: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Load credentials from a JSON file with `apikey`, `email` and `password`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load credentials from `SHARE_API_KEY`, `SHARE_EMAIL` and `SHARE_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        fn var(name: &str) -> Result<String> {
            std::env::var(name).map_err(|_| ShareError::MissingEnvVar(name.to_string()))
        }

        Ok(Self {
            apikey: var("SHARE_API_KEY")?,
            email: var("SHARE_EMAIL")?,
            password: var("SHARE_PASSWORD")?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Token response from the login endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub accesstoken: String,
    #[serde(default)]
    pub refreshtoken: Option<String>,
}
