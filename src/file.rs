//! A single remote file and the operations the service offers on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use crate::auth::{ensure_access_token, UserSession};
use crate::error::{Result, ShareError};
use crate::models::{format_size, FileRecord};
use crate::request::{HttpRequestClient, RequestClient};

/// Source of the bytes handed to [`FileResource::send_file`].
pub enum FileContents {
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// An open stream, read to the end.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// A file on the local filesystem.
    Path(PathBuf),
}

impl From<Vec<u8>> for FileContents {
    fn from(bytes: Vec<u8>) -> Self {
        FileContents::Bytes(bytes)
    }
}

impl From<&[u8]> for FileContents {
    fn from(bytes: &[u8]) -> Self {
        FileContents::Bytes(bytes.to_vec())
    }
}

/// A string names a file to read, not the bytes to send.
impl From<&str> for FileContents {
    fn from(path: &str) -> Self {
        FileContents::Path(PathBuf::from(path))
    }
}

impl From<String> for FileContents {
    fn from(path: String) -> Self {
        FileContents::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for FileContents {
    fn from(path: PathBuf) -> Self {
        FileContents::Path(path)
    }
}

impl From<&Path> for FileContents {
    fn from(path: &Path) -> Self {
        FileContents::Path(path.to_path_buf())
    }
}

impl From<tokio::fs::File> for FileContents {
    fn from(file: tokio::fs::File) -> Self {
        FileContents::Reader(Box::new(file))
    }
}

/// How contents are read before upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Bytes are sent exactly as read.
    #[default]
    Binary,
    /// `\r\n` and lone `\r` line endings are normalised to `\n`.
    Text,
}

impl Encoding {
    fn apply(self, bytes: Vec<u8>) -> Vec<u8> {
        match self {
            Encoding::Binary => bytes,
            Encoding::Text => normalize_newlines(&bytes),
        }
    }
}

fn normalize_newlines(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' {
            if iter.peek() == Some(&&b'\n') {
                iter.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}

/// Result of [`FileResource::send_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The upload URL accepted the payload.
    Sent,
    /// Nothing could be read from the contents; no request was made.
    Unreadable,
    /// The PUT failed or was answered with a non-success status.
    Rejected,
}

impl SendOutcome {
    pub fn is_success(self) -> bool {
        self == SendOutcome::Sent
    }
}

/// One file stored on the service.
///
/// Metadata is fixed at construction. The only state that may change
/// afterwards is the attached user session, needed for the authenticated
/// calls ([`get_upload_url`](Self::get_upload_url) and
/// [`destroy`](Self::destroy)).
#[derive(Clone)]
pub struct FileResource {
    record: FileRecord,
    request: Arc<dyn RequestClient>,
    user: Option<Arc<dyn UserSession>>,
}

impl FileResource {
    /// Create a resource talking to the service through a default [`HttpRequestClient`].
    pub fn new(record: FileRecord) -> Self {
        Self::with_request(record, Arc::new(HttpRequestClient::new()))
    }

    /// Create a resource that sends its requests through `request`.
    pub fn with_request(record: FileRecord, request: Arc<dyn RequestClient>) -> Self {
        Self {
            record,
            request,
            user: None,
        }
    }

    /// Build a resource from the file object returned by the service.
    pub fn from_json(value: Value, request: Arc<dyn RequestClient>) -> Result<Self> {
        let record: FileRecord = serde_json::from_value(value)?;
        Ok(Self::with_request(record, request))
    }

    /// Attach a user session, consuming and returning the resource.
    pub fn with_user(mut self, user: Arc<dyn UserSession>) -> Self {
        self.user = Some(user);
        self
    }

    /// Attach (or replace) the user session.
    pub fn attach_user(&mut self, user: Arc<dyn UserSession>) {
        self.user = Some(user);
    }

    pub fn has_user(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&Arc<dyn UserSession>> {
        self.user.as_ref()
    }

    pub fn request(&self) -> &Arc<dyn RequestClient> {
        &self.request
    }

    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    pub fn filename(&self) -> &str {
        &self.record.filename
    }

    pub fn fileid(&self) -> u64 {
        self.record.fileid
    }

    pub fn downloads(&self) -> u64 {
        self.record.downloads
    }

    pub fn readystate(&self) -> &str {
        &self.record.readystate
    }

    pub fn url(&self) -> &str {
        &self.record.url
    }

    pub fn download(&self) -> &str {
        &self.record.download
    }

    pub fn size(&self) -> u64 {
        self.record.size
    }

    pub fn created(&self) -> i64 {
        self.record.created
    }

    pub fn sharename(&self) -> &str {
        &self.record.sharename
    }

    pub fn put_upload_url(&self) -> Option<&str> {
        self.record.upload.as_ref()?.puturl.as_deref()
    }

    pub fn post_upload_url(&self) -> Option<&str> {
        self.record.upload.as_ref()?.posturl.as_deref()
    }

    /// Creation time as a UTC timestamp, if `created` is in range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.record.created, 0)
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!(
            "/files/{}/{}{}",
            self.record.sharename, self.record.fileid, suffix
        )
    }

    fn require_user(&self) -> Result<&Arc<dyn UserSession>> {
        self.user.as_ref().ok_or_else(ShareError::no_user)
    }

    /// Upload `contents` to `upload_url` as raw bytes.
    pub async fn send_file(
        &self,
        upload_url: &str,
        contents: impl Into<FileContents>,
    ) -> Result<SendOutcome> {
        self.send_file_with_encoding(upload_url, contents, Encoding::Binary)
            .await
    }

    /// Upload `contents` to `upload_url`, reading them with `encoding`.
    ///
    /// Contents are read fully before the single PUT is sent. An empty
    /// payload, an empty path or a path that is not a file yields
    /// [`SendOutcome::Unreadable`] without touching the network. Read
    /// errors on an existing source are returned as errors.
    pub async fn send_file_with_encoding(
        &self,
        upload_url: &str,
        contents: impl Into<FileContents>,
        encoding: Encoding,
    ) -> Result<SendOutcome> {
        let payload = match read_contents(contents.into()).await? {
            Some(bytes) => encoding.apply(bytes),
            None => return Ok(SendOutcome::Unreadable),
        };
        if payload.is_empty() {
            return Ok(SendOutcome::Unreadable);
        }

        let size = payload.len();
        match self.request.put(upload_url, payload).await {
            Ok(response) if response.is_success() => {
                info!(filename = %self.record.filename, bytes = size, "Uploaded file");
                Ok(SendOutcome::Sent)
            }
            Ok(response) => {
                warn!(status = response.status, "Upload rejected");
                Ok(SendOutcome::Rejected)
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                Ok(SendOutcome::Rejected)
            }
        }
    }

    /// Ask the service for a fresh PUT URL for this file.
    pub async fn get_upload_url(&self) -> Result<String> {
        let user = self.require_user()?;
        let token = ensure_access_token(user.as_ref()).await?;

        let endpoint = self.endpoint("/upload");
        let response = self
            .request
            .get(&format!("{}?accesstoken={}", endpoint, token))
            .await?;

        if !response.is_success() {
            return Err(ShareError::request(
                endpoint,
                format!("status {}", response.status),
            ));
        }

        match response.field("puturl") {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(ShareError::request(endpoint, "response has no puturl")),
        }
    }

    /// Delete the file. Returns `false` if the service refused.
    pub async fn destroy(&self) -> Result<bool> {
        let user = self.require_user()?;
        let token = ensure_access_token(user.as_ref()).await?;

        let endpoint = self.endpoint("/destroy");
        let response = self
            .request
            .post(&format!("{}?accesstoken={}", endpoint, token))
            .await?;

        if response.is_success() {
            info!(sharename = %self.record.sharename, fileid = self.record.fileid, "Destroyed file");
            Ok(true)
        } else {
            warn!(status = response.status, endpoint = %endpoint, "Destroy refused");
            Ok(false)
        }
    }

    /// Raw bytes of the file.
    pub async fn contents(&self) -> Result<Vec<u8>> {
        self.fetch_blob(&self.endpoint("/blob")).await
    }

    /// Raw bytes of the file's thumbnail. Only images have one.
    pub async fn thumbnail(&self) -> Result<Vec<u8>> {
        self.fetch_blob(&self.endpoint("/blob/thumb")).await
    }

    async fn fetch_blob(&self, endpoint: &str) -> Result<Vec<u8>> {
        let response = self.request.get_raw(endpoint).await?;
        if !response.success {
            return Err(ShareError::request(endpoint, response.status_line));
        }
        Ok(response.body)
    }

    /// Fetch current metadata and return it as a new resource.
    ///
    /// The returned resource shares this one's request client and user.
    pub async fn refresh(&self) -> Result<FileResource> {
        let endpoint = self.endpoint("");
        let response = self.request.get(&endpoint).await?;

        let status = response.status;
        let body = match response.body {
            Some(body @ Value::Object(_)) if response.is_success() => body,
            _ => {
                return Err(ShareError::request(
                    endpoint,
                    format!("unexpected response (status {})", status),
                ))
            }
        };

        let record: FileRecord = serde_json::from_value(body)?;
        Ok(FileResource {
            record,
            request: Arc::clone(&self.request),
            user: self.user.clone(),
        })
    }
}

async fn read_contents(contents: FileContents) -> Result<Option<Vec<u8>>> {
    match contents {
        FileContents::Bytes(bytes) => Ok(Some(bytes)),
        FileContents::Reader(mut reader) => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok(Some(buf))
        }
        FileContents::Path(path) => {
            if path.as_os_str().is_empty() || !path.is_file() {
                return Ok(None);
            }
            Ok(Some(tokio::fs::read(&path).await?))
        }
    }
}

impl std::fmt::Debug for FileResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResource")
            .field("record", &self.record)
            .field("has_user", &self.has_user())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for FileResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.record.readystate.is_empty() {
            "-"
        } else {
            self.record.readystate.as_str()
        };
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.record.fileid,
            format_size(self.record.size),
            state,
            self.record.filename
        )
    }
}
