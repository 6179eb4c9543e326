//! share_file - A client for single files stored on a file-sharing service.
//!
//! This library provides functionality to:
//! - Describe a remote file (name, size, URLs, timestamps) from service metadata
//! - Obtain an upload URL and send file contents to it
//! - Download a file's contents or its thumbnail
//! - Delete a file and refresh its metadata
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use share_file::models::FileRecord;
//! use share_file::{Credentials, FileResource, HttpRequestClient, User};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let user = User::new(Credentials::from_env()?);
//!     let record = FileRecord {
//!         sharename: "9Yh3cXe".to_string(),
//!         fileid: 0,
//!         ..Default::default()
//!     };
//!     let file = FileResource::with_request(record, Arc::new(HttpRequestClient::new()))
//!         .with_user(Arc::new(user));
//!
//!     let url = file.get_upload_url().await?;
//!     let outcome = file.send_file(&url, b"hello".as_slice()).await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod file;
pub mod models;
pub mod request;
pub mod url_parser;

// Re-exports for convenience
pub use auth::{User, UserSession};
pub use error::{Result, ShareError};
pub use file::{Encoding, FileContents, FileResource, SendOutcome};
pub use models::{Credentials, FileRecord};
pub use request::{HttpRequestClient, RequestClient};
pub use url_parser::parse_file_url;
