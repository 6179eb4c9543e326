//! share_file CLI - Work with single files on the file-sharing service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use share_file::models::format_size;
use share_file::request::DEFAULT_API_BASE;
use share_file::{
    parse_file_url, Credentials, Encoding, FileRecord, FileResource, HttpRequestClient,
    RequestClient, SendOutcome, User,
};

/// CLI tool for single files on the file-sharing service.
#[derive(Parser)]
#[command(name = "share_file")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API base URL.
    #[arg(long, env = "SHARE_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Path to a JSON credentials file (apikey, email, password).
    /// Falls back to SHARE_API_KEY, SHARE_EMAIL and SHARE_PASSWORD.
    #[arg(long, env = "SHARE_CREDENTIALS")]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a file's metadata.
    Info {
        /// File URL or <share>/<fileid>.
        file: String,
    },

    /// Download a file's contents.
    Download {
        /// File URL or <share>/<fileid>.
        file: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Download a file's thumbnail.
    Thumbnail {
        /// File URL or <share>/<fileid>.
        file: String,

        /// Local destination file.
        #[arg(long, short = 't')]
        to: PathBuf,
    },

    /// Print a fresh upload URL for a file.
    UploadUrl {
        /// File URL or <share>/<fileid>.
        file: String,
    },

    /// Send a local file to an upload URL.
    Send {
        /// Local file to upload.
        source: PathBuf,

        /// Upload URL. Requested from the service for --file when omitted.
        #[arg(long, required_unless_present = "file")]
        url: Option<String>,

        /// Target file URL or <share>/<fileid>.
        #[arg(long)]
        file: Option<String>,

        /// Normalise line endings before sending.
        #[arg(long)]
        text: bool,
    },

    /// Delete a file.
    Destroy {
        /// File URL or <share>/<fileid>.
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("share_file=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let request: Arc<dyn RequestClient> = Arc::new(HttpRequestClient::with_base_url(&cli.api_base));

    match cli.command {
        Commands::Info { file } => {
            let resource = open(&file, &request)?
                .refresh()
                .await
                .with_context(|| format!("Failed to fetch metadata for: {}", file))?;

            println!("{}", resource);
            println!("downloads: {}", resource.downloads());
            println!("size:      {}", format_size(resource.size()));
            if let Some(created) = resource.created_at() {
                println!("created:   {}", created.to_rfc3339());
            }
            println!("url:       {}", resource.url());
            println!("download:  {}", resource.download());
        }

        Commands::Download { file, to } => {
            let resource = open(&file, &request)?;

            let final_path = if to.is_dir() {
                let metadata = resource
                    .refresh()
                    .await
                    .with_context(|| format!("Failed to fetch metadata for: {}", file))?;
                to.join(local_name(&metadata))
            } else {
                to
            };

            print!("Downloading {}... ", file);
            let bytes = resource
                .contents()
                .await
                .with_context(|| format!("Failed to download file: {}", file))?;
            tokio::fs::write(&final_path, &bytes)
                .await
                .with_context(|| format!("Failed to write {:?}", final_path))?;

            println!("OK");
            println!("Saved to: {:?}", final_path);
        }

        Commands::Thumbnail { file, to } => {
            let bytes = open(&file, &request)?
                .thumbnail()
                .await
                .with_context(|| format!("Failed to download thumbnail: {}", file))?;
            tokio::fs::write(&to, &bytes)
                .await
                .with_context(|| format!("Failed to write {:?}", to))?;
            println!("Saved to: {:?}", to);
        }

        Commands::UploadUrl { file } => {
            let user = load_user(&cli.credentials, &cli.api_base)?;
            let url = open(&file, &request)?
                .with_user(Arc::new(user))
                .get_upload_url()
                .await
                .with_context(|| format!("Failed to get upload URL for: {}", file))?;
            println!("{}", url);
        }

        Commands::Send {
            source,
            url,
            file,
            text,
        } => {
            let (resource, url) = match (url, file) {
                (Some(url), file) => {
                    let resource = match file {
                        Some(file) => open(&file, &request)?,
                        None => FileResource::with_request(FileRecord::default(), Arc::clone(&request)),
                    };
                    (resource, url)
                }
                (None, Some(file)) => {
                    let user = load_user(&cli.credentials, &cli.api_base)?;
                    let resource = open(&file, &request)?.with_user(Arc::new(user));
                    let url = resource
                        .get_upload_url()
                        .await
                        .with_context(|| format!("Failed to get upload URL for: {}", file))?;
                    (resource, url)
                }
                (None, None) => anyhow::bail!("Either --url or --file is required"),
            };

            let encoding = if text { Encoding::Text } else { Encoding::Binary };
            print!("Uploading {:?}... ", source);
            let outcome = resource
                .send_file_with_encoding(&url, source.as_path(), encoding)
                .await
                .with_context(|| format!("Failed to read {:?}", source))?;

            match outcome {
                SendOutcome::Sent => println!("OK"),
                SendOutcome::Unreadable => {
                    println!("FAILED");
                    anyhow::bail!("Nothing to upload from {:?}", source);
                }
                SendOutcome::Rejected => {
                    println!("FAILED");
                    anyhow::bail!("Upload to {} was rejected", url);
                }
            }
        }

        Commands::Destroy { file } => {
            let user = load_user(&cli.credentials, &cli.api_base)?;
            let destroyed = open(&file, &request)?
                .with_user(Arc::new(user))
                .destroy()
                .await
                .with_context(|| format!("Failed to delete file: {}", file))?;

            if !destroyed {
                anyhow::bail!("The service refused to delete {}", file);
            }
            println!("Deleted {}", file);
        }
    }

    Ok(())
}

/// Build a resource addressing `file` (URL or `<share>/<fileid>`).
fn open(file: &str, request: &Arc<dyn RequestClient>) -> Result<FileResource> {
    let (sharename, fileid) =
        parse_file_url(file).with_context(|| format!("Invalid file URL: {}", file))?;
    let record = FileRecord {
        sharename,
        fileid,
        ..Default::default()
    };
    Ok(FileResource::with_request(record, Arc::clone(request)))
}

/// Local file name for a download: the remote name, or the file id when the
/// service reports none.
fn local_name(file: &FileResource) -> String {
    match file.filename().trim() {
        "" => file.fileid().to_string(),
        name => name.to_string(),
    }
}

fn load_user(credentials: &Option<PathBuf>, api_base: &str) -> Result<User> {
    let credentials = match credentials {
        Some(path) => Credentials::from_file(path)
            .with_context(|| format!("Failed to load credentials from {:?}", path))?,
        None => Credentials::from_env().context("No credentials file given")?,
    };
    Ok(User::with_base_url(credentials, api_base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_requires_url_or_file() {
        assert!(Cli::try_parse_from(["share_file", "send", "a.txt"]).is_err());
        assert!(Cli::try_parse_from(["share_file", "send", "a.txt", "--url", "https://x/put"]).is_ok());
        assert!(Cli::try_parse_from(["share_file", "send", "a.txt", "--file", "abc/0"]).is_ok());
    }

    #[test]
    fn test_local_name_falls_back_to_fileid() {
        let request: Arc<dyn RequestClient> = Arc::new(HttpRequestClient::new());
        let record = FileRecord {
            fileid: 7,
            ..Default::default()
        };
        let unnamed = FileResource::with_request(record.clone(), Arc::clone(&request));
        assert_eq!(local_name(&unnamed), "7");

        let named = FileResource::with_request(
            FileRecord {
                filename: "photo.jpg".to_string(),
                ..record
            },
            request,
        );
        assert_eq!(local_name(&named), "photo.jpg");
    }

    #[test]
    fn test_open_builds_resource() {
        let request: Arc<dyn RequestClient> = Arc::new(HttpRequestClient::new());
        let file = open("https://ge.tt/abc123/v/4", &request).unwrap();
        assert_eq!(file.sharename(), "abc123");
        assert_eq!(file.fileid(), 4);
        assert!(open("not a url", &request).is_err());
    }
}
