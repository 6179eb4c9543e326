//! User sessions and login against the service.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Result, ShareError};
use crate::models::{ApiErrorResponse, Credentials, TokenResponse};
use crate::request::DEFAULT_API_BASE;

/// Authentication state consulted by [`FileResource`](crate::file::FileResource).
///
/// The session is either holding an access token or not; `login` moves it
/// into the former state.
#[async_trait]
pub trait UserSession: Send + Sync {
    async fn has_access_token(&self) -> bool;

    async fn login(&self) -> Result<()>;

    /// The current access token. Empty if the session never logged in.
    async fn access_token(&self) -> String;
}

/// Body of the login request: either a full credential set or a refresh token.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum LoginRequest<'a> {
    Refresh {
        refreshtoken: &'a str,
    },
    Password {
        apikey: &'a str,
        email: &'a str,
        password: &'a str,
    },
}

#[derive(Debug, Default)]
struct Tokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// A user logging in with an API key, email and password.
#[derive(Clone)]
pub struct User {
    credentials: Arc<Credentials>,
    base_url: String,
    client: Client,
    tokens: Arc<RwLock<Tokens>>,
}

impl User {
    /// Create a user for the default API base.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_API_BASE)
    }

    /// Create a user for a custom API base.
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            credentials: Arc::new(credentials),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            tokens: Arc::new(RwLock::new(Tokens::default())),
        }
    }

    /// Seed the session with a refresh token from an earlier login.
    ///
    /// The next `login` exchanges it instead of sending the password.
    pub async fn set_refresh_token(&self, refresh_token: impl Into<String>) {
        self.tokens.write().await.refresh_token = Some(refresh_token.into());
    }

    /// The refresh token issued by the last login, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh_token.clone()
    }

    /// The email address this user logs in with.
    pub fn email(&self) -> &str {
        &self.credentials.email
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("email", &self.credentials.email)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserSession for User {
    async fn has_access_token(&self) -> bool {
        self.tokens.read().await.access_token.is_some()
    }

    async fn login(&self) -> Result<()> {
        let refresh_token = self.tokens.read().await.refresh_token.clone();
        let body = match refresh_token.as_deref() {
            Some(token) => LoginRequest::Refresh {
                refreshtoken: token,
            },
            None => LoginRequest::Password {
                apikey: &self.credentials.apikey,
                email: &self.credentials.email,
                password: &self.credentials.password,
            },
        };

        let response = self
            .client
            .post(format!("{}/users/login", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => api_error.error,
                Err(_) => body,
            };
            return Err(ShareError::Login(format!("Status {}: {}", status, message)));
        }

        let token_response: TokenResponse = response.json().await?;

        let mut tokens = self.tokens.write().await;
        tokens.access_token = Some(token_response.accesstoken);
        if token_response.refreshtoken.is_some() {
            tokens.refresh_token = token_response.refreshtoken;
        }

        info!(email = %self.credentials.email, "Logged in");
        Ok(())
    }

    async fn access_token(&self) -> String {
        self.tokens
            .read()
            .await
            .access_token
            .clone()
            .unwrap_or_default()
    }
}

/// Log in `user` unless it already holds a token, then return the token.
pub(crate) async fn ensure_access_token(user: &dyn UserSession) -> Result<String> {
    if !user.has_access_token().await {
        user.login().await?;
    }
    Ok(user.access_token().await)
}
