//! Tests for the HTTP request client and user login with mocked HTTP responses.

use std::io::Write;
use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;
use share_file::{
    Credentials, FileRecord, FileResource, HttpRequestClient, RequestClient, SendOutcome, User,
    UserSession,
};
use tempfile::NamedTempFile;

fn credentials() -> Credentials {
    Credentials {
        apikey: "key".to_string(),
        email: "me@example.com".to_string(),
        password: "secret".to_string(),
    }
}

mod request_client {
    use super::*;

    #[tokio::test]
    async fn test_get_parses_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/1/files/abc123/0/upload")
            .match_query(Matcher::UrlEncoded("accesstoken".into(), "tok".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"puturl": "https://x/put/abc"}"#)
            .create_async()
            .await;

        let client = HttpRequestClient::with_base_url(format!("{}/1", server.url()));
        let response = client
            .get("/files/abc123/0/upload?accesstoken=tok")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert_eq!(response.field("puturl"), Some("https://x/put/abc"));
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/files/abc123/0/destroy")
            .with_status(200)
            .create_async()
            .await;

        let client = HttpRequestClient::with_base_url(format!("{}/1", server.url()));
        let response = client.post("/files/abc123/0/destroy").await.unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn test_failed_status_is_not_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/1/files/abc123/0")
            .with_status(404)
            .with_body(r#"{"error": "not found"}"#)
            .create_async()
            .await;

        let client = HttpRequestClient::with_base_url(format!("{}/1", server.url()));
        let response = client.get("/files/abc123/0").await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.status, 404);
        assert_eq!(response.field("error"), Some("not found"));
    }

    #[tokio::test]
    async fn test_put_sends_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/put/abc")
            .match_body("hello world")
            .with_status(201)
            .create_async()
            .await;

        let client = HttpRequestClient::new();
        let response = client
            .put(&format!("{}/put/abc", server.url()), b"hello world".to_vec())
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_get_raw_keeps_bytes_and_status_line() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/1/files/abc123/0/blob")
            .with_status(200)
            .with_body(vec![0u8, 159, 146, 150])
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/1/files/abc123/0/blob/thumb")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpRequestClient::with_base_url(format!("{}/1", server.url()));

        let raw = client.get_raw("/files/abc123/0/blob").await.unwrap();
        assert!(raw.success);
        assert_eq!(raw.status_line, "200 OK");
        assert_eq!(raw.body, vec![0u8, 159, 146, 150]);

        let raw = client.get_raw("/files/abc123/0/blob/thumb").await.unwrap();
        assert!(!raw.success);
        assert_eq!(raw.status_line, "404 Not Found");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn test_login_with_password() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/users/login")
            .match_body(Matcher::PartialJson(json!({
                "apikey": "key",
                "email": "me@example.com",
                "password": "secret"
            })))
            .with_status(200)
            .with_body(r#"{"accesstoken": "a.1", "refreshtoken": "r.1", "expires": 86400}"#)
            .create_async()
            .await;

        let user = User::with_base_url(credentials(), format!("{}/1", server.url()));
        assert!(!user.has_access_token().await);

        user.login().await.unwrap();

        mock.assert_async().await;
        assert!(user.has_access_token().await);
        assert_eq!(user.access_token().await, "a.1");
        assert_eq!(user.refresh_token().await.as_deref(), Some("r.1"));
    }

    #[tokio::test]
    async fn test_login_with_refresh_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/1/users/login")
            .match_body(Matcher::PartialJson(json!({"refreshtoken": "r.0"})))
            .with_status(200)
            .with_body(r#"{"accesstoken": "a.2"}"#)
            .create_async()
            .await;

        let user = User::with_base_url(credentials(), format!("{}/1", server.url()));
        user.set_refresh_token("r.0").await;
        user.login().await.unwrap();

        mock.assert_async().await;
        assert_eq!(user.access_token().await, "a.2");
        assert_eq!(user.refresh_token().await.as_deref(), Some("r.0"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/1/users/login")
            .with_status(403)
            .with_body(r#"{"error": "wrong password"}"#)
            .create_async()
            .await;

        let user = User::with_base_url(credentials(), format!("{}/1", server.url()));
        let err = user.login().await.unwrap_err();

        assert!(err.to_string().contains("wrong password"));
        assert!(!user.has_access_token().await);
    }
}

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn test_upload_url_then_send() {
        let mut server = Server::new_async().await;
        let put_url = format!("{}/put/xyz", server.url());
        let login = server
            .mock("POST", "/1/users/login")
            .with_status(200)
            .with_body(r#"{"accesstoken": "a.1"}"#)
            .expect(1)
            .create_async()
            .await;
        let upload = server
            .mock("GET", "/1/files/abc123/0/upload")
            .match_query(Matcher::UrlEncoded("accesstoken".into(), "a.1".into()))
            .with_status(200)
            .with_body(json!({ "puturl": put_url }).to_string())
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/put/xyz")
            .match_body("payload")
            .with_status(200)
            .create_async()
            .await;

        let base = format!("{}/1", server.url());
        let record = FileRecord {
            sharename: "abc123".to_string(),
            fileid: 0,
            ..Default::default()
        };
        let file = FileResource::with_request(record, Arc::new(HttpRequestClient::with_base_url(&base)))
            .with_user(Arc::new(User::with_base_url(credentials(), &base)));

        let url = file.get_upload_url().await.unwrap();
        assert_eq!(url, put_url);

        let outcome = file.send_file(&url, b"payload".as_slice()).await.unwrap();
        assert_eq!(outcome, SendOutcome::Sent);

        login.assert_async().await;
        upload.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_contents_failure_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/1/files/abc123/3/blob")
            .with_status(410)
            .create_async()
            .await;

        let record = FileRecord {
            sharename: "abc123".to_string(),
            fileid: 3,
            ..Default::default()
        };
        let client = HttpRequestClient::with_base_url(format!("{}/1", server.url()));
        let file = FileResource::with_request(record, Arc::new(client));

        let message = file.contents().await.unwrap_err().to_string();
        assert!(message.contains("/files/abc123/3/blob"));
        assert!(message.contains("410 Gone"));
    }
}

mod credentials_file {
    use super::*;

    #[test]
    fn test_credentials_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let creds_json = json!({
            "apikey": "key",
            "email": "me@example.com",
            "password": "secret"
        });
        temp_file.write_all(creds_json.to_string().as_bytes()).unwrap();

        let creds = Credentials::from_file(temp_file.path()).unwrap();
        assert_eq!(creds.apikey, "key");
        assert_eq!(creds.email, "me@example.com");
    }

    #[test]
    fn test_credentials_from_invalid_file() {
        assert!(Credentials::from_file("/nonexistent/path/credentials.json").is_err());
    }

    #[test]
    fn test_credentials_from_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();

        assert!(Credentials::from_file(temp_file.path()).is_err());
    }
}
