//! Google OAuth access tokens from a credentials file.
//!
//! Two kinds of file are understood, picked by their `"type"` field:
//! `authorized_user` (refresh token grant) and `service_account`
//! (signed JWT bearer grant).

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::calendar::BackendError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Contents of an `authorized_user` credentials file as written by
/// `gcloud auth application-default login` and similar tools.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// The key file downloaded for a service account.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    AuthorizedUser(AuthorizedUserCredentials),
    ServiceAccount(ServiceAccountCredentials),
}

impl Credentials {
    pub async fn from_file(path: &str) -> Result<Self, BackendError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
            BackendError::MissingConfig(format!("cannot read credentials {}: {}", path, err))
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            BackendError::MissingConfig(format!("invalid credentials {}: {}", path, err))
        })
    }

    pub fn token_uri(&self) -> Option<&str> {
        match self {
            Credentials::AuthorizedUser(creds) => creds.token_uri.as_deref(),
            Credentials::ServiceAccount(creds) => creds.token_uri.as_deref(),
        }
    }

    pub async fn fetch_access_token(
        &self,
        client: &Client,
        token_url: &str,
        scope: &str,
    ) -> Result<OAuthResponse, BackendError> {
        match self {
            Credentials::AuthorizedUser(creds) => {
                refresh_access_token(client, token_url, creds, scope).await
            }
            Credentials::ServiceAccount(creds) => {
                service_account_access_token(client, token_url, creds, scope).await
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Claims of the assertion a service account signs for the token
/// endpoint.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ServiceAccountClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ServiceAccountClaims {
    pub fn new(credentials: &ServiceAccountCredentials, token_url: &str, scope: &str, now: i64) -> Self {
        Self {
            iss: credentials.client_email.clone(),
            scope: scope.to_string(),
            aud: token_url.to_string(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }
}

pub async fn refresh_access_token(
    client: &Client,
    token_url: &str,
    credentials: &AuthorizedUserCredentials,
    scope: &str,
) -> Result<OAuthResponse, BackendError> {
    let params = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("refresh_token", credentials.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
        ("scope", scope),
    ];

    let resp = client
        .post(token_url)
        .form(&params)
        .send()
        .await
        .map_err(super::gcal::transport_error)?;

    token_response(resp, "token refresh").await
}

pub async fn service_account_access_token(
    client: &Client,
    token_url: &str,
    credentials: &ServiceAccountCredentials,
    scope: &str,
) -> Result<OAuthResponse, BackendError> {
    let claims = ServiceAccountClaims::new(credentials, token_url, scope, Utc::now().timestamp());
    let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes()).map_err(|err| {
        BackendError::MissingConfig(format!("invalid service account key: {}", err))
    })?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = credentials.private_key_id.clone();

    let assertion = jsonwebtoken::encode(&header, &claims, &key).map_err(|err| {
        BackendError::Unexpected(format!("cannot sign service account assertion: {}", err))
    })?;

    let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

    let resp = client
        .post(token_url)
        .form(&params)
        .send()
        .await
        .map_err(super::gcal::transport_error)?;

    token_response(resp, "service account token request").await
}

async fn token_response(resp: Response, what: &str) -> Result<OAuthResponse, BackendError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::error!("{} failed ({}): {}", what, status, body);
        return Err(BackendError::Api {
            status,
            message: format!("{} failed: {}", what, body),
        });
    }

    resp.json::<OAuthResponse>()
        .await
        .map_err(|err| BackendError::Unexpected(format!("invalid token response: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;

    const TEST_KEY: &str = include_str!("testdata/service_account_key.pem");

    fn credentials() -> AuthorizedUserCredentials {
        AuthorizedUserCredentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            refresh_token: "refresh-token".to_string(),
            token_uri: None,
        }
    }

    fn service_account() -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            client_email: "bot@project.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY.to_string(),
            private_key_id: Some("key-1".to_string()),
            token_uri: None,
        }
    }

    #[tokio::test]
    async fn it_exchanges_a_refresh_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-token".into()),
                Matcher::UrlEncoded("client_id".into(), "client-id".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let resp = refresh_access_token(
            &Client::new(),
            &token_url,
            &credentials(),
            "https://www.googleapis.com/auth/calendar",
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.access_token, "ya29.token");
        assert_eq!(resp.expires_in, Some(3599));
    }

    #[tokio::test]
    async fn it_reports_rejected_refresh_tokens() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let err = refresh_access_token(&Client::new(), &token_url, &credentials(), "scope")
            .await
            .unwrap_err();

        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn it_exchanges_a_signed_service_account_assertion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), JWT_BEARER_GRANT.into()),
                // header.claims.signature
                Matcher::Regex(r"assertion=[\w-]+\.[\w-]+\.[\w-]+".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"sa-token","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let token_url = format!("{}/token", server.url());
        let resp = service_account_access_token(
            &Client::new(),
            &token_url,
            &service_account(),
            "https://www.googleapis.com/auth/calendar",
        )
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.access_token, "sa-token");
    }

    #[test]
    fn it_builds_service_account_claims() {
        let claims = ServiceAccountClaims::new(
            &service_account(),
            "https://oauth2.googleapis.com/token",
            "https://www.googleapis.com/auth/calendar",
            1_700_000_000,
        );
        assert_eq!(
            claims,
            ServiceAccountClaims {
                iss: "bot@project.iam.gserviceaccount.com".to_string(),
                scope: "https://www.googleapis.com/auth/calendar".to_string(),
                aud: "https://oauth2.googleapis.com/token".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_003_600,
            }
        );
    }

    #[tokio::test]
    async fn it_rejects_a_bad_service_account_key() {
        let creds = ServiceAccountCredentials {
            private_key: "not a key".to_string(),
            ..service_account()
        };
        let err = service_account_access_token(&Client::new(), "http://127.0.0.1:9/token", &creds, "scope")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingConfig(_)));
    }

    #[tokio::test]
    async fn it_picks_the_credential_kind_from_the_type_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let contents = serde_json::json!({
            "type": "service_account",
            "project_id": "project",
            "private_key_id": "key-1",
            "private_key": TEST_KEY,
            "client_email": "bot@project.iam.gserviceaccount.com",
            "client_id": "1234",
            "token_uri": "https://oauth2.googleapis.com/token"
        });
        file.write_all(contents.to_string().as_bytes()).unwrap();

        let creds = Credentials::from_file(file.path().to_str().unwrap())
            .await
            .unwrap();
        match &creds {
            Credentials::ServiceAccount(sa) => {
                assert_eq!(sa.client_email, "bot@project.iam.gserviceaccount.com");
            }
            other => panic!("Expected a service account, got {:?}", other),
        }
        assert_eq!(creds.token_uri(), Some("https://oauth2.googleapis.com/token"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"type":"authorized_user","client_id":"id","client_secret":"secret","refresh_token":"refresh"}"#,
        )
        .unwrap();
        let creds = Credentials::from_file(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(matches!(creds, Credentials::AuthorizedUser(_)));
    }

    #[tokio::test]
    async fn it_reports_missing_credential_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = Credentials::from_file(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingConfig(_)));
    }
}
