//! `VaultApi` over HTTP with optional gzip request bodies.

use crate::api::{ApiError, AuthSession, VaultApi};
use async_trait::async_trait;
use flate2::{write::GzEncoder, Compression};
use keeper_protocol::{routes, AuthReply, Credentials, Record, RecordRef, RecordSummary};
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// `host:port` or a full `http(s)://` base URL.
    pub server: String,
    pub timeout: Duration,
    pub gzip_requests: bool,
}

impl HttpConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            timeout: DEFAULT_TIMEOUT,
            gzip_requests: true,
        }
    }
}

pub struct HttpVaultApi {
    client: reqwest::Client,
    base_url: String,
    gzip_requests: bool,
}

impl HttpVaultApi {
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url(&config.server),
            gzip_requests: config.gzip_requests,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        route: &str,
        token: Option<&str>,
        payload: &T,
    ) -> Result<Response, ApiError> {
        let json = serde_json::to_vec(payload).map_err(|e| ApiError::Encode(e.to_string()))?;
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, route))
            .header(CONTENT_TYPE, "application/json");

        request = if self.gzip_requests {
            request
                .header(CONTENT_ENCODING, "gzip")
                .body(gzip(&json)?)
        } else {
            request.body(json)
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Transport(format!("request to {route} timed out"))
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;
        debug!(route, status = %response.status(), "gateway responded");

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }

    async fn authenticate(&self, route: &str, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        let response = self.send(Method::POST, route, None, credentials).await?;
        let token = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("missing Authorization header".into()))?;

        let reply: AuthReply = decode(response).await?;
        Ok(AuthSession {
            user_id: reply.id,
            token,
            message: reply.msg,
            key: Some(reply.key).filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl VaultApi for HttpVaultApi {
    async fn register(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        self.authenticate(routes::REGISTER, credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        self.authenticate(routes::LOGIN, credentials).await
    }

    async fn list(&self, token: &str) -> Result<Vec<RecordSummary>, ApiError> {
        let response = self
            .send(Method::POST, routes::LIST, Some(token), &serde_json::json!({}))
            .await?;
        let list: Option<Vec<RecordSummary>> = decode(response).await?;
        Ok(list.unwrap_or_default())
    }

    async fn get(&self, token: &str, id: &str) -> Result<Record, ApiError> {
        let payload = RecordRef { id: id.to_string() };
        let response = self.send(Method::POST, routes::GET, Some(token), &payload).await?;
        decode(response).await
    }

    async fn upsert(&self, token: &str, record: &Record) -> Result<Record, ApiError> {
        let response = self.send(Method::PUT, routes::UPDATE, Some(token), record).await?;
        decode(response).await
    }
}

fn base_url(server: &str) -> String {
    let server = server.trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("http://{server}")
    }
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::fast());
    encoder
        .write_all(bytes)
        .map_err(|e| ApiError::Encode(format!("gzip: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ApiError::Encode(format!("gzip: {e}")))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

async fn rejection(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    if status == StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized { message }
    } else {
        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pulls a human-readable message out of an error body: the `error` or `msg`
/// field of a JSON object, else the trimmed text itself.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["error", "msg"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn base_url_accepts_bare_address() {
        assert_eq!(base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(base_url("https://vault.example/"), "https://vault.example");
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"error":"Ошибка авторизации!"}"#).as_deref(), Some("Ошибка авторизации!"));
        assert_eq!(error_message(r#"{"msg":"Неправильные логин/пароль"}"#).as_deref(), Some("Неправильные логин/пароль"));
        assert_eq!(error_message("plain failure\n").as_deref(), Some("plain failure"));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn gzip_body_inflates_back() {
        let payload = br#"{"user_name":"alice","password":"pw"}"#;
        let packed = gzip(payload).unwrap();
        let mut out = Vec::new();
        GzDecoder::new(&packed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_transport_error() {
        // Nothing listens on the discard port.
        let api = HttpVaultApi::new(HttpConfig {
            server: "127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            gzip_requests: true,
        })
        .unwrap();
        let err = api.list("token").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    }
}
