use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::ValidatedPayload;
use crate::registration::dto::RegisterReply;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("registration service unreachable: {0}")]
    Unreachable(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Decode(String),
}

/// Carries a validated payload to the registration service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: &ValidatedPayload) -> Result<RegisterReply, TransportError>;
}

pub struct HttpTransport {
    http: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/register", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &ValidatedPayload) -> Result<RegisterReply, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    TransportError::Unreachable(e.to_string())
                } else {
                    TransportError::Request(e)
                }
            })?;

        // Failures carry the same envelope as successes, so the status code
        // is informational only.
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "registration response");
        serde_json::from_slice::<RegisterReply>(&body)
            .map_err(|e| TransportError::Decode(format!("status {status}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> ValidatedPayload {
        ValidatedPayload {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            username: "ann-lee".into(),
            email: "ann@x.com".into(),
            password: "pw".into(),
            age: "30".into(),
            phone: "+1 1234567890".into(),
            address: "1 Rd".into(),
            city: "NYC".into(),
        }
    }

    #[test]
    fn endpoint_joins_base_url() {
        let t = HttpTransport::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.endpoint(), "http://localhost:5000/api/register");
    }

    #[tokio::test]
    async fn posts_camel_case_json_and_reads_created_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .and(body_json(json!({
                "firstName": "Ann",
                "lastName": "Lee",
                "username": "ann-lee",
                "email": "ann@x.com",
                "password": "pw",
                "age": "30",
                "phone": "+1 1234567890",
                "address": "1 Rd",
                "city": "NYC"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "message": "Registration successful",
                "userId": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let t = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let reply = t.send(&payload()).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.user_id, Some(1));
    }

    #[tokio::test]
    async fn reads_failure_envelope_from_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Email already registered"
            })))
            .mount(&server)
            .await;

        let t = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let reply = t.send(&payload()).await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message, "Email already registered");
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let t = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = t.send(&payload()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({ "success": true, "message": "" })),
            )
            .mount(&server)
            .await;

        let t = HttpTransport::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = t.send(&payload()).await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
    }
}
