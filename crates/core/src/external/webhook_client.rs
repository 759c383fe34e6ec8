use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExternalCallError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("API Error: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid JSON response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessage<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Posts chat messages to a webhook endpoint. No retries; failures are
/// logged and returned to the caller.
pub struct WebhookClient {
    url: String,
    http: Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    /// POST `{ message, sessionId }` and return the decoded JSON reply.
    pub fn send_message(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<serde_json::Value, ExternalCallError> {
        self.post(&ChatMessage {
            message,
            session_id,
        })
        .inspect_err(|e| log::error!("API Call Failed: {e}"))
    }

    fn post(&self, payload: &ChatMessage<'_>) -> Result<serde_json::Value, ExternalCallError> {
        let body = serde_json::to_string(payload).map_err(ExternalCallError::Encode)?;
        let request_err = |e: reqwest::Error| ExternalCallError::Request {
            url: self.url.clone(),
            source: e,
        };

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            log::error!("API Error Response: {} {}", status.as_u16(), reason);
            return Err(ExternalCallError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        let text = response.text().map_err(request_err)?;
        serde_json::from_str(&text).map_err(|e| ExternalCallError::Decode {
            url: self.url.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve_once, unreachable_url};
    use std::time::Duration;

    #[test]
    fn test_success_returns_json_body() {
        let (url, request) = serve_once("200 OK", br#"{"output":"Halo!"}"#.to_vec());
        let client = WebhookClient::with_client(url, local_client());

        let reply = client.send_message("hai", "session-1").unwrap();
        assert_eq!(reply["output"], "Halo!");

        let sent: serde_json::Value =
            serde_json::from_str(&request.recv_timeout(Duration::from_secs(5)).unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({"message": "hai", "sessionId": "session-1"}));
    }

    #[test]
    fn test_server_error_surfaces_status_code() {
        let (url, _request) = serve_once("500 Internal Server Error", b"{}".to_vec());
        let client = WebhookClient::with_client(url, local_client());

        let err = client.send_message("hai", "session-1").unwrap_err();
        assert!(matches!(err, ExternalCallError::Status { status: 500, .. }));
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[test]
    fn test_non_json_reply_is_decode_error() {
        let (url, _request) = serve_once("200 OK", b"<html>oops</html>".to_vec());
        let client = WebhookClient::with_client(url, local_client());

        let err = client.send_message("hai", "session-1").unwrap_err();
        assert!(matches!(err, ExternalCallError::Decode { .. }));
    }

    #[test]
    fn test_connection_failure_is_request_error() {
        let client = WebhookClient::with_client(unreachable_url(), local_client());

        let err = client.send_message("hai", "session-1").unwrap_err();
        assert!(matches!(err, ExternalCallError::Request { .. }));
    }
}
