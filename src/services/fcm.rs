use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::PushConfig;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push token rejected by the provider")]
    InvalidToken,
    #[error("push provider quota exceeded")]
    QuotaExceeded,
    #[error("transient push provider failure: {0}")]
    Transient(String),
}

#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub link: String,
}

/// FCM HTTP v1 style client. One delivery attempt per call; retries are the
/// caller's policy, not this client's.
#[derive(Clone)]
pub struct FcmClient {
    client: Client,
    api_url: String,
    server_key: String,
}

impl FcmClient {
    pub fn new(config: PushConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url,
            server_key: config.server_key,
        }
    }

    pub fn build_payload(token: &str, message: &PushMessage) -> Value {
        json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "webpush": {
                    "fcmOptions": {
                        "link": message.link,
                    },
                },
            }
        })
    }

    pub async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        let payload = Self::build_payload(token, message);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.server_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            log::debug!("Push accepted by provider: {}", status);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        log::warn!("Push provider rejected send: status={} body={}", status, body);
        Err(Self::error_for_status(status))
    }

    fn error_for_status(status: StatusCode) -> PushError {
        match status.as_u16() {
            400 | 404 => PushError::InvalidToken,
            429 => PushError::QuotaExceeded,
            _ => PushError::Transient(format!("status {}", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_provider_schema() {
        let message = PushMessage {
            title: "Umbrella Left Behind!".to_string(),
            body: "It looks like you left your umbrella behind!".to_string(),
            link: "http://localhost:8080/dashboard/notifications".to_string(),
        };
        let payload = FcmClient::build_payload("tok-abc", &message);

        assert_eq!(payload["message"]["token"], "tok-abc");
        assert_eq!(
            payload["message"]["notification"]["title"],
            "Umbrella Left Behind!"
        );
        assert_eq!(
            payload["message"]["notification"]["body"],
            "It looks like you left your umbrella behind!"
        );
        assert_eq!(
            payload["message"]["webpush"]["fcmOptions"]["link"],
            "http://localhost:8080/dashboard/notifications"
        );
    }

    #[test]
    fn provider_statuses_map_to_typed_failures() {
        assert!(matches!(
            FcmClient::error_for_status(StatusCode::BAD_REQUEST),
            PushError::InvalidToken
        ));
        assert!(matches!(
            FcmClient::error_for_status(StatusCode::NOT_FOUND),
            PushError::InvalidToken
        ));
        assert!(matches!(
            FcmClient::error_for_status(StatusCode::TOO_MANY_REQUESTS),
            PushError::QuotaExceeded
        ));
        assert!(matches!(
            FcmClient::error_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            PushError::Transient(_)
        ));
    }
}
