use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Method;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{Block, DaySchedule, Inventory, SyncConfig};

use super::intent::RemoteIntent;

/// Header that identifies the signed-in user to the planner API
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("rejected by server: {0}")]
    Validation(String),
    #[error("not found on server: {0}")]
    NotFound(String),
    #[error("http {code}: {message}")]
    Status { code: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("sync not ready: {0}")]
    NotReady(String),
}

impl SyncError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            400 | 422 => SyncError::Validation(message),
            404 => SyncError::NotFound(message),
            _ => SyncError::Status { code, message },
        }
    }

    /// Worth trying again later: transport trouble, 5xx and 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Status { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

/// Backend the sync worker talks to
pub trait RemoteStore: Send {
    fn send(&self, intent: &RemoteIntent) -> Result<(), SyncError>;
    fn fetch_day(&self, date: NaiveDate) -> Result<DaySchedule, SyncError>;
    fn fetch_inventory(&self) -> Result<Inventory, SyncError>;
}

/// `{success, error, data}` wrapper every API response uses
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

/// Planner REST API over blocking reqwest
pub struct HttpStore {
    client: Client,
    base_url: String,
    user_id: String,
}

impl HttpStore {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let base_url = config
            .endpoint
            .as_deref()
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SyncError::NotReady("no endpoint configured".into()))?;
        let user_id = config
            .user_id
            .as_deref()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SyncError::NotReady("no user signed in".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(HttpStore {
            client,
            base_url,
            user_id,
        })
    }

    /// Perform a request and return the body of a 2xx response
    fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<String, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, &url)
            .header(USER_HEADER, &self.user_id);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(network_error)?;
        let status = response.status();
        let text = response.text().map_err(network_error)?;
        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<Value>>(&text)
                .ok()
                .and_then(|env| env.error)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(SyncError::from_status(status.as_u16(), message));
        }
        Ok(text)
    }
}

fn network_error(err: reqwest::Error) -> SyncError {
    if err.is_timeout() {
        SyncError::Network(format!("timed out: {}", err))
    } else {
        SyncError::Network(err.to_string())
    }
}

/// Unwrap the envelope of a 2xx body. `success: false` is a rejection.
fn decode<T: DeserializeOwned>(text: &str) -> Result<Option<T>, SyncError> {
    let env: Envelope<T> =
        serde_json::from_str(text).map_err(|e| SyncError::Decode(e.to_string()))?;
    if !env.success {
        return Err(SyncError::Validation(
            env.error.unwrap_or_else(|| "request failed".to_string()),
        ));
    }
    Ok(env.data)
}

impl RemoteStore for HttpStore {
    fn send(&self, intent: &RemoteIntent) -> Result<(), SyncError> {
        let endpoint = intent.endpoint();
        let text = self.execute(endpoint.method, &endpoint.path, endpoint.body.as_ref())?;
        if text.trim().is_empty() {
            return Ok(());
        }
        decode::<Value>(&text).map(|_| ())
    }

    fn fetch_day(&self, date: NaiveDate) -> Result<DaySchedule, SyncError> {
        let path = format!("/api/blocks?date={}", date.format("%Y-%m-%d"));
        let text = self.execute(Method::GET, &path, None)?;
        let blocks: Vec<Block> = decode(&text)?.unwrap_or_default();
        let mut day = DaySchedule::new(date);
        day.blocks = blocks;
        day.sort_blocks();
        Ok(day)
    }

    fn fetch_inventory(&self) -> Result<Inventory, SyncError> {
        let text = self.execute(Method::GET, "/api/inventory", None)?;
        Ok(decode(&text)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            SyncError::from_status(400, "bad".into()),
            SyncError::Validation("bad".into())
        );
        assert_eq!(
            SyncError::from_status(404, "gone".into()),
            SyncError::NotFound("gone".into())
        );
        assert!(SyncError::from_status(503, "down".into()).is_retryable());
        assert!(SyncError::from_status(429, "slow".into()).is_retryable());
        assert!(!SyncError::from_status(403, "no".into()).is_retryable());
        assert!(!SyncError::Validation("x".into()).is_retryable());
        assert!(SyncError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn envelope_success_with_data() {
        let blocks: Option<Vec<Block>> = decode(
            r#"{"success":true,"data":[{"id":"b1","start":"09:00","duration_min":30,"block_type":"admin"}]}"#,
        )
        .unwrap();
        assert_eq!(blocks.unwrap()[0].id, "b1");
    }

    #[test]
    fn envelope_failure_is_validation() {
        let err = decode::<Value>(r#"{"success":false,"error":"block overlaps"}"#).unwrap_err();
        assert_eq!(err, SyncError::Validation("block overlaps".into()));
    }

    #[test]
    fn garbage_is_decode_error() {
        assert!(matches!(decode::<Value>("<html>"), Err(SyncError::Decode(_))));
    }

    #[test]
    fn http_store_requires_user() {
        let config = SyncConfig {
            endpoint: Some("http://localhost:3000".into()),
            ..Default::default()
        };
        assert!(matches!(HttpStore::new(&config), Err(SyncError::NotReady(_))));
        let config = SyncConfig {
            user_id: Some("u1".into()),
            ..config
        };
        assert!(HttpStore::new(&config).is_ok());
    }
}
