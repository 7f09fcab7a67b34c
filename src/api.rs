use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::log_entry::{LogEntry, NewLogEntry};

pub const API_KEY_HEADER: &str = "X-API-KEY";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    logs_url: Url,
}

impl ApiClient {
    pub fn new(http: Client, base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            logs_url: base.join("/api/logs")?,
        })
    }

    pub async fn list_entries(&self) -> Result<Vec<LogEntry>, ApiError> {
        debug!("GET {}", self.logs_url);
        let response = self.http.get(self.logs_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Rejected(rejection_message(response).await));
        }
        Ok(response.json().await?)
    }

    pub async fn create_entry(
        &self,
        api_key: &str,
        entry: &NewLogEntry,
    ) -> Result<LogEntry, ApiError> {
        debug!("POST {}", self.logs_url);
        let response = self
            .http
            .post(self.logs_url.clone())
            .header(API_KEY_HEADER, api_key)
            .json(entry)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Rejected(rejection_message(response).await));
        }
        Ok(response.json().await?)
    }
}

// The store replies to rejected requests with a JSON `message`; anything
// else collapses into a status-code fallback.
async fn rejection_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        _ => format!("request failed ({status})"),
    }
}
