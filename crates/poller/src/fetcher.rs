//! Status fetcher: one incremental GET against the review-status API.

use std::future::Future;

use reqwest::StatusCode;
use serde_json::Value;

use herald_common::error::PollError;
use herald_common::types::Cursor;

/// Authorization scheme expected by the review-status API.
const AUTH_SCHEME: &str = "OAuth";

/// A source of raw poll responses.
///
/// Implementations perform exactly one request per call and never retry;
/// retrying is the poll loop's job.
pub trait StatusSource: Send + Sync {
    fn fetch(&self, cursor: Cursor) -> impl Future<Output = Result<Value, PollError>> + Send;
}

/// HTTP implementation of [`StatusSource`].
pub struct HttpStatusFetcher {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpStatusFetcher {
    /// Request timeouts are taken from `http`.
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

impl StatusSource for HttpStatusFetcher {
    async fn fetch(&self, cursor: Cursor) -> Result<Value, PollError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            from_date = cursor.value(),
            "Requesting review statuses"
        );

        let response = self
            .http
            .get(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{AUTH_SCHEME} {}", self.token),
            )
            .query(&[("from_date", cursor.value())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PollError::UnsuccessfulStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| PollError::Decode(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> PollError {
    // Without the URL the rendered message is stable across cursor values.
    PollError::Transport(err.without_url().to_string())
}
