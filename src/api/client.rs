use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ApiError, ApiResult};
use crate::calendar::{Event, EventId, EventUpdate, NewEvent};

/// Reply of `POST /google/sync`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub synced: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// HTTP client for the events backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_events(&self) -> ApiResult<Vec<Event>> {
        let resp = self.send(self.http.get(self.url("/events"))).await?;
        decode(check(resp, None).await?).await
    }

    /// Events starting in the given month, filtered server-side.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn list_events_in_month(&self, year: i32, month: u32) -> ApiResult<Vec<Event>> {
        let req = self
            .http
            .get(self.url("/events"))
            .query(&[("year", year.to_string()), ("month", month.to_string())]);
        let resp = self.send(req).await?;
        decode(check(resp, None).await?).await
    }

    pub async fn get_event(&self, id: EventId) -> ApiResult<Event> {
        let resp = self
            .send(self.http.get(self.url(&format!("/events/{id}"))))
            .await?;
        decode(check(resp, Some(id)).await?).await
    }

    pub async fn create_event(&self, event: &NewEvent) -> ApiResult<Event> {
        let resp = self
            .send(self.http.post(self.url("/events")).json(event))
            .await?;
        decode(check(resp, None).await?).await
    }

    pub async fn update_event(&self, id: EventId, update: &EventUpdate) -> ApiResult<Event> {
        let resp = self
            .send(self.http.put(self.url(&format!("/events/{id}"))).json(update))
            .await?;
        decode(check(resp, Some(id)).await?).await
    }

    pub async fn delete_event(&self, id: EventId) -> ApiResult<()> {
        let resp = self
            .send(self.http.delete(self.url(&format!("/events/{id}"))))
            .await?;
        check(resp, Some(id)).await?;
        Ok(())
    }

    /// Ask the backend to pull the shared Google calendar.
    pub async fn sync_google(&self) -> ApiResult<SyncResponse> {
        let resp = self.send(self.http.post(self.url("/google/sync"))).await?;
        decode(check(resp, None).await?).await
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ApiResult<Response> {
        let resp = req.send().await.map_err(ApiError::Transport)?;
        debug!(status = %resp.status(), url = %resp.url(), "backend response");
        Ok(resp)
    }
}

/// Map non-2xx replies to errors. A 404 on an id-addressed route means the
/// event is gone.
async fn check(resp: Response, id: Option<EventId>) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(ApiError::NotFound(id));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    resp.json::<T>().await.map_err(ApiError::Decode)
}
