//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::services::{CookieJar, Headers, RawResponse, Transport};

/// One request as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Cookie header value the jar produced.
    pub cookie: Option<String>,
    /// Empty for GET requests.
    pub form: Vec<(String, String)>,
}

/// Transport serving canned responses by URL; unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, RawResponse>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.with_status(url, 200, body)
    }

    pub fn with_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), RawResponse::new(status, body));
        self
    }

    /// Fail requests to `url` without a response, like a refused connection.
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs requested so far, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        url: &str,
        headers: &Headers,
        cookies: &CookieJar,
        form: &[(String, String)],
    ) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
            cookie: cookies.header_value(),
            form: form.to_vec(),
        });
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(url) {
            return Err(AppError::transport(url, "connection refused"));
        }
        Ok(self
            .responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| RawResponse::new(404, "Not Found")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, headers: &Headers, cookies: &CookieJar) -> Result<RawResponse> {
        self.respond(url, headers, cookies, &[]).await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &Headers,
        cookies: &CookieJar,
        form: &[(String, String)],
    ) -> Result<RawResponse> {
        self.respond(url, headers, cookies, form).await
    }
}
