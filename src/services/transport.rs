//! Network transport used by site fetches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::services::CookieJar;

/// Header name/value pairs attached to a request.
pub type Headers = [(String, String)];

/// A response as received, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches raw responses. Only faults that leave no response are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url`.
    async fn get(&self, url: &str, headers: &Headers, cookies: &CookieJar) -> Result<RawResponse>;

    /// POST `form` as multipart form fields.
    async fn post_form(
        &self,
        url: &str,
        headers: &Headers,
        cookies: &CookieJar,
        form: &[(String, String)],
    ) -> Result<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a configured transport, routed through `config.proxy` when set.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    fn prepare(request: RequestBuilder, headers: &Headers, cookies: &CookieJar) -> RequestBuilder {
        let mut request = request;
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = cookies.header_value() {
            request = request.header(COOKIE, cookie);
        }
        request
    }

    async fn read_body(url: &str, response: Response) -> Result<RawResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(url, format!("HTTP {status}, unreadable body: {e}")))?;
        Ok(RawResponse::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &Headers, cookies: &CookieJar) -> Result<RawResponse> {
        let request = Self::prepare(self.client.get(url), headers, cookies);
        let response = request.send().await?;
        Self::read_body(url, response).await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &Headers,
        cookies: &CookieJar,
        form: &[(String, String)],
    ) -> Result<RawResponse> {
        let multipart = form
            .iter()
            .fold(Form::new(), |f, (name, value)| f.text(name.clone(), value.clone()));
        let request = Self::prepare(self.client.post(url), headers, cookies).multipart(multipart);
        let response = request.send().await?;
        Self::read_body(url, response).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serve one canned HTTP response on a local port and return its base URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let base = serve_once("403 Forbidden", r#"<form action="/checkcaptcha?key=abc">"#);
        let transport = HttpTransport::new(&CrawlerConfig::default()).unwrap();

        let response = transport
            .get(&format!("{base}/user/alice"), &[], &CookieJar::new())
            .await
            .unwrap();
        assert_eq!(response.status, 403);
        assert!(!response.is_success());
        assert!(response.body.contains("/checkcaptcha?key="));
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(403, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
    }

    #[test]
    fn test_create_transport() {
        assert!(HttpTransport::new(&CrawlerConfig::default()).is_ok());
    }

    #[test]
    fn test_create_transport_with_proxy() {
        let config = CrawlerConfig {
            proxy: Some("http://127.0.0.1:8080".into()),
            ..CrawlerConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }
}
