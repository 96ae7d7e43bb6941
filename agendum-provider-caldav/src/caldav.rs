//! CalDAV HTTP helpers built on reqwest.
//!
//! Every request carries HTTP Basic auth and is bounded by the configured
//! timeout. Failures are mapped onto `SyncError` here so the status code and
//! response body of a rejection survive untouched.

use std::time::Duration;

use agendum_core::SyncError;
use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use url::Url;

/// Create the HTTP client used for one remote.
///
/// The client follows redirects (hosted CalDAV servers commonly redirect to
/// user-specific hosts) and applies `timeout` to every request.
pub fn create_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

/// Build the URL for an event resource inside a calendar collection.
pub fn event_url(calendar_url: &Url, event_uid: &str) -> Result<Url, SyncError> {
    let base = calendar_url.as_str().trim_end_matches('/');
    Url::parse(&format!("{}/{}.ics", base, event_uid))
        .map_err(|e| SyncError::Unreachable(format!("Invalid event URL: {e}")))
}

/// Authenticated request factory for one account.
#[derive(Clone)]
pub struct Session {
    http: Client,
    username: String,
    password: String,
    timeout: Duration,
}

impl Session {
    pub fn new(http: Client, username: &str, password: &str, timeout: Duration) -> Self {
        Self {
            http,
            username: username.to_string(),
            password: password.to_string(),
            timeout,
        }
    }

    /// PROPFIND with the given depth; returns the multistatus body.
    pub async fn propfind(&self, url: &Url, depth: u8, body: &'static str) -> Result<String, SyncError> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| SyncError::Unreachable(format!("Invalid method: {e}")))?;

        let request = self
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/xml; charset=utf-8"))
            .header("Depth", depth.to_string())
            .body(body);

        self.send(request).await
    }

    /// REPORT with the given depth (used for `calendar-query`).
    pub async fn report(&self, url: &Url, depth: u8, body: String) -> Result<String, SyncError> {
        let method = Method::from_bytes(b"REPORT")
            .map_err(|e| SyncError::Unreachable(format!("Invalid method: {e}")))?;

        let request = self
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/xml; charset=utf-8"))
            .header("Depth", depth.to_string())
            .body(body);

        self.send(request).await
    }

    /// PUT a new calendar resource. `If-None-Match: *` keeps an existing
    /// resource with the same uid from being overwritten.
    pub async fn put_calendar(&self, url: &Url, ics: String) -> Result<String, SyncError> {
        let request = self
            .request(Method::PUT, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/calendar; charset=utf-8"))
            .header("If-None-Match", "*")
            .body(ics);

        self.send(request).await
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.http
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, SyncError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        // 207 Multi-Status is a success code.
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %body, "CalDAV request rejected");
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn map_transport(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout(self.timeout)
        } else {
            SyncError::Unreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_url_appends_uid() {
        let cal = Url::parse("https://dav.example.com/cal/personal/").unwrap();
        assert_eq!(
            event_url(&cal, "abc-123").unwrap().as_str(),
            "https://dav.example.com/cal/personal/abc-123.ics"
        );

        let no_slash = Url::parse("https://dav.example.com/cal/personal").unwrap();
        assert_eq!(
            event_url(&no_slash, "abc-123").unwrap().as_str(),
            "https://dav.example.com/cal/personal/abc-123.ics"
        );
    }
}
