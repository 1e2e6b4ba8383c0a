//! Blocking HTTP transport used by the session and GraphQL clients.

use std::time::Duration;

use crate::error::Result;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: String,
}

impl HttpRequest {
    pub fn json(method: Method, url: &str, body: &serde_json::Value) -> Self {
        Self {
            method,
            url: url.to_string(),
            bearer: None,
            body: body.to_string(),
        }
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and waits for the full response. Transport failures
/// are errors; HTTP error statuses are returned as responses.
pub trait HttpClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("penny/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let builder = match request.method {
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        let mut builder = builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request.body.clone());
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().inspect_err(|err| {
            tracing::error!(url = %request.url, "request failed: {err}");
        })?;
        let status = response.status().as_u16();
        let body = response.text()?;
        tracing::debug!(url = %request.url, status, "response received");
        Ok(HttpResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_request() {
        let req = HttpRequest::json(Method::Put, "https://x/y", &serde_json::json!({"a": 1}))
            .with_bearer("tok");
        assert_eq!(req.body, r#"{"a":1}"#);
        assert_eq!(req.bearer.as_deref(), Some("tok"));
    }

    #[test]
    fn test_success_range() {
        assert!(HttpResponse { status: 200, body: String::new() }.is_success());
        assert!(HttpResponse { status: 201, body: String::new() }.is_success());
        assert!(!HttpResponse { status: 401, body: String::new() }.is_success());
    }
}
