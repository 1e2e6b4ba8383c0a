use serde::Deserialize;
use serde_json::json;

use crate::error::{PennyError, Result};
use crate::http::{HttpClient, HttpRequest, Method};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: Option<String>,
}

/// Client for the provider's passcode session endpoint.
pub struct SessionClient<'a> {
    http: &'a dyn HttpClient,
    url: String,
    deployment_id: String,
    email: String,
}

impl<'a> SessionClient<'a> {
    pub fn new(http: &'a dyn HttpClient, url: &str, deployment_id: &str, email: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
            deployment_id: deployment_id.to_string(),
            email: email.to_string(),
        }
    }

    /// Start a session. The provider answers by emailing a passcode, some
    /// time after this call returns.
    pub fn start(&self) -> Result<()> {
        let body = json!({
            "session": {
                "deploymentId": self.deployment_id,
                "email": self.email,
            }
        });
        let response = self.http.send(&HttpRequest::json(Method::Post, &self.url, &body))?;
        if !response.is_success() {
            return Err(PennyError::Auth(format!(
                "session start rejected with status {}",
                response.status
            )));
        }
        Ok(())
    }

    /// Exchange a passcode for a bearer token.
    pub fn upgrade(&self, passcode: &str) -> Result<String> {
        let body = json!({
            "session": {
                "deploymentId": self.deployment_id,
                "email": self.email,
                "passcode": passcode,
            }
        });
        let response = self.http.send(&HttpRequest::json(Method::Put, &self.url, &body))?;
        if !response.is_success() {
            return Err(PennyError::Auth(format!(
                "passcode rejected with status {}",
                response.status
            )));
        }
        let parsed: SessionResponse = serde_json::from_str(&response.body)
            .map_err(|e| PennyError::MalformedResponse(format!("session response: {e}")))?;
        parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PennyError::MalformedResponse("session response has no token".to_string()))
    }
}
