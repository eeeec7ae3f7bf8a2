//! Blocking HTTP client for the visitor backend.

use super::record::{NewVisitor, PassCode, VisitorRecord};
use super::service::{SearchKey, ServiceError, VisitorService};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use ureq::{Agent, AgentBuilder, Request, Response};

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    pass_code: PassCode,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// [`VisitorService`] backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpVisitorClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpVisitorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: AgentBuilder::new().timeout(TIMEOUT).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Uses a previously issued bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Exchanges credentials for a bearer token and keeps it for later calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), ServiceError> {
        let response = self
            .agent
            .post(&self.url("/auth/login"))
            .send_json(serde_json::json!({ "username": username, "password": password }))?;
        let TokenResponse { token } = decode(response)?;
        tracing::info!(username, "Logged in");
        self.token = Some(token);
        Ok(())
    }

    /// Every stored record.
    pub fn list_visitors(&self) -> Result<Vec<VisitorRecord>, ServiceError> {
        decode(self.authorized(self.agent.get(&self.url("/visitors")))?.call()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: Request) -> Result<Request, ServiceError> {
        let token = self.token.as_deref().ok_or(ServiceError::Unauthorized)?;
        Ok(request.set("Authorization", &format!("Bearer {token}")))
    }
}

impl VisitorService for HttpVisitorClient {
    fn create_visitor(&self, visitor: &NewVisitor) -> Result<PassCode, ServiceError> {
        let request = self.authorized(self.agent.post(&self.url("/visitors")))?;
        let CreatedResponse { pass_code } = decode(request.send_json(visitor)?)?;
        Ok(pass_code)
    }

    fn search(&self, key: &SearchKey) -> Result<Option<VisitorRecord>, ServiceError> {
        let request = self
            .authorized(self.agent.get(&self.url("/visitors/search")))?
            .query(key.field(), key.value());
        match request.call() {
            Ok(response) => decode(response).map(Some),
            Err(ureq::Error::Status(404, _)) => {
                tracing::debug!(field = key.field(), "No previous visit found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn visitors_on(&self, date: NaiveDate) -> Result<Vec<VisitorRecord>, ServiceError> {
        let request = self
            .authorized(self.agent.get(&self.url("/visitors/by-date")))?
            .query("date", &date.format("%Y-%m-%d").to_string());
        decode(request.call()?)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    response
        .into_json()
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

impl From<ureq::Error> for ServiceError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(401 | 403, _) => ServiceError::Unauthorized,
            ureq::Error::Status(status, response) => {
                let message = response
                    .into_json::<MessageBody>()
                    .map(|body| body.message)
                    .unwrap_or_else(|_| "no details".to_string());
                ServiceError::Rejected { status, message }
            }
            ureq::Error::Transport(transport) => ServiceError::Transport(transport.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = HttpVisitorClient::new("http://127.0.0.1:5000/");
        assert_eq!(client.url("/visitors"), "http://127.0.0.1:5000/visitors");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_calls_without_token_are_refused_locally() {
        let client = HttpVisitorClient::new("http://127.0.0.1:9");
        let key = SearchKey::mobile("9876543210").unwrap();
        assert!(matches!(client.search(&key), Err(ServiceError::Unauthorized)));
        assert!(client.with_token("t").is_authenticated());
    }

    #[test]
    fn test_unreachable_server_is_a_transport_error() {
        let mut client = HttpVisitorClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.login("admin", "pw"),
            Err(ServiceError::Transport(_))
        ));
    }
}
