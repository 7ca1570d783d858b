//! Client for the hosted backend: PostgREST tables under `/rest/v1` and
//! GoTrue identity under `/auth/v1`.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::auth::{AuthError, Credentials, IdentityProvider, Session, SignUpOutcome, User};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote backend is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Bulk row storage on the remote side.
pub trait RemoteStore: Send + Sync {
    /// Insert `rows` into `table` and return the stored representation, in
    /// the order the rows were sent.
    fn insert<T: Serialize + Sync>(
        &self,
        session: &Session,
        table: &str,
        rows: &[T],
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send;

    fn delete(&self, session: &Session, table: &str, ids: &[String]) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        if base_url.trim().is_empty() || anon_key.trim().is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn auth_post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value, AuthError> {
        let resp = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(RemoteError::from)?;
        match check(resp).await {
            Ok(resp) => Ok(resp.json().await.map_err(RemoteError::from)?),
            Err(RemoteError::Api { status, message }) if (400..500).contains(&status) => {
                Err(AuthError::Rejected(message))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Pass successful responses through; turn anything else into
/// [`RemoteError::Api`] with the most useful message the body offers.
async fn check(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(format!("{what}: {e}")))
}

impl RemoteStore for SupabaseClient {
    async fn insert<T: Serialize + Sync>(&self, session: &Session, table: &str, rows: &[T]) -> Result<Vec<Value>, RemoteError> {
        log::debug!("POST {} ({} rows)", table, rows.len());
        let resp = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let body: Value = check(resp).await?.json().await?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(RemoteError::Decode(format!("expected an array from {table}, got {other}"))),
        }
    }

    async fn delete(&self, session: &Session, table: &str, ids: &[String]) -> Result<(), RemoteError> {
        if ids.is_empty() {
            return Ok(());
        }
        let filter = format!("in.({})", ids.join(","));
        log::debug!("DELETE {} ({} ids)", table, ids.len());
        let resp = self
            .http
            .delete(self.rest_url(table))
            .query(&[("id", filter.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

impl IdentityProvider for SupabaseClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = serde_json::json!({
            "email": credentials.email.trim(),
            "password": credentials.password,
        });
        let value = self.auth_post("token?grant_type=password", &body).await?;
        Ok(decode(value, "session")?)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let body = serde_json::json!({
            "email": credentials.email.trim(),
            "password": credentials.password,
        });
        let value = self.auth_post("signup", &body).await?;
        if value.get("access_token").is_some() {
            return Ok(SignUpOutcome::SignedIn(decode(value, "session")?));
        }
        // Confirmation pending: older servers wrap the user, newer ones
        // return it bare.
        let user = value.get("user").cloned().unwrap_or(value);
        Ok(SignUpOutcome::ConfirmationRequired(decode::<User>(user, "user")?))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(RemoteError::from)?;
        check(resp).await?;
        Ok(())
    }
}
