//! Hosted backend over HTTP
//!
//! Rows go through the PostgREST API under `/rest/v1`, sessions through the
//! auth API under `/auth/v1`, and objects through `/storage/v1`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::query::Query;
use super::{AuthProvider, AuthUser, Backend, Registration};
use crate::config::BackendConfig;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    user: AuthUser,
}

/// Client for the hosted backend; also acts as the identity provider
#[derive(Clone)]
pub struct RestBackend {
    http: Client,
    url: String,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Serialize)]
struct SignUpMetadata<'a> {
    username: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<RemoteUser> for AuthUser {
    fn from(user: RemoteUser) -> Self {
        let username = user
            .user_metadata
            .get("username")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            id: user.id,
            email: user.email,
            username,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(RemoteUser),
}

impl RestBackend {
    /// Create a client for the configured project
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("spooder-core/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.url, endpoint)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.url,
            bucket,
            urlencoding::encode(path)
        )
    }

    /// Attach the API key and the session token (or the anon key when signed out)
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone());
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Backend request failed: {}", message);
        Err(Error::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn store_session(&self, tokens: TokenResponse) -> AuthUser {
        let user = AuthUser::from(tokens.user);
        *self.session.write().await = Some(Session {
            access_token: tokens.access_token,
            user: user.clone(),
        });
        user
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        debug!(table, "Selecting rows");
        let request = self
            .http
            .get(self.rest_url(table))
            .query(&[("select", "*")])
            .query(&query.to_params());
        Ok(self.send(request).await?.json().await?)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        debug!(table, count = rows.len(), "Inserting rows");
        let request = self
            .http
            .post(self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(&rows);
        Ok(self.send(request).await?.json().await?)
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<()> {
        debug!(table, "Updating rows");
        let request = self
            .http
            .patch(self.rest_url(table))
            .query(&query.to_params())
            .header("Prefer", "return=minimal")
            .json(&patch);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<()> {
        debug!(table, "Deleting rows");
        let request = self
            .http
            .delete(self.rest_url(table))
            .query(&query.to_params());
        self.send(request).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        debug!(bucket, path, size = bytes.len(), "Uploading object");
        let request = self
            .http
            .post(self.object_url(bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes.to_vec());
        self.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url,
            bucket,
            urlencoding::encode(path)
        )
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let tokens: TokenResponse = self.send(request).await?.json().await?;
        let user = self.store_session(tokens).await;
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    async fn sign_up(&self, registration: &Registration) -> Result<AuthUser> {
        let request = self.http.post(self.auth_url("signup")).json(&SignUpRequest {
            email: &registration.email,
            password: &registration.password,
            data: SignUpMetadata {
                username: &registration.username,
                name: &registration.name,
            },
        });
        let response: SignUpResponse = self.send(request).await?.json().await?;
        let user = match response {
            SignUpResponse::Session(tokens) => self.store_session(tokens).await,
            SignUpResponse::User(user) => AuthUser::from(user),
        };
        info!(user_id = %user.id, "Registered account");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        let signed_in = self.session.read().await.is_some();
        let result = if signed_in {
            self.send(self.http.post(self.auth_url("logout")))
                .await
                .map(|_| ())
        } else {
            Ok(())
        };
        // The local session ends even when the server call fails
        *self.session.write().await = None;
        info!("Signed out");
        result
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }
}
