//! Resilient data gateway
//!
//! Every backend call made by the app goes through a [`Gateway`]. Each call is
//! attempted a bounded number of times, each attempt under a deadline, with
//! exponential backoff in between; the outcome is always a
//! [`GatewayResult`], never a panic or a raw transport error.
//!
//! Retried writes are not deduplicated: an insert whose response is lost is
//! inserted again by the next attempt.

mod chat;
mod outcome;
mod profiles;
mod retry;
mod stats;
mod tasks;

pub use outcome::{GatewayError, GatewayResult};
pub use retry::{
    retry, RetryPolicy, Sleep, TokioSleep, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_INITIAL_BACKOFF,
    DEFAULT_MAX_ATTEMPTS,
};

use chrono::{Local, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::backend::{AuthProvider, AuthUser, Backend, RestBackend, Table};
use crate::config::{BackendConfig, DEFAULT_BUCKET};
use crate::{Error, Result};

/// Handle to the backend, shared by every consumer.
///
/// Holds only immutable configuration and shared handles; cloning is cheap and
/// concurrent calls do not interact.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    auth: Arc<dyn AuthProvider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleep>,
    bucket: String,
}

impl Gateway {
    /// Create a gateway over explicit backend and identity handles
    pub fn new(backend: Arc<dyn Backend>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            backend,
            auth,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleep),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }

    /// Create a gateway talking to the hosted backend
    pub fn connect(config: &BackendConfig) -> Result<Self> {
        let rest = Arc::new(RestBackend::new(config)?);
        info!(url = %config.url, bucket = %config.bucket, "Gateway connected");
        Ok(Self::new(rest.clone(), rest)
            .with_policy(config.retry)
            .with_bucket(config.bucket.clone()))
    }

    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the delay source used between attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleep>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set the upload bucket
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one backend operation under the retry policy
    async fn run<T, F, Fut>(&self, operation: &'static str, op: F) -> GatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry(&self.policy, self.sleeper.as_ref(), operation, op).await
    }

    fn table(&self, name: &'static str) -> Table<'_> {
        Table::new(self.backend.as_ref(), name)
    }

    /// The signed-in account, or a rejection for operations that need one
    async fn require_user(&self, operation: &'static str) -> GatewayResult<AuthUser> {
        self.auth
            .current_user()
            .await
            .ok_or_else(|| GatewayError::rejected(operation, Error::NotAuthenticated))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
