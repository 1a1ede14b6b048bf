//! In-process backend
//!
//! Keeps every collection as a list of JSON rows behind a lock. Used by tests
//! and by offline runs; behaves like the hosted service for the columns the
//! app relies on (generated `id` and `created_at`, public object URLs).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::query::Query;
use super::{AuthProvider, AuthUser, Backend, Registration};
use crate::{Error, Result};

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<String, (String, Vec<u8>)>,
    accounts: HashMap<String, (String, AuthUser)>,
    session: Option<AuthUser>,
}

/// Thread-safe in-memory backend and identity provider
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put rows into a collection as-is, bypassing insert defaults
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.state.write().await;
        state.tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Every row currently stored in a collection
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        let state = self.state.read().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Stored object bytes and content type
    pub async fn object(&self, bucket: &str, path: &str) -> Option<(String, Vec<u8>)> {
        let state = self.state.read().await;
        state.objects.get(&object_key(bucket, path)).cloned()
    }

    /// Start a session for `user` without credentials
    pub async fn sign_in_as(&self, user: AuthUser) {
        self.state.write().await.session = Some(user);
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

fn with_defaults(row: Value) -> Result<Value> {
    let Value::Object(mut fields) = row else {
        return Err(Error::InvalidInput("Rows must be JSON objects".into()));
    };
    fill_missing(&mut fields, "id", || Value::String(Uuid::new_v4().to_string()));
    fill_missing(&mut fields, "created_at", || Value::String(Utc::now().to_rfc3339()));
    Ok(Value::Object(fields))
}

fn fill_missing(fields: &mut Map<String, Value>, key: &str, value: impl FnOnce() -> Value) {
    if fields.get(key).map_or(true, Value::is_null) {
        fields.insert(key.to_string(), value());
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let state = self.state.read().await;
        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| query.matches(row)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let stored = rows
            .into_iter()
            .map(with_defaults)
            .collect::<Result<Vec<_>>>()?;
        let mut state = self.state.write().await;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        debug!("Inserted {} row(s) into {}", stored.len(), table);
        Ok(stored)
    }

    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<()> {
        let Value::Object(patch) = patch else {
            return Err(Error::InvalidInput("Patch must be a JSON object".into()));
        };
        let mut state = self.state.write().await;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !query.matches(row));
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.objects.insert(
            object_key(bucket, path),
            (content_type.to_string(), bytes.to_vec()),
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}", object_key(bucket, path))
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut state = self.state.write().await;
        let user = match state.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => {
                return Err(Error::Backend {
                    status: 400,
                    message: "Invalid login credentials".into(),
                })
            }
        };
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, registration: &Registration) -> Result<AuthUser> {
        let mut state = self.state.write().await;
        if state.accounts.contains_key(&registration.email) {
            return Err(Error::Backend {
                status: 422,
                message: "User already registered".into(),
            });
        }
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(registration.email.clone()),
            username: Some(registration.username.clone()),
        };
        state.accounts.insert(
            registration.email.clone(),
            (registration.password.clone(), user.clone()),
        );
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.write().await.session = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<AuthUser> {
        self.state.read().await.session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_fills_generated_columns() {
        let backend = MemoryBackend::new();
        let stored = backend
            .insert("channels", vec![json!({ "name": "general" })])
            .await
            .unwrap();

        assert!(stored[0]["id"].is_string());
        assert!(stored[0]["created_at"].is_string());
        assert_eq!(backend.rows("channels").await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_filter() {
        let backend = MemoryBackend::new();
        backend
            .seed(
                "tasks",
                vec![
                    json!({ "id": "a", "is_completed": false }),
                    json!({ "id": "b", "is_completed": false }),
                ],
            )
            .await;

        let only_a = Query::new().eq("id", "a");
        backend
            .update("tasks", &only_a, json!({ "is_completed": true }))
            .await
            .unwrap();
        let done = backend
            .select("tasks", &Query::new().eq("is_completed", "true"))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0]["id"], "a");

        backend.delete("tasks", &only_a).await.unwrap();
        assert_eq!(backend.rows("tasks").await.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let backend = MemoryBackend::new();
        backend
            .upload("images", "a.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap();

        let (content_type, bytes) = backend.object("images", "a.jpg").await.unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(bytes, b"jpeg");
        assert_eq!(backend.public_url("images", "a.jpg"), "memory://images/a.jpg");
    }

    #[tokio::test]
    async fn test_auth_session_lifecycle() {
        let backend = MemoryBackend::new();
        assert!(backend.current_user().await.is_none());

        let registration = Registration {
            username: "sam".into(),
            name: "Sam".into(),
            email: "sam@example.com".into(),
            password: "hunter22".into(),
        };
        let user = backend.sign_up(&registration).await.unwrap();
        assert_eq!(backend.current_user().await, Some(user.clone()));

        backend.sign_out().await.unwrap();
        assert!(backend.current_user().await.is_none());

        assert!(backend.sign_in("sam@example.com", "wrong").await.is_err());
        let again = backend.sign_in("sam@example.com", "hunter22").await.unwrap();
        assert_eq!(again.id, user.id);
    }
}
