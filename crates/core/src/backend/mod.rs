//! Backend collaborator
//!
//! The hosted service provides row storage over named collections, an
//! identity provider and an object-storage bucket. This module defines the
//! interface the gateway talks to, a typed per-collection view on top of it,
//! and two implementations: the hosted REST API and an in-process store.

mod memory;
mod query;
mod rest;

pub use memory::MemoryBackend;
pub use query::{Direction, Filter, Query};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Collection names used by the app
pub mod tables {
    pub const TASKS: &str = "tasks";
    pub const PROFILES: &str = "profiles";
    pub const CHANNELS: &str = "channels";
    pub const CHANNEL_MEMBERS: &str = "channel_members";
    pub const MESSAGES: &str = "messages";
}

/// Row and object storage operations
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch rows matching the query, in the query's order
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert rows and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Merge `patch` into every row matching the query
    async fn update(&self, table: &str, query: &Query, patch: Value) -> Result<()>;

    /// Delete every row matching the query
    async fn delete(&self, table: &str, query: &Query) -> Result<()>;

    /// Store an object, replacing any object at the same path
    async fn upload(&self, bucket: &str, path: &str, bytes: &[u8], content_type: &str)
        -> Result<()>;

    /// Public URL of a stored object
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Identity of the signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    /// Username from the account metadata, if any
    pub username: Option<String>,
}

/// Details collected by the sign-up form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Session and identity operations
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with email and password, replacing any current session
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Create an account
    async fn sign_up(&self, registration: &Registration) -> Result<AuthUser>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;

    /// The signed-in account, if any
    async fn current_user(&self) -> Option<AuthUser>;
}

/// Typed view of one collection
#[derive(Clone, Copy)]
pub struct Table<'a> {
    backend: &'a dyn Backend,
    name: &'static str,
}

impl<'a> Table<'a> {
    pub fn new(backend: &'a dyn Backend, name: &'static str) -> Self {
        Self { backend, name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch and decode every matching row
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let rows = self.backend.select(self.name, query).await?;
        rows.into_iter().map(|row| self.decode(row)).collect()
    }

    /// Fetch exactly one row, failing with `NotFound` when there is none
    pub async fn select_single<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        self.select_optional(query)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No matching row in {}", self.name)))
    }

    /// Fetch the first matching row, if any
    pub async fn select_optional<T: DeserializeOwned>(&self, query: &Query) -> Result<Option<T>> {
        let rows = self.backend.select(self.name, query).await?;
        rows.into_iter().next().map(|row| self.decode(row)).transpose()
    }

    /// Insert one row and decode what the backend stored
    pub async fn insert_one<T: Serialize + DeserializeOwned>(&self, row: &T) -> Result<T> {
        let stored = self.backend.insert(self.name, vec![encode(row)?]).await?;
        let row = stored.into_iter().next().ok_or_else(|| {
            Error::Storage(format!("Insert into {} returned no row", self.name))
        })?;
        self.decode(row)
    }

    /// Insert several rows without reading them back
    pub async fn insert_many<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        let encoded = rows.iter().map(encode).collect::<Result<Vec<_>>>()?;
        self.backend.insert(self.name, encoded).await?;
        Ok(())
    }

    /// Overwrite matching rows with the serialized form of `row`
    pub async fn replace<T: Serialize>(&self, query: &Query, row: &T) -> Result<()> {
        self.backend.update(self.name, query, encode(row)?).await
    }

    /// Apply a partial JSON patch to matching rows
    pub async fn patch(&self, query: &Query, patch: Value) -> Result<()> {
        self.backend.update(self.name, query, patch).await
    }

    pub async fn delete(&self, query: &Query) -> Result<()> {
        self.backend.delete(self.name, query).await
    }

    fn decode<T: DeserializeOwned>(&self, row: Value) -> Result<T> {
        serde_json::from_value(row).map_err(|e| Error::decode(self.name, e))
    }
}

fn encode<T: Serialize>(row: &T) -> Result<Value> {
    Ok(serde_json::to_value(row)?)
}
