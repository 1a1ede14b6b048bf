//! Core library for the Spooder task app
//!
//! This crate contains the client-side logic that sits between the UI and the
//! hosted backend, including:
//! - A retrying, time-bounded gateway over every backend call
//! - Typed schemas for tasks, profiles, channels and messages
//! - Leaderboard aggregation over raw task rows
//! - Local timer preferences

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod leaderboard;
pub mod logging;
pub mod prefs;
pub mod profile;
pub mod task;

pub use config::BackendConfig;
pub use error::Error;
pub use gateway::{Gateway, GatewayError, GatewayResult, RetryPolicy};
pub use leaderboard::{Leaderboard, UserAggregate};

pub type Result<T> = std::result::Result<T, Error>;
