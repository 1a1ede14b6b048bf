//! Task module
//!
//! This module contains the task row schema and calendar-day handling.

mod date;
mod model;

pub use date::{date_key, normalize_date, DateWindow, DATE_FORMAT};
pub use model::*;
