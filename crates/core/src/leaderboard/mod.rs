//! Leaderboard aggregation
//!
//! Turns raw task rows for a window of days into per-user summaries ranked by
//! focused time and by score. Pure and stateless: every call recomputes from
//! its inputs.

mod aggregate;
mod duration;

pub use aggregate::{
    aggregate, priority_weight, summarize, Contestant, Leaderboard, UserAggregate,
};
pub use duration::{format_minutes, parse_minutes_label, span_minutes, task_minutes, ClockFormat};
