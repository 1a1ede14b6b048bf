//! Local preferences
//!
//! Small key-value settings kept on the device, such as the pomodoro timer
//! durations.

mod store;
mod timer;

pub use store::{FilePreferenceStore, PreferenceStore};
pub use timer::{
    TimerSettings, BREAK_TIME_KEY, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES, FOCUS_TIME_KEY,
};
