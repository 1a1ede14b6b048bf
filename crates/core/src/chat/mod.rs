//! Chat module
//!
//! Channels, their membership records and messages.

mod model;

pub use model::{Channel, ChannelMember, Message};
