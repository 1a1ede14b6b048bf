//! Chat model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `channels` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Assigned by the backend on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
}

impl Channel {
    /// Create a channel that has not been stored yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: None,
            image_url: None,
        }
    }

    /// Set the channel picture
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Join record between a channel and one of its users
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: String,
    pub user_id: String,
}

impl ChannelMember {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// A row of the `messages` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default, rename = "senderName")]
    pub sender_name: Option<String>,
    #[serde(default, rename = "senderAvatarUrl")]
    pub sender_avatar_url: Option<String>,
}

impl Message {
    /// Create a text message for a channel
    pub fn new(channel_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            content: content.into(),
            sender_id: None,
            created_at: None,
            image_url: None,
            sender_name: None,
            sender_avatar_url: None,
        }
    }

    /// Attach the sender shown next to the message
    pub fn with_sender(
        mut self,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        sender_avatar_url: Option<String>,
    ) -> Self {
        self.sender_id = Some(sender_id.into());
        self.sender_name = Some(sender_name.into());
        self.sender_avatar_url = sender_avatar_url;
        self
    }

    /// Attach an uploaded picture
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}
