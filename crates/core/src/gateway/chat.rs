//! Channel and message operations

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{Gateway, GatewayError, GatewayResult};
use crate::backend::{tables, Direction, Query};
use crate::chat::{Channel, ChannelMember, Message};
use crate::profile::Profile;
use crate::Error;

impl Gateway {
    /// Channels the signed-in user belongs to; empty when signed out
    pub async fn channels(&self) -> GatewayResult<Vec<Channel>> {
        let Some(user) = self.auth.current_user().await else {
            debug!("No signed-in user, no channels");
            return Ok(Vec::new());
        };

        let members = self.table(tables::CHANNEL_MEMBERS);
        let channels = self.table(tables::CHANNELS);
        let membership_query = Query::new().eq("user_id", user.id.as_str());
        let membership_query = &membership_query;

        self.run("channels.list", move || async move {
            let memberships: Vec<ChannelMember> = members.select(membership_query).await?;
            if memberships.is_empty() {
                return Ok(Vec::new());
            }
            let ids = memberships.into_iter().map(|m| m.channel_id);
            channels
                .select(&Query::new().in_list("id", ids).order("created_at", Direction::Ascending))
                .await
        })
        .await
    }

    pub async fn channel_by_id(&self, channel_id: &str) -> GatewayResult<Channel> {
        let channels = self.table(tables::CHANNELS);
        let query = Query::new().eq("id", channel_id);
        let query = &query;
        self.run("channels.get", move || async move {
            channels.select_single(query).await
        })
        .await
    }

    /// Create a channel and enrol the creator plus `member_ids`.
    ///
    /// The channel insert and the membership insert are separate calls, each
    /// with its own retries.
    pub async fn create_channel(
        &self,
        name: &str,
        image_url: Option<String>,
        member_ids: &[String],
    ) -> GatewayResult<Channel> {
        const OPERATION: &str = "channels.create";
        if name.trim().is_empty() {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput("Channel name cannot be blank".into()),
            ));
        }
        if member_ids.is_empty() {
            return Err(GatewayError::rejected(
                OPERATION,
                Error::InvalidInput("A channel needs at least one other member".into()),
            ));
        }
        let creator = self.require_user(OPERATION).await?;

        let mut channel = Channel::new(name.trim());
        channel.image_url = image_url;

        let channels = self.table(tables::CHANNELS);
        let channel_ref = &channel;
        let created: Channel = self
            .run(OPERATION, move || async move {
                channels.insert_one(channel_ref).await
            })
            .await?;

        let channel_id = created.id.clone().ok_or_else(|| {
            GatewayError::rejected(
                OPERATION,
                Error::Storage("Created channel has no id".into()),
            )
        })?;
        let distinct: BTreeSet<&str> = member_ids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(creator.id.as_str()))
            .collect();
        let rows: Vec<ChannelMember> = distinct
            .into_iter()
            .map(|user_id| ChannelMember::new(channel_id.as_str(), user_id))
            .collect();

        let members = self.table(tables::CHANNEL_MEMBERS);
        let rows = rows.as_slice();
        self.run("channels.add_members", move || async move {
            members.insert_many(rows).await
        })
        .await?;

        info!(channel_id = %channel_id, members = rows.len(), "Channel created");
        Ok(created)
    }

    /// Enrol a user in a channel. Returns `false` when already a member.
    pub async fn add_user_to_channel(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> GatewayResult<bool> {
        let members = self.table(tables::CHANNEL_MEMBERS);
        let existing_query = Query::new()
            .eq("channel_id", channel_id)
            .eq("user_id", user_id);
        let existing_query = &existing_query;
        let member = ChannelMember::new(channel_id, user_id);
        let member = std::slice::from_ref(&member);

        self.run("channels.add_user", move || async move {
            let existing: Vec<ChannelMember> = members.select(existing_query).await?;
            if !existing.is_empty() {
                return Ok(false);
            }
            members.insert_many(member).await?;
            Ok::<_, Error>(true)
        })
        .await
    }

    /// Profiles of everyone in a channel
    pub async fn channel_members(&self, channel_id: &str) -> GatewayResult<Vec<Profile>> {
        let members = self.table(tables::CHANNEL_MEMBERS);
        let profiles = self.table(tables::PROFILES);
        let query = Query::new().eq("channel_id", channel_id);
        let query = &query;

        self.run("channels.members", move || async move {
            let memberships: Vec<ChannelMember> = members.select(query).await?;
            if memberships.is_empty() {
                return Ok(Vec::new());
            }
            let ids = memberships.into_iter().map(|m| m.user_id);
            profiles.select(&Query::new().in_list("id", ids)).await
        })
        .await
    }

    /// Messages of a channel, oldest first
    pub async fn messages(&self, channel_id: &str) -> GatewayResult<Vec<Message>> {
        let messages = self.table(tables::MESSAGES);
        let query = Query::new()
            .eq("channel_id", channel_id)
            .order("created_at", Direction::Ascending);
        let query = &query;
        self.run("messages.list", move || async move {
            messages.select(query).await
        })
        .await
    }

    pub async fn send_message(&self, message: Message) -> GatewayResult<Message> {
        let messages = self.table(tables::MESSAGES);
        let message = &message;
        self.run("messages.send", move || async move {
            messages.insert_one(message).await
        })
        .await
    }

    /// Upload a picture and post it as a message with no text
    pub async fn send_image_message(
        &self,
        message: Message,
        bytes: &[u8],
        content_type: &str,
    ) -> GatewayResult<Message> {
        let url = self.upload_image(bytes, content_type).await?;
        let mut message = message.with_image_url(url);
        message.content.clear();
        self.send_message(message).await
    }
}
