// Copyright (C) 2026 StarHuntingGames
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridiron_common::{ChatAuthor, ChatMessage, Embed};
use reqwest::{Method, Url, header::AUTHORIZATION};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info};

const CATEGORY_CHANNEL: u8 = 4;
const TEXT_CHANNEL: u8 = 0;
const MAX_HISTORY_PAGE: usize = 100;

#[derive(Debug, Error)]
#[error("chat platform error: {0:#}")]
pub struct PlatformError(#[from] anyhow::Error);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content: String,
    pub embed: Option<Embed>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
        }
    }

    pub fn with_embed(content: impl Into<String>, embed: Embed) -> Self {
        Self {
            content: content.into(),
            embed: Some(embed),
        }
    }
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Name the engine uses for this platform in session bindings.
    fn platform_name(&self) -> &str;
    fn mention(&self, user_id: &str) -> String;

    async fn create_thread(&self, category: &str, name: &str) -> Result<Conversation, PlatformError>;
    async fn post_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError>;
    async fn send_private_message(
        &self,
        user: &ChatUser,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError>;
    async fn resolve_user(&self, name: &str) -> Result<ChatUser, PlatformError>;
    async fn resolve_conversation(&self, conversation_id: &str)
    -> Result<Conversation, PlatformError>;
    async fn recent_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError>;
    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), PlatformError>;
}

#[derive(Debug, Deserialize)]
struct DiscordChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: u8,
}

impl From<DiscordChannel> for Conversation {
    fn from(channel: DiscordChannel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct DiscordMember {
    user: DiscordUser,
}

#[derive(Debug, Deserialize)]
struct DiscordMessage {
    id: String,
    author: DiscordUser,
    #[serde(default)]
    content: String,
    #[serde(default)]
    embeds: Vec<Embed>,
    timestamp: DateTime<Utc>,
}

impl From<DiscordMessage> for ChatMessage {
    fn from(message: DiscordMessage) -> Self {
        Self {
            id: message.id,
            author: ChatAuthor {
                id: message.author.id,
                name: message.author.username,
                bot: message.author.bot,
            },
            content: message.content,
            embeds: message.embeds,
            sent_at: message.timestamp,
        }
    }
}

/// Discord REST (v10) implementation. Inbound events arrive through the
/// HTTP ingress, so no gateway connection is held here.
#[derive(Clone)]
pub struct DiscordClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    guild_id: String,
    platform_name: String,
}

impl DiscordClient {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        guild_id: impl Into<String>,
        platform_name: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("invalid CHAT_API_BASE_URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("CHAT_API_BASE_URL must be a hierarchical http(s) url");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
            guild_id: guild_id.into(),
            platform_name: platform_name.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("chat api base url cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<reqwest::Response> {
        let url = self.endpoint(segments)?;
        debug!(%method, path = %url.path(), "calling chat platform");
        let mut request = self
            .client
            .request(method, url.clone())
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("failed to call chat platform at {}", url.path()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_string());
            anyhow::bail!("chat platform returned {status} for {}: {body}", url.path());
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<T> {
        self.send(method, segments, query, body)
            .await?
            .json::<T>()
            .await
            .context("invalid chat platform payload")
    }

    async fn post_to_channel(&self, channel_id: &str, message: &OutboundMessage) -> anyhow::Result<()> {
        let mut body = serde_json::json!({ "content": message.content });
        if let Some(embed) = &message.embed {
            body["embeds"] = serde_json::json!([embed]);
        }
        self.send(
            Method::POST,
            &["channels", channel_id, "messages"],
            &[],
            Some(body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    fn platform_name(&self) -> &str {
        &self.platform_name
    }

    fn mention(&self, user_id: &str) -> String {
        format!("<@{user_id}>")
    }

    async fn create_thread(&self, category: &str, name: &str) -> Result<Conversation, PlatformError> {
        let channels: Vec<DiscordChannel> = self
            .send_json(Method::GET, &["guilds", &self.guild_id, "channels"], &[], None)
            .await?;
        let parent = channels
            .into_iter()
            .find(|channel| {
                channel.kind == CATEGORY_CHANNEL
                    && channel
                        .name
                        .as_deref()
                        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(category))
            })
            .ok_or_else(|| anyhow::anyhow!("category {category} not found"))?;

        let created: DiscordChannel = self
            .send_json(
                Method::POST,
                &["guilds", &self.guild_id, "channels"],
                &[],
                Some(serde_json::json!({
                    "name": name,
                    "type": TEXT_CHANNEL,
                    "parent_id": parent.id,
                })),
            )
            .await?;
        info!(thread_id = %created.id, name = %name, "created game thread");
        Ok(created.into())
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        Ok(self.post_to_channel(conversation_id, message).await?)
    }

    async fn send_private_message(
        &self,
        user: &ChatUser,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        let channel: DiscordChannel = self
            .send_json(
                Method::POST,
                &["users", "@me", "channels"],
                &[],
                Some(serde_json::json!({ "recipient_id": user.id })),
            )
            .await
            .with_context(|| format!("failed to open a private conversation with {}", user.name))?;
        self.post_to_channel(&channel.id, message).await?;
        info!(user = %user.name, "private message sent");
        Ok(())
    }

    async fn resolve_user(&self, name: &str) -> Result<ChatUser, PlatformError> {
        let members: Vec<DiscordMember> = self
            .send_json(
                Method::GET,
                &["guilds", &self.guild_id, "members", "search"],
                &[("query", name.to_string()), ("limit", "10".to_string())],
                None,
            )
            .await?;
        let member = members
            .into_iter()
            .find(|member| member.user.username == name)
            .ok_or_else(|| anyhow::anyhow!("user {name} not found"))?;
        Ok(ChatUser {
            id: member.user.id,
            name: member.user.username,
        })
    }

    async fn resolve_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Conversation, PlatformError> {
        let channel: DiscordChannel = self
            .send_json(Method::GET, &["channels", conversation_id], &[], None)
            .await?;
        Ok(channel.into())
    }

    async fn recent_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        let limit = limit.clamp(1, MAX_HISTORY_PAGE);
        let messages: Vec<DiscordMessage> = self
            .send_json(
                Method::GET,
                &["channels", conversation_id, "messages"],
                &[("limit", limit.to_string())],
                None,
            )
            .await?;
        Ok(messages.into_iter().map(ChatMessage::from).collect())
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), PlatformError> {
        self.send(Method::DELETE, &["channels", conversation_id], &[], None)
            .await?;
        info!(conversation_id = %conversation_id, "deleted conversation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_history_maps_to_chat_messages() {
        let raw = serde_json::json!([{
            "id": "m-1",
            "author": { "id": "42", "username": "gridiron", "bot": true },
            "content": "",
            "timestamp": "2026-10-19T20:15:00.000000+00:00",
            "embeds": [{
                "title": "Submit a Number",
                "description": "**Game ID: g-9**",
                "fields": [{ "name": "Timeout", "value": "The defense has called a timeout", "inline": false }]
            }]
        }]);
        let messages: Vec<DiscordMessage> = serde_json::from_value(raw).unwrap();
        let message = ChatMessage::from(messages.into_iter().next().unwrap());
        assert!(message.author.bot);
        assert_eq!(message.author.name, "gridiron");
        let record = gridiron_common::PromptRecord::decode(&message.embeds[0]).unwrap();
        assert_eq!(record.session_id, "g-9");
        assert!(record.timeout_called);
    }

    #[test]
    fn mentions_use_the_user_id() {
        let client =
            DiscordClient::new("https://discord.com/api/v10", "token", "guild", "Discord").unwrap();
        assert_eq!(client.mention("123"), "<@123>");
        let url = client.endpoint(&["users", "@me", "channels"]).unwrap();
        assert_eq!(url.path(), "/api/v10/users/@me/channels");
    }
}
