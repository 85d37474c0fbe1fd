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
use gridiron_common::{DEFAULT_HISTORY_WINDOW, PlayKind, template::expand_env_vars};
use serde::Deserialize;
use tracing::{info, warn};

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    pub engine_base_url: String,
    pub chat_api_base_url: String,
    pub chat_bot_token: String,
    pub chat_guild_id: String,
    pub platform_name: String,
    pub command_prefix: String,
    pub games_category: String,
    pub history_window: usize,
    pub messages_config_path: Option<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            engine_base_url: "http://gridiron-engine:1212/api/v1".to_string(),
            chat_api_base_url: "https://discord.com/api/v10".to_string(),
            chat_bot_token: String::new(),
            chat_guild_id: String::new(),
            platform_name: "Discord".to_string(),
            command_prefix: "!".to_string(),
            games_category: "Games".to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            messages_config_path: None,
        }
    }
}

impl BotSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let chat_bot_token = env_string("CHAT_BOT_TOKEN")
            .context("CHAT_BOT_TOKEN must be set to talk to the chat platform")?;

        Ok(Self {
            engine_base_url: env_string("ENGINE_BASE_URL").unwrap_or(defaults.engine_base_url),
            chat_api_base_url: env_string("CHAT_API_BASE_URL")
                .unwrap_or(defaults.chat_api_base_url),
            chat_bot_token,
            chat_guild_id: env_string("CHAT_GUILD_ID").unwrap_or(defaults.chat_guild_id),
            platform_name: env_string("CHAT_PLATFORM_NAME").unwrap_or(defaults.platform_name),
            command_prefix: env_string("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),
            games_category: env_string("GAMES_CATEGORY").unwrap_or(defaults.games_category),
            history_window: parse_history_window(env_string("HISTORY_WINDOW").as_deref()),
            messages_config_path: env_string("MESSAGES_CONFIG_PATH"),
        })
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_history_window(raw: Option<&str>) -> usize {
    match raw {
        None => DEFAULT_HISTORY_WINDOW,
        Some(raw) => match raw.parse::<usize>() {
            Ok(window) => window.max(1),
            Err(error) => {
                warn!(value = %raw, error = %error, "invalid HISTORY_WINDOW; using default");
                DEFAULT_HISTORY_WINDOW
            }
        },
    }
}

/// User-facing wording. Every key may be overridden from YAML; `{name}`
/// placeholders are filled at send time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub game_created: String,
    pub game_start: String,
    pub coin_toss_result: String,
    pub coin_toss_choice: String,
    pub defense_kickoff: String,
    pub defense_normal: String,
    pub defense_point_after: String,
    pub offense_kickoff: String,
    pub offense_normal: String,
    pub offense_point_after: String,
    pub defense_ack: String,
    pub defense_ack_timeout: String,
    pub play_result: String,
    pub game_over: String,
    pub unexpected_error: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            game_created: "Started {away} at {home} in {thread}.".to_string(),
            game_start: "{away} at {home} is underway! {away_coach}, please call `heads` or `tails` for the coin toss.".to_string(),
            coin_toss_result: "{winner} wins the coin toss! {winner_coach}, do you want to `receive` or `defer`?".to_string(),
            coin_toss_choice: "{winner} elected to {choice}. {receiving} will receive the opening kickoff.".to_string(),
            defense_kickoff: "{offense} is kicking off to {defense}. Please submit your number for the kickoff return.".to_string(),
            defense_normal: "{offense} has the ball against {defense}. Please submit your defensive number.".to_string(),
            defense_point_after: "{offense} is going for the point after against {defense}. Please submit your number.".to_string(),
            offense_kickoff: "{offense}, {defense} has submitted their number. Please reply with your number and `normal`, `onside` or `squib`.".to_string(),
            offense_normal: "{offense}, {defense} has submitted their number. Please reply with your number and `run`, `pass`, `spike`, `kneel`, `field goal` or `punt`. Add `chew` or `hurry` to change the clock runoff, or `timeout` to call one.".to_string(),
            offense_point_after: "{offense}, {defense} has submitted their number. Please reply with your number and `pat` or `two point`.".to_string(),
            defense_ack: "I've got {number} as your number.".to_string(),
            defense_ack_timeout: "I've got {number} as your number. You have called a timeout.".to_string(),
            play_result: "{offense} called {play_call}: {result} for {yards} yards.\n{score}\n{down_distance} | :football: {spot} | Q{quarter} {clock}".to_string(),
            game_over: "That's the end of the game! {score}".to_string(),
            unexpected_error: "There was an issue {action}: {error}. Please contact an admin.".to_string(),
        }
    }
}

impl MessageTemplates {
    pub fn defense_prompt(&self, kind: PlayKind) -> &str {
        match kind {
            PlayKind::Kickoff => &self.defense_kickoff,
            PlayKind::Normal => &self.defense_normal,
            PlayKind::PointAfter => &self.defense_point_after,
        }
    }

    pub fn offense_prompt(&self, kind: PlayKind) -> &str {
        match kind {
            PlayKind::Kickoff => &self.offense_kickoff,
            PlayKind::Normal => &self.offense_normal,
            PlayKind::PointAfter => &self.offense_point_after,
        }
    }

    /// Load templates from a YAML file. A missing or unreadable file falls
    /// back to the built-in wording.
    pub fn load(path: Option<&str>) -> Self {
        let Some(path) = path.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::default();
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(path = %path, error = %error, "failed to read message templates file");
                return Self::default();
            }
        };
        if raw.trim().is_empty() {
            warn!(path = %path, "message templates file is empty");
            return Self::default();
        }

        match serde_yaml::from_str::<Self>(&expand_env_vars(&raw)) {
            Ok(templates) => {
                info!(path = %path, "loaded message templates");
                templates
            }
            Err(error) => {
                warn!(path = %path, error = %error, "failed to parse message templates yaml");
                Self::default()
            }
        }
    }
}
