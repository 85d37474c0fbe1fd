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

//! The prompt marker: a structured embed the bot attaches to every number
//! request so later messages in the same conversation can be tied back to a
//! session without any local state.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{MAX_PLAY_NUMBER, MIN_PLAY_NUMBER, PlayKind, Session, SessionId};

pub const PROMPT_TITLE: &str = "Submit a Number";
pub const PROMPT_COLOR: u32 = 0x2ecc71;

const STATUS_FIELD: &str = "Status";
const INSTRUCTIONS_FIELD: &str = "Instructions";
const PLAY_FIELD: &str = "Play";
const TIMEOUT_FIELD: &str = "Timeout";
const DEADLINE_FIELD: &str = "Deadline";

static SESSION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*Game ID: ([^*]+)\*\*").expect("session marker pattern is valid")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            color: Some(PROMPT_COLOR),
            ..Self::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatAuthor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

/// One message from a conversation's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub author: ChatAuthor,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub sent_at: DateTime<Utc>,
}

/// What a previously issued prompt tells us: the session it belongs to, the
/// kind of play it asked a number for, and whether the defense called a
/// timeout before it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub session_id: SessionId,
    pub play_kind: Option<PlayKind>,
    pub timeout_called: bool,
}

impl PromptRecord {
    pub fn decode(embed: &Embed) -> Option<Self> {
        if embed.title.as_deref() != Some(PROMPT_TITLE) {
            return None;
        }
        let description = embed.description.as_deref()?;
        let session_id = SESSION_MARKER
            .captures(description)?
            .get(1)?
            .as_str()
            .trim()
            .to_string();
        if session_id.is_empty() {
            return None;
        }

        Some(Self {
            session_id,
            play_kind: embed.field_value(PLAY_FIELD).and_then(PlayKind::from_label),
            timeout_called: embed.has_field(TIMEOUT_FIELD),
        })
    }
}

/// First prompt among the `window` most recent messages before the one
/// that triggered the scan, newest first, ignoring anything not sent by a
/// bot.
pub fn latest_prompt(
    history: &[ChatMessage],
    trigger_message_id: &str,
    window: usize,
) -> Option<PromptRecord> {
    let mut recent: Vec<&ChatMessage> = history
        .iter()
        .filter(|message| message.id != trigger_message_id)
        .collect();
    recent.sort_by(|left, right| right.sent_at.cmp(&left.sent_at));
    recent
        .into_iter()
        .take(window.max(1))
        .filter(|message| message.author.bot)
        .find_map(|message| message.embeds.iter().find_map(PromptRecord::decode))
}

pub fn number_request_embed(session: &Session, defense_timeout: bool) -> Embed {
    let mut embed = Embed {
        description: Some(format!("**Game ID: {}**", session.session_id)),
        ..Embed::titled(PROMPT_TITLE)
    }
    .field(STATUS_FIELD, status_line(session), false)
    .field(
        INSTRUCTIONS_FIELD,
        format!(
            "Please submit a number between **{MIN_PLAY_NUMBER}** and **{MAX_PLAY_NUMBER}**, inclusive"
        ),
        false,
    )
    .field(PLAY_FIELD, session.current_play_kind.label(), true);

    if defense_timeout {
        embed = embed.field(TIMEOUT_FIELD, "The defense has called a timeout", false);
    }
    if let Some(timer) = session.game_timer.as_deref().filter(|timer| !timer.is_empty()) {
        embed = embed.field(
            DEADLINE_FIELD,
            format!("You have until {timer} to submit a number"),
            false,
        );
    }
    embed
}

pub fn score_line(home_team: &str, away_team: &str, home_score: u32, away_score: u32) -> String {
    if home_score > away_score {
        format!("{home_team} leads {away_team} {home_score}-{away_score}")
    } else if away_score > home_score {
        format!("{away_team} leads {home_team} {away_score}-{home_score}")
    } else {
        format!("{home_team} and {away_team} are tied {home_score}-{away_score}")
    }
}

pub fn down_and_distance(down: u8, yards_to_go: u32) -> String {
    let suffix = match down {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{down}{suffix} and {yards_to_go}")
}

/// Ball spot as read from the sideline: past midfield it is counted from
/// the opponent's goal line.
pub fn ball_spot(possessing_team: &str, defending_team: &str, ball_location: u8) -> String {
    if ball_location > 50 {
        format!("{defending_team} {}", 100u8.saturating_sub(ball_location))
    } else {
        format!("{possessing_team} {ball_location}")
    }
}

pub fn status_line(session: &Session) -> String {
    let possessing = session.possession;
    format!(
        "{}\nQ{} | {} | {} | :football: {}",
        score_line(
            &session.home_team,
            &session.away_team,
            session.home_score,
            session.away_score
        ),
        session.quarter,
        session.clock,
        down_and_distance(session.down, session.yards_to_go),
        ball_spot(
            session.team(possessing),
            session.team(possessing.opponent()),
            session.ball_location
        ),
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::fixtures::session;

    fn message(id: &str, minute: u32, bot: bool, embeds: Vec<Embed>) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            author: ChatAuthor {
                id: if bot { "bot" } else { "coach" }.to_string(),
                name: if bot { "gridiron" } else { "wolverine" }.to_string(),
                bot,
            },
            content: String::new(),
            embeds,
            sent_at: Utc.with_ymd_and_hms(2026, 10, 19, 20, minute, 0).unwrap(),
        }
    }

    fn prompt_for(session_id: &str, timeout: bool) -> Embed {
        let mut session = session();
        session.session_id = session_id.to_string();
        number_request_embed(&session, timeout)
    }

    #[test]
    fn prompt_embed_decodes_to_its_session() {
        let embed = prompt_for("g-100", true);
        let record = PromptRecord::decode(&embed).unwrap();
        assert_eq!(record.session_id, "g-100");
        assert_eq!(record.play_kind, Some(PlayKind::Normal));
        assert!(record.timeout_called);
        assert!(embed.field_value(DEADLINE_FIELD).is_some());
    }

    #[test]
    fn unrelated_embeds_do_not_decode() {
        let embed = Embed::titled("Commands").field("Command", "start", true);
        assert!(PromptRecord::decode(&embed).is_none());

        let mut missing_marker = prompt_for("g-1", false);
        missing_marker.description = Some("no marker".to_string());
        assert!(PromptRecord::decode(&missing_marker).is_none());
    }

    #[test]
    fn latest_prompt_scans_newest_first() {
        let history = vec![
            message("1", 1, true, vec![prompt_for("old", false)]),
            message("3", 3, true, vec![prompt_for("new", false)]),
            message("2", 2, false, vec![]),
        ];
        let record = latest_prompt(&history, "trigger", 10).unwrap();
        assert_eq!(record.session_id, "new");
    }

    #[test]
    fn latest_prompt_skips_trigger_and_human_messages() {
        let history = vec![
            message("1", 1, true, vec![prompt_for("mine", false)]),
            message("2", 2, false, vec![prompt_for("forged", false)]),
            message("3", 3, true, vec![prompt_for("trigger-echo", false)]),
        ];
        let record = latest_prompt(&history, "3", 10).unwrap();
        assert_eq!(record.session_id, "mine");
    }

    #[test]
    fn latest_prompt_respects_the_window() {
        let history = vec![
            message("1", 1, true, vec![prompt_for("too-old", false)]),
            message("2", 2, true, vec![]),
            message("3", 3, false, vec![]),
        ];
        assert!(latest_prompt(&history, "x", 2).is_none());
        assert_eq!(
            latest_prompt(&history, "x", 3).unwrap().session_id,
            "too-old"
        );
    }

    #[test]
    fn trigger_does_not_use_up_the_window() {
        let history = vec![
            message("1", 1, true, vec![prompt_for("g-5", false)]),
            message("2", 2, false, vec![]),
        ];
        assert_eq!(latest_prompt(&history, "2", 1).unwrap().session_id, "g-5");
    }

    #[test]
    fn latest_prompt_is_idempotent() {
        let history = vec![message("1", 1, true, vec![prompt_for("g-7", false)])];
        assert_eq!(
            latest_prompt(&history, "x", 5),
            latest_prompt(&history, "x", 5)
        );
    }

    #[test]
    fn status_line_reads_from_the_possessing_side() {
        let mut session = session();
        assert_eq!(
            status_line(&session),
            "Ohio State leads Michigan 7-3\nQ2 | 7:00 | 2nd and 7 | :football: Ohio State 35"
        );

        session.ball_location = 80;
        session.home_score = 3;
        session.down = 4;
        assert!(status_line(&session).ends_with("4th and 7 | :football: Michigan 20"));
        assert!(status_line(&session).starts_with("Ohio State and Michigan are tied 3-3"));
    }

    #[test]
    fn away_leader_is_named_first() {
        assert_eq!(score_line("A", "B", 3, 10), "B leads A 10-3");
    }
}
