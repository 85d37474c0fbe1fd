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

pub mod coin_toss;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod template;
pub mod turn;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use coin_toss::{CoinTossPhase, receiving_side};
pub use error::InputError;
pub use parser::{
    CoinCall, CoinChoice, DefenseSubmission, KickoffPlay, NormalPlay, OffenseSubmission, PlayCall,
    PointAfterPlay, RunoffType, StartParameters,
};
pub use prompt::{ChatAuthor, ChatMessage, Embed, EmbedField, PromptRecord};

pub const MIN_PLAY_NUMBER: u32 = 1;
pub const MAX_PLAY_NUMBER: u32 = 1500;
pub const DEFAULT_HISTORY_WINDOW: usize = 25;

pub type SessionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "HOME", alias = "Home")]
    Home,
    #[serde(alias = "AWAY", alias = "Away")]
    Away,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlayKind {
    #[serde(rename = "KICKOFF")]
    Kickoff,
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "POINT AFTER", alias = "POINT_AFTER")]
    PointAfter,
}

impl PlayKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Kickoff => "Kickoff",
            Self::Normal => "Normal",
            Self::PointAfter => "Point After",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "kickoff" => Some(Self::Kickoff),
            "normal" => Some(Self::Normal),
            "point after" => Some(Self::PointAfter),
            _ => None,
        }
    }
}

/// Where one side of a session is being played: a platform name plus the
/// platform's own id for the conversation (a game thread id on chat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformBinding<'a> {
    pub platform: &'a str,
    pub location_id: &'a str,
}

impl PlatformBinding<'_> {
    pub fn is_platform(&self, platform: &str) -> bool {
        self.platform.eq_ignore_ascii_case(platform)
    }
}

/// Request-scoped copy of a game owned by the engine. Never cached between
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "gameId", deserialize_with = "loose_id")]
    pub session_id: SessionId,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_score: u32,
    #[serde(default)]
    pub away_score: u32,
    pub possession: Side,
    #[serde(default)]
    pub waiting_on: Option<String>,
    #[serde(rename = "currentPlayType")]
    pub current_play_kind: PlayKind,
    #[serde(default, deserialize_with = "optional_loose_id")]
    pub current_play_id: Option<String>,
    #[serde(default)]
    pub down: u8,
    #[serde(default)]
    pub yards_to_go: u32,
    #[serde(default)]
    pub ball_location: u8,
    #[serde(default)]
    pub quarter: u8,
    #[serde(default)]
    pub clock: String,
    #[serde(default)]
    pub coin_toss_winner: Option<String>,
    #[serde(default)]
    pub coin_toss_choice: Option<String>,
    #[serde(default)]
    pub game_timer: Option<String>,
    #[serde(default)]
    pub home_platform: String,
    #[serde(default, deserialize_with = "loose_id_or_empty")]
    pub home_platform_id: String,
    #[serde(default)]
    pub away_platform: String,
    #[serde(default, deserialize_with = "loose_id_or_empty")]
    pub away_platform_id: String,
}

impl Session {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn side_of_team(&self, team: &str) -> Option<Side> {
        if team.eq_ignore_ascii_case(&self.home_team) {
            Some(Side::Home)
        } else if team.eq_ignore_ascii_case(&self.away_team) {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    pub fn binding(&self, side: Side) -> PlatformBinding<'_> {
        match side {
            Side::Home => PlatformBinding {
                platform: &self.home_platform,
                location_id: &self.home_platform_id,
            },
            Side::Away => PlatformBinding {
                platform: &self.away_platform,
                location_id: &self.away_platform_id,
            },
        }
    }

    /// First side (home, then away) bound to `platform`.
    pub fn binding_on(&self, platform: &str) -> Option<PlatformBinding<'_>> {
        [Side::Home, Side::Away]
            .into_iter()
            .map(|side| self.binding(side))
            .find(|binding| binding.is_platform(platform) && !binding.location_id.is_empty())
    }

    pub fn has_coin_toss_winner(&self) -> bool {
        present(self.coin_toss_winner.as_deref()).is_some()
    }

    /// The engine reports the winner as a team name; `home`/`away` are also
    /// accepted.
    pub fn coin_toss_winner(&self) -> Option<Side> {
        let raw = present(self.coin_toss_winner.as_deref())?;
        match raw.to_ascii_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => self.side_of_team(raw),
        }
    }

    pub fn has_coin_toss_choice(&self) -> bool {
        present(self.coin_toss_choice.as_deref()).is_some()
    }

    pub fn coin_toss_choice(&self) -> Option<CoinChoice> {
        present(self.coin_toss_choice.as_deref()).and_then(CoinChoice::from_token)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("none"))
}

/// A coach as the engine knows them, looked up by team per operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Coach {
    #[serde(default)]
    pub team: String,
    pub username: String,
    #[serde(rename = "discordTag", alias = "platformTag")]
    pub platform_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub home: Coach,
    pub away: Coach,
}

impl Matchup {
    pub fn coach(&self, side: Side) -> &Coach {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn coach_by_username(&self, username: &str) -> Option<(Side, &Coach)> {
        [Side::Home, Side::Away]
            .into_iter()
            .map(|side| (side, self.coach(side)))
            .find(|(_, coach)| coach.username == username)
    }

    pub fn side_of_tag(&self, platform_tag: &str) -> Option<Side> {
        [Side::Home, Side::Away]
            .into_iter()
            .find(|side| self.coach(*side).platform_tag == platform_tag)
    }
}

/// The engine's resolution of an offensive submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayOutcome {
    #[serde(default)]
    pub play_call: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub yards: Option<i32>,
    pub possession: Side,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_score: u32,
    #[serde(default)]
    pub away_score: u32,
    #[serde(default)]
    pub down: u8,
    #[serde(default)]
    pub yards_to_go: u32,
    #[serde(default)]
    pub ball_location: u8,
    #[serde(default)]
    pub quarter: u8,
    #[serde(default)]
    pub clock: String,
    #[serde(default)]
    pub game_status: Option<String>,
}

impl PlayOutcome {
    pub fn is_final(&self) -> bool {
        self.game_status
            .as_deref()
            .map(|status| status.trim().eq_ignore_ascii_case("final"))
            .unwrap_or(false)
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// The side that submits the next defensive number.
    pub fn next_defense(&self) -> Side {
        self.possession.opponent()
    }
}

/// Everything the engine needs to open a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSessionRequest {
    pub parameters: StartParameters,
    pub platform: String,
    pub home_location_id: String,
    pub away_location_id: String,
}

fn loose_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LooseId::deserialize(deserializer)?.into_string())
}

fn optional_loose_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseId>::deserialize(deserializer)?.map(LooseId::into_string))
}

fn loose_id_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_loose_id(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Text(String),
    Number(i64),
}

impl LooseId {
    fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn session() -> Session {
        Session {
            session_id: "g-100".to_string(),
            home_team: "Ohio State".to_string(),
            away_team: "Michigan".to_string(),
            home_score: 7,
            away_score: 3,
            possession: Side::Home,
            waiting_on: Some("away_coach".to_string()),
            current_play_kind: PlayKind::Normal,
            current_play_id: Some("p-9".to_string()),
            down: 2,
            yards_to_go: 7,
            ball_location: 35,
            quarter: 2,
            clock: "7:00".to_string(),
            coin_toss_winner: Some("Michigan".to_string()),
            coin_toss_choice: Some("defer".to_string()),
            game_timer: Some("10/19 21:00".to_string()),
            home_platform: "Discord".to_string(),
            home_platform_id: "thread-1".to_string(),
            away_platform: "Discord".to_string(),
            away_platform_id: "thread-1".to_string(),
        }
    }

    pub fn matchup() -> Matchup {
        Matchup {
            home: Coach {
                team: "Ohio State".to_string(),
                username: "home_coach".to_string(),
                platform_tag: "buckeye".to_string(),
            },
            away: Coach {
                team: "Michigan".to_string(),
                username: "away_coach".to_string(),
                platform_tag: "wolverine".to_string(),
            },
        }
    }
}
