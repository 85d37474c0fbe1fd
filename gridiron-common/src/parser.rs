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

//! Turns free-text coach messages into typed submissions.
//!
//! Matching is permissive about surrounding prose and strict about the token
//! set: the leftmost whole-word match wins and nothing else is inferred.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{InputError, MAX_PLAY_NUMBER, MIN_PLAY_NUMBER, PlayKind};

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]+\b").expect("number pattern is valid"));
static NORMAL_PLAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(run|pass|spike|kneel|field\s+goal|punt)\b")
        .expect("normal play pattern is valid")
});
static KICKOFF_PLAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(normal|onside|squib)\b").expect("kickoff play pattern is valid")
});
static POINT_AFTER_PLAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(two\s+point|pat)\b").expect("point after pattern is valid")
});
static RUNOFF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(chew|hurry)\b").expect("runoff pattern is valid"));
static TIMEOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btimeout\b").expect("timeout pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalPlay {
    Run,
    Pass,
    Spike,
    Kneel,
    FieldGoal,
    Punt,
}

impl NormalPlay {
    pub fn token(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Pass => "pass",
            Self::Spike => "spike",
            Self::Kneel => "kneel",
            Self::FieldGoal => "field goal",
            Self::Punt => "punt",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "run" => Some(Self::Run),
            "pass" => Some(Self::Pass),
            "spike" => Some(Self::Spike),
            "kneel" => Some(Self::Kneel),
            "field goal" => Some(Self::FieldGoal),
            "punt" => Some(Self::Punt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickoffPlay {
    Normal,
    Onside,
    Squib,
}

impl KickoffPlay {
    pub fn token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Onside => "onside",
            Self::Squib => "squib",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "normal" => Some(Self::Normal),
            "onside" => Some(Self::Onside),
            "squib" => Some(Self::Squib),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointAfterPlay {
    TwoPoint,
    Pat,
}

impl PointAfterPlay {
    pub fn token(self) -> &'static str {
        match self {
            Self::TwoPoint => "two point",
            Self::Pat => "pat",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "two point" => Some(Self::TwoPoint),
            "pat" => Some(Self::Pat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCall {
    Normal(NormalPlay),
    Kickoff(KickoffPlay),
    PointAfter(PointAfterPlay),
}

impl PlayCall {
    /// The play string the engine expects; kickoffs are prefixed.
    pub fn engine_token(self) -> String {
        match self {
            Self::Normal(play) => play.token().to_string(),
            Self::Kickoff(play) => format!("kickoff {}", play.token()),
            Self::PointAfter(play) => play.token().to_string(),
        }
    }

    pub fn kind(self) -> PlayKind {
        match self {
            Self::Normal(_) => PlayKind::Normal,
            Self::Kickoff(_) => PlayKind::Kickoff,
            Self::PointAfter(_) => PlayKind::PointAfter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunoffType {
    #[default]
    Normal,
    Chew,
    Hurry,
}

impl RunoffType {
    pub fn token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Chew => "chew",
            Self::Hurry => "hurry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinCall {
    Heads,
    Tails,
}

impl CoinCall {
    pub fn token(self) -> &'static str {
        match self {
            Self::Heads => "heads",
            Self::Tails => "tails",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinChoice {
    Receive,
    Defer,
}

impl CoinChoice {
    pub fn token(self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Defer => "defer",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "receive" => Some(Self::Receive),
            "defer" => Some(Self::Defer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseSubmission {
    pub number: u32,
    pub timeout_called: bool,
}

impl fmt::Display for DefenseSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if self.timeout_called {
            f.write_str(" timeout")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffenseSubmission {
    pub number: u32,
    pub play: PlayCall,
    pub runoff: RunoffType,
    pub offensive_timeout: bool,
    pub defensive_timeout: bool,
}

impl OffenseSubmission {
    /// A defensive timeout takes precedence: when it is set the offense's own
    /// timeout is dropped whatever its text said.
    pub fn with_defensive_timeout(self, called: bool) -> Self {
        Self {
            offensive_timeout: self.offensive_timeout && !called,
            defensive_timeout: called,
            ..self
        }
    }
}

/// Renders the submission the way a coach would type it. The defensive
/// timeout is not part of the offense's text and is not rendered.
impl fmt::Display for OffenseSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.play.engine_token())?;
        if self.runoff != RunoffType::Normal {
            write!(f, " {}", self.runoff.token())?;
        }
        if self.offensive_timeout {
            f.write_str(" timeout")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartParameters {
    pub season: u32,
    pub week: u32,
    pub subdivision: String,
    pub home_team: String,
    pub away_team: String,
    pub broadcast: String,
    pub start_time: String,
    pub location: String,
    pub scrimmage: bool,
}

impl StartParameters {
    pub fn thread_name(&self) -> String {
        let mut name = format!(
            "{} at {} S{} W{} {}",
            self.away_team, self.home_team, self.season, self.week, self.subdivision
        );
        if self.scrimmage {
            name.push_str(" (Scrimmage)");
        }
        name
    }
}

pub fn parse_number(text: &str) -> Result<u64, InputError> {
    NUMBER
        .find(text)
        .map(|found| found.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .ok_or_else(|| {
            InputError::parse("I could not find a valid number in your message, please try again")
        })
}

pub fn validate_number_range(number: u64) -> Result<u32, InputError> {
    u32::try_from(number)
        .ok()
        .filter(|number| (MIN_PLAY_NUMBER..=MAX_PLAY_NUMBER).contains(number))
        .ok_or_else(|| {
            InputError::validation(format!(
                "The number you submitted is not between {MIN_PLAY_NUMBER} and {MAX_PLAY_NUMBER}, please try again"
            ))
        })
}

fn first_token(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find(text).map(|found| {
        found
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase()
    })
}

pub fn parse_normal_play(text: &str) -> Result<NormalPlay, InputError> {
    first_token(&NORMAL_PLAY, text)
        .as_deref()
        .and_then(NormalPlay::from_token)
        .ok_or_else(|| {
            InputError::parse(
                "I could not find a valid play in your message, please select **run**, **pass**, \
                 **spike**, **kneel**, **field goal**, or **punt** and try again",
            )
        })
}

pub fn parse_kickoff_play(text: &str) -> Result<KickoffPlay, InputError> {
    first_token(&KICKOFF_PLAY, text)
        .as_deref()
        .and_then(KickoffPlay::from_token)
        .ok_or_else(|| {
            InputError::parse(
                "I could not find a valid play in your message, please select **normal**, \
                 **onside**, or **squib** and try again",
            )
        })
}

pub fn parse_point_after_play(text: &str) -> Result<PointAfterPlay, InputError> {
    first_token(&POINT_AFTER_PLAY, text)
        .as_deref()
        .and_then(PointAfterPlay::from_token)
        .ok_or_else(|| {
            InputError::parse(
                "I could not find a valid play in your message, please select **two point** or \
                 **pat** and try again",
            )
        })
}

pub fn parse_play(kind: PlayKind, text: &str) -> Result<PlayCall, InputError> {
    match kind {
        PlayKind::Normal => parse_normal_play(text).map(PlayCall::Normal),
        PlayKind::Kickoff => parse_kickoff_play(text).map(PlayCall::Kickoff),
        PlayKind::PointAfter => parse_point_after_play(text).map(PlayCall::PointAfter),
    }
}

pub fn parse_runoff_type(text: &str) -> RunoffType {
    match first_token(&RUNOFF, text).as_deref() {
        Some("chew") => RunoffType::Chew,
        Some("hurry") => RunoffType::Hurry,
        _ => RunoffType::Normal,
    }
}

pub fn parse_timeout_called(text: &str) -> bool {
    TIMEOUT.is_match(text)
}

pub fn parse_coin_call(text: &str) -> Result<CoinCall, InputError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "heads" => Ok(CoinCall::Heads),
        "tails" => Ok(CoinCall::Tails),
        _ => Err(InputError::validation(
            "Invalid coin toss call, please call **heads** or **tails**",
        )),
    }
}

pub fn parse_coin_choice(text: &str) -> Result<CoinChoice, InputError> {
    CoinChoice::from_token(text).ok_or_else(|| {
        InputError::validation("Invalid choice, please select **receive** or **defer**")
    })
}

pub fn parse_defense_submission(text: &str) -> Result<DefenseSubmission, InputError> {
    let number = validate_number_range(parse_number(text)?)?;
    Ok(DefenseSubmission {
        number,
        timeout_called: parse_timeout_called(text),
    })
}

pub fn parse_offense_submission(kind: PlayKind, text: &str) -> Result<OffenseSubmission, InputError> {
    let number = validate_number_range(parse_number(text)?)?;
    let play = parse_play(kind, text)?;
    Ok(OffenseSubmission {
        number,
        play,
        runoff: parse_runoff_type(text),
        offensive_timeout: parse_timeout_called(text),
        defensive_timeout: false,
    })
}

const START_USAGE: &str = "Error parsing parameters for the start command. Expected \
     [season, week, subdivision, home team, away team, broadcast, start time, location, scrimmage]";

pub fn parse_start_parameters(text: &str) -> Result<StartParameters, InputError> {
    let inner = text
        .split_once('[')
        .and_then(|(_, rest)| rest.split_once(']'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| InputError::parse(START_USAGE))?;

    let parameters: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [
        season,
        week,
        subdivision,
        home_team,
        away_team,
        broadcast,
        start_time,
        location,
        scrimmage,
    ] = parameters.as_slice()
    else {
        return Err(InputError::validation(format!(
            "{START_USAGE}, got {} parameters",
            parameters.len()
        )));
    };

    if parameters.iter().any(|value| value.is_empty()) {
        return Err(InputError::validation(format!(
            "{START_USAGE}, every parameter must be filled in"
        )));
    }

    let season = season
        .parse::<u32>()
        .map_err(|_| InputError::validation(format!("Season must be a number, got {season}")))?;
    let week = week
        .parse::<u32>()
        .map_err(|_| InputError::validation(format!("Week must be a number, got {week}")))?;
    let scrimmage = match scrimmage.to_ascii_lowercase().as_str() {
        "yes" => true,
        "no" => false,
        _ => {
            return Err(InputError::validation(
                "Error parsing scrimmage parameter. Expected **yes** or **no**.",
            ));
        }
    };

    Ok(StartParameters {
        season,
        week,
        subdivision: subdivision.to_string(),
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        broadcast: broadcast.to_string(),
        start_time: start_time.to_string(),
        location: location.to_string(),
        scrimmage,
    })
}
