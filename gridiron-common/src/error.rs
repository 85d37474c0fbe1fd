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

use thiserror::Error;

/// Failures that are answered in the originating conversation and never
/// touch the engine. The message is the user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Turn(String),
    #[error("{0}")]
    SessionNotFound(String),
}

impl InputError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn turn(message: impl Into<String>) -> Self {
        Self::Turn(message.into())
    }

    pub fn session_not_found() -> Self {
        Self::SessionNotFound(
            "Could not find a valid game id in previous messages, are you sure you are in a game?"
                .to_string(),
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
            Self::Turn(_) => "turn",
            Self::SessionNotFound(_) => "session_not_found",
        }
    }
}
