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

use gridiron_common::InputError;
use thiserror::Error;

use crate::{chat::PlatformError, engine::EngineError};

/// Everything a message handler can fail with. Input errors are answered
/// in the originating conversation; the rest are reported as unexpected.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl DispatchError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(error) => error.kind(),
            Self::Engine(_) => "engine",
            Self::Platform(_) => "platform",
        }
    }
}
