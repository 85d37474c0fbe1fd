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

use std::sync::Arc;

use gridiron_common::{Matchup, Session};

use crate::{
    chat::ChatPlatform,
    config::{BotSettings, MessageTemplates},
    correlator::ContextCorrelator,
    engine::{EngineError, GameEngine},
};

/// Dependencies every handler runs against. Cloned per event; holds no
/// session state of its own.
#[derive(Clone)]
pub struct BotContext {
    pub engine: Arc<dyn GameEngine>,
    pub chat: Arc<dyn ChatPlatform>,
    pub templates: Arc<MessageTemplates>,
    pub settings: Arc<BotSettings>,
}

impl BotContext {
    /// Both coaches of `session`, fetched fresh from the engine.
    pub async fn matchup(&self, session: &Session) -> Result<Matchup, EngineError> {
        let (home, away) = tokio::try_join!(
            self.engine.coach_by_team(&session.home_team),
            self.engine.coach_by_team(&session.away_team),
        )?;
        Ok(Matchup { home, away })
    }

    pub fn correlator(&self) -> ContextCorrelator<'_> {
        ContextCorrelator::new(self.chat.as_ref(), self.settings.history_window)
    }

    pub fn on_this_platform(&self, platform: &str) -> bool {
        platform.eq_ignore_ascii_case(self.chat.platform_name())
    }
}
