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

use gridiron_common::{InputError, PromptRecord, SessionId, prompt::latest_prompt};
use tracing::debug;

use crate::{
    chat::{ChatPlatform, PlatformError},
    error::DispatchError,
};

/// Recovers the session a conversation belongs to from the prompts the bot
/// left in it. Read-only; the same history always yields the same answer.
pub struct ContextCorrelator<'a> {
    chat: &'a dyn ChatPlatform,
    window: usize,
}

impl<'a> ContextCorrelator<'a> {
    pub fn new(chat: &'a dyn ChatPlatform, window: usize) -> Self {
        Self {
            chat,
            window: window.max(1),
        }
    }

    /// Newest prompt within the window. The triggering message is fetched
    /// along with the window and skipped.
    pub async fn prompt_in(
        &self,
        conversation_id: &str,
        trigger_message_id: &str,
    ) -> Result<Option<PromptRecord>, PlatformError> {
        let history = self
            .chat
            .recent_history(conversation_id, self.window + 1)
            .await?;
        let record = latest_prompt(&history, trigger_message_id, self.window);
        debug!(
            conversation_id = %conversation_id,
            scanned = history.len(),
            session_id = record.as_ref().map(|record| record.session_id.as_str()),
            "scanned conversation for a prompt"
        );
        Ok(record)
    }

    pub async fn session_id_in(
        &self,
        conversation_id: &str,
        trigger_message_id: &str,
    ) -> Result<SessionId, DispatchError> {
        self.prompt_in(conversation_id, trigger_message_id)
            .await?
            .map(|record| record.session_id)
            .ok_or_else(|| InputError::session_not_found().into())
    }
}
