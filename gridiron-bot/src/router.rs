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

use chrono::{DateTime, Utc};
use gridiron_common::{
    ChatAuthor, CoinTossPhase,
    parser::{parse_coin_call, parse_coin_choice},
    template::render,
};
use serde::Deserialize;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::{
    chat::OutboundMessage,
    coin_toss,
    commands::{self, Command},
    context::BotContext,
    error::DispatchError,
    submission,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Thread,
    Channel,
}

/// A chat message relayed from the platform gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub message_id: String,
    pub conversation_id: String,
    pub conversation_kind: ConversationKind,
    pub author: ChatAuthor,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Handle one incoming message to completion. Failures are reported back
/// into the conversation the message came from.
pub async fn dispatch_message(ctx: &BotContext, message: &IncomingMessage) {
    if message.author.bot {
        debug!(message_id = %message.message_id, "ignoring bot-authored message");
        return;
    }

    let span = info_span!(
        "dispatch",
        dispatch_id = %Uuid::new_v4(),
        conversation_id = %message.conversation_id,
        author = %message.author.name,
        sent_at = ?message.sent_at,
    );
    async {
        if let Err(failure) = route(ctx, message).await {
            report_failure(ctx, message, &failure).await;
        }
    }
    .instrument(span)
    .await
}

async fn route(ctx: &BotContext, message: &IncomingMessage) -> Result<(), DispatchError> {
    if let Some(rest) = commands::strip_prefix(&ctx.settings.command_prefix, &message.content) {
        return match Command::parse(rest) {
            Some(command) => commands::run(ctx, message, command).await,
            None => {
                debug!(content = %message.content, "ignoring unknown command");
                Ok(())
            }
        };
    }

    if message.conversation_kind == ConversationKind::Private {
        return submission::handle_defense(ctx, message).await;
    }

    let Some(session) = ctx
        .engine
        .session_by_thread(ctx.chat.platform_name(), &message.conversation_id)
        .await?
    else {
        debug!("no game in this conversation");
        return Ok(());
    };

    // Coin words go to the coin toss in every phase so an out-of-turn call
    // gets the coin toss answer instead of being read as a play.
    let text = message.content.as_str();
    if parse_coin_call(text).is_ok() {
        return coin_toss::handle_call(ctx, message, session, text).await;
    }
    if parse_coin_choice(text).is_ok() {
        return coin_toss::handle_choice(ctx, message, session, text).await;
    }
    match CoinTossPhase::of(&session) {
        CoinTossPhase::Resolved => submission::handle_offense(ctx, message, session).await,
        phase => {
            debug!(?phase, "ignoring chatter during the coin toss");
            Ok(())
        }
    }
}

async fn report_failure(ctx: &BotContext, message: &IncomingMessage, failure: &DispatchError) {
    let reply = if failure.is_recoverable() {
        warn!(kind = failure.kind(), error = %failure, "rejected message");
        failure.to_string()
    } else {
        error!(kind = failure.kind(), error = %failure, "failed to handle message");
        render(
            &ctx.templates.unexpected_error,
            &[
                ("action", "handling your message"),
                ("error", failure.to_string().as_str()),
            ],
        )
    };

    if let Err(post_error) = ctx
        .chat
        .post_message(&message.conversation_id, &OutboundMessage::text(reply))
        .await
    {
        error!(error = %post_error, "failed to report error to the conversation");
    }
}
