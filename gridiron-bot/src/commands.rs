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

use gridiron_common::{
    Embed, InputError, Session, StartParameters, StartSessionRequest,
    parser::parse_start_parameters, template::render,
};
use tracing::{error, info, warn};

use crate::{
    chat::{Conversation, OutboundMessage},
    coin_toss,
    context::BotContext,
    error::DispatchError,
    router::{ConversationKind, IncomingMessage},
};

const START_EXAMPLE: &str =
    "[2026, 7, FBS, Ohio State, Michigan, ABC, 12:00 PM ET, Ohio Stadium, no]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Help,
    Start(&'a str),
    Delete,
    Coin(&'a str),
    Choice(&'a str),
}

impl<'a> Command<'a> {
    /// `rest` is the message with the command prefix removed. Unknown
    /// commands yield `None`.
    pub fn parse(rest: &'a str) -> Option<Self> {
        let rest = rest.trim_start();
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest.trim_end(), ""),
        };
        match name.to_ascii_lowercase().as_str() {
            "help" => Some(Self::Help),
            "start" => Some(Self::Start(args)),
            "delete" => Some(Self::Delete),
            "coin" => Some(Self::Coin(args)),
            "choice" => Some(Self::Choice(args)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Start(_) => "start",
            Self::Delete => "delete",
            Self::Coin(_) => "coin",
            Self::Choice(_) => "choice",
        }
    }
}

pub fn strip_prefix<'a>(prefix: &str, content: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    content.trim_start().strip_prefix(prefix)
}

pub async fn run(
    ctx: &BotContext,
    message: &IncomingMessage,
    command: Command<'_>,
) -> Result<(), DispatchError> {
    info!(command = command.name(), author = %message.author.name, "running command");
    match command {
        Command::Help => help(ctx, message).await,
        Command::Start(args) => start(ctx, message, args).await,
        Command::Delete => delete(ctx, message).await,
        Command::Coin(args) => {
            let session = game_in_thread(ctx, message).await?;
            coin_toss::handle_call(ctx, message, session, args).await
        }
        Command::Choice(args) => {
            let session = game_in_thread(ctx, message).await?;
            coin_toss::handle_choice(ctx, message, session, args).await
        }
    }
}

fn help_embed(prefix: &str) -> Embed {
    Embed::titled("Gridiron Bot Commands")
        .field(format!("{prefix}help"), "Show this message", false)
        .field(
            format!("{prefix}start"),
            "Start a game in a new thread. Parameters: [season, week, subdivision, home team, \
             away team, broadcast, start time, location, scrimmage (yes/no)]",
            false,
        )
        .field(format!("{prefix}delete"), "Delete the game in this thread", false)
        .field(
            format!("{prefix}coin <heads|tails>"),
            "Call the coin toss (away coach)",
            false,
        )
        .field(
            format!("{prefix}choice <receive|defer>"),
            "Choose after winning the coin toss",
            false,
        )
        .field("Example", format!("{prefix}start {START_EXAMPLE}"), false)
}

async fn help(ctx: &BotContext, message: &IncomingMessage) -> Result<(), DispatchError> {
    ctx.chat
        .post_message(
            &message.conversation_id,
            &OutboundMessage::with_embed("", help_embed(&ctx.settings.command_prefix)),
        )
        .await?;
    Ok(())
}

async fn start(
    ctx: &BotContext,
    message: &IncomingMessage,
    args: &str,
) -> Result<(), DispatchError> {
    let parameters = parse_start_parameters(args)?;
    let thread = ctx
        .chat
        .create_thread(&ctx.settings.games_category, &parameters.thread_name())
        .await?;

    match open_game(ctx, &thread, parameters).await {
        Ok(session) => {
            let text = render(
                &ctx.templates.game_created,
                &[
                    ("home", session.home_team.as_str()),
                    ("away", session.away_team.as_str()),
                    ("thread", thread.name.as_str()),
                ],
            );
            ctx.chat
                .post_message(&message.conversation_id, &OutboundMessage::text(text))
                .await?;
            Ok(())
        }
        Err(failure) => {
            warn!(thread_id = %thread.id, error = %failure, "game start failed; removing thread");
            if let Err(cleanup) = ctx.chat.delete_conversation(&thread.id).await {
                error!(thread_id = %thread.id, error = %cleanup, "failed to remove game thread");
            }
            Err(failure)
        }
    }
}

/// Start the session bound to `thread`. A session the engine already
/// created is deleted again if announcing it fails.
async fn open_game(
    ctx: &BotContext,
    thread: &Conversation,
    parameters: StartParameters,
) -> Result<Session, DispatchError> {
    let request = StartSessionRequest {
        parameters,
        platform: ctx.chat.platform_name().to_string(),
        home_location_id: thread.id.clone(),
        away_location_id: thread.id.clone(),
    };
    let session = ctx.engine.start_session(&request).await?;

    match announce_game(ctx, thread, &session).await {
        Ok(()) => Ok(session),
        Err(failure) => {
            warn!(session_id = %session.session_id, error = %failure, "game announcement failed; removing session");
            if let Err(cleanup) = ctx.engine.delete_session(&session.session_id).await {
                error!(session_id = %session.session_id, error = %cleanup, "failed to remove game session");
            }
            Err(failure)
        }
    }
}

async fn announce_game(
    ctx: &BotContext,
    thread: &Conversation,
    session: &Session,
) -> Result<(), DispatchError> {
    let matchup = ctx.matchup(session).await?;
    ctx.engine
        .set_waiting_on(&session.session_id, &matchup.away.username)
        .await?;
    let away = ctx.chat.resolve_user(&matchup.away.platform_tag).await?;

    let text = render(
        &ctx.templates.game_start,
        &[
            ("home", session.home_team.as_str()),
            ("away", session.away_team.as_str()),
            ("away_coach", ctx.chat.mention(&away.id).as_str()),
        ],
    );
    ctx.chat
        .post_message(&thread.id, &OutboundMessage::text(text))
        .await?;
    info!(session_id = %session.session_id, thread_id = %thread.id, "game started");
    Ok(())
}

/// The session bound to the conversation the command was sent in.
async fn game_in_thread(
    ctx: &BotContext,
    message: &IncomingMessage,
) -> Result<Session, DispatchError> {
    let outside = || InputError::validation("This command can only be used in a game thread");
    if message.conversation_kind == ConversationKind::Private {
        return Err(outside().into());
    }
    ctx.engine
        .session_by_thread(ctx.chat.platform_name(), &message.conversation_id)
        .await?
        .ok_or_else(|| outside().into())
}
