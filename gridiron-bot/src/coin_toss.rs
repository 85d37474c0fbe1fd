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

//! Coin toss: the away coach calls it, the winner chooses, then the
//! receiving side is asked for the opening kickoff number.

use anyhow::anyhow;
use gridiron_common::{
    CoinTossPhase, InputError, Session,
    parser::{parse_coin_call, parse_coin_choice},
    receiving_side,
    template::render,
    turn::is_waiting_on_user,
};
use tracing::info;

use crate::{
    chat::OutboundMessage, context::BotContext, engine::EngineError, error::DispatchError,
    router::IncomingMessage, submission,
};

pub async fn handle_call(
    ctx: &BotContext,
    message: &IncomingMessage,
    session: Session,
    text: &str,
) -> Result<(), DispatchError> {
    if CoinTossPhase::of(&session) != CoinTossPhase::AwaitingCall {
        return Err(InputError::turn("I am not waiting on a coin toss right now").into());
    }
    let matchup = ctx.matchup(&session).await?;
    if matchup.away.platform_tag != message.author.name {
        return Err(InputError::turn(format!(
            "Only the away coach, {}, may call the coin toss",
            matchup.away.username
        ))
        .into());
    }
    let call = parse_coin_call(text)?;

    let tossed = ctx
        .engine
        .run_coin_toss(&session.session_id, call)
        .await?;
    let winner = tossed.coin_toss_winner().ok_or_else(|| {
        EngineError::from(anyhow!(
            "coin toss for session {} returned no winner",
            session.session_id
        ))
    })?;
    let winner_coach = matchup.coach(winner);
    ctx.engine
        .set_waiting_on(&session.session_id, &winner_coach.username)
        .await?;
    info!(
        session_id = %session.session_id,
        call = call.token(),
        winner = %tossed.team(winner),
        "coin toss resolved"
    );

    let user = ctx.chat.resolve_user(&winner_coach.platform_tag).await?;
    let text = render(
        &ctx.templates.coin_toss_result,
        &[
            ("winner", tossed.team(winner)),
            ("winner_coach", ctx.chat.mention(&user.id).as_str()),
            ("call", call.token()),
        ],
    );
    ctx.chat
        .post_message(&message.conversation_id, &OutboundMessage::text(text))
        .await?;
    Ok(())
}

pub async fn handle_choice(
    ctx: &BotContext,
    message: &IncomingMessage,
    session: Session,
    text: &str,
) -> Result<(), DispatchError> {
    if CoinTossPhase::of(&session) != CoinTossPhase::AwaitingChoice {
        return Err(InputError::turn("I am not waiting on a coin toss choice right now").into());
    }
    let matchup = ctx.matchup(&session).await?;
    is_waiting_on_user(&session, &matchup, &message.author.name)?;
    let choice = parse_coin_choice(text)?;

    let chosen = ctx
        .engine
        .set_coin_toss_choice(&session.session_id, choice)
        .await?;
    let winner = chosen
        .coin_toss_winner()
        .or_else(|| session.coin_toss_winner())
        .ok_or_else(|| {
            EngineError::from(anyhow!(
                "session {} has a coin toss choice but no winner",
                session.session_id
            ))
        })?;
    let receiving = receiving_side(winner, choice);
    info!(
        session_id = %session.session_id,
        choice = choice.token(),
        receiving = %chosen.team(receiving),
        "coin toss choice made"
    );

    let text = render(
        &ctx.templates.coin_toss_choice,
        &[
            ("winner", chosen.team(winner)),
            ("choice", choice.token()),
            ("receiving", chosen.team(receiving)),
        ],
    );
    ctx.chat
        .post_message(&message.conversation_id, &OutboundMessage::text(text))
        .await?;

    // The receiving team defends the opening kickoff.
    submission::prompt_defense(ctx, &chosen, receiving).await
}
