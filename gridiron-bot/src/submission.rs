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

//! Number-submission sub-protocol: the defense answers privately, the
//! offense answers in the game thread, the engine resolves the play.

use anyhow::anyhow;
use gridiron_common::{
    InputError, Matchup, OffenseSubmission, PlayOutcome, Session, Side,
    parser::{parse_defense_submission, parse_offense_submission},
    prompt::{ball_spot, down_and_distance, number_request_embed, score_line},
    template::render,
    turn::{has_possession, is_waiting_on_user, lacks_possession},
};
use tracing::info;

use crate::{
    chat::OutboundMessage,
    context::BotContext,
    engine::EngineError,
    error::DispatchError,
    router::IncomingMessage,
};

/// A private message from the defense. The session comes from the last
/// prompt the bot sent into this conversation.
pub async fn handle_defense(
    ctx: &BotContext,
    message: &IncomingMessage,
) -> Result<(), DispatchError> {
    let session_id = ctx
        .correlator()
        .session_id_in(&message.conversation_id, &message.message_id)
        .await?;
    let session = ctx
        .engine
        .session_by_id(&session_id)
        .await?
        .ok_or_else(InputError::session_not_found)?;
    let matchup = ctx.matchup(&session).await?;

    is_waiting_on_user(&session, &matchup, &message.author.name)?;
    lacks_possession(&session, &matchup, &message.author.name)?;
    let submission = parse_defense_submission(&message.content)?;

    ctx.engine
        .submit_defense(&session.session_id, &submission)
        .await?;
    let offense = matchup.coach(session.possession);
    ctx.engine
        .set_waiting_on(&session.session_id, &offense.username)
        .await?;
    info!(
        session_id = %session.session_id,
        submission = %submission,
        waiting_on = %offense.username,
        "defensive number accepted"
    );

    let ack = if submission.timeout_called {
        &ctx.templates.defense_ack_timeout
    } else {
        &ctx.templates.defense_ack
    };
    let number = submission.number.to_string();
    ctx.chat
        .post_message(
            &message.conversation_id,
            &OutboundMessage::text(render(ack, &[("number", number.as_str())])),
        )
        .await?;

    prompt_offense(ctx, &session, &matchup, submission.timeout_called).await
}

/// Ask the possessing coach for their number in the game thread.
pub async fn prompt_offense(
    ctx: &BotContext,
    session: &Session,
    matchup: &Matchup,
    defense_timeout: bool,
) -> Result<(), DispatchError> {
    let offense_side = session.possession;
    let binding = session.binding(offense_side);
    if !ctx.on_this_platform(binding.platform) || binding.location_id.is_empty() {
        info!(
            session_id = %session.session_id,
            platform = %binding.platform,
            "offense plays elsewhere; not prompting"
        );
        return Ok(());
    }

    let thread = ctx.chat.resolve_conversation(binding.location_id).await?;
    let (offense, defense) = tokio::try_join!(
        ctx.chat
            .resolve_user(&matchup.coach(offense_side).platform_tag),
        ctx.chat
            .resolve_user(&matchup.coach(offense_side.opponent()).platform_tag),
    )?;
    let text = render(
        ctx.templates.offense_prompt(session.current_play_kind),
        &[
            ("offense", ctx.chat.mention(&offense.id).as_str()),
            ("defense", ctx.chat.mention(&defense.id).as_str()),
        ],
    );
    ctx.chat
        .post_message(
            &thread.id,
            &OutboundMessage::with_embed(text, number_request_embed(session, defense_timeout)),
        )
        .await?;
    info!(
        session_id = %session.session_id,
        thread_id = %thread.id,
        play_kind = session.current_play_kind.label(),
        defense_timeout,
        "offense prompted"
    );
    Ok(())
}

/// A message from the possessing coach in the game thread.
pub async fn handle_offense(
    ctx: &BotContext,
    message: &IncomingMessage,
    session: Session,
) -> Result<(), DispatchError> {
    let matchup = ctx.matchup(&session).await?;
    is_waiting_on_user(&session, &matchup, &message.author.name)?;
    has_possession(&session, &matchup, &message.author.name)?;
    let submission = parse_offense_submission(session.current_play_kind, &message.content)?;

    // The defense's timeout lives on our own last prompt, not in the offense's text.
    let defense_timeout = ctx
        .correlator()
        .prompt_in(&message.conversation_id, &message.message_id)
        .await?
        .filter(|record| record.session_id == session.session_id)
        .is_some_and(|record| record.timeout_called);
    let submission = submission.with_defensive_timeout(defense_timeout);

    let play_id = session.current_play_id.as_deref().ok_or_else(|| {
        EngineError::from(anyhow!(
            "session {} has no current play",
            session.session_id
        ))
    })?;
    let outcome = ctx.engine.submit_offense(play_id, &submission).await?;
    info!(
        session_id = %session.session_id,
        play_id = %play_id,
        submission = %submission,
        possession = %outcome.possession,
        "play resolved"
    );

    ctx.chat
        .post_message(
            &message.conversation_id,
            &OutboundMessage::text(outcome_text(ctx, &outcome, &submission)),
        )
        .await?;

    if outcome.is_final() {
        let score = final_score(&outcome);
        ctx.chat
            .post_message(
                &message.conversation_id,
                &OutboundMessage::text(render(&ctx.templates.game_over, &[("score", score.as_str())])),
            )
            .await?;
        info!(session_id = %session.session_id, "game over");
        return Ok(());
    }

    let next = ctx
        .engine
        .session_by_id(&session.session_id)
        .await?
        .ok_or_else(InputError::session_not_found)?;
    prompt_defense(ctx, &next, outcome.next_defense()).await
}

/// Ask `defense_side` for their number privately and point the engine at
/// them. Sides bound to another platform are left alone.
pub async fn prompt_defense(
    ctx: &BotContext,
    session: &Session,
    defense_side: Side,
) -> Result<(), DispatchError> {
    let binding = session.binding(defense_side);
    if !ctx.on_this_platform(binding.platform) {
        info!(
            session_id = %session.session_id,
            side = %defense_side,
            platform = %binding.platform,
            "defense plays elsewhere; not prompting"
        );
        return Ok(());
    }

    let coach = ctx
        .engine
        .coach_by_team(session.team(defense_side))
        .await?;
    ctx.engine
        .set_waiting_on(&session.session_id, &coach.username)
        .await?;
    let user = ctx.chat.resolve_user(&coach.platform_tag).await?;
    let text = render(
        ctx.templates.defense_prompt(session.current_play_kind),
        &[
            ("offense", session.team(defense_side.opponent())),
            ("defense", session.team(defense_side)),
        ],
    );
    ctx.chat
        .send_private_message(
            &user,
            &OutboundMessage::with_embed(text, number_request_embed(session, false)),
        )
        .await?;
    info!(
        session_id = %session.session_id,
        coach = %coach.username,
        play_kind = session.current_play_kind.label(),
        "defense prompted"
    );
    Ok(())
}

fn final_score(outcome: &PlayOutcome) -> String {
    score_line(
        &outcome.home_team,
        &outcome.away_team,
        outcome.home_score,
        outcome.away_score,
    )
}

fn outcome_text(ctx: &BotContext, outcome: &PlayOutcome, submission: &OffenseSubmission) -> String {
    let offense = outcome.team(outcome.possession);
    let play_call = outcome
        .play_call
        .clone()
        .unwrap_or_else(|| submission.play.engine_token());
    let result = outcome.result.as_deref().unwrap_or("no result");
    let yards = outcome.yards.unwrap_or_default().to_string();
    let down_distance = down_and_distance(outcome.down, outcome.yards_to_go);
    let spot = ball_spot(
        offense,
        outcome.team(outcome.possession.opponent()),
        outcome.ball_location,
    );
    let quarter = outcome.quarter.to_string();
    render(
        &ctx.templates.play_result,
        &[
            ("offense", offense),
            ("play_call", play_call.as_str()),
            ("result", result),
            ("yards", yards.as_str()),
            ("score", final_score(outcome).as_str()),
            ("down_distance", down_distance.as_str()),
            ("spot", spot.as_str()),
            ("quarter", quarter.as_str()),
            ("clock", outcome.clock.as_str()),
        ],
    )
}
