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

mod chat;
mod coin_toss;
mod commands;
mod config;
mod context;
mod correlator;
mod engine;
mod error;
mod router;
mod submission;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use lambda_http::run as lambda_run;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    chat::DiscordClient,
    config::{BotSettings, MessageTemplates},
    context::BotContext,
    engine::RestGameEngine,
    router::IncomingMessage,
};

#[derive(Clone)]
struct AppState {
    bot: BotContext,
    /// Lambda freezes the process after the response, so events are
    /// handled before answering there.
    detach_dispatch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "gridiron_bot=debug,tower_http=info".to_string()),
        )
        .init();

    let settings = BotSettings::from_env()?;
    let templates = MessageTemplates::load(settings.messages_config_path.as_deref());
    let engine = RestGameEngine::new(&settings.engine_base_url)
        .context("failed to build game engine client")?;
    let chat = DiscordClient::new(
        &settings.chat_api_base_url,
        settings.chat_bot_token.clone(),
        settings.chat_guild_id.clone(),
        settings.platform_name.clone(),
    )
    .context("failed to build chat platform client")?;
    info!(
        engine = %settings.engine_base_url,
        platform = %settings.platform_name,
        history_window = settings.history_window,
        "gridiron-bot configured"
    );

    let lambda_mode = std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok();
    let state = AppState {
        bot: BotContext {
            engine: Arc::new(engine),
            chat: Arc::new(chat),
            templates: Arc::new(templates),
            settings: Arc::new(settings),
        },
        detach_dispatch: !lambda_mode,
    };
    let app = build_router(state);

    if lambda_mode {
        info!("AWS Lambda runtime detected; running gridiron-bot in lambda mode");
        lambda_run(app)
            .await
            .map_err(|e| anyhow::Error::msg(format!("lambda runtime error: {e}")))?;
        return Ok(());
    }

    let bind_addr = parse_bind_addr("GRIDIRON_BOT_BIND", "0.0.0.0:8095")?;
    info!(%bind_addr, "gridiron-bot listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/events/messages", post(message_event_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn parse_bind_addr(var_name: &str, default: &str) -> anyhow::Result<SocketAddr> {
    let value = std::env::var(var_name)
        .ok()
        .unwrap_or_else(|| default.to_string());
    value.parse().context(format!("invalid {var_name}"))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true, "service": "gridiron-bot"}))
}

async fn message_event_handler(
    State(state): State<AppState>,
    Json(message): Json<IncomingMessage>,
) -> StatusCode {
    if state.detach_dispatch {
        tokio::spawn(async move {
            router::dispatch_message(&state.bot, &message).await;
        });
    } else {
        router::dispatch_message(&state.bot, &message).await;
    }
    StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{FakeChat, FakeEngine, context};

    fn app(detach_dispatch: bool) -> (Router, Arc<FakeChat>) {
        let chat = FakeChat::new();
        let state = AppState {
            bot: context(FakeEngine::new(), chat.clone()),
            detach_dispatch,
        };
        (build_router(state), chat)
    }

    #[tokio::test]
    async fn health_reports_the_service() {
        let (app, _) = app(true);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn message_events_are_accepted() {
        let (app, chat) = app(false);
        let body = serde_json::json!({
            "message_id": "m-1",
            "conversation_id": "general",
            "conversation_kind": "channel",
            "author": { "id": "7", "name": "fan", "bot": false },
            "content": "!help"
        });
        let response = app
            .oneshot(
                Request::post("/v1/events/messages")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(chat.posts_to("general").len(), 1);
    }

    #[tokio::test]
    async fn malformed_events_are_rejected() {
        let (app, _) = app(true);
        let response = app
            .oneshot(
                Request::post("/v1/events/messages")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"content\":\"hi\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
