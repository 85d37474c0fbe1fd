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

use anyhow::Context;
use async_trait::async_trait;
use gridiron_common::{
    CoinCall, CoinChoice, Coach, DefenseSubmission, OffenseSubmission, PlayOutcome, Session,
    StartSessionRequest,
};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("game engine error: {0:#}")]
pub struct EngineError(#[from] anyhow::Error);

/// The game engine owns every session. Lookups return `None` when the engine
/// has no such session.
#[async_trait]
pub trait GameEngine: Send + Sync {
    async fn session_by_thread(
        &self,
        platform: &str,
        thread_id: &str,
    ) -> Result<Option<Session>, EngineError>;
    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, EngineError>;
    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session, EngineError>;
    async fn run_coin_toss(&self, session_id: &str, call: CoinCall) -> Result<Session, EngineError>;
    async fn set_coin_toss_choice(
        &self,
        session_id: &str,
        choice: CoinChoice,
    ) -> Result<Session, EngineError>;
    async fn set_waiting_on(&self, session_id: &str, username: &str) -> Result<(), EngineError>;
    async fn submit_defense(
        &self,
        session_id: &str,
        submission: &DefenseSubmission,
    ) -> Result<(), EngineError>;
    async fn submit_offense(
        &self,
        play_id: &str,
        submission: &OffenseSubmission,
    ) -> Result<PlayOutcome, EngineError>;
    async fn delete_session(&self, session_id: &str) -> Result<(), EngineError>;
    async fn coach_by_team(&self, team: &str) -> Result<Coach, EngineError>;
}

#[derive(Clone)]
pub struct RestGameEngine {
    client: reqwest::Client,
    base_url: Url,
}

impl RestGameEngine {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url).context("invalid ENGINE_BASE_URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("ENGINE_BASE_URL must be a hierarchical http(s) url");
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("engine base url cannot hold a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, segments: &[&str]) -> anyhow::Result<reqwest::Response> {
        let url = self.endpoint(segments)?;
        debug!(%method, path = %url.path(), "calling game engine");
        self.client
            .request(method, url.clone())
            .send()
            .await
            .with_context(|| format!("failed to call game engine at {}", url.path()))
    }

    async fn expect_ok(&self, method: Method, segments: &[&str]) -> anyhow::Result<reqwest::Response> {
        ensure_success(self.send(method, segments).await?).await
    }

    async fn expect_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> anyhow::Result<T> {
        self.expect_ok(method, segments)
            .await?
            .json::<T>()
            .await
            .context("invalid game engine payload")
    }

    async fn find_session(&self, segments: &[&str]) -> anyhow::Result<Option<Session>> {
        let response = self.send(Method::GET, segments).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let session = ensure_success(response)
            .await?
            .json::<Session>()
            .await
            .context("invalid game engine session payload")?;
        Ok(Some(session))
    }
}

async fn ensure_success(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_string());
    anyhow::bail!("game engine returned {status}: {body}")
}

#[async_trait]
impl GameEngine for RestGameEngine {
    async fn session_by_thread(
        &self,
        platform: &str,
        thread_id: &str,
    ) -> Result<Option<Session>, EngineError> {
        let platform = platform.to_ascii_lowercase();
        Ok(self
            .find_session(&["games", "ongoing", &platform, thread_id])
            .await?)
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, EngineError> {
        Ok(self.find_session(&["games", "game_id", session_id]).await?)
    }

    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session, EngineError> {
        let parameters = &request.parameters;
        let season = parameters.season.to_string();
        let week = parameters.week.to_string();
        let scrimmage = parameters.scrimmage.to_string();
        Ok(self
            .expect_json(
                Method::POST,
                &[
                    "games",
                    "start",
                    &request.platform,
                    &request.home_location_id,
                    &request.platform,
                    &request.away_location_id,
                    &season,
                    &week,
                    &parameters.subdivision,
                    &parameters.home_team,
                    &parameters.away_team,
                    &parameters.broadcast,
                    &parameters.start_time,
                    &parameters.location,
                    &scrimmage,
                ],
            )
            .await?)
    }

    async fn run_coin_toss(&self, session_id: &str, call: CoinCall) -> Result<Session, EngineError> {
        Ok(self
            .expect_json(Method::PUT, &["games", "coin_toss", session_id, call.token()])
            .await?)
    }

    async fn set_coin_toss_choice(
        &self,
        session_id: &str,
        choice: CoinChoice,
    ) -> Result<Session, EngineError> {
        Ok(self
            .expect_json(
                Method::PUT,
                &["games", "coin_toss_choice", session_id, choice.token()],
            )
            .await?)
    }

    async fn set_waiting_on(&self, session_id: &str, username: &str) -> Result<(), EngineError> {
        self.expect_ok(Method::PUT, &["games", "waiting_on", session_id, username])
            .await?;
        Ok(())
    }

    async fn submit_defense(
        &self,
        session_id: &str,
        submission: &DefenseSubmission,
    ) -> Result<(), EngineError> {
        let number = submission.number.to_string();
        let timeout = submission.timeout_called.to_string();
        self.expect_ok(
            Method::POST,
            &["game_plays", "defense_submitted", session_id, &number, &timeout],
        )
        .await?;
        Ok(())
    }

    async fn submit_offense(
        &self,
        play_id: &str,
        submission: &OffenseSubmission,
    ) -> Result<PlayOutcome, EngineError> {
        let number = submission.number.to_string();
        let play = submission.play.engine_token();
        let offensive_timeout = submission.offensive_timeout.to_string();
        let defensive_timeout = submission.defensive_timeout.to_string();
        Ok(self
            .expect_json(
                Method::POST,
                &[
                    "game_plays",
                    "offense_submitted",
                    play_id,
                    &number,
                    &play,
                    submission.runoff.token(),
                    &offensive_timeout,
                    &defensive_timeout,
                ],
            )
            .await?)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), EngineError> {
        self.expect_ok(Method::DELETE, &["games", session_id]).await?;
        Ok(())
    }

    async fn coach_by_team(&self, team: &str) -> Result<Coach, EngineError> {
        Ok(self
            .expect_json(Method::GET, &["users", "team", team])
            .await?)
    }
}
