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

//! Recording fakes for the engine and chat seams, plus shared fixtures.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use gridiron_common::{
    ChatAuthor, ChatMessage, CoinCall, CoinChoice, Coach, DefenseSubmission, Embed,
    OffenseSubmission, PlayKind, PlayOutcome, Session, Side, StartSessionRequest,
    prompt::number_request_embed, receiving_side,
};

use crate::{
    chat::{ChatPlatform, ChatUser, Conversation, OutboundMessage, PlatformError},
    config::{BotSettings, MessageTemplates},
    context::BotContext,
    engine::{EngineError, GameEngine},
    router::{ConversationKind, IncomingMessage},
};

pub fn session() -> Session {
    serde_json::from_value(serde_json::json!({
        "gameId": "g-100",
        "homeTeam": "Ohio State",
        "awayTeam": "Michigan",
        "homeScore": 7,
        "awayScore": 3,
        "possession": "home",
        "waitingOn": "away_coach",
        "currentPlayType": "NORMAL",
        "currentPlayId": "p-9",
        "down": 2,
        "yardsToGo": 7,
        "ballLocation": 35,
        "quarter": 2,
        "clock": "7:00",
        "coinTossWinner": "Michigan",
        "coinTossChoice": "defer",
        "gameTimer": "10/19 21:00",
        "homePlatform": "Discord",
        "homePlatformId": "thread-1",
        "awayPlatform": "DISCORD",
        "awayPlatformId": "thread-1"
    }))
    .expect("session fixture is valid")
}

pub fn outcome(possession: Side, game_status: Option<&str>) -> PlayOutcome {
    PlayOutcome {
        play_call: None,
        result: Some("gain".to_string()),
        yards: Some(8),
        possession,
        home_team: "Ohio State".to_string(),
        away_team: "Michigan".to_string(),
        home_score: 7,
        away_score: 3,
        down: 1,
        yards_to_go: 10,
        ball_location: 43,
        quarter: 2,
        clock: "6:32".to_string(),
        game_status: game_status.map(str::to_string),
    }
}

fn coaches() -> HashMap<String, Coach> {
    [
        ("Ohio State", "home_coach", "buckeye"),
        ("Michigan", "away_coach", "wolverine"),
    ]
    .into_iter()
    .map(|(team, username, tag)| {
        (
            team.to_string(),
            Coach {
                team: team.to_string(),
                username: username.to_string(),
                platform_tag: tag.to_string(),
            },
        )
    })
    .collect()
}

pub fn context(engine: Arc<FakeEngine>, chat: Arc<FakeChat>) -> BotContext {
    BotContext {
        engine,
        chat,
        templates: Arc::new(MessageTemplates::default()),
        settings: Arc::new(BotSettings::default()),
    }
}

pub fn incoming(
    kind: ConversationKind,
    conversation_id: &str,
    author: &str,
    content: &str,
) -> IncomingMessage {
    IncomingMessage {
        message_id: "m-incoming".to_string(),
        conversation_id: conversation_id.to_string(),
        conversation_kind: kind,
        author: ChatAuthor {
            id: format!("id-{author}"),
            name: author.to_string(),
            bot: false,
        },
        content: content.to_string(),
        sent_at: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    StartSession(StartSessionRequest),
    RunCoinToss {
        session_id: String,
        call: CoinCall,
    },
    SetCoinTossChoice {
        session_id: String,
        choice: CoinChoice,
    },
    SetWaitingOn {
        session_id: String,
        username: String,
    },
    SubmitDefense {
        session_id: String,
        submission: DefenseSubmission,
    },
    SubmitOffense {
        play_id: String,
        submission: OffenseSubmission,
    },
    DeleteSession(String),
}

/// In-memory engine. Records every write; heads always wins for the away
/// side and tails for the home side.
pub struct FakeEngine {
    sessions: Mutex<HashMap<String, Session>>,
    coaches: HashMap<String, Coach>,
    calls: Mutex<Vec<EngineCall>>,
    outcome: Mutex<Option<PlayOutcome>>,
    start_result: Mutex<Option<Session>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            coaches: coaches(),
            calls: Mutex::new(Vec::new()),
            outcome: Mutex::new(None),
            start_result: Mutex::new(None),
        })
    }

    pub fn with_session(session: Session) -> Arc<Self> {
        let engine = Self::new();
        engine
            .sessions
            .lock()
            .unwrap()
            .insert(session.session_id.clone(), session);
        engine
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn session(&self, session_id: &str) -> Session {
        self.sessions.lock().unwrap()[session_id].clone()
    }

    pub fn set_outcome(&self, outcome: PlayOutcome) {
        *self.outcome.lock().unwrap() = Some(outcome);
    }

    pub fn set_start_result(&self, session: Session) {
        *self.start_result.lock().unwrap() = Some(session);
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn update(
        &self,
        session_id: &str,
        change: impl FnOnce(&mut Session) -> Result<(), EngineError>,
    ) -> Result<Session, EngineError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::from(anyhow::anyhow!("404: no game {session_id}")))?;
        change(session)?;
        Ok(session.clone())
    }
}

#[async_trait]
impl GameEngine for FakeEngine {
    async fn session_by_thread(
        &self,
        platform: &str,
        thread_id: &str,
    ) -> Result<Option<Session>, EngineError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .find(|session| {
                [Side::Home, Side::Away].into_iter().any(|side| {
                    let binding = session.binding(side);
                    binding.is_platform(platform) && binding.location_id == thread_id
                })
            })
            .cloned())
    }

    async fn session_by_id(&self, session_id: &str) -> Result<Option<Session>, EngineError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn start_session(&self, request: &StartSessionRequest) -> Result<Session, EngineError> {
        self.record(EngineCall::StartSession(request.clone()));
        let session = self
            .start_result
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| EngineError::from(anyhow::anyhow!("500: engine unavailable")))?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    async fn run_coin_toss(&self, session_id: &str, call: CoinCall) -> Result<Session, EngineError> {
        self.record(EngineCall::RunCoinToss {
            session_id: session_id.to_string(),
            call,
        });
        self.update(session_id, |session| {
            let winner = match call {
                CoinCall::Heads => Side::Away,
                CoinCall::Tails => Side::Home,
            };
            session.coin_toss_winner = Some(session.team(winner).to_string());
            Ok(())
        })
    }

    async fn set_coin_toss_choice(
        &self,
        session_id: &str,
        choice: CoinChoice,
    ) -> Result<Session, EngineError> {
        self.record(EngineCall::SetCoinTossChoice {
            session_id: session_id.to_string(),
            choice,
        });
        self.update(session_id, |session| {
            let winner = session
                .coin_toss_winner()
                .ok_or_else(|| EngineError::from(anyhow::anyhow!("400: no coin toss winner")))?;
            session.coin_toss_choice = Some(choice.token().to_string());
            session.possession = receiving_side(winner, choice).opponent();
            session.current_play_kind = PlayKind::Kickoff;
            Ok(())
        })
    }

    async fn set_waiting_on(&self, session_id: &str, username: &str) -> Result<(), EngineError> {
        self.record(EngineCall::SetWaitingOn {
            session_id: session_id.to_string(),
            username: username.to_string(),
        });
        self.update(session_id, |session| {
            session.waiting_on = Some(username.to_string());
            Ok(())
        })?;
        Ok(())
    }

    async fn submit_defense(
        &self,
        session_id: &str,
        submission: &DefenseSubmission,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::SubmitDefense {
            session_id: session_id.to_string(),
            submission: *submission,
        });
        Ok(())
    }

    async fn submit_offense(
        &self,
        play_id: &str,
        submission: &OffenseSubmission,
    ) -> Result<PlayOutcome, EngineError> {
        self.record(EngineCall::SubmitOffense {
            play_id: play_id.to_string(),
            submission: *submission,
        });
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| EngineError::from(anyhow::anyhow!("500: play could not be resolved")))
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), EngineError> {
        self.record(EngineCall::DeleteSession(session_id.to_string()));
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn coach_by_team(&self, team: &str) -> Result<Coach, EngineError> {
        self.coaches
            .get(team)
            .cloned()
            .ok_or_else(|| EngineError::from(anyhow::anyhow!("404: no coach for {team}")))
    }
}

/// A message to place into a conversation's history.
pub struct Draft {
    author: ChatAuthor,
    content: String,
    embeds: Vec<Embed>,
}

pub fn prompt_message(session_id: &str, defense_timeout: bool) -> Draft {
    let session = Session {
        session_id: session_id.to_string(),
        ..session()
    };
    Draft {
        author: bot_author(),
        content: String::new(),
        embeds: vec![number_request_embed(&session, defense_timeout)],
    }
}

pub fn user_message(name: &str, content: &str) -> Draft {
    Draft {
        author: ChatAuthor {
            id: format!("id-{name}"),
            name: name.to_string(),
            bot: false,
        },
        content: content.to_string(),
        embeds: Vec::new(),
    }
}

fn bot_author() -> ChatAuthor {
    ChatAuthor {
        id: "id-gridiron".to_string(),
        name: "gridiron".to_string(),
        bot: true,
    }
}

/// In-memory chat platform. Everything the bot sends lands in the
/// conversation history too, so later correlations see it.
#[derive(Default)]
pub struct FakeChat {
    posts: Mutex<Vec<(String, OutboundMessage)>>,
    private: Mutex<Vec<(String, OutboundMessage)>>,
    history: Mutex<HashMap<String, Vec<ChatMessage>>>,
    threads: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append to a conversation's history and return the new message id.
    pub fn seed(&self, conversation_id: &str, draft: Draft) -> String {
        let mut history = self.history.lock().unwrap();
        let sequence = history.values().map(Vec::len).sum::<usize>() as i64;
        let id = format!("m-{sequence}");
        let base = Utc
            .with_ymd_and_hms(2026, 10, 19, 20, 0, 0)
            .single()
            .expect("fixture time is valid");
        history
            .entry(conversation_id.to_string())
            .or_default()
            .push(ChatMessage {
                id: id.clone(),
                author: draft.author,
                content: draft.content,
                embeds: draft.embeds,
                sent_at: base + Duration::seconds(sequence),
            });
        id
    }

    pub fn posts_to(&self, conversation_id: &str) -> Vec<OutboundMessage> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == conversation_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn private_to(&self, user_name: &str) -> Vec<OutboundMessage> {
        self.private
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == user_name)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn threads(&self) -> Vec<String> {
        self.threads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn bot_draft(message: &OutboundMessage) -> Draft {
        Draft {
            author: bot_author(),
            content: message.content.clone(),
            embeds: message.embed.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    fn platform_name(&self) -> &str {
        "Discord"
    }

    fn mention(&self, user_id: &str) -> String {
        format!("<@{user_id}>")
    }

    async fn create_thread(&self, _category: &str, name: &str) -> Result<Conversation, PlatformError> {
        self.threads.lock().unwrap().push(name.to_string());
        Ok(Conversation {
            id: "thread-new".to_string(),
            name: name.to_string(),
        })
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        self.seed(conversation_id, Self::bot_draft(message));
        self.posts
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), message.clone()));
        Ok(())
    }

    async fn send_private_message(
        &self,
        user: &ChatUser,
        message: &OutboundMessage,
    ) -> Result<(), PlatformError> {
        self.seed(&format!("dm-{}", user.name), Self::bot_draft(message));
        self.private
            .lock()
            .unwrap()
            .push((user.name.clone(), message.clone()));
        Ok(())
    }

    async fn resolve_user(&self, name: &str) -> Result<ChatUser, PlatformError> {
        Ok(ChatUser {
            id: format!("id-{name}"),
            name: name.to_string(),
        })
    }

    async fn resolve_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Conversation, PlatformError> {
        Ok(Conversation {
            id: conversation_id.to_string(),
            name: "game thread".to_string(),
        })
    }

    async fn recent_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        let mut messages = self
            .history
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by(|left, right| right.sent_at.cmp(&left.sent_at));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), PlatformError> {
        self.deleted.lock().unwrap().push(conversation_id.to_string());
        Ok(())
    }
}
