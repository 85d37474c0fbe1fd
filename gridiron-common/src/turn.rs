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

//! Who may act next, and from which conversation.
//!
//! The checks run against a freshly fetched session and are an early answer
//! for the user only; the engine still decides whether a submission lands.

use crate::{Coach, InputError, Matchup, Session};

/// The coach the engine is currently waiting on, if it names one of the two.
pub fn waiting_coach<'a>(session: &Session, matchup: &'a Matchup) -> Option<&'a Coach> {
    let waiting_on = session.waiting_on.as_deref()?;
    matchup
        .coach_by_username(waiting_on)
        .map(|(_, coach)| coach)
}

pub fn is_waiting_on_user(
    session: &Session,
    matchup: &Matchup,
    invoker_tag: &str,
) -> Result<(), InputError> {
    let waiting_on = session.waiting_on.as_deref().unwrap_or("nobody");
    match waiting_coach(session, matchup) {
        Some(coach) if coach.platform_tag == invoker_tag => Ok(()),
        _ => Err(InputError::turn(format!(
            "I am not waiting on a number from you currently. Currently waiting on a number from {waiting_on}"
        ))),
    }
}

/// The possession holder submits in the game thread.
pub fn has_possession(
    session: &Session,
    matchup: &Matchup,
    invoker_tag: &str,
) -> Result<(), InputError> {
    if matchup.coach(session.possession).platform_tag == invoker_tag {
        Ok(())
    } else {
        Err(InputError::turn(
            "You don't have possession, please submit your number in your DMs instead. \
             The game is waiting on you.",
        ))
    }
}

/// The side without the ball submits privately.
pub fn lacks_possession(
    session: &Session,
    matchup: &Matchup,
    invoker_tag: &str,
) -> Result<(), InputError> {
    if matchup.coach(session.possession).platform_tag == invoker_tag {
        Err(InputError::turn(
            "You have possession, please submit your number in the game thread instead",
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Side,
        fixtures::{matchup, session},
    };

    #[test]
    fn only_the_waited_on_coach_passes() {
        let session = session();
        let matchup = matchup();
        assert!(is_waiting_on_user(&session, &matchup, "wolverine").is_ok());

        let error = is_waiting_on_user(&session, &matchup, "buckeye").unwrap_err();
        assert!(matches!(error, InputError::Turn(_)));
        assert!(error.to_string().contains("away_coach"));
    }

    #[test]
    fn unknown_waiting_on_rejects_everyone() {
        let mut session = session();
        session.waiting_on = Some("someone_else".to_string());
        let matchup = matchup();
        assert!(is_waiting_on_user(&session, &matchup, "wolverine").is_err());
        assert!(is_waiting_on_user(&session, &matchup, "buckeye").is_err());

        session.waiting_on = None;
        assert!(is_waiting_on_user(&session, &matchup, "wolverine").is_err());
    }

    #[test]
    fn possession_holder_must_use_the_thread() {
        let session = session();
        let matchup = matchup();
        assert_eq!(session.possession, Side::Home);

        assert!(has_possession(&session, &matchup, "buckeye").is_ok());
        let error = lacks_possession(&session, &matchup, "buckeye").unwrap_err();
        assert!(error.to_string().contains("game thread"));
    }

    #[test]
    fn non_holder_must_use_private_messages() {
        let session = session();
        let matchup = matchup();

        assert!(lacks_possession(&session, &matchup, "wolverine").is_ok());
        let error = has_possession(&session, &matchup, "wolverine").unwrap_err();
        assert!(matches!(error, InputError::Turn(_)));
        assert!(error.to_string().contains("DMs"));
    }
}
