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

//! Coin toss phases as read from a session, and who receives the kickoff.

use crate::{CoinChoice, Session, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinTossPhase {
    AwaitingCall,
    AwaitingChoice,
    Resolved,
}

impl CoinTossPhase {
    pub fn of(session: &Session) -> Self {
        if !session.has_coin_toss_winner() {
            Self::AwaitingCall
        } else if !session.has_coin_toss_choice() {
            Self::AwaitingChoice
        } else {
            Self::Resolved
        }
    }
}

/// A winner who defers kicks; otherwise the winner receives.
pub fn receiving_side(winner: Side, choice: CoinChoice) -> Side {
    match choice {
        CoinChoice::Receive => winner,
        CoinChoice::Defer => winner.opponent(),
    }
}
