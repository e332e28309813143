use std::fmt;
use std::str::FromStr;

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::AdminToken;
use crate::error::{LeagueError, LeagueResult};
use crate::model::{MatchId, MatchStatus, ParseLabelError};
use crate::store::{Store, load_match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Start,
    Pause,
    Resume,
    Finish,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Start,
        Transition::Pause,
        Transition::Resume,
        Transition::Finish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Pause => "pause",
            Transition::Resume => "resume",
            Transition::Finish => "finish",
        }
    }

    pub fn target_status(self) -> MatchStatus {
        match self {
            Transition::Start | Transition::Resume => MatchStatus::Live,
            Transition::Pause => MatchStatus::Intermission,
            Transition::Finish => MatchStatus::Finished,
        }
    }

    /// States from which the UI offers this transition.
    pub fn allowed_from(self) -> &'static [MatchStatus] {
        match self {
            Transition::Start => &[MatchStatus::Scheduled],
            Transition::Pause => &[MatchStatus::Live],
            Transition::Resume => &[MatchStatus::Intermission],
            Transition::Finish => &[MatchStatus::Live, MatchStatus::Intermission],
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Transition::ALL
            .into_iter()
            .find(|t| t.as_str() == raw)
            .ok_or_else(|| ParseLabelError::new("transition", raw))
    }
}

/// How strictly [`apply`] treats the current status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Every transition is an unconditional write keyed by match id.
    #[default]
    Permissive,
    /// Transitions not in [`Transition::allowed_from`] are rejected.
    Guarded,
}

/// Controls a scoreboard offers for a match in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchAction {
    Start,
    Pause,
    Resume,
    Finish,
    Score,
    Goal,
    Delete,
}

impl MatchStatus {
    pub fn available_actions(self) -> &'static [MatchAction] {
        match self {
            MatchStatus::Scheduled => &[MatchAction::Start, MatchAction::Delete],
            MatchStatus::Live => &[
                MatchAction::Pause,
                MatchAction::Finish,
                MatchAction::Score,
                MatchAction::Goal,
                MatchAction::Delete,
            ],
            MatchStatus::Intermission => &[
                MatchAction::Resume,
                MatchAction::Finish,
                MatchAction::Delete,
            ],
            MatchStatus::Finished => &[MatchAction::Delete],
        }
    }

    pub fn offers(self, action: MatchAction) -> bool {
        self.available_actions().contains(&action)
    }
}

/// Drives a match to `transition`'s target status.
///
/// `Start` also resets the period to 1; the other transitions leave it alone.
/// A missing match is a successful no-op under either policy.
pub fn apply(
    store: &Store,
    admin: &AdminToken,
    match_id: MatchId,
    transition: Transition,
    policy: TransitionPolicy,
) -> LeagueResult<()> {
    let target = transition.target_status();
    let rows = store.write(|tx| {
        if policy == TransitionPolicy::Guarded {
            let Some(current) = load_match(tx, match_id)? else {
                return Ok(0);
            };
            if !transition.allowed_from().contains(&current.status) {
                return Err(LeagueError::validation(format!(
                    "cannot {transition} a match that is {}",
                    current.status.label().to_lowercase()
                )));
            }
        }
        let rows = match transition {
            Transition::Start => tx.execute(
                "UPDATE matches SET status = ?1, period = 1 WHERE id = ?2",
                params![target, match_id],
            )?,
            _ => tx.execute(
                "UPDATE matches SET status = ?1 WHERE id = ?2",
                params![target, match_id],
            )?,
        };
        Ok(rows)
    })?;

    if rows == 0 {
        debug!(match_id, %transition, rows, "match.transition_noop");
    } else {
        info!(
            match_id,
            %transition,
            status = %target,
            admin = admin.username(),
            "match.transition"
        );
    }
    Ok(())
}

pub fn start(store: &Store, admin: &AdminToken, match_id: MatchId) -> LeagueResult<()> {
    apply(store, admin, match_id, Transition::Start, TransitionPolicy::Permissive)
}

pub fn pause(store: &Store, admin: &AdminToken, match_id: MatchId) -> LeagueResult<()> {
    apply(store, admin, match_id, Transition::Pause, TransitionPolicy::Permissive)
}

pub fn resume(store: &Store, admin: &AdminToken, match_id: MatchId) -> LeagueResult<()> {
    apply(store, admin, match_id, Transition::Resume, TransitionPolicy::Permissive)
}

pub fn finish(store: &Store, admin: &AdminToken, match_id: MatchId) -> LeagueResult<()> {
    apply(store, admin, match_id, Transition::Finish, TransitionPolicy::Permissive)
}

/// Removes the match entirely; idempotent.
pub fn delete(store: &Store, admin: &AdminToken, match_id: MatchId) -> LeagueResult<()> {
    debug!(match_id, admin = admin.username(), "match.delete");
    store.delete_match(match_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_targets() {
        assert_eq!(Transition::Start.target_status(), MatchStatus::Live);
        assert_eq!(Transition::Pause.target_status(), MatchStatus::Intermission);
        assert_eq!(Transition::Resume.target_status(), MatchStatus::Live);
        assert_eq!(Transition::Finish.target_status(), MatchStatus::Finished);
    }

    #[test]
    fn offered_actions_follow_the_board() {
        assert!(MatchStatus::Scheduled.offers(MatchAction::Start));
        assert!(!MatchStatus::Scheduled.offers(MatchAction::Goal));
        assert!(MatchStatus::Live.offers(MatchAction::Goal));
        assert!(MatchStatus::Live.offers(MatchAction::Score));
        assert!(!MatchStatus::Intermission.offers(MatchAction::Goal));
        assert!(MatchStatus::Intermission.offers(MatchAction::Resume));
        assert_eq!(
            MatchStatus::Finished.available_actions(),
            &[MatchAction::Delete]
        );
    }

    #[test]
    fn transition_names_parse() {
        for t in Transition::ALL {
            assert_eq!(t.as_str().parse::<Transition>(), Ok(t));
        }
        assert!("restart".parse::<Transition>().is_err());
    }
}
