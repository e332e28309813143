use rusqlite::params;
use tracing::{debug, info};

use crate::auth::AdminToken;
use crate::error::LeagueResult;
use crate::model::{GoalId, MatchId, PlayerId, TeamId};
use crate::store::{Store, bump_player_goals, load_match, now};

/// Manual correction: overwrites both scores regardless of recorded goals.
pub fn update_score(
    store: &Store,
    admin: &AdminToken,
    match_id: MatchId,
    score1: u32,
    score2: u32,
) -> LeagueResult<()> {
    let rows = store.write(|tx| {
        Ok(tx.execute(
            "UPDATE matches SET score1 = ?1, score2 = ?2 WHERE id = ?3",
            params![score1, score2, match_id],
        )?)
    })?;
    if rows == 0 {
        debug!(match_id, rows, "score.override_noop");
    } else {
        info!(
            match_id,
            score1,
            score2,
            admin = admin.username(),
            "score.overridden"
        );
    }
    Ok(())
}

/// Records a goal and credits it in one transaction.
///
/// A goal whose team is not `team1` of the match is credited to `score2`,
/// participant or not. When the match row is gone the goal is still stored
/// and the scorer still credited; only the score update is skipped.
pub fn record_goal(
    store: &Store,
    admin: &AdminToken,
    match_id: MatchId,
    team_id: TeamId,
    player_id: PlayerId,
    period: u32,
    time: &str,
) -> LeagueResult<GoalId> {
    let (goal_id, scores) = store.write(|tx| {
        tx.execute(
            "INSERT INTO goals (match_id, team_id, player_id, period, time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![match_id, team_id, player_id, period, time, now()],
        )?;
        let goal_id = tx.last_insert_rowid();

        let scores = match load_match(tx, match_id)? {
            Some(game) => {
                let (score1, score2) = if game.team1_id == team_id {
                    (game.score1.saturating_add(1), game.score2)
                } else {
                    (game.score1, game.score2.saturating_add(1))
                };
                tx.execute(
                    "UPDATE matches SET score1 = ?1, score2 = ?2 WHERE id = ?3",
                    params![score1, score2, match_id],
                )?;
                Some((score1, score2))
            }
            None => None,
        };

        bump_player_goals(tx, player_id)?;
        Ok((goal_id, scores))
    })?;

    match scores {
        Some((score1, score2)) => info!(
            match_id,
            goal_id,
            team_id,
            player_id,
            period,
            time,
            score1,
            score2,
            admin = admin.username(),
            "goal.recorded"
        ),
        None => debug!(match_id, goal_id, player_id, "goal.recorded_without_match"),
    }
    Ok(goal_id)
}
