use rusqlite::{OptionalExtension, params};

use crate::error::LeagueResult;
use crate::model::{MatchId, Player, TeamId, TeamRef, team_label};
use crate::store::Store;

/// Both participants of a match, team1 first.
///
/// A participant whose team row is missing is labelled `Team #<id>`. An
/// unknown match yields an empty list.
pub fn get_match_teams(store: &Store, match_id: MatchId) -> LeagueResult<Vec<TeamRef>> {
    store.read(|conn| {
        let row = conn
            .query_row(
                r#"
                SELECT m.team1_id, t1.name, m.team2_id, t2.name
                FROM matches m
                LEFT JOIN teams t1 ON m.team1_id = t1.id
                LEFT JOIN teams t2 ON m.team2_id = t2.id
                WHERE m.id = ?1
                "#,
                params![match_id],
                |row| {
                    Ok((
                        row.get::<_, TeamId>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, TeamId>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((team1_id, team1_name, team2_id, team2_name)) = row else {
            return Ok(Vec::new());
        };
        Ok(vec![
            TeamRef {
                id: team1_id,
                name: team_label(team1_id, team1_name.as_deref()),
            },
            TeamRef {
                id: team2_id,
                name: team_label(team2_id, team2_name.as_deref()),
            },
        ])
    })
}

/// Roster ordered by jersey number; empty for an unknown team.
pub fn get_team_players(store: &Store, team_id: TeamId) -> LeagueResult<Vec<Player>> {
    store.list_players_by_team(team_id)
}
