use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use tracing::{debug, info};

use crate::error::{LeagueError, LeagueResult};
use crate::model::{
    Goal, GoalEntry, Match, MatchId, MatchStatus, Player, PlayerId, Position, ScoreboardRow, Team, TeamId,
};

const BUSY_TIMEOUT_SECS: u64 = 5;

const TEAM_COLUMNS: &str = "id, name, city, created_at";
const PLAYER_COLUMNS: &str = "id, team_id, name, number, position, goals, assists";
const MATCH_COLUMNS: &str =
    "id, team1_id, team2_id, score1, score2, status, period, date_time, created_at";
const GOAL_COLUMNS: &str = "id, match_id, team_id, player_id, period, time, created_at";

/// Durable records for teams, players, matches and goals.
///
/// One SQLite connection sits behind a mutex; every mutation is a single
/// `BEGIN IMMEDIATE` transaction on it, so concurrent writers on the same
/// match or player serialize and readers never see a half-applied write.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
            .context("set sqlite busy timeout")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // An unfinished transaction is rolled back when it is dropped, so the
        // connection behind a poisoned lock is still consistent.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> LeagueResult<T>,
    ) -> LeagueResult<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = op(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub(crate) fn read<T>(&self, op: impl FnOnce(&Connection) -> LeagueResult<T>) -> LeagueResult<T> {
        let conn = self.lock();
        op(&*conn)
    }

    pub fn create_team(&self, name: &str, city: &str) -> LeagueResult<TeamId> {
        let id = self.write(|tx| {
            tx.execute(
                "INSERT INTO teams (name, city, created_at) VALUES (?1, ?2, ?3)",
                params![name, city, now()],
            )?;
            Ok(tx.last_insert_rowid())
        })?;
        info!(team_id = id, name, "team.created");
        Ok(id)
    }

    pub fn create_player(
        &self,
        team_id: TeamId,
        name: &str,
        number: u32,
        position: Position,
    ) -> LeagueResult<PlayerId> {
        let id = self.write(|tx| {
            if !team_exists(tx, team_id)? {
                return Err(LeagueError::validation(format!(
                    "team {team_id} does not exist"
                )));
            }
            tx.execute(
                "INSERT INTO players (team_id, name, number, position, goals, assists)
                 VALUES (?1, ?2, ?3, ?4, 0, 0)",
                params![team_id, name, number, position],
            )?;
            Ok(tx.last_insert_rowid())
        })?;
        info!(player_id = id, team_id, number, "player.created");
        Ok(id)
    }

    pub fn create_match(
        &self,
        team1_id: TeamId,
        team2_id: TeamId,
        date_time: &str,
    ) -> LeagueResult<MatchId> {
        if team1_id == team2_id {
            return Err(LeagueError::validation("Select two different teams"));
        }
        let id = self.write(|tx| {
            tx.execute(
                "INSERT INTO matches (team1_id, team2_id, score1, score2, date_time, status, period, created_at)
                 VALUES (?1, ?2, 0, 0, ?3, ?4, 1, ?5)",
                params![team1_id, team2_id, date_time, MatchStatus::Scheduled, now()],
            )?;
            Ok(tx.last_insert_rowid())
        })?;
        info!(match_id = id, team1_id, team2_id, date_time, "match.created");
        Ok(id)
    }

    /// Hard delete. Goals of the match are left in place.
    pub fn delete_match(&self, match_id: MatchId) -> LeagueResult<()> {
        let rows = self.write(|tx| {
            Ok(tx.execute("DELETE FROM matches WHERE id = ?1", params![match_id])?)
        })?;
        if rows == 0 {
            debug!(match_id, rows, "match.delete_noop");
        } else {
            info!(match_id, "match.deleted");
        }
        Ok(())
    }

    pub fn get_match(&self, match_id: MatchId) -> LeagueResult<Option<Match>> {
        self.read(|conn| load_match(conn, match_id))
    }

    pub fn list_matches(&self) -> LeagueResult<Vec<Match>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MATCH_COLUMNS} FROM matches ORDER BY date_time DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], match_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn list_scoreboard(&self) -> LeagueResult<Vec<ScoreboardRow>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    m.id, m.team1_id, m.team2_id, m.score1, m.score2,
                    m.status, m.period, m.date_time, m.created_at,
                    t1.name, t1.city, t2.name, t2.city
                FROM matches m
                LEFT JOIN teams t1 ON m.team1_id = t1.id
                LEFT JOIN teams t2 ON m.team2_id = t2.id
                ORDER BY m.date_time DESC, m.id DESC
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ScoreboardRow {
                    game: match_from_row(row)?,
                    team1_name: row.get(9)?,
                    team1_city: row.get(10)?,
                    team2_name: row.get(11)?,
                    team2_city: row.get(12)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn get_team(&self, team_id: TeamId) -> LeagueResult<Option<Team>> {
        self.read(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
                    params![team_id],
                    team_from_row,
                )
                .optional()?)
        })
    }

    pub fn list_teams(&self) -> LeagueResult<Vec<Team>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEAM_COLUMNS} FROM teams ORDER BY name ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], team_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn get_player(&self, player_id: PlayerId) -> LeagueResult<Option<Player>> {
        self.read(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1"),
                    params![player_id],
                    player_from_row,
                )
                .optional()?)
        })
    }

    pub fn list_players_by_team(&self, team_id: TeamId) -> LeagueResult<Vec<Player>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = ?1 ORDER BY number ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![team_id], player_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// No-op when the player does not exist.
    pub fn increment_player_goals(&self, player_id: PlayerId) -> LeagueResult<()> {
        let rows = self.write(|tx| Ok(bump_player_goals(tx, player_id)?))?;
        if rows == 0 {
            debug!(player_id, rows, "player.goals_noop");
        }
        Ok(())
    }

    pub fn list_goals(&self, match_id: MatchId) -> LeagueResult<Vec<Goal>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE match_id = ?1 ORDER BY period ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![match_id], goal_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn list_goal_entries(&self, match_id: MatchId) -> LeagueResult<Vec<GoalEntry>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    g.id, g.match_id, g.team_id, g.player_id, g.period, g.time, g.created_at,
                    p.name, p.number
                FROM goals g
                LEFT JOIN players p ON g.player_id = p.id
                WHERE g.match_id = ?1
                ORDER BY g.period ASC, g.id ASC
                "#,
            )?;
            let rows = stmt.query_map(params![match_id], |row| {
                Ok(GoalEntry {
                    goal: goal_from_row(row)?,
                    player_name: row.get(7)?,
                    player_number: row.get(8)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    pub fn count_goals_for_player(&self, player_id: PlayerId) -> LeagueResult<u32> {
        self.read(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM goals WHERE player_id = ?1",
                params![player_id],
                |row| row.get::<_, u32>(0),
            )?)
        })
    }

    pub fn admin_password_hash(&self, username: &str) -> LeagueResult<Option<String>> {
        self.read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT password FROM admins WHERE username = ?1",
                    params![username],
                    |row| row.get::<_, String>(0),
                )
                .optional()?)
        })
    }

    pub fn upsert_admin(&self, username: &str, password_hash: &str) -> LeagueResult<()> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO admins (username, password) VALUES (?1, ?2)
                 ON CONFLICT(username) DO UPDATE SET password = excluded.password",
                params![username, password_hash],
            )?;
            Ok(())
        })
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    // In-memory databases answer "memory"; only file databases switch to WAL.
    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
        .context("set sqlite journal mode")?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            number INTEGER,
            position TEXT,
            team_id INTEGER,
            goals INTEGER DEFAULT 0,
            assists INTEGER DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY,
            team1_id INTEGER NOT NULL,
            team2_id INTEGER NOT NULL,
            score1 INTEGER DEFAULT 0,
            score2 INTEGER DEFAULT 0,
            date_time TEXT NOT NULL,
            status TEXT DEFAULT 'scheduled',
            period INTEGER DEFAULT 1,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS goals (
            id INTEGER PRIMARY KEY,
            match_id INTEGER,
            team_id INTEGER,
            player_id INTEGER,
            period INTEGER,
            time TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
        CREATE INDEX IF NOT EXISTS idx_matches_date_time ON matches(date_time);
        CREATE INDEX IF NOT EXISTS idx_goals_match ON goals(match_id);
        CREATE INDEX IF NOT EXISTS idx_goals_player ON goals(player_id);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub(crate) fn load_match(conn: &Connection, match_id: MatchId) -> LeagueResult<Option<Match>> {
    Ok(conn
        .query_row(
            &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"),
            params![match_id],
            match_from_row,
        )
        .optional()?)
}

pub(crate) fn bump_player_goals(conn: &Connection, player_id: PlayerId) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE players SET goals = COALESCE(goals, 0) + 1 WHERE id = ?1",
        params![player_id],
    )
}

fn team_exists(conn: &Connection, team_id: TeamId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE id = ?1)",
        params![team_id],
        |row| row.get::<_, bool>(0),
    )
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}

// Columns written by older databases may be NULL or out of range; they read
// as zero/empty, and counters clamp into `u32`.
fn opt_u32(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .map(clamp_u32)
        .unwrap_or_default())
}

fn period_u32(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    Ok(row
        .get::<_, Option<i64>>(idx)?
        .map(clamp_u32)
        .unwrap_or(1)
        .max(1))
}

fn clamp_u32(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

// Free-text labels from older databases that match no position read as `None`.
fn opt_position(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Position>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|raw| raw.parse::<Position>().ok()))
}

fn opt_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        city: opt_text(row, 2)?,
        created_at: opt_text(row, 3)?,
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        team_id: row.get::<_, Option<TeamId>>(1)?.unwrap_or_default(),
        name: row.get(2)?,
        number: opt_u32(row, 3)?,
        position: opt_position(row, 4)?,
        goals: opt_u32(row, 5)?,
        assists: opt_u32(row, 6)?,
    })
}

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        team1_id: row.get(1)?,
        team2_id: row.get(2)?,
        score1: opt_u32(row, 3)?,
        score2: opt_u32(row, 4)?,
        status: row
            .get::<_, Option<MatchStatus>>(5)?
            .unwrap_or(MatchStatus::Scheduled),
        period: period_u32(row, 6)?,
        date_time: row.get(7)?,
        created_at: opt_text(row, 8)?,
    })
}

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        match_id: row.get::<_, Option<MatchId>>(1)?.unwrap_or_default(),
        team_id: row.get::<_, Option<TeamId>>(2)?.unwrap_or_default(),
        player_id: row.get::<_, Option<PlayerId>>(3)?.unwrap_or_default(),
        period: period_u32(row, 4)?,
        time: opt_text(row, 5)?,
        created_at: opt_text(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('admins', 'teams', 'players', 'matches', 'goals')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn legacy_rows_with_nulls_decode() {
        let store = Store::open_in_memory().unwrap();
        store
            .read(|conn| {
                conn.execute_batch(
                    "INSERT INTO teams (id, name) VALUES (1, 'Bears');
                     INSERT INTO players (id, name, position, team_id) VALUES (5, 'Ivan', 'Вратарь', 1);
                     INSERT INTO matches (id, team1_id, team2_id, date_time) VALUES (9, 1, 2, '2026-01-10T18:00');",
                )?;
                Ok(())
            })
            .unwrap();

        let team = store.get_team(1).unwrap().unwrap();
        assert_eq!(team.city, "");
        let player = store.get_player(5).unwrap().unwrap();
        assert_eq!(player.position, Some(Position::Goalie));
        assert_eq!(player.number, 0);
        assert_eq!(player.goals, 0);
        let game = store.get_match(9).unwrap().unwrap();
        assert_eq!(game.status, MatchStatus::Scheduled);
        assert_eq!(game.period, 1);
        assert_eq!((game.score1, game.score2), (0, 0));
    }
}
