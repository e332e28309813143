use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TeamId = i64;
pub type PlayerId = i64;
pub type MatchId = i64;
pub type GoalId = i64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseLabelError {
    kind: &'static str,
    value: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lifecycle stage of a match.
///
/// The stored/wire label of `Intermission` is `"period"`, which is what the
/// legacy league database holds for a match on a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    #[serde(rename = "period")]
    Intermission,
    Finished,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Intermission => "period",
            MatchStatus::Finished => "finished",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::Live => "Live",
            MatchStatus::Intermission => "Intermission",
            MatchStatus::Finished => "Finished",
        }
    }

    /// Period is only meaningful while the match is being played.
    pub fn shows_period(self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::Intermission)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "live" => Ok(MatchStatus::Live),
            "period" | "intermission" => Ok(MatchStatus::Intermission),
            "finished" => Ok(MatchStatus::Finished),
            _ => Err(ParseLabelError::new("match status", raw)),
        }
    }
}

impl ToSql for MatchStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MatchStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Forward,
    Defenseman,
    Goalie,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Forward => "forward",
            Position::Defenseman => "defenseman",
            Position::Goalie => "goalie",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Forward => "F",
            Position::Defenseman => "D",
            Position::Goalie => "G",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = ParseLabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Cyrillic labels are what the league's first admin panel wrote.
        match raw.trim().to_lowercase().as_str() {
            "forward" | "f" | "нападающий" => Ok(Position::Forward),
            "defenseman" | "defenceman" | "defender" | "defence" | "defense" | "d"
            | "защитник" => Ok(Position::Defenseman),
            "goalie" | "goaltender" | "g" | "вратарь" => Ok(Position::Goalie),
            _ => Err(ParseLabelError::new("position", raw)),
        }
    }
}

impl ToSql for Position {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub city: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    pub number: u32,
    // `None` for rows whose stored label names no known position.
    pub position: Option<Position>,
    pub goals: u32,
    // Never incremented; kept so the record mirrors the league sheet.
    pub assists: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
    pub period: u32,
    pub date_time: String,
    pub created_at: String,
}

impl Match {
    pub fn total_goals(&self) -> u32 {
        self.score1.saturating_add(self.score2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub period: u32,
    pub time: String,
    pub created_at: String,
}

/// A goal with its scorer's roster fields, for goal logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEntry {
    #[serde(flatten)]
    pub goal: Goal,
    pub player_name: Option<String>,
    pub player_number: Option<u32>,
}

/// Participant reference handed to goal-recording pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

/// A match with its participants' display fields, as the scoreboard lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardRow {
    #[serde(flatten)]
    pub game: Match,
    pub team1_name: Option<String>,
    pub team1_city: Option<String>,
    pub team2_name: Option<String>,
    pub team2_city: Option<String>,
}

impl ScoreboardRow {
    pub fn team1_label(&self) -> String {
        team_label(self.game.team1_id, self.team1_name.as_deref())
    }

    pub fn team2_label(&self) -> String {
        team_label(self.game.team2_id, self.team2_name.as_deref())
    }
}

/// Display name for a team reference that may dangle.
pub fn team_label(id: TeamId, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("Team #{id}"),
    }
}
