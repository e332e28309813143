//! JSON request/response surface of the league core.
//!
//! Paths and payloads follow the league site's `/api/...` layout so
//! existing scripts and pages keep working against this implementation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::auth::Access;
use crate::error::{LeagueError, LeagueResult};
use crate::lifecycle::{self, Transition, TransitionPolicy};
use crate::model::{MatchId, Player, PlayerId, Position, TeamId};
use crate::roster;
use crate::scoring;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Transition {
        match_id: MatchId,
        transition: Transition,
    },
    DeleteMatch {
        match_id: MatchId,
    },
    UpdateScore {
        match_id: MatchId,
    },
    RecordGoal {
        match_id: MatchId,
    },
    CreateMatch,
    CreateTeam,
    CreatePlayer,
    MatchTeams {
        match_id: MatchId,
    },
    TeamPlayers {
        team_id: TeamId,
    },
    ListMatches,
    ListTeams,
}

impl Route {
    pub fn parse(method: &str, path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        let method = method.trim().to_ascii_uppercase();

        match (method.as_str(), segments.as_slice()) {
            ("POST", ["api", "match", "create"]) => Some(Route::CreateMatch),
            ("POST", ["api", "team", "create"]) => Some(Route::CreateTeam),
            ("POST", ["api", "player", "create"]) => Some(Route::CreatePlayer),
            ("POST", ["api", "match", action, id]) => {
                let match_id = parse_id(id)?;
                match *action {
                    "delete" => Some(Route::DeleteMatch { match_id }),
                    "update_score" => Some(Route::UpdateScore { match_id }),
                    "add_goal" => Some(Route::RecordGoal { match_id }),
                    other => other
                        .parse::<Transition>()
                        .ok()
                        .map(|transition| Route::Transition {
                            match_id,
                            transition,
                        }),
                }
            }
            ("GET", ["api", "match", id, "teams"]) => Some(Route::MatchTeams {
                match_id: parse_id(id)?,
            }),
            ("GET", ["api", "team", id, "players"]) => Some(Route::TeamPlayers {
                team_id: parse_id(id)?,
            }),
            ("GET", ["api", "matches"]) => Some(Route::ListMatches),
            ("GET", ["api", "teams"]) => Some(Route::ListTeams),
            _ => None,
        }
    }

    /// Whether the admin gate applies.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Route::MatchTeams { .. }
                | Route::TeamPlayers { .. }
                | Route::ListMatches
                | Route::ListTeams
        )
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub score1: u32,
    #[serde(default)]
    pub score2: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalRequest {
    pub team_id: TeamId,
    pub player_id: PlayerId,
    #[serde(default = "default_period")]
    pub period: u32,
    #[serde(default = "default_time")]
    pub time: String,
}

fn default_period() -> u32 {
    1
}

fn default_time() -> String {
    "00:00".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchRequest {
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub date_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlayerRequest {
    pub team_id: TeamId,
    pub name: String,
    pub number: u32,
    pub position: String,
}

/// Roster row as the squad endpoint returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub number: u32,
    pub position: Option<Position>,
    pub goals: u32,
    pub assists: u32,
}

impl From<Player> for RosterEntry {
    fn from(p: Player) -> Self {
        Self {
            id: p.id,
            name: p.name,
            number: p.number,
            position: p.position,
            goals: p.goals,
            assists: p.assists,
        }
    }
}

/// Runs one request and shapes the JSON answer; errors never escape.
pub fn dispatch(
    store: &Store,
    access: &Access,
    policy: TransitionPolicy,
    route: Route,
    body: &str,
) -> Value {
    debug!(?route, "api.dispatch");
    match handle(store, access, policy, route, body) {
        Ok(value) => value,
        Err(err) => {
            warn!(?route, error = %err, "api.failed");
            to_value(ApiResponse::failure(err.to_string()))
        }
    }
}

/// Answer for a path that matched no route.
pub fn unknown_route() -> Value {
    to_value(ApiResponse::failure("unknown route"))
}

fn handle(
    store: &Store,
    access: &Access,
    policy: TransitionPolicy,
    route: Route,
    body: &str,
) -> LeagueResult<Value> {
    let admin = if route.is_mutating() {
        Some(access.require_admin()?)
    } else {
        None
    };

    match (route, admin) {
        (
            Route::Transition {
                match_id,
                transition,
            },
            Some(admin),
        ) => {
            lifecycle::apply(store, admin, match_id, transition, policy)?;
            Ok(ok_value())
        }
        (Route::DeleteMatch { match_id }, Some(admin)) => {
            lifecycle::delete(store, admin, match_id)?;
            Ok(ok_value())
        }
        (Route::UpdateScore { match_id }, Some(admin)) => {
            let req: ScoreRequest = parse_body(body)?;
            scoring::update_score(store, admin, match_id, req.score1, req.score2)?;
            Ok(ok_value())
        }
        (Route::RecordGoal { match_id }, Some(admin)) => {
            let req: GoalRequest = parse_body(body)?;
            scoring::record_goal(
                store,
                admin,
                match_id,
                req.team_id,
                req.player_id,
                req.period,
                &req.time,
            )?;
            Ok(ok_value())
        }
        (Route::CreateMatch, Some(_)) => {
            let req: CreateMatchRequest = parse_body(body)?;
            store.create_match(req.team1_id, req.team2_id, &req.date_time)?;
            Ok(ok_value())
        }
        (Route::CreateTeam, Some(_)) => {
            let req: CreateTeamRequest = parse_body(body)?;
            store.create_team(&req.name, &req.city)?;
            Ok(ok_value())
        }
        (Route::CreatePlayer, Some(_)) => {
            let req: CreatePlayerRequest = parse_body(body)?;
            let position = req
                .position
                .parse::<Position>()
                .map_err(|err| LeagueError::validation(err.to_string()))?;
            store.create_player(req.team_id, &req.name, req.number, position)?;
            Ok(ok_value())
        }
        (Route::MatchTeams { match_id }, _) => {
            let teams = roster::get_match_teams(store, match_id)?;
            Ok(json!({ "teams": teams }))
        }
        (Route::TeamPlayers { team_id }, _) => {
            let players = roster::get_team_players(store, team_id)?
                .into_iter()
                .map(RosterEntry::from)
                .collect::<Vec<_>>();
            Ok(to_value(players))
        }
        (Route::ListMatches, _) => Ok(to_value(store.list_scoreboard()?)),
        (Route::ListTeams, _) => Ok(to_value(store.list_teams()?)),
        (_, None) => Err(LeagueError::Unauthorized),
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> LeagueResult<T> {
    let raw = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(raw)
        .map_err(|err| LeagueError::validation(format!("invalid request body: {err}")))
}

fn ok_value() -> Value {
    to_value(ApiResponse::ok())
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
