use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::warn;

use crate::auth::{self, AdminToken};
use crate::error::{LeagueError, LeagueResult};
use crate::lifecycle::{self, TransitionPolicy};
use crate::model::MatchId;
use crate::roster;
use crate::scoring;
use crate::state::{Delta, ProviderCommand};
use crate::store::Store;

/// Owns the store and the admin session on behalf of the terminal.
pub struct LeagueProvider {
    store: Store,
    policy: TransitionPolicy,
    admin: Option<AdminToken>,
    watched: Option<MatchId>,
    tx: Sender<Delta>,
}

impl LeagueProvider {
    pub fn new(store: Store, policy: TransitionPolicy, tx: Sender<Delta>) -> Self {
        Self {
            store,
            policy,
            admin: None,
            watched: None,
            tx,
        }
    }

    /// Runs commands until the sender side hangs up, re-reading the
    /// scoreboard every `refresh` while idle.
    pub fn run(mut self, cmd_rx: Receiver<ProviderCommand>, refresh: Duration) {
        self.refresh();
        loop {
            match cmd_rx.recv_timeout(refresh) {
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => self.refresh(),
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }

    pub fn handle(&mut self, cmd: ProviderCommand) {
        match cmd {
            ProviderCommand::Refresh => self.refresh(),
            ProviderCommand::Watch { match_id } => {
                self.watched = Some(match_id);
                self.send_goals();
            }
            ProviderCommand::FetchRoster { team_id, team_name } => {
                match roster::get_team_players(&self.store, team_id) {
                    Ok(players) => self.send(Delta::SetRoster {
                        team_id,
                        team_name,
                        players,
                    }),
                    Err(err) => self.warn(format!("Roster load failed: {err}")),
                }
            }
            ProviderCommand::FetchGoalTeams { match_id } => {
                match roster::get_match_teams(&self.store, match_id) {
                    Ok(teams) => self.send(Delta::SetGoalTeams { match_id, teams }),
                    Err(err) => self.warn(format!("Team lookup failed: {err}")),
                }
            }
            ProviderCommand::FetchGoalPlayers { team_id } => {
                match roster::get_team_players(&self.store, team_id) {
                    Ok(players) => self.send(Delta::SetGoalPlayers { team_id, players }),
                    Err(err) => self.warn(format!("Player lookup failed: {err}")),
                }
            }
            ProviderCommand::Login { username, password } => {
                match auth::login(&self.store, username.trim(), &password) {
                    Ok(token) => {
                        self.info(format!("Logged in as {}", token.username()));
                        self.send(Delta::AdminChanged(Some(token.username().to_string())));
                        self.admin = Some(token);
                    }
                    Err(_) => self.warn("Invalid username or password"),
                }
            }
            ProviderCommand::Logout => {
                self.admin = None;
                self.send(Delta::AdminChanged(None));
                self.info("Logged out");
            }
            ProviderCommand::Transition {
                match_id,
                transition,
            } => {
                let policy = self.policy;
                self.mutate(&format!("{transition} match {match_id}"), |store, admin| {
                    lifecycle::apply(store, admin, match_id, transition, policy)
                });
            }
            ProviderCommand::DeleteMatch { match_id } => {
                self.mutate(&format!("delete match {match_id}"), |store, admin| {
                    lifecycle::delete(store, admin, match_id)
                });
            }
            ProviderCommand::UpdateScore {
                match_id,
                score1,
                score2,
            } => {
                self.mutate(
                    &format!("set score {score1}:{score2} on match {match_id}"),
                    |store, admin| scoring::update_score(store, admin, match_id, score1, score2),
                );
            }
            ProviderCommand::RecordGoal(goal) => {
                self.mutate(
                    &format!("goal in match {} ({})", goal.match_id, goal.time),
                    |store, admin| {
                        scoring::record_goal(
                            store,
                            admin,
                            goal.match_id,
                            goal.team_id,
                            goal.player_id,
                            goal.period,
                            &goal.time,
                        )
                        .map(|_| ())
                    },
                );
            }
        }
    }

    fn mutate(
        &mut self,
        what: &str,
        op: impl FnOnce(&Store, &AdminToken) -> LeagueResult<()>,
    ) {
        let result = match self.admin.as_ref() {
            Some(admin) => op(&self.store, admin),
            None => Err(LeagueError::Unauthorized),
        };
        match result {
            Ok(()) => self.info(format!("Done: {what}")),
            Err(err) => self.warn(format!("Failed to {what}: {err}")),
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        match self.store.list_scoreboard() {
            Ok(rows) => {
                if let Some(id) = self.watched
                    && !rows.iter().any(|row| row.game.id == id)
                {
                    self.watched = None;
                }
                self.send(Delta::SetScoreboard(rows));
            }
            Err(err) => self.warn(format!("Scoreboard load failed: {err}")),
        }
        self.send_goals();
    }

    fn send_goals(&mut self) {
        let Some(match_id) = self.watched else {
            return;
        };
        match self.store.list_goal_entries(match_id) {
            Ok(goals) => self.send(Delta::SetGoals { match_id, goals }),
            Err(err) => self.warn(format!("Goal log load failed: {err}")),
        }
    }

    fn info(&self, msg: impl AsRef<str>) {
        self.send(Delta::Log(format!("[INFO] {}", msg.as_ref())));
    }

    fn warn(&self, msg: impl AsRef<str>) {
        warn!(detail = msg.as_ref(), "provider.warning");
        self.send(Delta::Log(format!("[WARN] {}", msg.as_ref())));
    }

    fn send(&self, delta: Delta) {
        let _ = self.tx.send(delta);
    }
}

pub fn spawn_league_provider(
    store: Store,
    policy: TransitionPolicy,
    refresh: Duration,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || LeagueProvider::new(store, policy, tx).run(cmd_rx, refresh))
}
