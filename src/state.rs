use std::collections::VecDeque;

use crate::lifecycle::{MatchAction, Transition};
use crate::model::{GoalEntry, MatchId, Player, PlayerId, ScoreboardRow, TeamId, TeamRef};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Scoreboard,
    Roster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreForm {
    pub match_id: MatchId,
    pub score1: String,
    pub score2: String,
    pub second: bool,
}

impl ScoreForm {
    pub fn focused_mut(&mut self) -> &mut String {
        if self.second {
            &mut self.score2
        } else {
            &mut self.score1
        }
    }

    pub fn parsed(&self) -> Option<(u32, u32)> {
        let score1 = self.score1.trim().parse::<u32>().ok()?;
        let score2 = self.score2.trim().parse::<u32>().ok()?;
        Some((score1, score2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Team,
    Player,
    Period,
    Time,
}

impl GoalField {
    pub fn next(self) -> Self {
        match self {
            GoalField::Team => GoalField::Player,
            GoalField::Player => GoalField::Period,
            GoalField::Period => GoalField::Time,
            GoalField::Time => GoalField::Team,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalForm {
    pub match_id: MatchId,
    pub teams: Vec<TeamRef>,
    pub team_idx: usize,
    pub players: Vec<Player>,
    pub player_idx: usize,
    pub period: String,
    pub time: String,
    pub focus: GoalField,
}

impl GoalForm {
    pub fn new(match_id: MatchId, period: u32) -> Self {
        Self {
            match_id,
            teams: Vec::new(),
            team_idx: 0,
            players: Vec::new(),
            player_idx: 0,
            period: period.max(1).to_string(),
            time: String::new(),
            focus: GoalField::Team,
        }
    }

    pub fn team(&self) -> Option<&TeamRef> {
        self.teams.get(self.team_idx)
    }

    pub fn player(&self) -> Option<&Player> {
        self.players.get(self.player_idx)
    }

    /// Moves the focused picker. Switching team drops the loaded players.
    pub fn step(&mut self, forward: bool) {
        match self.focus {
            GoalField::Team => {
                let before = self.team_idx;
                self.team_idx = cycle(self.team_idx, self.teams.len(), forward);
                if self.team_idx != before {
                    self.players.clear();
                    self.player_idx = 0;
                }
            }
            GoalField::Player => {
                self.player_idx = cycle(self.player_idx, self.players.len(), forward);
            }
            GoalField::Period | GoalField::Time => {}
        }
    }

    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            GoalField::Period => Some(&mut self.period),
            GoalField::Time => Some(&mut self.time),
            GoalField::Team | GoalField::Player => None,
        }
    }

    pub fn submission(&self) -> Option<GoalSubmission> {
        let team = self.team()?;
        let player = self.player()?;
        let period = self.period.trim().parse::<u32>().ok().filter(|p| *p >= 1)?;
        let time = match self.time.trim() {
            "" => "00:00".to_string(),
            t => t.to_string(),
        };
        Some(GoalSubmission {
            match_id: self.match_id,
            team_id: team.id,
            player_id: player.id,
            period,
            time,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSubmission {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub period: u32,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Login(LoginForm),
    Score(ScoreForm),
    Goal(GoalForm),
    ConfirmDelete { match_id: MatchId },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub matches: Vec<ScoreboardRow>,
    pub selected: usize,
    pub loaded: bool,
    pub goals_match_id: Option<MatchId>,
    pub goals: Vec<GoalEntry>,
    pub roster_team_id: Option<TeamId>,
    pub roster_team: Option<String>,
    pub roster: Vec<Player>,
    pub roster_selected: usize,
    pub admin: Option<String>,
    pub modal: Option<Modal>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Scoreboard,
            matches: Vec::with_capacity(32),
            selected: 0,
            loaded: false,
            goals_match_id: None,
            goals: Vec::new(),
            roster_team_id: None,
            roster_team: None,
            roster: Vec::new(),
            roster_selected: 0,
            admin: None,
            modal: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn selected_match(&self) -> Option<&ScoreboardRow> {
        self.matches.get(self.selected)
    }

    pub fn selected_match_id(&self) -> Option<MatchId> {
        self.selected_match().map(|row| row.game.id)
    }

    pub fn is_admin(&self) -> bool {
        self.admin.is_some()
    }

    /// Admin controls are bound only when the selected match offers them.
    pub fn can(&self, action: MatchAction) -> bool {
        self.is_admin()
            && self
                .selected_match()
                .is_some_and(|row| row.game.status.offers(action))
    }

    pub fn transition_for(&self, action: MatchAction) -> Option<Transition> {
        let transition = match action {
            MatchAction::Start => Transition::Start,
            MatchAction::Pause => Transition::Pause,
            MatchAction::Resume => Transition::Resume,
            MatchAction::Finish => Transition::Finish,
            MatchAction::Score | MatchAction::Goal | MatchAction::Delete => return None,
        };
        self.can(action).then_some(transition)
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Scoreboard => {
                self.selected = cycle(self.selected, self.matches.len(), true);
            }
            Screen::Roster => {
                self.roster_selected = cycle(self.roster_selected, self.roster.len(), true);
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Scoreboard => {
                self.selected = cycle(self.selected, self.matches.len(), false);
            }
            Screen::Roster => {
                self.roster_selected = cycle(self.roster_selected, self.roster.len(), false);
            }
        }
    }

    pub fn clamp_selection(&mut self) {
        if self.matches.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.matches.len() {
            self.selected = self.matches.len() - 1;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

fn cycle(idx: usize, total: usize, forward: bool) -> usize {
    if total == 0 {
        return 0;
    }
    if forward {
        (idx + 1) % total
    } else if idx == 0 {
        total - 1
    } else {
        idx - 1
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetScoreboard(Vec<ScoreboardRow>),
    SetGoals {
        match_id: MatchId,
        goals: Vec<GoalEntry>,
    },
    SetRoster {
        team_id: TeamId,
        team_name: String,
        players: Vec<Player>,
    },
    SetGoalTeams {
        match_id: MatchId,
        teams: Vec<TeamRef>,
    },
    SetGoalPlayers {
        team_id: TeamId,
        players: Vec<Player>,
    },
    AdminChanged(Option<String>),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Refresh,
    Watch {
        match_id: MatchId,
    },
    FetchRoster {
        team_id: TeamId,
        team_name: String,
    },
    FetchGoalTeams {
        match_id: MatchId,
    },
    FetchGoalPlayers {
        team_id: TeamId,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Transition {
        match_id: MatchId,
        transition: Transition,
    },
    DeleteMatch {
        match_id: MatchId,
    },
    UpdateScore {
        match_id: MatchId,
        score1: u32,
        score2: u32,
    },
    RecordGoal(GoalSubmission),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetScoreboard(matches) => {
            let selected_id = state.selected_match_id();
            state.matches = matches;
            state.loaded = true;
            if let Some(id) = selected_id
                && let Some(pos) = state.matches.iter().position(|row| row.game.id == id)
            {
                state.selected = pos;
            }
            state.clamp_selection();
            if state.selected_match_id() != state.goals_match_id {
                state.goals.clear();
                state.goals_match_id = None;
            }
        }
        Delta::SetGoals { match_id, goals } => {
            if state.selected_match_id() == Some(match_id) {
                state.goals_match_id = Some(match_id);
                state.goals = goals;
            }
        }
        Delta::SetRoster {
            team_id,
            team_name,
            players,
        } => {
            state.roster_team_id = Some(team_id);
            state.roster_team = Some(team_name);
            state.roster = players;
            state.roster_selected = 0;
        }
        Delta::SetGoalTeams { match_id, teams } => {
            if let Some(Modal::Goal(form)) = state.modal.as_mut()
                && form.match_id == match_id
            {
                form.teams = teams;
                form.team_idx = 0;
                form.players.clear();
                form.player_idx = 0;
            }
        }
        Delta::SetGoalPlayers { team_id, players } => {
            if let Some(Modal::Goal(form)) = state.modal.as_mut()
                && form.team().is_some_and(|t| t.id == team_id)
            {
                form.players = players;
                form.player_idx = 0;
            }
        }
        Delta::AdminChanged(admin) => {
            state.admin = admin;
            if matches!(state.modal, Some(Modal::Login(_))) && state.admin.is_some() {
                state.modal = None;
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
