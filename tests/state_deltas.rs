use rinkboard::lifecycle::{MatchAction, Transition};
use rinkboard::model::{
    Goal, GoalEntry, Match, MatchStatus, Player, Position, ScoreboardRow, TeamRef,
};
use rinkboard::state::{
    AppState, Delta, GoalField, GoalForm, LoginField, LoginForm, Modal, apply_delta,
};

fn row(id: i64, status: MatchStatus) -> ScoreboardRow {
    ScoreboardRow {
        game: Match {
            id,
            team1_id: 1,
            team2_id: 2,
            score1: 0,
            score2: 0,
            status,
            period: 1,
            date_time: format!("2026-01-{:02}T18:00", id),
            created_at: String::new(),
        },
        team1_name: Some("HOME".to_string()),
        team1_city: None,
        team2_name: Some("AWAY".to_string()),
        team2_city: None,
    }
}

fn player(id: i64, team_id: i64, number: u32) -> Player {
    Player {
        id,
        team_id,
        name: format!("P{id}"),
        number,
        position: Some(Position::Forward),
        goals: 0,
        assists: 0,
    }
}

fn goal(id: i64, match_id: i64) -> GoalEntry {
    GoalEntry {
        goal: Goal {
            id,
            match_id,
            team_id: 1,
            player_id: 7,
            period: 1,
            time: "01:00".to_string(),
            created_at: String::new(),
        },
        player_name: Some("P7".to_string()),
        player_number: Some(7),
    }
}

#[test]
fn scoreboard_refresh_keeps_selected_match() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetScoreboard(vec![
            row(3, MatchStatus::Live),
            row(2, MatchStatus::Scheduled),
            row(1, MatchStatus::Finished),
        ]),
    );
    state.select_next();
    assert_eq!(state.selected_match_id(), Some(2));

    apply_delta(
        &mut state,
        Delta::SetScoreboard(vec![
            row(4, MatchStatus::Scheduled),
            row(3, MatchStatus::Live),
            row(2, MatchStatus::Scheduled),
            row(1, MatchStatus::Finished),
        ]),
    );
    assert_eq!(state.selected_match_id(), Some(2));
    assert_eq!(state.selected, 2);
}

#[test]
fn deleted_selection_clamps_and_drops_goal_log() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetScoreboard(vec![row(2, MatchStatus::Live), row(1, MatchStatus::Live)]),
    );
    state.select_next();
    apply_delta(
        &mut state,
        Delta::SetGoals {
            match_id: 1,
            goals: vec![goal(10, 1)],
        },
    );
    assert_eq!(state.goals.len(), 1);

    apply_delta(&mut state, Delta::SetScoreboard(vec![row(2, MatchStatus::Live)]));
    assert_eq!(state.selected_match_id(), Some(2));
    assert!(state.goals.is_empty());
    assert_eq!(state.goals_match_id, None);
}

#[test]
fn goals_for_other_match_are_ignored() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetScoreboard(vec![row(5, MatchStatus::Live)]));
    apply_delta(
        &mut state,
        Delta::SetGoals {
            match_id: 6,
            goals: vec![goal(1, 6)],
        },
    );
    assert!(state.goals.is_empty());
    assert_eq!(state.goals_match_id, None);
}

#[test]
fn admin_keys_follow_status_and_session() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetScoreboard(vec![row(1, MatchStatus::Intermission)]),
    );
    assert_eq!(state.transition_for(MatchAction::Resume), None);

    apply_delta(&mut state, Delta::AdminChanged(Some("admin".to_string())));
    assert_eq!(
        state.transition_for(MatchAction::Resume),
        Some(Transition::Resume)
    );
    assert_eq!(state.transition_for(MatchAction::Start), None);
    assert!(!state.can(MatchAction::Goal));
    assert!(state.can(MatchAction::Delete));

    apply_delta(&mut state, Delta::AdminChanged(None));
    assert!(!state.can(MatchAction::Delete));
}

#[test]
fn successful_login_closes_login_modal() {
    let mut state = AppState::new();
    state.modal = Some(Modal::Login(LoginForm {
        username: "admin".to_string(),
        password: "pw".to_string(),
        focus: LoginField::Password,
    }));
    apply_delta(&mut state, Delta::Log("[WARN] Invalid username or password".to_string()));
    assert!(state.modal.is_some());

    apply_delta(&mut state, Delta::AdminChanged(Some("admin".to_string())));
    assert!(state.modal.is_none());
    assert!(state.is_admin());
}

#[test]
fn goal_form_fills_in_teams_then_players() {
    let mut state = AppState::new();
    state.modal = Some(Modal::Goal(GoalForm::new(9, 2)));

    apply_delta(
        &mut state,
        Delta::SetGoalTeams {
            match_id: 9,
            teams: vec![
                TeamRef {
                    id: 1,
                    name: "HOME".to_string(),
                },
                TeamRef {
                    id: 2,
                    name: "AWAY".to_string(),
                },
            ],
        },
    );
    apply_delta(
        &mut state,
        Delta::SetGoalPlayers {
            team_id: 2,
            players: vec![player(20, 2, 4)],
        },
    );
    let Some(Modal::Goal(form)) = state.modal.as_mut() else {
        panic!("goal modal should stay open");
    };
    assert!(form.players.is_empty());
    assert!(form.submission().is_none());

    form.focus = GoalField::Team;
    form.step(true);
    assert_eq!(form.team().map(|t| t.id), Some(2));

    apply_delta(
        &mut state,
        Delta::SetGoalPlayers {
            team_id: 2,
            players: vec![player(20, 2, 4), player(21, 2, 9)],
        },
    );
    let Some(Modal::Goal(form)) = state.modal.as_mut() else {
        panic!("goal modal should stay open");
    };
    form.focus = GoalField::Player;
    form.step(false);
    let goal = form.submission().expect("complete form");
    assert_eq!(goal.match_id, 9);
    assert_eq!(goal.team_id, 2);
    assert_eq!(goal.player_id, 21);
    assert_eq!(goal.period, 2);
    assert_eq!(goal.time, "00:00");
}

#[test]
fn goal_form_rejects_period_zero() {
    let mut form = GoalForm::new(1, 1);
    form.teams = vec![TeamRef {
        id: 1,
        name: "HOME".to_string(),
    }];
    form.players = vec![player(3, 1, 10)];
    form.period = "0".to_string();
    assert!(form.submission().is_none());

    form.period = "3".to_string();
    form.time = "12:34".to_string();
    let goal = form.submission().unwrap();
    assert_eq!((goal.period, goal.time.as_str()), (3, "12:34"));
}

#[test]
fn roster_delta_resets_cursor_and_logs_are_capped() {
    let mut state = AppState::new();
    state.roster_selected = 5;
    apply_delta(
        &mut state,
        Delta::SetRoster {
            team_id: 1,
            team_name: "HOME".to_string(),
            players: vec![player(1, 1, 1), player(2, 1, 2)],
        },
    );
    assert_eq!(state.roster_selected, 0);
    assert_eq!(state.roster_team.as_deref(), Some("HOME"));

    for n in 0..250 {
        state.push_log(format!("line {n}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.back().map(String::as_str), Some("line 249"));
}
