mod common;

use std::sync::mpsc;

use rinkboard::lifecycle::{Transition, TransitionPolicy};
use rinkboard::model::MatchStatus;
use rinkboard::provider::LeagueProvider;
use rinkboard::state::{AppState, Delta, ProviderCommand, apply_delta};
use rinkboard::store::Store;

fn drain(rx: &mpsc::Receiver<Delta>, state: &mut AppState) {
    while let Ok(delta) = rx.try_recv() {
        apply_delta(state, delta);
    }
}

fn provider_with_fixture() -> (LeagueProvider, mpsc::Receiver<Delta>, common::Fixture) {
    let store = Store::open_in_memory().unwrap();
    rinkboard::auth::ensure_admin(&store, common::ADMIN_USER, common::ADMIN_PASSWORD).unwrap();
    let fx = common::fixture(&store);
    let (tx, rx) = mpsc::channel();
    (
        LeagueProvider::new(store, TransitionPolicy::Permissive, tx),
        rx,
        fx,
    )
}

#[test]
fn mutations_need_a_login() {
    let (mut provider, rx, fx) = provider_with_fixture();
    let mut state = AppState::new();

    provider.handle(ProviderCommand::Transition {
        match_id: fx.game,
        transition: Transition::Start,
    });
    drain(&rx, &mut state);
    assert_eq!(state.matches[0].game.status, MatchStatus::Scheduled);
    assert!(state.logs.iter().any(|l| l.contains("Not authorized")));

    provider.handle(ProviderCommand::Login {
        username: common::ADMIN_USER.to_string(),
        password: "wrong".to_string(),
    });
    drain(&rx, &mut state);
    assert!(!state.is_admin());

    provider.handle(ProviderCommand::Login {
        username: common::ADMIN_USER.to_string(),
        password: common::ADMIN_PASSWORD.to_string(),
    });
    provider.handle(ProviderCommand::Transition {
        match_id: fx.game,
        transition: Transition::Start,
    });
    drain(&rx, &mut state);
    assert!(state.is_admin());
    assert_eq!(state.matches[0].game.status, MatchStatus::Live);

    provider.handle(ProviderCommand::Logout);
    provider.handle(ProviderCommand::DeleteMatch { match_id: fx.game });
    drain(&rx, &mut state);
    assert!(!state.is_admin());
    assert_eq!(state.matches.len(), 1);
}

#[test]
fn watched_match_streams_its_goal_log() {
    let (mut provider, rx, fx) = provider_with_fixture();
    let mut state = AppState::new();

    provider.handle(ProviderCommand::Login {
        username: common::ADMIN_USER.to_string(),
        password: common::ADMIN_PASSWORD.to_string(),
    });
    provider.handle(ProviderCommand::Refresh);
    drain(&rx, &mut state);
    provider.handle(ProviderCommand::Watch { match_id: fx.game });
    provider.handle(ProviderCommand::RecordGoal(rinkboard::state::GoalSubmission {
        match_id: fx.game,
        team_id: fx.away,
        player_id: fx.away_player,
        period: 2,
        time: "08:15".to_string(),
    }));
    drain(&rx, &mut state);

    assert_eq!(state.goals_match_id, Some(fx.game));
    assert_eq!(state.goals.len(), 1);
    assert_eq!(state.goals[0].player_name.as_deref(), Some("Oleg Smirnov"));
    assert_eq!(state.goals[0].player_number, Some(91));
    let game = &state.matches[0].game;
    assert_eq!((game.score1, game.score2), (0, 1));
}

#[test]
fn roster_and_goal_pickers_are_served() {
    let (mut provider, rx, fx) = provider_with_fixture();

    provider.handle(ProviderCommand::FetchGoalTeams { match_id: fx.game });
    provider.handle(ProviderCommand::FetchRoster {
        team_id: fx.home,
        team_name: "Ice Wolves".to_string(),
    });

    let deltas = rx.try_iter().collect::<Vec<_>>();
    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::SetGoalTeams { match_id, teams } if *match_id == fx.game && teams.len() == 2
    )));
    assert!(deltas.iter().any(|d| matches!(
        d,
        Delta::SetRoster { team_id, players, .. } if *team_id == fx.home && players.len() == 1
    )));
}
