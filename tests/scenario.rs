mod common;

use rinkboard::lifecycle;
use rinkboard::model::{MatchStatus, Position};
use rinkboard::roster;
use rinkboard::scoring;

#[test]
fn full_match_from_schedule_to_delete() {
    let common::League { store, admin } = common::league();

    let team_a = store.create_team("Team A", "Ufa").unwrap();
    let team_b = store.create_team("Team B", "Perm").unwrap();
    let player_a = store
        .create_player(team_a, "Artem Kuznetsov", 22, Position::Forward)
        .unwrap();
    let game = store
        .create_match(team_a, team_b, "2026-01-10T18:00")
        .unwrap();

    lifecycle::start(&store, &admin, game).unwrap();
    let m = store.get_match(game).unwrap().unwrap();
    assert_eq!((m.status, m.period), (MatchStatus::Live, 1));
    assert_eq!(
        m.status.available_actions().len(),
        MatchStatus::Live.available_actions().len()
    );

    let teams = roster::get_match_teams(&store, game).unwrap();
    assert_eq!(teams[0].id, team_a);
    let scorer = roster::get_team_players(&store, teams[0].id).unwrap()[0].id;
    assert_eq!(scorer, player_a);

    scoring::record_goal(&store, &admin, game, team_a, scorer, 1, "05:23").unwrap();
    let m = store.get_match(game).unwrap().unwrap();
    assert_eq!((m.score1, m.score2), (1, 0));
    assert_eq!(store.get_player(player_a).unwrap().unwrap().goals, 1);

    lifecycle::pause(&store, &admin, game).unwrap();
    assert_eq!(
        store.get_match(game).unwrap().unwrap().status,
        MatchStatus::Intermission
    );

    lifecycle::resume(&store, &admin, game).unwrap();
    assert_eq!(
        store.get_match(game).unwrap().unwrap().status,
        MatchStatus::Live
    );

    lifecycle::finish(&store, &admin, game).unwrap();
    let m = store.get_match(game).unwrap().unwrap();
    assert_eq!(m.status, MatchStatus::Finished);
    assert_eq!((m.score1, m.score2), (1, 0));

    lifecycle::delete(&store, &admin, game).unwrap();
    assert!(store.get_match(game).unwrap().is_none());
    assert!(store.list_scoreboard().unwrap().is_empty());
}
