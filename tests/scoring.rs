mod common;

use rinkboard::lifecycle;
use rinkboard::model::Position;
use rinkboard::scoring;

use common::{fixture, league};

#[test]
fn home_goal_increments_score1_only() {
    let league = league();
    let fx = fixture(&league.store);

    scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        fx.home,
        fx.home_player,
        1,
        "05:23",
    )
    .unwrap();

    let game = league.store.get_match(fx.game).unwrap().unwrap();
    assert_eq!((game.score1, game.score2), (1, 0));
}

#[test]
fn any_other_team_is_credited_to_score2() {
    let league = league();
    let fx = fixture(&league.store);
    let outsider = league.store.create_team("Night Owls", "Tver").unwrap();
    let outsider_player = league
        .store
        .create_player(outsider, "Pavel Orlov", 5, Position::Defenseman)
        .unwrap();

    scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        fx.away,
        fx.away_player,
        1,
        "01:00",
    )
    .unwrap();
    scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        outsider,
        outsider_player,
        2,
        "11:40",
    )
    .unwrap();

    let game = league.store.get_match(fx.game).unwrap().unwrap();
    assert_eq!((game.score1, game.score2), (0, 2));
    assert_eq!(league.store.list_goals(fx.game).unwrap().len(), 2);
}

#[test]
fn goal_credits_scorer_once_and_never_assists() {
    let league = league();
    let fx = fixture(&league.store);

    for minute in ["03:10", "07:45", "19:59"] {
        scoring::record_goal(
            &league.store,
            &league.admin,
            fx.game,
            fx.home,
            fx.home_player,
            1,
            minute,
        )
        .unwrap();
    }

    let scorer = league.store.get_player(fx.home_player).unwrap().unwrap();
    assert_eq!(scorer.goals, 3);
    assert_eq!(scorer.assists, 0);
    let other = league.store.get_player(fx.away_player).unwrap().unwrap();
    assert_eq!(other.goals, 0);
    assert_eq!(league.store.count_goals_for_player(fx.home_player).unwrap(), 3);
}

#[test]
fn goal_rows_keep_period_and_time() {
    let league = league();
    let fx = fixture(&league.store);

    let second = scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        fx.away,
        fx.away_player,
        2,
        "04:02",
    )
    .unwrap();
    let first = scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        fx.home,
        fx.home_player,
        1,
        "18:30",
    )
    .unwrap();

    let goals = league.store.list_goals(fx.game).unwrap();
    let ids = goals.iter().map(|g| g.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(goals[0].period, 1);
    assert_eq!(goals[0].time, "18:30");
    assert_eq!(goals[1].team_id, fx.away);
    assert!(!goals[1].created_at.is_empty());
}

#[test]
fn override_resets_the_baseline() {
    let league = league();
    let fx = fixture(&league.store);
    let goal = |team, player| {
        scoring::record_goal(
            &league.store,
            &league.admin,
            fx.game,
            team,
            player,
            1,
            "00:30",
        )
        .unwrap();
    };

    goal(fx.home, fx.home_player);
    goal(fx.away, fx.away_player);
    scoring::update_score(&league.store, &league.admin, fx.game, 3, 2).unwrap();

    let game = league.store.get_match(fx.game).unwrap().unwrap();
    assert_eq!((game.score1, game.score2), (3, 2));
    assert_eq!(league.store.list_goals(fx.game).unwrap().len(), 2);

    goal(fx.home, fx.home_player);
    let game = league.store.get_match(fx.game).unwrap().unwrap();
    assert_eq!(game.total_goals(), 6);
}

#[test]
fn override_on_missing_match_is_a_noop() {
    let league = league();
    scoring::update_score(&league.store, &league.admin, 77, 4, 4).unwrap();
    assert!(league.store.get_match(77).unwrap().is_none());
}

#[test]
fn goal_against_deleted_match_still_credits_player() {
    let league = league();
    let fx = fixture(&league.store);
    lifecycle::delete(&league.store, &league.admin, fx.game).unwrap();

    scoring::record_goal(
        &league.store,
        &league.admin,
        fx.game,
        fx.home,
        fx.home_player,
        1,
        "10:00",
    )
    .unwrap();

    assert!(league.store.get_match(fx.game).unwrap().is_none());
    assert_eq!(league.store.list_goals(fx.game).unwrap().len(), 1);
    let scorer = league.store.get_player(fx.home_player).unwrap().unwrap();
    assert_eq!(scorer.goals, 1);
}
