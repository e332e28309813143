#![allow(dead_code)]

use rinkboard::auth::{self, AdminToken};
use rinkboard::model::{MatchId, PlayerId, Position, TeamId};
use rinkboard::store::Store;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "rink-secret";

pub struct League {
    pub store: Store,
    pub admin: AdminToken,
}

#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub home: TeamId,
    pub away: TeamId,
    pub home_player: PlayerId,
    pub away_player: PlayerId,
    pub game: MatchId,
}

pub fn league() -> League {
    let store = Store::open_in_memory().expect("in-memory store");
    let admin = admin_for(&store);
    League { store, admin }
}

pub fn admin_for(store: &Store) -> AdminToken {
    auth::ensure_admin(store, ADMIN_USER, ADMIN_PASSWORD).expect("seed admin");
    auth::login(store, ADMIN_USER, ADMIN_PASSWORD).expect("admin login")
}

/// Two teams with one forward each and a scheduled match between them.
pub fn fixture(store: &Store) -> Fixture {
    let home = store.create_team("Ice Wolves", "Kazan").expect("home team");
    let away = store.create_team("Polar Bears", "Omsk").expect("away team");
    let home_player = store
        .create_player(home, "Ivan Petrov", 17, Position::Forward)
        .expect("home player");
    let away_player = store
        .create_player(away, "Oleg Smirnov", 91, Position::Forward)
        .expect("away player");
    let game = store
        .create_match(home, away, "2026-01-10T18:00")
        .expect("match");
    Fixture {
        home,
        away,
        home_player,
        away_player,
        game,
    }
}
