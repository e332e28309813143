pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod provider;
pub mod roster;
pub mod scoring;
pub mod state;
pub mod store;

pub use error::{LeagueError, LeagueResult};
pub use store::Store;
