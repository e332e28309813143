use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("Not authorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LeagueError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LeagueError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LeagueError::Validation(_))
    }
}

pub type LeagueResult<T> = std::result::Result<T, LeagueError>;
