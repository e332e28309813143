use std::env;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::lifecycle::TransitionPolicy;

const APP_DIR: &str = "rinkboard";
const DB_FILE: &str = "league.sqlite";
const LOG_FILE: &str = "rinkboard.log";
const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_REFRESH_SECS: u64 = 5;

static CONFIG: OnceCell<LeagueConfig> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub db_path: PathBuf,
    pub admin_user: String,
    pub admin_password: Option<String>,
    pub transition_policy: TransitionPolicy,
    pub refresh: Duration,
    pub log_file: Option<PathBuf>,
}

impl LeagueConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        let db_path = non_empty("RINK_DB_PATH")
            .map(PathBuf::from)
            .or_else(|| default_data_dir(&non_empty).map(|dir| dir.join(DB_FILE)))
            .unwrap_or_else(|| PathBuf::from(DB_FILE));
        let admin_user = non_empty("RINK_ADMIN_USER")
            .map(|val| val.trim().to_string())
            .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string());
        let admin_password = non_empty("RINK_ADMIN_PASSWORD");
        let transition_policy = if non_empty("RINK_STRICT_TRANSITIONS")
            .as_deref()
            .is_some_and(parse_flag)
        {
            TransitionPolicy::Guarded
        } else {
            TransitionPolicy::Permissive
        };
        let refresh_secs = non_empty("RINK_REFRESH_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(1);
        let log_file = non_empty("RINK_LOG_FILE")
            .map(PathBuf::from)
            .or_else(|| default_cache_dir(&non_empty).map(|dir| dir.join(LOG_FILE)));

        Self {
            db_path,
            admin_user,
            admin_password,
            transition_policy,
            refresh: Duration::from_secs(refresh_secs),
            log_file,
        }
    }
}

/// Process-wide configuration, read from the environment on first use.
pub fn get() -> &'static LeagueConfig {
    CONFIG.get_or_init(LeagueConfig::from_env)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_data_dir(var: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(base) = var("XDG_DATA_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = var("HOME")?;
    Some(PathBuf::from(home).join(".local").join("share").join(APP_DIR))
}

fn default_cache_dir(var: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(base) = var("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = var("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
