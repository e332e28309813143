use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use rinkboard::api::{self, Route};
use rinkboard::auth::{self, Access};
use rinkboard::config;
use rinkboard::logging;
use rinkboard::store::Store;

const USAGE: &str =
    "usage: league_admin [--db PATH] [--user U] [--password P] <METHOD> <PATH> [JSON_BODY]";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    db: Option<PathBuf>,
    user: Option<String>,
    password: Option<String>,
    positional: Vec<String>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_stderr();

    let args = parse_args(std::env::args().skip(1))?;
    let [method, path, rest @ ..] = args.positional.as_slice() else {
        bail!("{USAGE}");
    };
    let body = rest.join(" ");

    let cfg = config::get();
    let db_path = args.db.clone().unwrap_or_else(|| cfg.db_path.clone());
    let store = Store::open(&db_path)?;
    if let Some(password) = cfg.admin_password.as_deref() {
        auth::ensure_admin(&store, &cfg.admin_user, password).context("seed admin account")?;
    }

    let access = match args.password.as_deref().or(cfg.admin_password.as_deref()) {
        Some(password) => {
            let user = args.user.as_deref().unwrap_or(&cfg.admin_user);
            match auth::login(&store, user, password) {
                Ok(token) => Access::Admin(token),
                Err(err) => {
                    eprintln!("login as {user} failed: {err}");
                    Access::Anonymous
                }
            }
        }
        None => Access::Anonymous,
    };

    let response = match Route::parse(method, path) {
        Some(route) => api::dispatch(&store, &access, cfg.transition_policy, route, &body),
        None => api::unknown_route(),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<CliArgs> {
    let raw = raw.collect::<Vec<_>>();
    let mut args = CliArgs::default();
    let mut idx = 0;
    while idx < raw.len() {
        let arg = &raw[idx];
        idx += 1;
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let slot = match flag {
            "--db" | "--user" | "--password" => flag,
            _ => {
                args.positional.push(arg.clone());
                continue;
            }
        };
        let value = match inline {
            Some(value) => value,
            None => {
                let Some(next) = raw.get(idx) else {
                    bail!("missing value for {slot}\n{USAGE}");
                };
                idx += 1;
                next.clone()
            }
        };
        match slot {
            "--db" => args.db = Some(PathBuf::from(value)),
            "--user" => args.user = Some(value),
            _ => args.password = Some(value),
        }
    }
    Ok(args)
}
