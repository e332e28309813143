use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::{info, warn};

use crate::error::{LeagueError, LeagueResult};
use crate::store::Store;

const HASH_SCHEME: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
pub const DEFAULT_ROUNDS: u32 = 60_000;

/// Proof that the caller logged in as a league admin.
///
/// Only [`login`] hands these out; every mutating lifecycle and scoring
/// operation takes one by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminToken {
    username: String,
}

impl AdminToken {
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone, Default)]
pub enum Access {
    #[default]
    Anonymous,
    Admin(AdminToken),
}

impl Access {
    pub fn require_admin(&self) -> LeagueResult<&AdminToken> {
        match self {
            Access::Admin(token) => Ok(token),
            Access::Anonymous => Err(LeagueError::Unauthorized),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Access::Admin(_))
    }
}

pub fn hash_password(password: &str) -> String {
    let salt = rand::random::<[u8; SALT_LEN]>();
    hash_password_with(password, &salt, DEFAULT_ROUNDS)
}

/// Encodes as `pbkdf2_sha256$<rounds>$<salt>$<key>` with base64 salt and key.
pub fn hash_password_with(password: &str, salt: &[u8], rounds: u32) -> String {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    format!(
        "{HASH_SCHEME}${rounds}${}${}",
        BASE64.encode(salt),
        BASE64.encode(key)
    )
}

pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(expected)) else {
        return false;
    };
    if rounds == 0 || expected.len() != KEY_LEN {
        return false;
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, rounds, &mut key);
    key.iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Seeds the configured admin, re-hashing when the stored hash no longer
/// matches the configured password.
pub fn ensure_admin(store: &Store, username: &str, password: &str) -> LeagueResult<()> {
    if let Some(stored) = store.admin_password_hash(username)?
        && verify_password(password, &stored)
    {
        return Ok(());
    }
    store.upsert_admin(username, &hash_password(password))?;
    info!(username, "admin.seeded");
    Ok(())
}

pub fn login(store: &Store, username: &str, password: &str) -> LeagueResult<AdminToken> {
    let verified = store
        .admin_password_hash(username)?
        .is_some_and(|stored| verify_password(password, &stored));
    if !verified {
        warn!(username, "admin.login_failed");
        return Err(LeagueError::Unauthorized);
    }
    info!(username, "admin.login");
    Ok(AdminToken {
        username: username.to_string(),
    })
}
