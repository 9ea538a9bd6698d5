//! Configuration loaded from environment variables.

use std::env;
use std::net::IpAddr;

use anyhow::{Context, Result, bail};

use crate::models::Role;

/// Default seeded accounts: `admin`/`admin` and `user`/`user`.
const DEFAULT_USERS: &str = "admin:admin:ADMIN|USER,user:user:USER";

/// An account to seed into the user directory at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSeed {
    pub username: String,
    pub password: String,
    pub roles: Vec<Role>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8080). Zero binds an ephemeral port.
    pub port: u16,

    /// Address to bind (default: 0.0.0.0).
    pub bind_address: IpAddr,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// Mark the session cookie `Secure` (default: false).
    pub cookie_secure: bool,

    /// Session inactivity expiry in minutes (default: 30).
    pub session_expiry_minutes: i64,

    /// Realm advertised in `WWW-Authenticate` for management endpoints.
    pub management_realm: String,

    /// Public site URL used for the post-login redirect. When unset the
    /// redirect is built from the request `Host` header.
    pub site_url: Option<String>,

    /// Argon2 memory cost in KiB used when hashing seeded passwords.
    pub argon2_memory_kib: u32,

    /// Accounts seeded at startup.
    pub users: Vec<UserSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: IpAddr::from([0, 0, 0, 0]),
            cookie_same_site: "lax".to_string(),
            cookie_secure: false,
            session_expiry_minutes: 30,
            management_realm: "Gatehouse".to_string(),
            site_url: None,
            argon2_memory_kib: argon2::Params::DEFAULT_M_COST,
            users: parse_users(DEFAULT_USERS).unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let bind_address = match env::var("BIND_ADDRESS") {
            Ok(v) => v.parse().context("BIND_ADDRESS must be an IP address")?,
            Err(_) => defaults.bind_address,
        };

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or(defaults.cookie_same_site)
            .to_lowercase();

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(v) => parse_bool(&v).context("COOKIE_SECURE must be true or false")?,
            Err(_) => defaults.cookie_secure,
        };

        let session_expiry_minutes = match env::var("SESSION_EXPIRY_MINUTES") {
            Ok(v) => parse_expiry_minutes(&v).context("SESSION_EXPIRY_MINUTES is invalid")?,
            Err(_) => defaults.session_expiry_minutes,
        };

        let management_realm =
            env::var("MANAGEMENT_REALM").unwrap_or(defaults.management_realm);

        let site_url = env::var("SITE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let argon2_memory_kib = env::var("ARGON2_MEMORY_KIB")
            .unwrap_or_else(|_| defaults.argon2_memory_kib.to_string())
            .parse()
            .context("ARGON2_MEMORY_KIB must be a valid u32")?;

        let users = match env::var("GATEHOUSE_USERS") {
            Ok(v) => parse_users(&v).context("GATEHOUSE_USERS is malformed")?,
            Err(_) => defaults.users,
        };

        Ok(Self {
            port,
            bind_address,
            cookie_same_site,
            cookie_secure,
            session_expiry_minutes,
            management_realm,
            site_url,
            argon2_memory_kib,
            users,
        })
    }
}

/// Parse `name:password:ROLE|ROLE` entries separated by commas.
pub fn parse_users(list: &str) -> Result<Vec<UserSeed>> {
    let mut users = Vec::new();

    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(3, ':');
        let (Some(username), Some(password), Some(roles)) =
            (parts.next(), parts.next(), parts.next())
        else {
            bail!("expected name:password:ROLES, got {entry:?}");
        };

        if username.is_empty() {
            bail!("empty username in {entry:?}");
        }

        let roles = roles
            .split('|')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Role>>>()?;

        if roles.is_empty() {
            bail!("user {username:?} has no roles");
        }

        users.push(UserSeed {
            username: username.to_string(),
            password: password.to_string(),
            roles,
        });
    }

    Ok(users)
}

/// Longest accepted session inactivity expiry: one year.
const MAX_SESSION_EXPIRY_MINUTES: i64 = 525_600;

fn parse_expiry_minutes(value: &str) -> Result<i64> {
    let minutes: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("not an integer: {value:?}"))?;
    if !(1..=MAX_SESSION_EXPIRY_MINUTES).contains(&minutes) {
        bail!("{minutes} is outside 1..={MAX_SESSION_EXPIRY_MINUTES} minutes");
    }
    Ok(minutes)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: {other:?}"),
    }
}
