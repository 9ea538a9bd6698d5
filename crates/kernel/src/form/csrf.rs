//! CSRF token generation and verification.
//!
//! Tokens live in the session as a short list of [`IssuedToken`]s. Each one is
//! accepted at most once and only within [`TOKEN_VALIDITY_SECS`] of issue.
//!
//! Concurrent requests on one session each work on their own copy of the
//! session data, so the copy alone cannot enforce single use. Consumption is
//! claimed in a process-wide [`CsrfLedger`] before the copy is updated.

use anyhow::{Result, bail};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::warn;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "_csrf";

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of tokens to store per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

/// Prune expired ledger entries once it grows past this many.
const LEDGER_PRUNE_THRESHOLD: usize = 1024;

/// Process-wide record of consumed tokens.
///
/// Key is the token value, value is its issue time. Entries are dropped once
/// the token would have expired anyway.
#[derive(Debug, Default)]
pub struct CsrfLedger {
    consumed: DashMap<String, i64>,
}

impl CsrfLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token consumed. Returns `false` if it already was.
    fn claim(&self, token: &str, issued_at: i64, now: i64) -> bool {
        if self.consumed.len() > LEDGER_PRUNE_THRESHOLD {
            self.consumed
                .retain(|_, issued| now - *issued <= TOKEN_VALIDITY_SECS);
        }

        match self.consumed.entry(token.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(issued_at);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

/// A token as remembered by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IssuedToken {
    value: String,
    issued_at: i64,
}

impl IssuedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now - self.issued_at <= TOKEN_VALIDITY_SECS
    }

    fn matches(&self, submitted: &str) -> bool {
        self.value.as_bytes().ct_eq(submitted.as_bytes()).into()
    }
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let token = new_token(now);

    let mut tokens = load_tokens(session).await;
    tokens.retain(|t| t.is_fresh(now));
    tokens.push(IssuedToken {
        value: token.clone(),
        issued_at: now,
    });

    // Keep only the most recent tokens
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens.drain(..skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify a CSRF token against the session, consuming it on success.
///
/// Returns `Ok(false)` for unknown, expired or already-used tokens. Of several
/// concurrent submissions of one token, exactly one is accepted.
pub async fn verify_csrf_token(
    session: &Session,
    ledger: &CsrfLedger,
    submitted: &str,
) -> Result<bool> {
    if submitted.is_empty() {
        bail!("empty CSRF token");
    }

    let mut tokens = load_tokens(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let found = tokens
        .iter()
        .position(|t| t.matches(submitted) && t.is_fresh(now));

    let Some(index) = found else {
        return Ok(false);
    };

    if !ledger.claim(&tokens[index].value, tokens[index].issued_at, now) {
        warn!("CSRF token replayed");
        return Ok(false);
    }

    tokens.remove(index);
    tokens.retain(|t| t.is_fresh(now));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}

/// Clear all CSRF tokens from the session.
pub async fn clear_csrf_tokens(session: &Session) -> Result<()> {
    session
        .remove::<Vec<IssuedToken>>(CSRF_SESSION_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("failed to clear CSRF tokens: {e}"))?;
    Ok(())
}

async fn load_tokens(session: &Session) -> Vec<IssuedToken> {
    match session.get(CSRF_SESSION_KEY).await {
        Ok(tokens) => tokens.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "failed to load CSRF tokens; starting empty");
            Vec::new()
        }
    }
}

/// Hex-encoded SHA-256 over 32 random bytes and the issue time.
fn new_token(timestamp: i64) -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(timestamp.to_le_bytes());
    hex::encode(hasher.finalize())
}
