//! In-memory user directory.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result, bail};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use serde::Serialize;

use super::Role;
use crate::config::UserSeed;

/// Stored account.
#[derive(Debug, Clone)]
pub struct User {
    pub name: String,
    pass: String,
    pub roles: BTreeSet<Role>,
}

impl User {
    /// Check a candidate password against the stored Argon2 hash.
    ///
    /// Verification reads the cost parameters from the hash itself.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// The principal view of this account.
    pub fn principal(&self) -> Principal {
        Principal {
            username: self.name.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// An authenticated identity and its granted roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub roles: BTreeSet<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Authority strings, sorted.
    pub fn authorities(&self) -> Vec<&'static str> {
        self.roles.iter().map(|r| r.authority()).collect()
    }
}

/// Accounts keyed by username. Immutable after construction.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    /// Hash and register every seed.
    pub fn from_seeds(seeds: &[UserSeed], memory_kib: u32) -> Result<Self> {
        let params = Params::new(memory_kib, Params::DEFAULT_T_COST, Params::DEFAULT_P_COST, None)
            .map_err(|e| anyhow::anyhow!("invalid Argon2 parameters: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut users = HashMap::with_capacity(seeds.len());
        for seed in seeds {
            if users.contains_key(&seed.username) {
                bail!("duplicate user {:?}", seed.username);
            }
            let pass = hash_password(&argon2, &seed.password)
                .with_context(|| format!("failed to hash password for {:?}", seed.username))?;
            users.insert(
                seed.username.clone(),
                User {
                    name: seed.username.clone(),
                    pass,
                    roles: seed.roles.iter().copied().collect(),
                },
            );
        }

        Ok(Self { users })
    }

    /// Find a user by username.
    pub fn find_by_name(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    /// Verify credentials; `None` for an unknown user or a wrong password.
    pub fn authenticate(&self, name: &str, password: &str) -> Option<Principal> {
        let user = self.find_by_name(name)?;
        user.verify_password(password).then(|| user.principal())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Hash a password using Argon2id.
fn hash_password(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
