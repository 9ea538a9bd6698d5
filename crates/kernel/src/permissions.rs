//! Method-level security.
//!
//! Handlers declare a [`Secured`] requirement and ask [`MethodSecurity`] for a
//! [`Decision`] before running their body. How a decision becomes a response
//! depends on the surface: pages redirect to the login form, management
//! endpoints answer with a Basic challenge.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::models::{Principal, Role};

/// Roles allowed to invoke a handler (any one suffices).
#[derive(Debug, Clone, Copy)]
pub struct Secured(pub &'static [Role]);

impl Secured {
    pub const ADMIN: Secured = Secured(&[Role::Admin]);

    fn permits(&self, principal: &Principal) -> bool {
        self.0.iter().any(|role| principal.has_role(*role))
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Granted(Principal),
    /// No principal at all.
    Unauthenticated,
    /// Authenticated but lacking every required role.
    Denied(Principal),
}

/// Access decision service.
///
/// Keeps running grant/deny counters for the management surface.
#[derive(Clone, Default)]
pub struct MethodSecurity {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    granted: AtomicU64,
    denied: AtomicU64,
}

impl MethodSecurity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `principal` may invoke a method guarded by `secured`.
    pub fn check(&self, method: &str, principal: Option<Principal>, secured: Secured) -> Decision {
        let Some(principal) = principal else {
            self.inner.denied.fetch_add(1, Ordering::Relaxed);
            debug!(method, "access denied: unauthenticated");
            return Decision::Unauthenticated;
        };

        if secured.permits(&principal) {
            self.inner.granted.fetch_add(1, Ordering::Relaxed);
            Decision::Granted(principal)
        } else {
            self.inner.denied.fetch_add(1, Ordering::Relaxed);
            debug!(
                method,
                user = %principal.username,
                required = ?secured.0,
                "access denied: missing role"
            );
            Decision::Denied(principal)
        }
    }

    /// (granted, denied) totals since startup.
    pub fn counts(&self) -> (u64, u64) {
        (
            self.inner.granted.load(Ordering::Relaxed),
            self.inner.denied.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            username: "someone".to_string(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn anonymous_is_unauthenticated() {
        let security = MethodSecurity::new();
        assert_eq!(
            security.check("home", None, Secured::ADMIN),
            Decision::Unauthenticated
        );
        assert_eq!(security.counts(), (0, 1));
    }

    #[test]
    fn user_is_denied_admin_method() {
        let security = MethodSecurity::new();
        let user = principal(&[Role::User]);
        assert_eq!(
            security.check("home", Some(user.clone()), Secured::ADMIN),
            Decision::Denied(user)
        );
    }

    #[test]
    fn any_listed_role_grants() {
        let security = MethodSecurity::new();
        let admin = principal(&[Role::Admin]);
        assert_eq!(
            security.check("profile", Some(admin.clone()), Secured(&[Role::User, Role::Admin])),
            Decision::Granted(admin)
        );
        assert_eq!(security.counts(), (1, 0));
    }
}
