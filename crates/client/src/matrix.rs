//! The expected access-control matrix, as data, and a sequential runner.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FlowError, FlowResult};
use crate::login::Credentials;
use crate::probe::{Access, Expected, ProbeResult};
use crate::target::Target;

/// How a case obtains its credentials before probing.
#[derive(Debug, Clone)]
pub enum CaseAccess {
    /// Probe directly with this access.
    Direct(Access),
    /// Run the CSRF login flow first, then follow its redirect with the
    /// session cookie. The case path is ignored.
    FormLogin(Credentials),
}

/// One row of the matrix.
#[derive(Debug, Clone)]
pub struct AccessCase {
    pub name: &'static str,
    pub path: &'static str,
    pub access: CaseAccess,
    pub expected: Expected,
    /// Follow redirects before checking the status.
    pub follow_redirects: bool,
    pub body_contains: Option<&'static str>,
}

/// Result of running one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: &'static str,
    pub expected: Expected,
    pub status: Option<u16>,
    pub passed: bool,
    pub error: Option<String>,
}

/// The access rules of the sample application.
pub fn default_matrix() -> Vec<AccessCase> {
    let admin = Credentials::new("admin", "admin");
    let user = Credentials::new("user", "user");

    vec![
        AccessCase {
            name: "home_anonymous_shows_login",
            path: "/",
            access: CaseAccess::Direct(Access::Anonymous),
            expected: Expected::Ok,
            follow_redirects: true,
            body_contains: Some("<title>Login"),
        },
        AccessCase {
            name: "home_anonymous_redirects",
            path: "/",
            access: CaseAccess::Direct(Access::Anonymous),
            expected: Expected::Found,
            follow_redirects: false,
            body_contains: None,
        },
        AccessCase {
            name: "admin_login_reaches_home",
            path: "/",
            access: CaseAccess::FormLogin(admin.clone()),
            expected: Expected::Ok,
            follow_redirects: false,
            body_contains: None,
        },
        AccessCase {
            name: "user_login_is_denied_home",
            path: "/",
            access: CaseAccess::FormLogin(user.clone()),
            expected: Expected::Forbidden,
            follow_redirects: false,
            body_contains: Some("Access denied"),
        },
        AccessCase {
            name: "management_anonymous_unauthorized",
            path: "/beans",
            access: CaseAccess::Direct(Access::Anonymous),
            expected: Expected::Unauthorized,
            follow_redirects: false,
            body_contains: None,
        },
        AccessCase {
            name: "management_admin_ok",
            path: "/beans",
            access: CaseAccess::Direct(Access::Basic(admin)),
            expected: Expected::Ok,
            follow_redirects: false,
            body_contains: None,
        },
        AccessCase {
            name: "management_user_forbidden",
            path: "/beans",
            access: CaseAccess::Direct(Access::Basic(user)),
            expected: Expected::Forbidden,
            follow_redirects: false,
            body_contains: None,
        },
    ]
}

/// Run every case in order. A failing case does not stop the run.
pub async fn run(target: &Target, cases: &[AccessCase]) -> FlowResult<Vec<CaseReport>> {
    let probe = target.probe()?;
    let browsing = target.browsing_probe()?;
    let login = target.login_flow()?;

    let mut reports = Vec::with_capacity(cases.len());
    for case in cases {
        let result = match &case.access {
            CaseAccess::Direct(access) => {
                let probe = if case.follow_redirects { &browsing } else { &probe };
                probe.get(case.path, access).await
            }
            CaseAccess::FormLogin(credentials) => match login.login(credentials).await {
                Ok(outcome) => login.follow(&outcome).await,
                Err(e) => Err(e),
            },
        };

        let report = judge(case, result);
        if report.passed {
            info!(case = case.name, "pass");
        } else {
            warn!(case = case.name, error = ?report.error, "fail");
        }
        reports.push(report);
    }

    Ok(reports)
}

fn judge(case: &AccessCase, result: FlowResult<ProbeResult>) -> CaseReport {
    let status = result.as_ref().ok().map(|r| r.status.as_u16());
    let checked = result.and_then(|r| {
        let r = r.expect(case.expected)?;
        match case.body_contains {
            Some(needle) => r.expect_body_contains(needle),
            None => Ok(r),
        }
    });

    CaseReport {
        name: case.name,
        expected: case.expected,
        status,
        passed: checked.is_ok(),
        error: checked.err().map(|e: FlowError| e.to_string()),
    }
}
