//! Gatehouse client
//!
//! HTTP test client for form-login applications: the CSRF-aware login flow
//! ([`LoginFlow`]), single-request authorization probes ([`Probe`]) and the
//! access-control matrix that strings them together ([`matrix`]).

pub mod error;
pub mod extract;
pub mod login;
pub mod matrix;
pub mod probe;
pub mod target;

pub use error::{FlowError, FlowResult};
pub use extract::{extract_csrf_token, session_cookie};
pub use login::{Credentials, LoginFlow, LoginOutcome, LoginPage};
pub use probe::{Access, Expected, Probe, ProbeResult};
pub use target::Target;
