//! Form helpers.
//!
//! Every state-changing form carries a CSRF token issued into the session
//! when the form is rendered and consumed when it is submitted.

pub mod csrf;

pub use csrf::{CSRF_FIELD, CsrfLedger, clear_csrf_tokens, generate_csrf_token, verify_csrf_token};
