//! HTTP middleware components.

pub mod basic_auth;

pub use basic_auth::{BasicAuth, authenticate_basic, challenge};
