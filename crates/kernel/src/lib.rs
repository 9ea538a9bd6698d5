//! Gatehouse Kernel Library
//!
//! Form login with CSRF protection, method-level security and Basic-auth
//! management endpoints. The library exposes the router and state so
//! integration tests can serve the real application on an ephemeral port.
//! The main entry point for running the server is the `gatehouse` binary.

pub mod config;
pub mod error;
pub mod form;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;

pub use config::Config;
pub use routes::app;
pub use state::AppState;
