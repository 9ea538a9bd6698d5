//! Account and role models.

pub mod role;
pub mod user;

pub use role::Role;
pub use user::{Principal, User, UserDirectory};
