//! Service Module
//!
//! Application-level operations built on the cache client.

mod user;

pub use user::{describe_value, UserService};
