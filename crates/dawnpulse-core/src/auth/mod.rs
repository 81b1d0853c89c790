//! Account credentials and per-loop session state.
//!
//! This module provides:
//! - `Credential`: an (email, secret) pair loaded from config
//! - `AuthMode`: whether the secret is a password or a stored bearer token
//! - `Session`: the current token and when it was obtained
//!
//! Nothing here is persisted; sessions live only as long as their loop.

pub mod credentials;
pub mod session;

pub use credentials::{AuthMode, Credential};
pub use session::Session;
