//! REST client module for the rewards extension API.
//!
//! This module provides `DawnClient` for the login, keep-alive and
//! get-point calls, and the `RewardsApi` trait the keep-alive loop is
//! written against.
//!
//! Authenticated calls carry a bearer token obtained from login or
//! supplied directly in config.

pub mod client;
pub mod error;

pub use client::{DawnClient, Endpoints, RewardsApi};
pub use error::ApiError;
