//! Wire models for the rewards API.
//!
//! Field names and nesting match the upstream API exactly:
//!
//! - `LoginRequest`, `LoginResponse`: credential exchange
//! - `KeepAliveRequest`: heartbeat body
//! - `PointResponse`, `PointBreakdown`: point balance and its seven categories

pub mod auth;
pub mod points;

pub use auth::{KeepAliveRequest, LoginRequest, LoginResponse, EXTENSION_ID, EXTENSION_VERSION};
pub use points::{parse_points, PointBreakdown, PointResponse};
