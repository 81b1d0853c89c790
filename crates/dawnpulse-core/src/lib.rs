//! Core library for dawnpulse.
//!
//! Keeps many accounts of a browser-extension rewards service alive: one
//! long-lived loop per account logs in, sends periodic keep-alives and polls
//! the point balance, restarting itself after failed logins. Point totals can
//! be aggregated on demand for the CLI or the Telegram bot.

pub mod api;
pub mod auth;
pub mod bot;
pub mod config;
pub mod keepalive;
pub mod models;
pub mod points;
pub mod utils;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use keepalive::{AccountLoop, LoopTiming, Supervisor};
pub use points::PointAggregator;
