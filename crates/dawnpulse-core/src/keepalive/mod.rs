//! Per-account keep-alive loops.
//!
//! Each configured account gets one `AccountLoop` running on its own task:
//! log in (or adopt a stored token), then every few minutes send a
//! keep-alive and fetch the point balance. Failed logins wait a fixed delay
//! and start over; failed periodic calls are logged and skipped.
//!
//! The `Supervisor` launches the loops and stops them together.

pub mod account_loop;
pub mod supervisor;

pub use account_loop::{AccountEvent, AccountLoop, LoopTiming};
pub use supervisor::Supervisor;
