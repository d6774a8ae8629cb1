//! # Taskdeck Scheduler
//!
//! Daemon that periodically runs the due-date sweep, creating
//! `due_soon` notifications for tasks approaching their due dates.
//! The sweep itself is idempotent per calendar day, so the interval
//! only controls how quickly newly due tasks are noticed.
//!
//! ## Modules
//!
//! - `scheduler`: the poll loop and its configuration

pub mod scheduler;
