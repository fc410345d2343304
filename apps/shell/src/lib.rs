//! # Herald Shell
//!
//! Library half of the `herald` binary: configuration loading, the demo
//! events and listeners, and the scenario that drives them through a
//! [`herald_events::Dispatcher`].
//!
//! ## Example
//! ```rust
//! use herald_shell::config::DispatchSettings;
//! use herald_shell::scenario;
//!
//! let summary = scenario::run(&DispatchSettings::default());
//! assert_eq!(summary.logins, ["alice", "bob", "charlie"]);
//! ```

pub mod config;
pub mod events;
pub mod listeners;
pub mod scenario;
