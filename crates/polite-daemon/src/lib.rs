//! Polite daemon: polls the rule store and drives the ringer.
//!
//! Every tick loads the enabled rules, asks the calendar for the events in
//! progress, evaluates the rules against the local clock, and hands the
//! combined [`MuteDecision`](polite_core::decision::MuteDecision) to a sink.

pub mod config;
pub mod events;
pub mod poller;
pub mod sink;

pub use config::DaemonConfig;
pub use poller::Poller;
