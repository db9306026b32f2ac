//! Core types and rule evaluation for Polite, the automatic mute scheduler.
//!
//! A rule is either a calendar rule (mute while a matching calendar event is
//! in progress) or a schedule rule (mute during a recurring weekly window).
//! This crate holds the rule model, the "should the device be muted right now"
//! evaluation, and the [`store::RuleStore`] abstraction. It performs no I/O.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod codec;
pub mod days;
pub mod decision;
pub mod error;
pub mod event;
pub mod match_by;
pub mod rule;
pub mod schedule;
pub mod store;
pub mod time;

pub use error::{Error, Result};
