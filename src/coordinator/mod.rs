//! # Lifecycle coordination: single-batch and staged execution.
//!
//! ## Files & responsibilities
//! - **core.rs**: the [`Coordinator`]; dispatches lifecycle actions through
//!   the task runner, drives the single-batch state machine, chains stages
//!   with reverse-order compensation.
//! - **opts.rs**: per-call options and their hook signatures.

mod core;
mod opts;

pub use core::Coordinator;
pub use opts::{ActionErrorHook, CallOpts, StageStartHook};
