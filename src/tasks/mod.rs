//! # Context-aware concurrent execution with traceable per-unit results.
//!
//! The core of this module is [`Runnable`]: an async unit whose outcome is
//! gathered by [`run_all`] into one error slot per unit, regardless of
//! whether the unit finished in time, failed, or panicked. That makes it
//! easy to track which units finished, and also those that did not.

mod runnable;
mod runner;

pub use runnable::{Runnable, RunnableRef};
pub use runner::{any_error, run_all};
