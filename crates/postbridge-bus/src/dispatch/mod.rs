//! Dispatch module exports.
//!
//! Re-exports the registry, subscription handle and handler trait so
//! downstream consumers can depend on this module directly.

pub mod handler;
pub mod registry;

pub use handler::{handler_fn, FnHandler, Handler};
pub use registry::{DispatchOutcome, DispatchRegistry, Subscription};
