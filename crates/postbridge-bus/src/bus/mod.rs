//! Message bus facade: `send`, `send_and_wait`, `on`, plus typed helpers for
//! the common message types.

mod facade;
mod helpers;

pub use facade::{Bus, WeakBus};
