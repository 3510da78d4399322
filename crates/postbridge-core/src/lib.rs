//! postbridge core: transport-agnostic wire protocol and error types.
//!
//! This crate defines the envelope format, the closed set of message types
//! with their typed payloads, and the error surface shared by the host-side
//! and webview-side buses. It carries no runtime or transport dependencies so
//! both contexts (and any tooling) can reuse it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible path
//! surfaces as `BridgeError`/`Result`, so a corrupted frame from the other
//! side of the boundary can never crash the process that decodes it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{BridgeError, ErrorCode, Result};
pub use protocol::{Envelope, Message, MessageType};
