//! postbridge bus runtime.
//!
//! Wires the transport adapter, correlation table, dispatch registry and
//! error channel into a [`bus::Bus`], one per context. Each side has a
//! composition root with its default handlers ([`host::HostState`],
//! [`webview::WebviewState`]); the host also serves a WebSocket bridge
//! endpoint. Consumed by the binary (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bus;
pub mod config;
pub mod context;
pub mod correlation;
pub mod dispatch;
pub mod error_channel;
pub mod host;
pub mod ops;
pub mod router;
pub mod store;
pub mod transport;
pub mod webview;

pub use bus::{Bus, WeakBus};
pub use context::Side;
