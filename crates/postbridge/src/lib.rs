//! Top-level facade crate for postbridge.
//!
//! Re-exports the protocol types and the bus runtime so users can depend on a single crate.

pub mod core {
    pub use postbridge_core::*;
}

pub mod bus {
    pub use postbridge_bus::*;
}

pub use postbridge_bus::{Bus, Side};
pub use postbridge_core::{BridgeError, Envelope, Message, MessageType, Result};
