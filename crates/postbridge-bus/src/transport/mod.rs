//! Transport layer (raw channel boundary).
//!
//! The adapter is the only component that touches platform channels. Raw
//! channels move opaque frames; the adapter turns them into envelopes once and
//! drops anything that does not decode.

pub mod adapter;
pub mod channel;
pub mod codec;
pub mod ws;

pub use adapter::TransportAdapter;
pub use channel::{pair, MpscSink, RawEndpoint, RawSink};
