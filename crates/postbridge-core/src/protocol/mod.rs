//! Wire protocol shared by both sides of the boundary.
//!
//! - `message_type`: the closed set of envelope tags.
//! - `payload`: one statically shaped payload per tag, unified as `Message`.
//! - `envelope`: the immutable unit of exchange plus its JSON codec.
//!
//! Decoding is panic-free: anything that does not fit the envelope shape is
//! reported as `BridgeError::Malformed` and never reaches a handler.

pub mod envelope;
pub mod message_type;
pub mod payload;

pub use envelope::{decode_envelope, encode_envelope, fresh_id, Envelope};
pub use message_type::MessageType;
pub use payload::{
    ActionResponse, DataRequest, DataResponse, ErrorAcknowledge, ErrorReport, Lifecycle, Message,
    StateRequest, StateUpdate, UserAction,
};
