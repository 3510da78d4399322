//! Correlation of responses to in-flight requests.

mod table;

pub use table::{CorrelationTable, PendingReply};
