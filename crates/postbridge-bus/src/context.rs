//! Which side of the boundary a bus runs on.
//!
//! Both sides share one protocol implementation; `Side` only labels logs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The sandboxed extension process.
    Host,
    /// The embedded UI surface.
    Webview,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Host => "host",
            Side::Webview => "webview",
        }
    }

    pub fn peer(self) -> Side {
        match self {
            Side::Host => Side::Webview,
            Side::Webview => Side::Host,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
