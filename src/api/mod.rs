//! External analytics API surface
//!
//! Three endpoints are consumed, each answering with an envelope of the form
//! `{"status": "ok", "response": ...}` on success.

mod types;

pub use types::{Channel, ForwardItem, ForwardsPage, Post, TargetChannel};

use std::fmt;

/// The API endpoints the crawler calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Channel metadata lookup
    ChannelGet,
    /// Paginated forward events of a channel
    ChannelForwards,
    /// Single post lookup
    PostGet,
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::ChannelGet => "channels/get",
            Self::ChannelForwards => "channels/forwards",
            Self::PostGet => "posts/get",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
