/// Channel state definitions for tracking a single channel's crawl
///
/// A channel moves `Start -> MetadataFetched -> Paginating -> ChannelDone`,
/// or `Start -> Skipped` when its metadata cannot be fetched.
use std::fmt;

/// Represents the current state of a channel in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    // ===== Active States =====
    /// Nothing has been requested yet
    Start,

    /// Channel metadata is available
    MetadataFetched,

    /// Forward pages are being requested
    Paginating,

    // ===== Terminal States =====
    /// Pagination finished; edges are ready to be flushed
    ChannelDone,

    /// Metadata lookup failed after all retries; the channel yields nothing
    Skipped,
}

impl ChannelState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ChannelDone | Self::Skipped)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::ChannelDone)
    }

    /// Returns true if the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::MetadataFetched)
                | (Self::Start, Self::Skipped)
                | (Self::MetadataFetched, Self::Paginating)
                | (Self::Paginating, Self::ChannelDone)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::MetadataFetched => "metadata_fetched",
            Self::Paginating => "paginating",
            Self::ChannelDone => "channel_done",
            Self::Skipped => "skipped",
        }
    }

    /// Returns all possible channel states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Start,
            Self::MetadataFetched,
            Self::Paginating,
            Self::ChannelDone,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
