//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ChannelState`: Tracks where a single channel is in its crawl
//! - `CrawlState`: In-memory edge and raw item accumulators owned by the orchestrator
//! - `Progress`: The resumable cursor persisted by the checkpoint store

mod channel_state;
mod crawl_state;

// Re-export main types
pub use channel_state::ChannelState;
pub use crawl_state::{CrawlState, Progress};
