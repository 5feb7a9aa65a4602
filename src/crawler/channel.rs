//! Per-channel crawl state machine
//!
//! A channel is crawled in three phases: its metadata is fetched, its forward
//! events are paged through, and every new forward event is resolved to a post
//! lookup. The crawler only produces a [`ChannelOutcome`]; persisting it is the
//! coordinator's job.

use crate::api::{Channel, ForwardItem, ForwardsPage, TargetChannel};
use crate::config::CrawlerConfig;
use crate::crawler::fetcher::ApiClient;
use crate::crawler::governor::{DetailGovernor, Pacer};
use crate::graph::ForwardEdge;
use crate::state::ChannelState;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Instant;

/// Key used to drop repeated forward events within one channel's crawl
pub type DedupKey = (Option<i64>, String);

/// Everything a single channel's crawl produced
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub username: String,
    /// Terminal state: `ChannelDone` or `Skipped`
    pub state: ChannelState,
    pub edges: Vec<ForwardEdge>,
    /// Page items exactly as the API returned them
    pub raw_items: Vec<Value>,
    /// Number of non-empty pages consumed
    pub pages: usize,
    /// Items dropped for an unresolvable target, a duplicate, or a failed post lookup
    pub dropped: usize,
}

impl ChannelOutcome {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            state: ChannelState::Start,
            edges: Vec::new(),
            raw_items: Vec::new(),
            pages: 0,
            dropped: 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.state == ChannelState::Skipped
    }

    fn transition(&mut self, next: ChannelState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid channel transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!("@{}: {} -> {}", self.username, self.state, next);
        self.state = next;
    }
}

/// A forward event that passed resolution and dedup, awaiting its post lookup
#[derive(Debug)]
struct Candidate<'p> {
    item: ForwardItem,
    target: &'p TargetChannel,
    post_id: Value,
}

/// Drives one channel at a time through the crawl state machine
pub struct ChannelCrawler<'a> {
    api: &'a ApiClient,
    governor: &'a DetailGovernor,
    config: &'a CrawlerConfig,
}

impl<'a> ChannelCrawler<'a> {
    pub fn new(api: &'a ApiClient, governor: &'a DetailGovernor, config: &'a CrawlerConfig) -> Self {
        Self {
            api,
            governor,
            config,
        }
    }

    /// Crawls one channel to a terminal state
    ///
    /// Never fails: a metadata failure yields a `Skipped` outcome and any
    /// per-page or per-item failure only shortens the result.
    pub async fn crawl(&self, username: &str) -> ChannelOutcome {
        let started = Instant::now();
        let mut outcome = ChannelOutcome::new(username);

        let source = match self.api.get_channel(username).await {
            Ok(channel) if channel.is_empty() => {
                tracing::warn!("Skipping channel @{}: metadata is empty", username);
                outcome.transition(ChannelState::Skipped);
                return outcome;
            }
            Ok(channel) => channel,
            Err(failure) => {
                tracing::warn!(
                    "Skipping channel @{}: metadata unavailable ({})",
                    username,
                    failure
                );
                outcome.transition(ChannelState::Skipped);
                return outcome;
            }
        };
        outcome.transition(ChannelState::MetadataFetched);

        self.paginate(&source, &mut outcome).await;
        outcome.transition(ChannelState::ChannelDone);

        tracing::info!(
            channel = username,
            pages = outcome.pages,
            edges = outcome.edges.len(),
            dropped = outcome.dropped,
            "Channel @{} crawled in {:.2}s, {} edge(s) found",
            username,
            started.elapsed().as_secs_f64(),
            outcome.edges.len()
        );
        outcome
    }

    async fn paginate(&self, source: &Channel, outcome: &mut ChannelOutcome) {
        outcome.transition(ChannelState::Paginating);

        let mut pacer = Pacer::new(self.config.page_delay());
        let mut seen: HashSet<DedupKey> = HashSet::new();
        let mut offset = 0u32;

        loop {
            pacer.wait_turn().await;

            let page = match self
                .api
                .get_forwards(&outcome.username, offset, self.config.page_size)
                .await
            {
                Ok(page) => page,
                Err(failure) => {
                    tracing::warn!(
                        "Stopping pagination of @{} at offset {}: {}",
                        outcome.username,
                        offset,
                        failure
                    );
                    break;
                }
            };

            if page.is_exhausted() {
                tracing::debug!("@{}: no more forwards at offset {}", outcome.username, offset);
                break;
            }

            outcome.pages += 1;
            self.process_page(source, &page, &mut seen, outcome).await;
            pacer.page_finished();
            offset = offset.saturating_add(self.config.page_size);
        }
    }

    /// Turns one page into edges, fanning out post lookups through the governor
    async fn process_page(
        &self,
        source: &Channel,
        page: &ForwardsPage,
        seen: &mut HashSet<DedupKey>,
        outcome: &mut ChannelOutcome,
    ) {
        outcome.raw_items.extend(page.items.iter().cloned());

        let candidates = select_candidates(page, seen);
        outcome.dropped += page.items.len() - candidates.len();

        let lookups = candidates
            .iter()
            .map(|candidate| self.api.get_post(&candidate.post_id));
        let posts = self.governor.run_all(lookups).await;

        for (candidate, post) in candidates.iter().zip(posts) {
            let edge = post.ok().and_then(|post| {
                ForwardEdge::assemble(
                    &outcome.username,
                    source,
                    &candidate.item,
                    candidate.target,
                    &post,
                )
            });
            match edge {
                Some(edge) => outcome.edges.push(edge),
                None => outcome.dropped += 1,
            }
        }
    }
}

/// Resolves page items to their targets and drops repeats
///
/// Items are kept in page order. An item is dropped when it cannot be read,
/// has no post id, its target is not in the page's channel list, the target
/// has no username, or its `(post date, target)` pair was already seen.
fn select_candidates<'p>(page: &'p ForwardsPage, seen: &mut HashSet<DedupKey>) -> Vec<Candidate<'p>> {
    let mut candidates = Vec::new();

    for raw in &page.items {
        let item = match serde_json::from_value::<ForwardItem>(raw.clone()) {
            Ok(item) => item,
            Err(e) => {
                tracing::debug!("Dropping undecodable forward item: {}", e);
                continue;
            }
        };
        let Some(target) = item.channel_id.and_then(|id| page.resolve(id)) else {
            tracing::debug!("Dropping item: target channel {:?} not on page", item.channel_id);
            continue;
        };
        let Some(username) = target.username.as_deref().filter(|u| !u.is_empty()) else {
            tracing::debug!("Dropping item: target channel {:?} has no username", target.id);
            continue;
        };
        let Some(post_id) = item.source_post_id.clone().filter(|id| !id.is_null()) else {
            tracing::debug!("Dropping item for @{}: no source post id", username);
            continue;
        };

        if !seen.insert((item.post_date, username.to_string())) {
            tracing::debug!(
                "Dropping duplicate forward to @{} dated {:?}",
                username,
                item.post_date
            );
            continue;
        }

        candidates.push(Candidate {
            item,
            target,
            post_id,
        });
    }

    candidates
}
