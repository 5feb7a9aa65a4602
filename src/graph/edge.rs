use crate::api::{Channel, ForwardItem, Post, TargetChannel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A post on `target` that is a forward of content from `source`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardEdge {
    pub source: String,
    pub source_info: SourceInfo,
    pub target: String,
    pub target_info: TargetInfo,
    pub post: PostInfo,
}

/// Snapshot of the seed channel's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub link: Option<String>,
    pub title: Option<String>,
    pub peer_type: Option<String>,
    pub category: Option<String>,
    pub about: Option<String>,
    pub rkn_verification: Option<Value>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub participants_cnt: Option<i64>,
    pub red_label: Option<Value>,
    pub black_label: Option<Value>,
}

/// Snapshot of the receiving channel's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub link: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub participants_cnt: Option<i64>,
}

/// The forwarded post as seen on the target side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostInfo {
    pub id: Option<i64>,
    pub date: Option<i64>,
    pub views: Option<i64>,
    pub link: Option<String>,
    pub text: Option<String>,
}

impl From<&Channel> for SourceInfo {
    fn from(channel: &Channel) -> Self {
        Self {
            link: channel.link.clone(),
            title: channel.title.clone(),
            peer_type: channel.peer_type.clone(),
            category: channel.category.clone(),
            about: channel.about.clone(),
            rkn_verification: channel.verification_status(),
            country: channel.country.clone(),
            language: channel.language.clone(),
            participants_cnt: channel.participants_count,
            red_label: channel.restriction("red_label"),
            black_label: channel.restriction("black_label"),
        }
    }
}

impl From<&TargetChannel> for TargetInfo {
    fn from(channel: &TargetChannel) -> Self {
        Self {
            link: channel.link.clone(),
            title: channel.title.clone(),
            about: channel.about.clone(),
            participants_cnt: channel.participants_count,
        }
    }
}

impl ForwardEdge {
    /// Builds an edge from one resolved forward event
    ///
    /// Returns `None` when the target channel has no username.
    pub fn assemble(
        source: &str,
        source_channel: &Channel,
        item: &ForwardItem,
        target: &TargetChannel,
        post: &Post,
    ) -> Option<Self> {
        let target_username = target.username.clone().filter(|u| !u.is_empty())?;

        Some(Self {
            source: source.to_string(),
            source_info: SourceInfo::from(source_channel),
            target: target_username,
            target_info: TargetInfo::from(target),
            post: PostInfo {
                id: post.id,
                date: item.post_date,
                views: post.views,
                link: item.post_link.clone(),
                text: post.text.clone(),
            },
        })
    }
}
