//! Typed views of the API payloads
//!
//! Only the fields the crawler consumes are modelled. Everything is optional
//! because the API omits fields freely; unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

/// Channel metadata returned by `channels/get`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub link: Option<String>,
    pub peer_type: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub participants_count: Option<i64>,
    pub rkn_verification: Option<Value>,
    #[serde(rename = "tgstat_restrictions")]
    pub restrictions: Option<Value>,
}

impl Channel {
    /// True when the payload identifies no channel at all
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.username.as_deref().map_or(true, str::is_empty)
    }

    /// Verification status, if the verification object carries one
    pub fn verification_status(&self) -> Option<Value> {
        self.rkn_verification
            .as_ref()
            .and_then(|v| v.get("status"))
            .cloned()
    }

    /// Reads one restriction flag; only an object-shaped restriction block counts
    pub fn restriction(&self, flag: &str) -> Option<Value> {
        match &self.restrictions {
            Some(Value::Object(map)) => map.get(flag).cloned(),
            _ => None,
        }
    }
}

/// A channel entry from the `channels` list of a forwards page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetChannel {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub about: Option<String>,
    pub participants_count: Option<i64>,
}

/// One forward event from `channels/forwards`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForwardItem {
    /// Channel the post was forwarded to
    pub channel_id: Option<i64>,
    /// Post identifier for the `posts/get` lookup
    pub source_post_id: Option<Value>,
    pub post_date: Option<i64>,
    pub post_link: Option<String>,
}

/// A page of `channels/forwards` with `extended=1`
///
/// Items are kept as raw JSON so they can be logged verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForwardsPage {
    pub items: Vec<Value>,
    pub channels: Vec<TargetChannel>,
}

impl ForwardsPage {
    /// An empty item list or an empty channel list means there is no more data
    pub fn is_exhausted(&self) -> bool {
        self.items.is_empty() || self.channels.is_empty()
    }

    /// Looks up a page channel by id
    pub fn resolve(&self, channel_id: i64) -> Option<&TargetChannel> {
        self.channels.iter().find(|c| c.id == Some(channel_id))
    }
}

/// Post detail returned by `posts/get`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: Option<i64>,
    pub views: Option<i64>,
    pub text: Option<String>,
}
