//! Event router: picks the transformer for a channel.
//!
//! Recognized channel names:
//!
//! | Channel | Route |
//! |---------|-------|
//! | `memory/<shard>/stats` | [`Route::Stats`] with the shard taken from the name |
//! | `cpu` | [`Route::Performance`] |
//! | `console` | [`Route::Console`] |
//!
//! Anything else is dropped. The subscriber never asks for other channels,
//! so an unknown name means the transport delivered something unexpected.

use serde_json::Value;
use tickstash_types::{ChannelMessage, Document, ShardName};
use tracing::trace;

use crate::capture::Capture;
use crate::error::TransformError;
use crate::index::IndexNaming;
use crate::{console, performance, stats};

/// Channel carrying CPU/memory samples.
pub const CPU_CHANNEL: &str = "cpu";

/// Channel carrying console output.
pub const CONSOLE_CHANNEL: &str = "console";

/// Prefix of per-shard stats channels.
const STATS_PREFIX: &str = "memory/";

/// Suffix of per-shard stats channels.
const STATS_SUFFIX: &str = "/stats";

/// Name of the stats channel for `shard`.
pub fn stats_channel(shard: &ShardName) -> String {
    format!("{STATS_PREFIX}{shard}{STATS_SUFFIX}")
}

/// The transformer a channel maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Per-tick stats for one shard. `None` if the channel's shard segment
    /// is empty.
    Stats {
        /// Shard named by the channel.
        shard: Option<ShardName>,
    },
    /// CPU/memory samples.
    Performance,
    /// Console output.
    Console,
}

impl Route {
    /// Match a channel name against the known patterns.
    pub fn from_channel(channel: &str) -> Option<Self> {
        match channel {
            CPU_CHANNEL => Some(Self::Performance),
            CONSOLE_CHANNEL => Some(Self::Console),
            other => {
                let shard = other
                    .strip_prefix(STATS_PREFIX)?
                    .strip_suffix(STATS_SUFFIX)?;
                if shard.contains('/') {
                    return None;
                }
                Some(Self::Stats {
                    shard: (!shard.is_empty()).then(|| ShardName::from(shard)),
                })
            }
        }
    }

    /// Run the route's transformer on `payload`.
    ///
    /// # Errors
    ///
    /// Returns the transformer's [`TransformError`].
    pub fn transform(
        self,
        payload: Value,
        capture: &Capture,
        naming: &IndexNaming,
    ) -> Result<Vec<Document>, TransformError> {
        match self {
            Self::Stats { shard } => stats::transform(shard, payload, capture, naming),
            Self::Performance => performance::transform(payload, capture, naming),
            Self::Console => console::transform(payload, capture, naming),
        }
    }
}

/// Routes channel messages to transformers and names their destinations.
#[derive(Debug, Clone, Default)]
pub struct Router {
    naming: IndexNaming,
}

impl Router {
    /// Create a router that names destinations with `naming`.
    pub const fn new(naming: IndexNaming) -> Self {
        Self { naming }
    }

    /// The naming policy in use.
    pub const fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    /// Turn one channel message into documents.
    ///
    /// Unrecognized channels yield no documents.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if the payload does not fit the channel.
    pub fn route(
        &self,
        message: ChannelMessage,
        capture: &Capture,
    ) -> Result<Vec<Document>, TransformError> {
        let Some(route) = Route::from_channel(&message.channel) else {
            trace!(channel = message.channel, "dropping message on unrecognized channel");
            return Ok(Vec::new());
        };
        route.transform(message.payload, capture, &self.naming)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use tickstash_types::DocumentKind;

    use super::*;

    fn capture() -> Capture {
        Capture::at(
            Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
    }

    #[test]
    fn stats_channel_carries_shard() {
        assert_eq!(
            Route::from_channel("memory/shard0/stats"),
            Some(Route::Stats {
                shard: Some(ShardName::from("shard0"))
            })
        );
    }

    #[test]
    fn stats_channel_with_empty_shard_has_no_shard() {
        assert_eq!(
            Route::from_channel("memory//stats"),
            Some(Route::Stats { shard: None })
        );
    }

    #[test]
    fn literal_channels() {
        assert_eq!(Route::from_channel("cpu"), Some(Route::Performance));
        assert_eq!(Route::from_channel("console"), Some(Route::Console));
    }

    #[test]
    fn unknown_channels_do_not_route() {
        for channel in [
            "memory/shard0/other",
            "memory/a/b/stats",
            "room:shard0/W1N1",
            "CPU",
            "",
        ] {
            assert_eq!(Route::from_channel(channel), None, "{channel}");
        }
    }

    #[test]
    fn stats_channel_name_round_trips() {
        let shard = ShardName::from("shard3");
        let channel = stats_channel(&shard);
        assert_eq!(channel, "memory/shard3/stats");
        assert_eq!(
            Route::from_channel(&channel),
            Some(Route::Stats { shard: Some(shard) })
        );
    }

    #[test]
    fn router_dispatches_by_channel() {
        let router = Router::default();

        let stats = router
            .route(
                ChannelMessage::new("memory/shard0/stats", json!({ "tick": 1, "gcl": {} })),
                &capture(),
            )
            .unwrap();
        assert_eq!(stats[0].kind, DocumentKind::Stats);
        assert_eq!(stats[0].field("shard"), Some(&json!("shard0")));

        let cpu = router
            .route(ChannelMessage::new("cpu", json!({ "cpu": 1, "memory": 2 })), &capture())
            .unwrap();
        assert_eq!(cpu[0].kind, DocumentKind::Performance);

        let console = router
            .route(ChannelMessage::new("console", json!({ "results": ["1"] })), &capture())
            .unwrap();
        assert_eq!(console[0].kind, DocumentKind::Log);
    }

    #[test]
    fn router_drops_unknown_channel() {
        let docs = Router::default()
            .route(ChannelMessage::new("market", json!({ "x": 1 })), &capture())
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn router_applies_namespace() {
        let router = Router::new(IndexNaming::with_namespace(Some("screeps".to_owned())));
        let docs = router
            .route(ChannelMessage::new("cpu", json!({ "cpu": 1 })), &capture())
            .unwrap();
        assert_eq!(docs[0].destination, "screeps-performance-2026-10-19");
    }
}
