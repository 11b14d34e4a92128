//! Channel subscription at startup and teardown at shutdown.
//!
//! One stats channel per shard, plus `cpu` and `console` once.

use tickstash_core::router::{self, CONSOLE_CHANNEL, CPU_CHANNEL};
use tickstash_types::ShardName;
use tickstash_transport::{Transport, TransportError};
use tracing::{info, warn};

/// Owns the transport session for the lifetime of the process.
#[derive(Debug)]
pub struct Subscriber<T> {
    transport: T,
}

impl<T: Transport> Subscriber<T> {
    /// Wrap a connected transport.
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Shards to subscribe to: the configured list if there is one,
    /// otherwise whatever the server reports.
    pub async fn shards(&self, configured: Option<&[String]>) -> Result<Vec<ShardName>, TransportError> {
        if let Some(names) = configured {
            info!(shards = ?names, "using configured shard list");
            return Ok(names.iter().map(|name| ShardName::new(name.as_str())).collect());
        }
        let shards = self.transport.shards().await?;
        info!(count = shards.len(), shards = ?shards, "discovered shards");
        Ok(shards)
    }

    /// Subscribe to every telemetry channel. Returns the subscribed
    /// channel names.
    pub async fn subscribe_all(
        &mut self,
        configured: Option<&[String]>,
    ) -> Result<Vec<String>, TransportError> {
        let shards = self.shards(configured).await?;
        if shards.is_empty() {
            warn!("server reported no shards, stats will not be collected");
        }

        for shard in &shards {
            self.transport.subscribe(&router::stats_channel(shard)).await?;
        }
        self.transport.subscribe(CPU_CHANNEL).await?;
        self.transport.subscribe(CONSOLE_CHANNEL).await?;

        let channels = self.transport.subscriptions();
        info!(count = channels.len(), "subscriptions requested");
        Ok(channels)
    }

    /// Unsubscribe from everything and close the session. Failures are
    /// logged; shutdown always completes.
    pub async fn shutdown(mut self) {
        for channel in self.transport.subscriptions() {
            if let Err(e) = self.transport.unsubscribe(&channel).await {
                warn!(channel = channel, error = %e, "failed to unsubscribe");
            }
        }
        self.transport.disconnect().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records every call; `shards` fails when `shard_list` is `None`.
    #[derive(Debug, Default)]
    struct FakeTransport {
        shard_list: Option<Vec<ShardName>>,
        subscribed: BTreeSet<String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl FakeTransport {
        fn record(&self, entry: String) {
            if let Ok(mut log) = self.log.lock() {
                log.push(entry);
            }
        }
    }

    impl Transport for FakeTransport {
        async fn shards(&self) -> Result<Vec<ShardName>, TransportError> {
            self.record("shards".to_owned());
            self.shard_list.clone().ok_or(TransportError::Api {
                endpoint: "api/game/shards/info",
                status: 404,
                body: String::new(),
            })
        }

        async fn subscribe(&mut self, channel: &str) -> Result<(), TransportError> {
            self.record(format!("subscribe {channel}"));
            self.subscribed.insert(channel.to_owned());
            Ok(())
        }

        async fn unsubscribe(&mut self, channel: &str) -> Result<(), TransportError> {
            self.record(format!("unsubscribe {channel}"));
            self.subscribed.remove(channel);
            Ok(())
        }

        fn subscriptions(&self) -> Vec<String> {
            self.subscribed.iter().cloned().collect()
        }

        async fn disconnect(self) {
            self.record("disconnect".to_owned());
        }
    }

    fn fake(shards: Option<&[&str]>) -> (FakeTransport, Arc<Mutex<Vec<String>>>) {
        let transport = FakeTransport {
            shard_list: shards.map(|names| names.iter().map(|n| ShardName::from(*n)).collect()),
            ..FakeTransport::default()
        };
        let log = Arc::clone(&transport.log);
        (transport, log)
    }

    #[tokio::test]
    async fn subscribes_per_shard_then_shared_channels() {
        let (transport, log) = fake(Some(&["shard0", "shard1"]));
        let mut subscriber = Subscriber::new(transport);

        let channels = subscriber.subscribe_all(None).await.unwrap();
        assert_eq!(channels.len(), 4);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "shards",
                "subscribe memory/shard0/stats",
                "subscribe memory/shard1/stats",
                "subscribe cpu",
                "subscribe console",
            ]
        );
    }

    #[tokio::test]
    async fn discovery_failure_is_fatal() {
        let (transport, log) = fake(None);
        let mut subscriber = Subscriber::new(transport);

        assert!(subscriber.subscribe_all(None).await.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["shards"]);
    }

    #[tokio::test]
    async fn configured_shards_skip_discovery() {
        let (transport, log) = fake(None);
        let mut subscriber = Subscriber::new(transport);
        let configured = vec!["shardSeason".to_owned()];

        subscriber.subscribe_all(Some(&configured)).await.unwrap();
        let log = log.lock().unwrap();
        assert!(!log.contains(&"shards".to_owned()));
        assert!(log.contains(&"subscribe memory/shardSeason/stats".to_owned()));
    }

    #[tokio::test]
    async fn no_shards_still_subscribes_cpu_and_console() {
        let (transport, _log) = fake(Some(&[]));
        let mut subscriber = Subscriber::new(transport);

        let channels = subscriber.subscribe_all(None).await.unwrap();
        assert_eq!(channels, vec!["console".to_owned(), "cpu".to_owned()]);
    }

    #[tokio::test]
    async fn shutdown_unsubscribes_everything_then_disconnects() {
        let (transport, log) = fake(Some(&["shard0"]));
        let mut subscriber = Subscriber::new(transport);
        subscriber.subscribe_all(None).await.unwrap();
        log.lock().unwrap().clear();

        subscriber.shutdown().await;
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 4);
        assert!(log.iter().take(3).all(|entry| entry.starts_with("unsubscribe ")));
        assert_eq!(log.last().map(String::as_str), Some("disconnect"));
    }
}
