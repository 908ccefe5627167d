//! Ledger-network seam and in-process simulation
//!
//! The ordering service, membership service and peers live outside this
//! crate. Everything the bootstrap sequence needs from them is expressed by
//! the [`LedgerNetwork`] trait; [`InMemoryNetwork`] is a process-local
//! implementation of the same outcomes, used by the demo binary and by the
//! integration tests. It simulates results, not protocols.

use crate::error::{ClientError, Result};
use crate::identity::Identity;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// Create-or-update submission for the ordering service. The channel
/// definition artifact is opaque; only its path travels here.
#[derive(Debug, Clone)]
pub struct ChannelCreateRequest {
    pub channel_id: String,
    pub definition_path: PathBuf,
    pub orderer_url: String,
    pub submitter: Identity,
    pub orderer_admin: Identity,
}

/// Join submission for a set of peers.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub channel_id: String,
    pub peer_urls: Vec<String>,
    pub submitter: Identity,
}

/// Channel configuration as reported by the network once the channel has
/// settled on the ordering service.
#[derive(Debug, Clone)]
pub struct ChannelConfigInfo {
    pub channel_id: String,
    pub orderer_urls: Vec<String>,
    pub version: u64,
}

/// One peer's event-notification endpoint together with its TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEndpoint {
    pub event_url: String,
    pub tls_ca_path: String,
    pub server_name_override: String,
}

/// Abstraction over the external ledger network. Implementations must be
/// shareable across the client handles that hold them.
pub trait LedgerNetwork: Send + Sync {
    /// Readiness probe: does the channel configuration exist on the network.
    fn channel_exists(&self, channel_id: &str) -> Result<bool>;

    /// Has the given peer already joined the channel.
    fn has_peer_joined(&self, channel_id: &str, peer_url: &str) -> Result<bool>;

    /// Submit a create-or-update channel transaction to the ordering service.
    fn create_or_update_channel(&self, request: &ChannelCreateRequest) -> Result<()>;

    /// Fetch the channel configuration. Errors while the channel is still
    /// settling after creation.
    fn channel_config(&self, channel_id: &str) -> Result<ChannelConfigInfo>;

    /// Submit a join request for a set of peers.
    fn join_channel(&self, request: &JoinRequest) -> Result<()>;

    /// Open the long-lived event connection to a bound endpoint. The
    /// connection outlives this call.
    fn open_event_stream(&self, endpoint: &EventEndpoint) -> Result<()>;
}

#[derive(Debug)]
struct SimChannel {
    created_at: Instant,
    version: u64,
    orderer_url: String,
    joined_peers: HashSet<String>,
}

/// Counters for the network calls the simulation has served. Tests use
/// these to assert that idempotent paths really skip work.
#[derive(Debug, Clone, Default)]
pub struct CallCounters {
    pub join_checks: u64,
    pub create_or_update_calls: u64,
    pub config_fetches: u64,
    pub join_calls: u64,
    pub event_connects: u64,
}

/// Process-local ledger network. Channels live in a table behind a mutex;
/// an optional settling delay hides a freshly created channel's
/// configuration for a while, the way a real ordering service does.
pub struct InMemoryNetwork {
    channels: Mutex<HashMap<String, SimChannel>>,
    counters: Mutex<CallCounters>,
    settle: Duration,
    fail_event_connect: Mutex<bool>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::with_settle_delay(Duration::ZERO)
    }

    /// A network whose channels report no configuration until `settle` has
    /// elapsed after creation.
    pub fn with_settle_delay(settle: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            counters: Mutex::new(CallCounters::default()),
            settle,
            fail_event_connect: Mutex::new(false),
        }
    }

    /// Make every subsequent `open_event_stream` call fail.
    pub fn fail_event_connect(&self, fail: bool) {
        *self.fail_event_connect.lock() = fail;
    }

    pub fn counters(&self) -> CallCounters {
        self.counters.lock().clone()
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerNetwork for InMemoryNetwork {
    fn channel_exists(&self, channel_id: &str) -> Result<bool> {
        Ok(self.channels.lock().contains_key(channel_id))
    }

    fn has_peer_joined(&self, channel_id: &str, peer_url: &str) -> Result<bool> {
        self.counters.lock().join_checks += 1;
        let channels = self.channels.lock();
        Ok(channels
            .get(channel_id)
            .map(|c| c.joined_peers.contains(peer_url))
            .unwrap_or(false))
    }

    fn create_or_update_channel(&self, request: &ChannelCreateRequest) -> Result<()> {
        if request.definition_path.as_os_str().is_empty() {
            return Err(ClientError::Network(
                "channel definition artifact path is empty".to_string(),
            ));
        }
        self.counters.lock().create_or_update_calls += 1;
        let mut channels = self.channels.lock();
        match channels.get_mut(&request.channel_id) {
            Some(existing) => {
                existing.version += 1;
                existing.orderer_url = request.orderer_url.clone();
            }
            None => {
                debug!(channel = %request.channel_id, orderer = %request.orderer_url,
                    "creating channel");
                channels.insert(
                    request.channel_id.clone(),
                    SimChannel {
                        created_at: Instant::now(),
                        version: 1,
                        orderer_url: request.orderer_url.clone(),
                        joined_peers: HashSet::new(),
                    },
                );
            }
        }
        Ok(())
    }

    fn channel_config(&self, channel_id: &str) -> Result<ChannelConfigInfo> {
        self.counters.lock().config_fetches += 1;
        let channels = self.channels.lock();
        let channel = channels.get(channel_id).ok_or_else(|| {
            ClientError::Network(format!("channel \"{}\" not found", channel_id))
        })?;
        if channel.created_at.elapsed() < self.settle {
            return Err(ClientError::Network(format!(
                "channel \"{}\" configuration not yet available",
                channel_id
            )));
        }
        Ok(ChannelConfigInfo {
            channel_id: channel_id.to_string(),
            orderer_urls: vec![channel.orderer_url.clone()],
            version: channel.version,
        })
    }

    fn join_channel(&self, request: &JoinRequest) -> Result<()> {
        self.counters.lock().join_calls += 1;
        let mut channels = self.channels.lock();
        let channel = channels.get_mut(&request.channel_id).ok_or_else(|| {
            ClientError::Network(format!(
                "cannot join channel \"{}\": channel not found",
                request.channel_id
            ))
        })?;
        for url in &request.peer_urls {
            channel.joined_peers.insert(url.clone());
        }
        Ok(())
    }

    fn open_event_stream(&self, endpoint: &EventEndpoint) -> Result<()> {
        if endpoint.event_url.is_empty() {
            return Err(ClientError::Network(
                "event endpoint has no URL".to_string(),
            ));
        }
        if *self.fail_event_connect.lock() {
            return Err(ClientError::Network(format!(
                "event endpoint {} refused connection",
                endpoint.event_url
            )));
        }
        self.counters.lock().event_connects += 1;
        debug!(endpoint = %endpoint.event_url, "event stream opened");
        Ok(())
    }
}
