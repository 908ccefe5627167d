//! Channel handles: endpoint records, assembly and join lifecycle
//!
//! A [`Channel`] is one logical ledger partition. It is assembled from the
//! profile (one randomly selected orderer plus every peer of the requested
//! organizations), then driven through the join lifecycle: join-check,
//! create-or-update on the ordering service, readiness poll, local
//! initialization and the join submission itself.

use crate::error::{ClientError, Result};
use crate::identity::Session;
use crate::network::{ChannelConfigInfo, ChannelCreateRequest, JoinRequest, LedgerNetwork};
use crate::profile::{OrdererProfile, PeerProfile};
use crate::sdk::SystemClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Immutable orderer endpoint record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orderer {
    pub url: String,
    pub tls_ca_path: String,
    pub server_name_override: String,
}

impl Orderer {
    pub fn from_profile(config: &OrdererProfile) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::Assembly(
                "orderer endpoint has an empty URL".to_string(),
            ));
        }
        Ok(Self {
            url: config.url.clone(),
            tls_ca_path: config.tls.ca_cert_path.clone(),
            server_name_override: config.grpc.server_name_override(),
        })
    }
}

/// Immutable peer endpoint record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub url: String,
    pub event_url: String,
    pub tls_ca_path: String,
    pub server_name_override: String,
}

impl Peer {
    pub fn from_profile(config: &PeerProfile) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::Assembly(
                "peer endpoint has an empty URL".to_string(),
            ));
        }
        Ok(Self {
            url: config.url.clone(),
            event_url: config.event_url.clone(),
            tls_ca_path: config.tls.ca_cert_path.clone(),
            server_name_override: config.grpc.server_name_override(),
        })
    }
}

/// One logical ledger partition with its attached endpoints. Becomes
/// usable only after [`Channel::initialize`] has fetched the channel
/// configuration from the network.
pub struct Channel {
    pub id: String,
    network: Arc<dyn LedgerNetwork>,
    orderers: Vec<Orderer>,
    peers: Vec<Peer>,
    config: Option<ChannelConfigInfo>,
    initialized: bool,
}

impl Channel {
    pub(crate) fn new(channel_id: &str, network: Arc<dyn LedgerNetwork>) -> Self {
        Self {
            id: channel_id.to_string(),
            network,
            orderers: Vec::new(),
            peers: Vec::new(),
            config: None,
            initialized: false,
        }
    }

    pub fn add_orderer(&mut self, orderer: Orderer) -> Result<()> {
        if self.orderers.iter().any(|o| o.url == orderer.url) {
            return Err(ClientError::Assembly(format!(
                "orderer {} already attached to channel {}",
                orderer.url, self.id
            )));
        }
        self.orderers.push(orderer);
        Ok(())
    }

    pub fn add_peer(&mut self, peer: Peer) -> Result<()> {
        if self.peers.iter().any(|p| p.url == peer.url) {
            return Err(ClientError::Assembly(format!(
                "peer {} already attached to channel {}",
                peer.url, self.id
            )));
        }
        self.peers.push(peer);
        Ok(())
    }

    pub fn orderers(&self) -> &[Orderer] {
        &self.orderers
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// The first attached peer. Attachment order follows the profile, so
    /// this is deterministic for a given configuration.
    pub fn primary_peer(&self) -> Option<&Peer> {
        self.peers.first()
    }

    /// Fetch and hold the channel configuration from the network.
    pub fn initialize(&mut self) -> Result<()> {
        let config = self.network.channel_config(&self.id).map_err(|e| {
            ClientError::Lifecycle(format!("channel initialize failed: {}", e))
        })?;
        self.config = Some(config);
        self.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> Option<&ChannelConfigInfo> {
        self.config.as_ref()
    }
}

/// Build a channel object for `channel_id` with one random orderer and all
/// peers of the given organizations attached. A partially assembled channel
/// is never returned; the first failed step aborts the whole assembly.
pub fn assemble_channel(
    client: &SystemClient,
    channel_id: &str,
    org_ids: &[&str],
) -> Result<Channel> {
    let mut channel = client.new_channel(channel_id)?;

    let orderer_config = client
        .random_orderer_config()
        .map_err(|e| ClientError::Assembly(format!("selecting orderer failed: {}", e)))?;
    let orderer = Orderer::from_profile(orderer_config)?;
    debug!(channel = channel_id, orderer = %orderer.url, "attaching orderer");
    channel.add_orderer(orderer)?;

    for org_id in org_ids {
        let peer_configs = client.peers_config(org_id).map_err(|e| {
            ClientError::Assembly(format!(
                "reading peer config for org {} failed: {}",
                org_id, e
            ))
        })?;
        for config in peer_configs {
            let peer = Peer::from_profile(config)?;
            debug!(channel = channel_id, peer = %peer.url, "attaching peer");
            channel.add_peer(peer)?;
        }
    }

    Ok(channel)
}

/// How long, and how eagerly, to wait for a freshly created channel to
/// settle on the ordering service before initializing it locally.
#[derive(Debug, Clone)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub initial_interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_interval: Duration::from_millis(250),
        }
    }
}

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Everything the join lifecycle needs beyond the channel itself.
pub struct JoinSpec {
    pub definition_path: PathBuf,
    pub admin: Session,
    pub orderer_admin: Session,
    pub readiness: ReadinessPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The channel was created (or updated) and the peers joined it.
    Joined,
    /// The primary peer had already joined; nothing was submitted.
    AlreadyJoined,
}

/// Drive the channel through the join lifecycle. Checking the primary peer
/// first makes the whole operation an idempotent no-op on an already-joined
/// channel: no create-or-update and no join transaction is submitted.
pub fn ensure_joined(
    client: &SystemClient,
    channel: &mut Channel,
    join_spec: &JoinSpec,
) -> Result<JoinOutcome> {
    let primary_url = channel
        .primary_peer()
        .map(|p| p.url.clone())
        .ok_or_else(|| {
            ClientError::Lifecycle(format!("channel {} has no peers to join", channel.id))
        })?;
    let network = client.network();

    let already_joined = network
        .has_peer_joined(&channel.id, &primary_url)
        .map_err(|e| {
            ClientError::Lifecycle(format!(
                "failed while checking if primary peer has already joined channel: {}",
                e
            ))
        })?;
    if already_joined {
        info!(channel = %channel.id, peer = %primary_url, "primary peer already joined");
        return Ok(JoinOutcome::AlreadyJoined);
    }

    let orderer_url = channel
        .orderers()
        .first()
        .map(|o| o.url.clone())
        .ok_or_else(|| {
            ClientError::Lifecycle(format!("channel {} has no orderer attached", channel.id))
        })?;

    let request = ChannelCreateRequest {
        channel_id: channel.id.clone(),
        definition_path: join_spec.definition_path.clone(),
        orderer_url,
        submitter: join_spec.admin.identity().clone(),
        orderer_admin: join_spec.orderer_admin.identity().clone(),
    };
    network
        .create_or_update_channel(&request)
        .map_err(|e| ClientError::Lifecycle(format!("channel create-or-update failed: {}", e)))?;

    wait_until_ready(network.as_ref(), &channel.id, &join_spec.readiness)?;
    channel.initialize()?;

    let join = JoinRequest {
        channel_id: channel.id.clone(),
        peer_urls: channel.peers().iter().map(|p| p.url.clone()).collect(),
        submitter: join_spec.admin.identity().clone(),
    };
    network
        .join_channel(&join)
        .map_err(|e| ClientError::Lifecycle(format!("channel join failed: {}", e)))?;

    info!(channel = %channel.id, peers = join.peer_urls.len(), "channel joined");
    Ok(JoinOutcome::Joined)
}

/// Poll the channel configuration with doubling backoff until the network
/// serves it, or fail once the policy's timeout has elapsed.
fn wait_until_ready(
    network: &dyn LedgerNetwork,
    channel_id: &str,
    policy: &ReadinessPolicy,
) -> Result<()> {
    let deadline = Instant::now() + policy.timeout;
    let mut interval = policy.initial_interval;
    loop {
        match network.channel_config(channel_id) {
            Ok(_) => return Ok(()),
            Err(e) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ClientError::Lifecycle(format!(
                        "channel {} not ready within {:?}: {}",
                        channel_id, policy.timeout, e
                    )));
                }
                debug!(channel = channel_id, ?interval, "channel not ready yet");
                thread::sleep(interval.min(deadline - now));
                interval = (interval * 2).min(MAX_POLL_INTERVAL);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::network::InMemoryNetwork;
    use crate::profile::{GrpcOptions, TlsProfile};

    fn orderer_profile(url: &str) -> OrdererProfile {
        OrdererProfile {
            url: url.to_string(),
            tls: TlsProfile::default(),
            grpc: GrpcOptions::default(),
        }
    }

    fn peer_profile(url: &str) -> PeerProfile {
        PeerProfile {
            url: url.to_string(),
            event_url: format!("{}-events", url),
            tls: TlsProfile::default(),
            grpc: GrpcOptions::default(),
        }
    }

    #[test]
    fn endpoint_constructors_reject_empty_urls() {
        assert!(Orderer::from_profile(&orderer_profile("")).is_err());
        assert!(Peer::from_profile(&peer_profile("")).is_err());
    }

    #[test]
    fn duplicate_attach_is_an_error() {
        let network = Arc::new(InMemoryNetwork::new());
        let mut channel = Channel::new("mychannel", network);
        let peer = Peer::from_profile(&peer_profile("grpcs://peer0:7051")).unwrap();
        channel.add_peer(peer.clone()).unwrap();
        let err = channel.add_peer(peer).unwrap_err();
        assert!(err.to_string().contains("already attached"));
    }

    #[test]
    fn primary_peer_is_first_attached() {
        let network = Arc::new(InMemoryNetwork::new());
        let mut channel = Channel::new("mychannel", network);
        channel
            .add_peer(Peer::from_profile(&peer_profile("grpcs://peer0:7051")).unwrap())
            .unwrap();
        channel
            .add_peer(Peer::from_profile(&peer_profile("grpcs://peer1:7051")).unwrap())
            .unwrap();
        assert_eq!(channel.primary_peer().unwrap().url, "grpcs://peer0:7051");
    }

    #[test]
    fn initialize_requires_channel_on_network() {
        let network = Arc::new(InMemoryNetwork::new());
        let mut channel = Channel::new("mychannel", network);
        let err = channel.initialize().unwrap_err();
        assert!(err.to_string().starts_with("channel initialize failed"));
        assert!(!channel.is_initialized());
    }

    fn admin_identity() -> Identity {
        Identity {
            name: "Admin".to_string(),
            msp_id: "Org1MSP".to_string(),
            org_id: "Org1".to_string(),
        }
    }

    #[test]
    fn readiness_poll_times_out() {
        let network = InMemoryNetwork::with_settle_delay(Duration::from_secs(60));
        let admin = admin_identity();
        network
            .create_or_update_channel(&ChannelCreateRequest {
                channel_id: "slow".to_string(),
                definition_path: PathBuf::from("fixtures/slow.def"),
                orderer_url: "grpcs://orderer:7050".to_string(),
                submitter: admin.clone(),
                orderer_admin: admin,
            })
            .unwrap();
        let policy = ReadinessPolicy {
            timeout: Duration::from_millis(50),
            initial_interval: Duration::from_millis(10),
        };
        let err = wait_until_ready(&network, "slow", &policy).unwrap_err();
        assert!(err.to_string().contains("not ready within"));
    }

    #[test]
    fn readiness_poll_succeeds_after_settling() {
        let network = InMemoryNetwork::with_settle_delay(Duration::from_millis(40));
        let admin = admin_identity();
        network
            .create_or_update_channel(&ChannelCreateRequest {
                channel_id: "settling".to_string(),
                definition_path: PathBuf::from("fixtures/settling.def"),
                orderer_url: "grpcs://orderer:7050".to_string(),
                submitter: admin.clone(),
                orderer_admin: admin,
            })
            .unwrap();
        let policy = ReadinessPolicy {
            timeout: Duration::from_secs(2),
            initial_interval: Duration::from_millis(10),
        };
        wait_until_ready(&network, "settling", &policy).unwrap();
    }
}
