//! Client bootstrap: settings, initialize sequence, and the initialized aggregate
//!
//! `initialize` is a linear sequence: SDK factory, admin session, system
//! client, channel assembly, join lifecycle, event-hub wiring. The first
//! failure aborts the rest; a partially built aggregate never escapes, the
//! caller either gets a fully initialized [`LedgerClient`] or an error.

use crate::channel::{assemble_channel, ensure_joined, Channel, JoinOutcome, JoinSpec, ReadinessPolicy};
use crate::error::{ClientError, Result};
use crate::events::{wire_event_hub, EventHub};
use crate::identity::Identity;
use crate::network::LedgerNetwork;
use crate::sdk::{Sdk, SdkOptions, SystemClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Default admin username the membership service pre-enrolls per org.
pub const DEFAULT_ADMIN_USER: &str = "Admin";
/// Organization that administers the ordering service.
pub const DEFAULT_ORDERER_ADMIN_ORG: &str = "ordererorg";

/// Declarative inputs of one bootstrap run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub config_file: PathBuf,
    pub org_id: String,
    pub channel_id: String,
    /// Path of the opaque channel-definition artifact.
    pub channel_definition: PathBuf,
    pub connect_event_hub: bool,
    pub admin_user: String,
    pub orderer_admin_org: String,
    pub readiness: ReadinessPolicy,
}

impl ClientSettings {
    pub fn new(
        config_file: impl Into<PathBuf>,
        org_id: impl Into<String>,
        channel_id: impl Into<String>,
        channel_definition: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_file: config_file.into(),
            org_id: org_id.into(),
            channel_id: channel_id.into(),
            channel_definition: channel_definition.into(),
            connect_event_hub: false,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            orderer_admin_org: DEFAULT_ORDERER_ADMIN_ORG.to_string(),
            readiness: ReadinessPolicy::default(),
        }
    }

    pub fn connect_event_hub(mut self, connect: bool) -> Self {
        self.connect_event_hub = connect;
        self
    }

    pub fn readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    /// Run the whole bootstrap sequence against the given network.
    pub fn initialize(&self, network: Arc<dyn LedgerNetwork>) -> Result<LedgerClient> {
        info!(channel = %self.channel_id, org = %self.org_id, "initializing ledger client");

        let sdk = Sdk::new(SdkOptions {
            config_file: self.config_file.clone(),
            network,
        })?;

        let session = sdk
            .pre_enrolled_session(&self.org_id, &self.admin_user)
            .map_err(|e| {
                ClientError::Session(format!(
                    "failed getting admin user session for org {}: {}",
                    self.org_id, e
                ))
            })?;
        let client = sdk.system_client(&session)?;
        let admin = session.identity().clone();

        let mut channel = assemble_channel(&client, &self.channel_id, &[self.org_id.as_str()])
            .map_err(|e| {
                ClientError::Assembly(format!(
                    "create channel ({}) failed: {}",
                    self.channel_id, e
                ))
            })?;

        let orderer_admin = sdk
            .pre_enrolled_session(&self.orderer_admin_org, &self.admin_user)
            .map_err(|e| {
                ClientError::Session(format!("failed getting orderer admin user: {}", e))
            })?;

        let join_spec = JoinSpec {
            definition_path: self.channel_definition.clone(),
            admin: session,
            orderer_admin,
            readiness: self.readiness.clone(),
        };
        match ensure_joined(&client, &mut channel, &join_spec)? {
            JoinOutcome::Joined => info!(channel = %self.channel_id, "channel created and joined"),
            JoinOutcome::AlreadyJoined => {
                info!(channel = %self.channel_id, "channel already joined, nothing to do")
            }
        }

        let event_hub = wire_event_hub(&client, &self.org_id, self.connect_event_hub)?;

        info!(channel = %self.channel_id, "ledger client initialized");
        Ok(LedgerClient {
            client,
            channel,
            event_hub,
            admin,
            initialized: true,
        })
    }
}

/// Fully initialized client aggregate. Only produced when every bootstrap
/// stage succeeded, so `initialized` is true on every value of this type.
pub struct LedgerClient {
    pub client: SystemClient,
    pub channel: Channel,
    pub event_hub: EventHub,
    pub admin: Identity,
    pub initialized: bool,
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("event_hub", &self.event_hub)
            .field("admin", &self.admin)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl LedgerClient {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
