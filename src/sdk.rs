//! SDK factory and system client
//!
//! The factory turns a profile path and a network backend into handles the
//! rest of the bootstrap drives: pre-enrolled admin sessions and a
//! [`SystemClient`] that exposes the profile's config accessors alongside
//! the network seam.

use crate::channel::Channel;
use crate::error::{ClientError, Result};
use crate::identity::{Identity, Session};
use crate::network::LedgerNetwork;
use crate::profile::{NetworkProfile, OrdererProfile, PeerProfile};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct SdkOptions {
    pub config_file: PathBuf,
    pub network: Arc<dyn LedgerNetwork>,
}

pub struct Sdk {
    profile: Arc<NetworkProfile>,
    network: Arc<dyn LedgerNetwork>,
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl Sdk {
    /// Build an SDK instance from a profile file and a network backend.
    pub fn new(options: SdkOptions) -> Result<Self> {
        let profile = NetworkProfile::load(&options.config_file)
            .map_err(|e| ClientError::Client(format!("SDK init failed: {}", e)))?;
        info!(profile = %profile.name, "SDK initialized");
        Ok(Self {
            profile: Arc::new(profile),
            network: options.network,
        })
    }

    /// Session for a user the membership service has already enrolled.
    /// The user must be declared under the organization in the profile.
    pub fn pre_enrolled_session(&self, org_id: &str, username: &str) -> Result<Session> {
        let org = self.profile.organization(org_id).ok_or_else(|| {
            ClientError::Session(format!(
                "organization \"{}\" not found in network profile",
                org_id
            ))
        })?;
        let user = org.users.iter().find(|u| u.name == username).ok_or_else(|| {
            ClientError::Session(format!(
                "pre-enrolled user \"{}\" not found for organization \"{}\"",
                username, org_id
            ))
        })?;
        Ok(Session::new(Identity {
            name: user.name.clone(),
            msp_id: org.msp_id.clone(),
            org_id: org.id.clone(),
        }))
    }

    /// System-level client authorized by the given session.
    pub fn system_client(&self, session: &Session) -> Result<SystemClient> {
        let org_id = &session.identity().org_id;
        if self.profile.organization(org_id).is_none() {
            return Err(ClientError::Client(format!(
                "system client construction failed: organization \"{}\" not in profile",
                org_id
            )));
        }
        Ok(SystemClient {
            profile: Arc::clone(&self.profile),
            network: Arc::clone(&self.network),
        })
    }
}

/// Client-side handle to the ledger network, scoped by the profile it was
/// built from. Cheap to clone the underlying handles out of.
pub struct SystemClient {
    profile: Arc<NetworkProfile>,
    network: Arc<dyn LedgerNetwork>,
}

impl SystemClient {
    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn network(&self) -> Arc<dyn LedgerNetwork> {
        Arc::clone(&self.network)
    }

    /// A fresh, empty channel object. Endpoints are attached afterwards.
    pub fn new_channel(&self, channel_id: &str) -> Result<Channel> {
        if channel_id.is_empty() {
            return Err(ClientError::Assembly(
                "channel id must not be empty".to_string(),
            ));
        }
        Ok(Channel::new(channel_id, self.network()))
    }

    pub fn random_orderer_config(&self) -> Result<&OrdererProfile> {
        self.profile.random_orderer()
    }

    pub fn peers_config(&self, org_id: &str) -> Result<&[PeerProfile]> {
        self.profile.peers_for_org(org_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InMemoryNetwork;
    use std::io::Write;

    fn write_profile(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const PROFILE: &str = r#"
name = "devnet"

[[orderers]]
url = "grpcs://orderer.example.com:7050"

[[organizations]]
id = "Org1"
msp_id = "Org1MSP"

[[organizations.users]]
name = "Admin"
"#;

    fn sdk_from(contents: &str) -> Sdk {
        let file = write_profile(contents);
        Sdk::new(SdkOptions {
            config_file: file.path().to_path_buf(),
            network: Arc::new(InMemoryNetwork::new()),
        })
        .unwrap()
    }

    #[test]
    fn sdk_init_wraps_profile_errors() {
        let err = Sdk::new(SdkOptions {
            config_file: PathBuf::from("missing/profile.toml"),
            network: Arc::new(InMemoryNetwork::new()),
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("SDK init failed"));
    }

    #[test]
    fn session_lookup_finds_admin() {
        let sdk = sdk_from(PROFILE);
        let session = sdk.pre_enrolled_session("Org1", "Admin").unwrap();
        assert_eq!(session.identity().msp_id, "Org1MSP");
    }

    #[test]
    fn session_lookup_rejects_unknown_user() {
        let sdk = sdk_from(PROFILE);
        let err = sdk.pre_enrolled_session("Org1", "Nobody").unwrap_err();
        assert!(err.to_string().contains("pre-enrolled user"));
    }

    #[test]
    fn session_lookup_rejects_unknown_org() {
        let sdk = sdk_from(PROFILE);
        let err = sdk.pre_enrolled_session("Org9", "Admin").unwrap_err();
        assert!(err.to_string().contains("Org9"));
    }

    #[test]
    fn system_client_exposes_profile_accessors() {
        let sdk = sdk_from(PROFILE);
        let session = sdk.pre_enrolled_session("Org1", "Admin").unwrap();
        let client = sdk.system_client(&session).unwrap();
        assert_eq!(client.profile().name, "devnet");
        assert!(client.random_orderer_config().is_ok());
        assert!(client.new_channel("").is_err());
    }
}
