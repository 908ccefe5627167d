//! Network-profile configuration for fabriclink
//!
//! The profile is the declarative topology document the client is driven by:
//! organizations with their pre-enrolled users and peers, plus the orderer
//! endpoints of the ordering service. It is parsed into typed structures here;
//! nothing downstream probes untyped maps.

use crate::error::{ClientError, Result};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkProfile {
    /// Human-readable name of the network this profile describes.
    pub name: String,
    #[serde(default)]
    pub organizations: Vec<OrganizationProfile>,
    #[serde(default)]
    pub orderers: Vec<OrdererProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationProfile {
    pub id: String,
    #[serde(default)]
    pub msp_id: String,
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub peers: Vec<PeerProfile>,
}

/// A pre-enrolled user whose credentials the membership service already holds.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub enrollment_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerProfile {
    /// Endorsement endpoint. An empty URL marks the peer as unreachable;
    /// that is significant downstream, not a parse error.
    #[serde(default)]
    pub url: String,
    /// Event-notification endpoint, may be empty for peers without one.
    #[serde(default)]
    pub event_url: String,
    #[serde(default)]
    pub tls: TlsProfile,
    #[serde(default)]
    pub grpc: GrpcOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdererProfile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tls: TlsProfile,
    #[serde(default)]
    pub grpc: GrpcOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsProfile {
    #[serde(default)]
    pub ca_cert_path: String,
}

/// Typed gRPC dial options for one endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GrpcOptions {
    /// Expected TLS server name when it differs from the dialed host.
    #[serde(default)]
    pub ssl_target_name_override: Option<String>,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default)]
    pub allow_insecure: bool,
}

impl Default for GrpcOptions {
    fn default() -> Self {
        Self {
            ssl_target_name_override: None,
            keepalive_secs: default_keepalive_secs(),
            allow_insecure: false,
        }
    }
}

impl GrpcOptions {
    /// The server-name override to dial with. Absent means empty string,
    /// never an error.
    pub fn server_name_override(&self) -> String {
        self.ssl_target_name_override.clone().unwrap_or_default()
    }
}

fn default_keepalive_secs() -> u64 {
    60
}

impl NetworkProfile {
    /// Load and validate a profile from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to read network profile {}: {}",
                path.display(),
                e
            ))
        })?;
        let profile: NetworkProfile = toml::from_str(&raw).map_err(|e| {
            ClientError::Config(format!(
                "failed to parse network profile {}: {}",
                path.display(),
                e
            ))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ClientError::Config(
                "network profile name must not be empty".to_string(),
            ));
        }
        if self.organizations.is_empty() {
            return Err(ClientError::Config(
                "network profile must declare at least one organization".to_string(),
            ));
        }
        for org in &self.organizations {
            if org.id.is_empty() {
                return Err(ClientError::Config(
                    "organization id must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn organization(&self, org_id: &str) -> Option<&OrganizationProfile> {
        self.organizations.iter().find(|org| org.id == org_id)
    }

    /// Peer configurations for one organization, in their configured order.
    pub fn peers_for_org(&self, org_id: &str) -> Result<&[PeerProfile]> {
        self.organization(org_id)
            .map(|org| org.peers.as_slice())
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "organization \"{}\" not found in network profile",
                    org_id
                ))
            })
    }

    /// Pick one orderer configuration at random.
    pub fn random_orderer(&self) -> Result<&OrdererProfile> {
        self.orderers
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| {
                ClientError::Config("network profile declares no orderers".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
name = "devnet"

[[orderers]]
url = "grpcs://orderer.example.com:7050"

[orderers.tls]
ca_cert_path = "crypto/ordererOrganizations/tlsca.pem"

[orderers.grpc]
ssl_target_name_override = "orderer.example.com"

[[organizations]]
id = "Org1"
msp_id = "Org1MSP"

[[organizations.users]]
name = "Admin"
enrollment_id = "admin-org1"

[[organizations.peers]]
url = "grpcs://peer0.org1.example.com:7051"
event_url = "grpcs://peer0.org1.example.com:7053"

[organizations.peers.tls]
ca_cert_path = "crypto/peerOrganizations/org1/tlsca.pem"
"#;

    fn sample_profile() -> NetworkProfile {
        toml::from_str(SAMPLE).expect("sample profile parses")
    }

    #[test]
    fn parses_sample_profile() {
        let profile = sample_profile();
        assert_eq!(profile.name, "devnet");
        assert_eq!(profile.orderers.len(), 1);
        assert_eq!(
            profile.orderers[0].grpc.server_name_override(),
            "orderer.example.com"
        );
        let peers = profile.peers_for_org("Org1").unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].event_url, "grpcs://peer0.org1.example.com:7053");
    }

    #[test]
    fn absent_override_is_empty_string() {
        let profile = sample_profile();
        let peer = &profile.peers_for_org("Org1").unwrap()[0];
        assert_eq!(peer.grpc.server_name_override(), "");
    }

    #[test]
    fn unknown_org_is_an_error() {
        let profile = sample_profile();
        let err = profile.peers_for_org("Org9").unwrap_err();
        assert!(err.to_string().contains("Org9"));
    }

    #[test]
    fn random_orderer_fails_without_orderers() {
        let mut profile = sample_profile();
        profile.orderers.clear();
        assert!(profile.random_orderer().is_err());
    }

    #[test]
    fn load_validates_missing_organizations() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"empty\"").unwrap();
        let err = NetworkProfile::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("at least one organization"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = NetworkProfile::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read network profile"));
    }
}
