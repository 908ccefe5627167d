//! Event-hub wiring
//!
//! The event hub is a subscription channel for ledger events from one bound
//! peer. Wiring picks the first reachable peer of the organization, binds the
//! hub to that peer's event endpoint and, if asked to, opens the connection
//! right away.

use crate::error::{ClientError, Result};
use crate::network::{EventEndpoint, LedgerNetwork};
use crate::sdk::SystemClient;
use std::sync::Arc;
use tracing::info;

/// Subscription channel to one peer's event endpoint. Must be bound before
/// a connect is attempted.
pub struct EventHub {
    network: Arc<dyn LedgerNetwork>,
    bound: Option<EventEndpoint>,
    connected: bool,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("bound", &self.bound)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl EventHub {
    pub fn new(network: Arc<dyn LedgerNetwork>) -> Self {
        Self {
            network,
            bound: None,
            connected: false,
        }
    }

    pub fn bind(&mut self, endpoint: EventEndpoint) {
        self.bound = Some(endpoint);
    }

    pub fn bound_endpoint(&self) -> Option<&EventEndpoint> {
        self.bound.as_ref()
    }

    /// Open the event connection. The connection is long-lived and outlives
    /// this call.
    pub fn connect(&mut self) -> Result<()> {
        let endpoint = self.bound.as_ref().ok_or_else(|| {
            ClientError::EventHub("event hub is not bound to a peer".to_string())
        })?;
        self.network
            .open_event_stream(endpoint)
            .map_err(|e| ClientError::EventHub(format!("event hub connect failed: {}", e)))?;
        self.connected = true;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Bind an event hub to the first peer of `org_id` with a non-empty URL,
/// in configured order. With `connect_now` the connection is opened
/// synchronously and a connect failure aborts the wiring.
pub fn wire_event_hub(
    client: &SystemClient,
    org_id: &str,
    connect_now: bool,
) -> Result<EventHub> {
    let mut hub = EventHub::new(client.network());

    let peer_configs = client.peers_config(org_id).map_err(|e| {
        ClientError::EventHub(format!("reading peer config for event hub failed: {}", e))
    })?;
    let chosen = peer_configs
        .iter()
        .find(|p| !p.url.is_empty())
        .ok_or_else(|| {
            ClientError::EventHub(format!(
                "event hub configuration not found for organization \"{}\"",
                org_id
            ))
        })?;

    info!(peer = %chosen.url, events = %chosen.event_url, "binding event hub");
    hub.bind(EventEndpoint {
        event_url: chosen.event_url.clone(),
        tls_ca_path: chosen.tls.ca_cert_path.clone(),
        server_name_override: chosen.grpc.server_name_override(),
    });

    if connect_now {
        hub.connect()?;
    }
    Ok(hub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InMemoryNetwork;

    #[test]
    fn connect_requires_binding() {
        let mut hub = EventHub::new(Arc::new(InMemoryNetwork::new()));
        let err = hub.connect().unwrap_err();
        assert!(err.to_string().contains("not bound"));
        assert!(!hub.is_connected());
    }

    #[test]
    fn connect_marks_hub_connected() {
        let mut hub = EventHub::new(Arc::new(InMemoryNetwork::new()));
        hub.bind(EventEndpoint {
            event_url: "grpcs://peer0:7053".to_string(),
            tls_ca_path: String::new(),
            server_name_override: String::new(),
        });
        hub.connect().unwrap();
        assert!(hub.is_connected());
        hub.disconnect();
        assert!(!hub.is_connected());
    }

    #[test]
    fn connect_failure_is_wrapped() {
        let network = Arc::new(InMemoryNetwork::new());
        network.fail_event_connect(true);
        let mut hub = EventHub::new(network);
        hub.bind(EventEndpoint {
            event_url: "grpcs://peer0:7053".to_string(),
            tls_ca_path: String::new(),
            server_name_override: String::new(),
        });
        let err = hub.connect().unwrap_err();
        assert!(err.to_string().starts_with("event hub connect failed"));
        assert!(!hub.is_connected());
    }
}
