#![forbid(unsafe_code)]
//! Demo client for fabriclink against the in-process ledger network.

use fabriclink::client::ClientSettings;
use fabriclink::logging::{self, LogOptions};
use fabriclink::network::InMemoryNetwork;
use std::sync::Arc;
use tracing::{error, info};

const CONFIG_FILE: &str = "config/network.toml";
const CHANNEL_ID: &str = "mychannel";
const ORG_ID: &str = "Org1";
const CHANNEL_DEFINITION: &str = "config/mychannel.def";

fn main() {
    if let Err(e) = logging::init(&LogOptions::default()) {
        eprintln!("logging setup failed: {}", e);
        return;
    }

    info!("### Starting fabriclink client ###");

    let settings = ClientSettings::new(CONFIG_FILE, ORG_ID, CHANNEL_ID, CHANNEL_DEFINITION)
        .connect_event_hub(true);
    let network = Arc::new(InMemoryNetwork::new());

    match settings.initialize(network) {
        Ok(client) => {
            info!(
                channel = %client.channel.id,
                orderers = client.channel.orderers().len(),
                peers = client.channel.peers().len(),
                event_hub_connected = client.event_hub.is_connected(),
                "client ready"
            );
        }
        Err(e) => {
            error!("Failed to init ledger client. Message: {}", e);
        }
    }

    info!("### Shutdown fabriclink client ###");
}
