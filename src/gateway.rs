//! Gateway - owns the endpoints and routes every event to its handler
//!
//! The gateway is the single entry point the transport layer calls:
//! - Startup registration of both endpoints (failures are non-fatal)
//! - Event dispatch to the remote adapter, peer bridge and lifecycle shim
//! - A fault boundary so no handler can propagate a panic to the caller
//! - Config hot reload of the mapping tables

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::RemoteAdapter;
use crate::bridge::PeerBridge;
use crate::config::AppConfig;
use crate::endpoint::{EndpointKind, PeerEndpoint, Registration, RemoteEndpoint};
use crate::lifecycle::{EndpointLifecycle, EndpointStatus};
use crate::log::EventLog;
use crate::mapping::{ChannelMap, FeedbackTable};
use crate::signal::{ButtonEvent, FeedbackState, InboundSignal};

/// Everything the transport layer can deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Button(ButtonEvent),
    Inbound(InboundSignal),
    Online { endpoint: EndpointKind, online: bool },
}

/// Serialisable view of the gateway
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub endpoints: Vec<EndpointStatus>,
    pub feedback: FeedbackState,
}

pub struct Gateway {
    remote: Arc<dyn RemoteEndpoint>,
    peer: Arc<dyn PeerEndpoint>,
    adapter: RemoteAdapter,
    bridge: PeerBridge,
    lifecycle: EndpointLifecycle,
    log: Arc<dyn EventLog>,
    config: AppConfig,
}

impl Gateway {
    pub fn new(
        config: AppConfig,
        remote: Arc<dyn RemoteEndpoint>,
        peer: Arc<dyn PeerEndpoint>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let adapter = RemoteAdapter::new(
            peer.clone(),
            ChannelMap::from_config(&config.buttons),
            log.clone(),
        );
        let bridge = PeerBridge::new(
            remote.clone(),
            FeedbackTable::from_config(&config.feedback),
            log.clone(),
        );
        let lifecycle = EndpointLifecycle::new([remote.info(), peer.info()], log.clone());

        Self {
            remote,
            peer,
            adapter,
            bridge,
            lifecycle,
            log,
            config,
        }
    }

    /// Register the remote, then the peer
    ///
    /// Each outcome goes to the lifecycle shim. Nothing is retried and a
    /// failure never stops the other registration.
    pub async fn register_endpoints(&self) {
        let outcome = Registration::from(self.remote.register().await);
        self.lifecycle.on_registered(EndpointKind::Remote, outcome);

        let outcome = Registration::from(self.peer.register().await);
        self.lifecycle.on_registered(EndpointKind::Peer, outcome);
    }

    /// Route one event to its handler
    ///
    /// A panic inside a handler is caught here, logged, and suppressed.
    pub fn dispatch(&self, event: &GatewayEvent) {
        debug!("Dispatching {:?}", event);

        let result = panic::catch_unwind(AssertUnwindSafe(|| match event {
            GatewayEvent::Button(button) => self.adapter.on_button_event(button),
            GatewayEvent::Inbound(signal) => self.bridge.on_inbound_signal(signal),
            GatewayEvent::Online { endpoint, online } => {
                self.lifecycle.on_online_status_changed(*endpoint, *online)
            }
        }));

        if let Err(payload) = result {
            self.log
                .error(&format!("Error handling {:?}: {}", event, panic_message(&*payload)));
        }
    }

    pub fn on_button_event(&self, event: ButtonEvent) {
        self.dispatch(&GatewayEvent::Button(event));
    }

    pub fn on_inbound_signal(&self, signal: InboundSignal) {
        self.dispatch(&GatewayEvent::Inbound(signal));
    }

    pub fn on_online_status_changed(&self, endpoint: EndpointKind, online: bool) {
        self.dispatch(&GatewayEvent::Online { endpoint, online });
    }

    /// Apply a reloaded config
    ///
    /// Mapping tables are swapped in place. Endpoint identity and logging
    /// cannot change while running; such a change is reported and otherwise
    /// ignored.
    pub fn update_config(&mut self, config: AppConfig) {
        if self.config.requires_restart(&config) {
            self.log
                .warn("Endpoint or logging settings changed; restart to apply them");
        }

        self.adapter.set_channels(ChannelMap::from_config(&config.buttons));
        self.bridge.set_table(FeedbackTable::from_config(&config.feedback));
        info!("Button and feedback mappings updated");

        self.config = config;
    }

    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            endpoints: self.lifecycle.statuses(),
            feedback: self.remote.feedback(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
