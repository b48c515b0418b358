//! Endpoint lifecycle shim
//!
//! Receives registration outcomes and online/offline transitions from the
//! transport layer. Transitions are observational only: they are recorded and
//! logged, nothing is retried or reconnected.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::endpoint::{EndpointInfo, EndpointKind, OnlineStatus, Registration};
use crate::log::EventLog;

/// What the shim knows about one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointStatus {
    pub info: EndpointInfo,
    /// `None` until registration has been attempted
    pub registration: Option<Registration>,
    pub online: OnlineStatus,
}

pub struct EndpointLifecycle {
    endpoints: RwLock<BTreeMap<EndpointKind, EndpointStatus>>,
    log: Arc<dyn EventLog>,
}

impl EndpointLifecycle {
    pub fn new(endpoints: impl IntoIterator<Item = EndpointInfo>, log: Arc<dyn EventLog>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|info| {
                (
                    info.kind,
                    EndpointStatus {
                        info,
                        registration: None,
                        online: OnlineStatus::Offline,
                    },
                )
            })
            .collect();

        Self {
            endpoints: RwLock::new(endpoints),
            log,
        }
    }

    /// Record a registration outcome; failures are logged and non-fatal
    pub fn on_registered(&self, kind: EndpointKind, outcome: Registration) {
        let mut endpoints = self.endpoints.write();
        let Some(status) = endpoints.get_mut(&kind) else {
            self.log
                .error(&format!("Registration outcome for unknown {} endpoint", kind));
            return;
        };

        if let Registration::Failure(reason) = &outcome {
            self.log.error(&format!(
                "Error registering {}: {}",
                status.info, reason
            ));
        } else {
            debug!("{} registered", status.info);
        }
        status.registration = Some(outcome);
    }

    /// Record an online/offline transition
    pub fn on_online_status_changed(&self, kind: EndpointKind, is_online: bool) {
        let mut endpoints = self.endpoints.write();
        let Some(status) = endpoints.get_mut(&kind) else {
            self.log
                .error(&format!("Online status for unknown {} endpoint", kind));
            return;
        };

        let online = OnlineStatus::from(is_online);
        status.online = online;

        match kind {
            EndpointKind::Remote => self
                .log
                .notice(&format!("{} is {}", status.info.name, online)),
            EndpointKind::Peer => debug!("{} is {}", status.info.name, online),
        }
    }

    pub fn status(&self, kind: EndpointKind) -> Option<EndpointStatus> {
        self.endpoints.read().get(&kind).cloned()
    }

    /// Status of every known endpoint, remote first
    pub fn statuses(&self) -> Vec<EndpointStatus> {
        self.endpoints.read().values().cloned().collect()
    }
}
