//! Peer bridge - peer signals → remote feedback
//!
//! Dispatch is a lookup in the [`FeedbackTable`] keyed by `(kind, channel)`.
//! Signals without an entry, including all string signals unless a room label
//! channel is configured, are ignored without error.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use crate::endpoint::RemoteEndpoint;
use crate::log::EventLog;
use crate::mapping::{FeedbackAction, FeedbackTable};
use crate::signal::{convert, InboundSignal, SignalValue};

pub struct PeerBridge {
    remote: Arc<dyn RemoteEndpoint>,
    table: RwLock<FeedbackTable>,
    log: Arc<dyn EventLog>,
}

impl PeerBridge {
    pub fn new(remote: Arc<dyn RemoteEndpoint>, table: FeedbackTable, log: Arc<dyn EventLog>) -> Self {
        Self {
            remote,
            table: RwLock::new(table),
            log,
        }
    }

    /// Handle a signal received from the peer
    pub fn on_inbound_signal(&self, signal: &InboundSignal) {
        let action = match self.table.read().lookup(signal.kind(), signal.channel) {
            Some(action) => action,
            None => {
                trace!("Ignoring peer signal {}", signal);
                return;
            }
        };

        match (action, &signal.value) {
            (FeedbackAction::Flag(flag), SignalValue::Boolean(value)) => {
                self.remote.set_feedback_flag(flag, *value);
            }
            (FeedbackAction::VolumeLevel, SignalValue::Unsigned(value)) => {
                self.remote.set_volume_level(convert::scale_level(*value));
            }
            (FeedbackAction::RoomLabel, SignalValue::String(text)) => {
                self.remote.set_room_label(text);
            }
            // The table is keyed by kind, so a mismatch means a corrupted entry
            (action, _) => {
                self.log.error(&format!(
                    "Feedback action {:?} cannot take peer signal {}",
                    action, signal
                ));
            }
        }
    }

    /// Replace the feedback table (config reload)
    pub fn set_table(&self, table: FeedbackTable) {
        *self.table.write() = table;
    }
}
