//! Remote adapter - remote button events → peer boolean channels

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use crate::endpoint::{EndpointError, PeerEndpoint};
use crate::log::EventLog;
use crate::mapping::ChannelMap;
use crate::signal::{ButtonEvent, OutboundSignal};

/// Translates each button event into exactly one boolean write on the peer
///
/// A press sets the mapped channel high and is logged; a release sets it low
/// silently. Write failures are logged and never reach the caller.
pub struct RemoteAdapter {
    peer: Arc<dyn PeerEndpoint>,
    channels: RwLock<ChannelMap>,
    log: Arc<dyn EventLog>,
}

impl RemoteAdapter {
    pub fn new(peer: Arc<dyn PeerEndpoint>, channels: ChannelMap, log: Arc<dyn EventLog>) -> Self {
        Self {
            peer,
            channels: RwLock::new(channels),
            log,
        }
    }

    /// Handle a button press or release from the remote
    pub fn on_button_event(&self, event: &ButtonEvent) {
        if let Err(e) = self.forward(event) {
            self.log.error(&format!(
                "Button {} ({}) {}: {}",
                event.name, event.index, event.state, e
            ));
        }
    }

    fn forward(&self, event: &ButtonEvent) -> Result<OutboundSignal, EndpointError> {
        let channel = self
            .channels
            .read()
            .resolve(event.index)
            .ok_or(EndpointError::NoChannel { index: event.index })?;

        let signal = OutboundSignal {
            channel,
            value: event.state.is_pressed(),
        };
        trace!("Button {} -> bool[{}] = {}", event.index, signal.channel, signal.value);

        self.peer.set_boolean(signal.channel, signal.value)?;

        if event.state.is_pressed() {
            self.log
                .notice(&format!("Button {} has state {}", event.name, event.state));
        }

        Ok(signal)
    }

    /// Replace the button mapping (config reload)
    pub fn set_channels(&self, channels: ChannelMap) {
        *self.channels.write() = channels;
    }
}
