//! Console endpoints - log all writes for bench testing and debugging

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

use super::{
    check_address, Endpoint, EndpointError, EndpointInfo, EndpointKind, PeerEndpoint,
    RemoteEndpoint,
};
use crate::config::{PeerConfig, RemoteConfig};
use crate::signal::{convert::MAX_LEVEL, FeedbackFlag, FeedbackState};

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// In-process peer system
///
/// Channels `1..=boolean_channels` are allocated. The last value written to
/// each channel is kept so the console can show it.
pub struct ConsolePeer {
    info: EndpointInfo,
    host: String,
    boolean_channels: u16,
    registered: AtomicBool,
    booleans: RwLock<BTreeMap<u16, bool>>,
    write_count: AtomicU64,
}

impl ConsolePeer {
    pub fn new(config: &PeerConfig) -> Self {
        Self {
            info: EndpointInfo::new(EndpointKind::Peer, config.name.clone(), config.address),
            host: config.host.clone(),
            boolean_channels: config.boolean_channels,
            registered: AtomicBool::new(false),
            booleans: RwLock::new(BTreeMap::new()),
            write_count: AtomicU64::new(0),
        }
    }

    /// Last value written to a boolean channel
    pub fn boolean(&self, channel: u16) -> Option<bool> {
        self.booleans.read().get(&channel).copied()
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Endpoint for ConsolePeer {
    fn info(&self) -> EndpointInfo {
        self.info.clone()
    }

    async fn register(&self) -> Result<(), EndpointError> {
        check_address(self.info.address)?;
        self.host
            .parse::<IpAddr>()
            .map_err(|_| EndpointError::Registration {
                reason: format!("invalid peer host '{}'", self.host),
            })?;

        self.registered.store(true, Ordering::Release);
        info!("🔌 {} registered (peer host {})", self.info, self.host);
        Ok(())
    }
}

impl PeerEndpoint for ConsolePeer {
    fn set_boolean(&self, channel: u16, value: bool) -> Result<(), EndpointError> {
        if !self.registered.load(Ordering::Acquire) {
            return Err(EndpointError::Offline {
                endpoint: self.info.name.clone(),
            });
        }
        if channel == 0 || channel > self.boolean_channels {
            return Err(EndpointError::ChannelUnavailable { channel });
        }

        self.booleans.write().insert(channel, value);
        let count = self.write_count.fetch_add(1, Ordering::Relaxed) + 1;

        debug!(
            "📤 [{}] {} bool[{}] = {} [write #{}]",
            timestamp(),
            self.info.name,
            channel,
            value,
            count
        );
        Ok(())
    }
}

/// In-process remote holding its own feedback state
pub struct ConsoleRemote {
    info: EndpointInfo,
    feedback: RwLock<FeedbackState>,
}

impl ConsoleRemote {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            info: EndpointInfo::new(EndpointKind::Remote, config.name.clone(), config.address),
            feedback: RwLock::new(FeedbackState::default()),
        }
    }
}

#[async_trait]
impl Endpoint for ConsoleRemote {
    fn info(&self) -> EndpointInfo {
        self.info.clone()
    }

    async fn register(&self) -> Result<(), EndpointError> {
        check_address(self.info.address)?;
        info!("🔌 {} registered on the RF gateway", self.info);
        Ok(())
    }
}

impl RemoteEndpoint for ConsoleRemote {
    fn set_feedback_flag(&self, flag: FeedbackFlag, value: bool) {
        let mut feedback = self.feedback.write();
        match flag {
            FeedbackFlag::Volume => feedback.show_volume = value,
            FeedbackFlag::Mute => feedback.show_mute = value,
        }
        debug!("📥 [{}] {} {} sub-display = {}", timestamp(), self.info.name, flag, value);
    }

    fn set_volume_level(&self, level: u8) {
        let level = level.min(MAX_LEVEL);
        self.feedback.write().volume_level = level;
        debug!("📥 [{}] {} volume level = {}", timestamp(), self.info.name, level);
    }

    fn set_room_label(&self, text: &str) {
        self.feedback.write().room_label = text.to_string();
        debug!("📥 [{}] {} room label = {:?}", timestamp(), self.info.name, text);
    }

    fn feedback(&self) -> FeedbackState {
        self.feedback.read().clone()
    }
}
