//! Recording endpoints for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;

use crate::endpoint::{
    Endpoint, EndpointError, EndpointInfo, EndpointKind, PeerEndpoint, RemoteEndpoint,
};
use crate::signal::{FeedbackFlag, FeedbackState, OutboundSignal};

/// Mutation applied to a [`RecordingRemote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Flag(FeedbackFlag, bool),
    Level(u8),
    Label(String),
}

/// Peer that records every successful write
pub struct RecordingPeer {
    pub writes: Mutex<Vec<OutboundSignal>>,
    unavailable: BTreeSet<u16>,
    panic_on: Option<u16>,
    registration_error: Option<String>,
}

impl RecordingPeer {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            unavailable: BTreeSet::new(),
            panic_on: None,
            registration_error: None,
        }
    }

    /// Writes to these channels fail with `ChannelUnavailable`
    pub fn with_unavailable(mut self, channels: impl IntoIterator<Item = u16>) -> Self {
        self.unavailable = channels.into_iter().collect();
        self
    }

    /// A write to this channel panics
    pub fn panicking_on(mut self, channel: u16) -> Self {
        self.panic_on = Some(channel);
        self
    }

    pub fn failing_registration(mut self, reason: &str) -> Self {
        self.registration_error = Some(reason.to_string());
        self
    }

    pub fn writes(&self) -> Vec<OutboundSignal> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl Endpoint for RecordingPeer {
    fn info(&self) -> EndpointInfo {
        EndpointInfo::new(EndpointKind::Peer, "EISC", 0x51)
    }

    async fn register(&self) -> Result<(), EndpointError> {
        match &self.registration_error {
            Some(reason) => Err(EndpointError::Registration {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PeerEndpoint for RecordingPeer {
    fn set_boolean(&self, channel: u16, value: bool) -> Result<(), EndpointError> {
        if self.panic_on == Some(channel) {
            panic!("peer link dropped while writing channel {}", channel);
        }
        if self.unavailable.contains(&channel) {
            return Err(EndpointError::ChannelUnavailable { channel });
        }
        self.writes.lock().push(OutboundSignal { channel, value });
        Ok(())
    }
}

/// Remote that records every feedback mutation
pub struct RecordingRemote {
    pub calls: Mutex<Vec<RemoteCall>>,
    state: Mutex<FeedbackState>,
    registration_error: Option<String>,
}

impl RecordingRemote {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(FeedbackState::default()),
            registration_error: None,
        }
    }

    pub fn failing_registration(mut self, reason: &str) -> Self {
        self.registration_error = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Endpoint for RecordingRemote {
    fn info(&self) -> EndpointInfo {
        EndpointInfo::new(EndpointKind::Remote, "MLX3", 0x30)
    }

    async fn register(&self) -> Result<(), EndpointError> {
        match &self.registration_error {
            Some(reason) => Err(EndpointError::Registration {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl RemoteEndpoint for RecordingRemote {
    fn set_feedback_flag(&self, flag: FeedbackFlag, value: bool) {
        let mut state = self.state.lock();
        match flag {
            FeedbackFlag::Volume => state.show_volume = value,
            FeedbackFlag::Mute => state.show_mute = value,
        }
        self.calls.lock().push(RemoteCall::Flag(flag, value));
    }

    fn set_volume_level(&self, level: u8) {
        self.state.lock().volume_level = level;
        self.calls.lock().push(RemoteCall::Level(level));
    }

    fn set_room_label(&self, text: &str) {
        self.state.lock().room_label = text.to_string();
        self.calls.lock().push(RemoteCall::Label(text.to_string()));
    }

    fn feedback(&self) -> FeedbackState {
        self.state.lock().clone()
    }
}
