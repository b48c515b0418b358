//! Endpoint interfaces (remote and peer system)
//!
//! The core never talks to hardware directly. The transport layer provides an
//! implementation of [`RemoteEndpoint`] and [`PeerEndpoint`] and injects them
//! into the gateway. Writes are synchronous and must not block: an endpoint
//! backed by real I/O hands the write off to its own task.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::signal::{FeedbackFlag, FeedbackState};

pub mod console;

pub use console::{ConsolePeer, ConsoleRemote};

/// Lowest and highest IP ID an endpoint may register with
pub const MIN_ADDRESS: u8 = 0x03;
pub const MAX_ADDRESS: u8 = 0xFE;

/// Errors reported by endpoints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("channel {channel} unavailable")]
    ChannelUnavailable { channel: u16 },

    #[error("button {index} has no peer channel")]
    NoChannel { index: u32 },

    #[error("registration failed: {reason}")]
    Registration { reason: String },

    #[error("{endpoint} is offline")]
    Offline { endpoint: String },
}

/// Which side of the bridge an endpoint sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Remote,
    Peer,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Remote => write!(f, "remote"),
            EndpointKind::Peer => write!(f, "peer"),
        }
    }
}

/// Fixed identity of an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub kind: EndpointKind,
    /// Endpoint type name (e.g. "MLX3", "EISC")
    pub name: String,
    /// IP ID assigned at construction
    pub address: u8,
}

impl EndpointInfo {
    pub fn new(kind: EndpointKind, name: impl Into<String>, address: u8) -> Self {
        Self {
            kind,
            name: name.into(),
            address,
        }
    }
}

impl fmt::Display for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:#04x}", self.name, self.address)
    }
}

/// Outcome of registering an endpoint with its transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum Registration {
    Success,
    Failure(String),
}

impl Registration {
    pub fn is_success(&self) -> bool {
        matches!(self, Registration::Success)
    }
}

impl From<Result<(), EndpointError>> for Registration {
    fn from(result: Result<(), EndpointError>) -> Self {
        match result {
            Ok(()) => Registration::Success,
            Err(EndpointError::Registration { reason }) => Registration::Failure(reason),
            Err(e) => Registration::Failure(e.to_string()),
        }
    }
}

/// Online/offline status of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    #[default]
    Offline,
}

impl From<bool> for OnlineStatus {
    fn from(online: bool) -> Self {
        if online {
            OnlineStatus::Online
        } else {
            OnlineStatus::Offline
        }
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnlineStatus::Online => write!(f, "online"),
            OnlineStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Common endpoint surface
#[async_trait]
pub trait Endpoint: Send + Sync {
    fn info(&self) -> EndpointInfo;

    /// Register with the transport layer. Called once at startup.
    async fn register(&self) -> Result<(), EndpointError>;
}

/// Peer system reached over numbered boolean channels
pub trait PeerEndpoint: Endpoint {
    /// Fire-and-forget boolean write
    fn set_boolean(&self, channel: u16, value: bool) -> Result<(), EndpointError>;
}

/// Remote whose feedback state the bridge mutates
pub trait RemoteEndpoint: Endpoint {
    fn set_feedback_flag(&self, flag: FeedbackFlag, value: bool);

    /// Set the volume indicator (0-100)
    fn set_volume_level(&self, level: u8);

    fn set_room_label(&self, text: &str);

    /// Snapshot of the current feedback state
    fn feedback(&self) -> FeedbackState;
}

/// Check that an address lies in the registrable IP ID range
pub fn check_address(address: u8) -> Result<(), EndpointError> {
    if (MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
        Ok(())
    } else {
        Err(EndpointError::Registration {
            reason: format!(
                "IP ID {:#04x} outside {:#04x}-{:#04x}",
                address, MIN_ADDRESS, MAX_ADDRESS
            ),
        })
    }
}
