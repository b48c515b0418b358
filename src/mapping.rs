//! Channel mapping tables
//!
//! [`ChannelMap`] resolves a remote button index to the peer boolean channel it
//! drives. [`FeedbackTable`] resolves an inbound peer signal, keyed by
//! `(kind, channel)`, to the feedback it produces on the remote.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{ButtonMappingConfig, FeedbackConfig};
use crate::signal::{FeedbackFlag, SignalKind};

/// Button index → peer boolean channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    identity: bool,
    overrides: BTreeMap<u32, u16>,
    disabled: BTreeSet<u32>,
}

impl ChannelMap {
    /// Every button index N maps to channel N
    pub fn identity() -> Self {
        Self {
            identity: true,
            ..Default::default()
        }
    }

    /// Only the listed buttons are mapped
    pub fn from_table(table: impl IntoIterator<Item = (u32, u16)>) -> Self {
        Self {
            identity: false,
            overrides: table.into_iter().collect(),
            disabled: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &ButtonMappingConfig) -> Self {
        Self {
            identity: config.identity,
            overrides: config.overrides.clone(),
            disabled: config.disabled.iter().copied().collect(),
        }
    }

    /// Peer channel for a button, if any
    ///
    /// Disabled buttons never resolve. Explicit entries win over identity.
    /// Under identity, an index that does not fit a channel number is unmapped.
    pub fn resolve(&self, index: u32) -> Option<u16> {
        if self.disabled.contains(&index) {
            return None;
        }
        if let Some(channel) = self.overrides.get(&index) {
            return Some(*channel);
        }
        if self.identity {
            return u16::try_from(index).ok();
        }
        None
    }
}

/// Feedback produced on the remote by a peer signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackAction {
    /// Boolean value drives a sub-display flag
    Flag(FeedbackFlag),
    /// Unsigned value is scaled to 0-100 and drives the volume indicator
    VolumeLevel,
    /// String value becomes the room label
    RoomLabel,
}

impl FeedbackAction {
    /// Signal kind this action consumes
    pub fn kind(self) -> SignalKind {
        match self {
            FeedbackAction::Flag(_) => SignalKind::Boolean,
            FeedbackAction::VolumeLevel => SignalKind::Unsigned,
            FeedbackAction::RoomLabel => SignalKind::String,
        }
    }
}

/// `(kind, channel)` → feedback action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackTable {
    entries: HashMap<(SignalKind, u16), FeedbackAction>,
}

impl FeedbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        let mut table = Self::new();
        if let Some(channel) = config.volume_popup {
            table.insert(channel, FeedbackAction::Flag(FeedbackFlag::Volume));
        }
        if let Some(channel) = config.mute_popup {
            table.insert(channel, FeedbackAction::Flag(FeedbackFlag::Mute));
        }
        if let Some(channel) = config.volume_level {
            table.insert(channel, FeedbackAction::VolumeLevel);
        }
        if let Some(channel) = config.room_label {
            table.insert(channel, FeedbackAction::RoomLabel);
        }
        table
    }

    /// Add an entry; the key's kind is implied by the action
    pub fn insert(&mut self, channel: u16, action: FeedbackAction) -> &mut Self {
        self.entries.insert((action.kind(), channel), action);
        self
    }

    pub fn lookup(&self, kind: SignalKind, channel: u16) -> Option<FeedbackAction> {
        self.entries.get(&(kind, channel)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
