//! Signal types exchanged between the remote, the gateway and the peer system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary state of a remote button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    Pressed,
    Released,
}

impl ButtonState {
    pub fn is_pressed(self) -> bool {
        matches!(self, ButtonState::Pressed)
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonState::Pressed => write!(f, "Pressed"),
            ButtonState::Released => write!(f, "Released"),
        }
    }
}

/// A single press or release reported by the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    /// Stable numeric button index
    pub index: u32,
    /// Symbolic button name (e.g. "VolumeUp", "Mute")
    pub name: String,
    pub state: ButtonState,
}

impl ButtonEvent {
    pub fn new(index: u32, name: impl Into<String>, state: ButtonState) -> Self {
        Self {
            index,
            name: name.into(),
            state,
        }
    }

    pub fn pressed(index: u32, name: impl Into<String>) -> Self {
        Self::new(index, name, ButtonState::Pressed)
    }

    pub fn released(index: u32, name: impl Into<String>) -> Self {
        Self::new(index, name, ButtonState::Released)
    }
}

/// Boolean write towards the peer system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundSignal {
    pub channel: u16,
    pub value: bool,
}

/// Channel type of a peer signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Boolean,
    Unsigned,
    String,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Boolean => write!(f, "bool"),
            SignalKind::Unsigned => write!(f, "u16"),
            SignalKind::String => write!(f, "string"),
        }
    }
}

/// Typed payload of a peer signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SignalValue {
    Boolean(bool),
    Unsigned(u16),
    String(String),
}

impl SignalValue {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalValue::Boolean(_) => SignalKind::Boolean,
            SignalValue::Unsigned(_) => SignalKind::Unsigned,
            SignalValue::String(_) => SignalKind::String,
        }
    }
}

/// Signal received from the peer system on a numbered channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSignal {
    pub channel: u16,
    #[serde(flatten)]
    pub value: SignalValue,
}

impl InboundSignal {
    pub fn boolean(channel: u16, value: bool) -> Self {
        Self {
            channel,
            value: SignalValue::Boolean(value),
        }
    }

    pub fn unsigned(channel: u16, value: u16) -> Self {
        Self {
            channel,
            value: SignalValue::Unsigned(value),
        }
    }

    pub fn string(channel: u16, value: impl Into<String>) -> Self {
        Self {
            channel,
            value: SignalValue::String(value.into()),
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.value.kind()
    }
}

impl fmt::Display for InboundSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            SignalValue::Boolean(v) => write!(f, "bool[{}]={}", self.channel, v),
            SignalValue::Unsigned(v) => write!(f, "u16[{}]={}", self.channel, v),
            SignalValue::String(v) => write!(f, "string[{}]={:?}", self.channel, v),
        }
    }
}

/// Sub-display flags on the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackFlag {
    Volume,
    Mute,
}

impl fmt::Display for FeedbackFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackFlag::Volume => write!(f, "volume"),
            FeedbackFlag::Mute => write!(f, "mute"),
        }
    }
}

/// Feedback state owned by the remote endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackState {
    pub show_volume: bool,
    pub show_mute: bool,
    /// Volume indicator, 0-100
    pub volume_level: u8,
    pub room_label: String,
}

impl FeedbackState {
    pub fn flag(&self, flag: FeedbackFlag) -> bool {
        match flag {
            FeedbackFlag::Volume => self.show_volume,
            FeedbackFlag::Mute => self.show_mute,
        }
    }
}

/// Value conversion between the peer and remote ranges
pub mod convert {
    /// Divisor mapping the peer's 16-bit analog range onto 0-100
    pub const LEVEL_DIVISOR: f64 = 655.35;

    /// Highest level the remote's volume indicator accepts
    pub const MAX_LEVEL: u8 = 100;

    /// Scale a 16-bit peer value (0-65535) to a remote level (0-100)
    ///
    /// Rounds half up: `round(value / 655.35)`. 32768 maps to 50, 65535 to 100.
    pub fn scale_level(value: u16) -> u8 {
        let level = (f64::from(value) / LEVEL_DIVISOR).round();
        level.min(f64::from(MAX_LEVEL)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::convert::scale_level;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scale_level_endpoints() {
        assert_eq!(scale_level(0), 0);
        assert_eq!(scale_level(65535), 100);
    }

    #[test]
    fn test_scale_level_midpoint_rounds_half_up() {
        assert_eq!(scale_level(32768), 50);
        assert_eq!(scale_level(32767), 50);
        // 327 / 655.35 = 0.499 -> 0, 328 / 655.35 = 0.5005 -> 1
        assert_eq!(scale_level(327), 0);
        assert_eq!(scale_level(328), 1);
    }

    #[test]
    fn test_inbound_signal_kind() {
        assert_eq!(InboundSignal::boolean(7, true).kind(), SignalKind::Boolean);
        assert_eq!(InboundSignal::unsigned(1, 10).kind(), SignalKind::Unsigned);
        assert_eq!(InboundSignal::string(3, "Den").kind(), SignalKind::String);
    }

    #[test]
    fn test_inbound_signal_json_shape() {
        let signal = InboundSignal::unsigned(1, 32768);
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"channel": 1, "type": "unsigned", "value": 32768})
        );
    }

    #[test]
    fn test_feedback_state_flag() {
        let state = FeedbackState {
            show_volume: true,
            ..Default::default()
        };
        assert!(state.flag(FeedbackFlag::Volume));
        assert!(!state.flag(FeedbackFlag::Mute));
    }

    proptest! {
        #[test]
        fn prop_scale_level_in_range(value in any::<u16>()) {
            prop_assert!(scale_level(value) <= 100);
        }

        #[test]
        fn prop_scale_level_monotonic(a in any::<u16>(), b in any::<u16>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale_level(lo) <= scale_level(hi));
        }

        #[test]
        fn prop_scale_level_within_half_step(value in any::<u16>()) {
            let exact = f64::from(value) / 655.35;
            prop_assert!((f64::from(scale_level(value)) - exact).abs() <= 0.5 + 1e-9);
        }
    }
}
