//! MLX3 Bridge
//!
//! Forwards button events from an MLX3 wireless remote to a peer control
//! system as numbered boolean signals, and mirrors selected peer signals back
//! onto the remote as feedback (sub-display flags, volume level, room label).

pub mod adapter;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod gateway;
pub mod lifecycle;
pub mod log;
pub mod mapping;
pub mod signal;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::RemoteAdapter;
pub use bridge::PeerBridge;
pub use config::AppConfig;
pub use gateway::{Gateway, GatewayEvent};
pub use lifecycle::EndpointLifecycle;
