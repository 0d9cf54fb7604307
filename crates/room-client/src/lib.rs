//! Push-to-talk room client
//!
//! Connects to a real-time audio/video room through an external media
//! library, keeps a flat roster of remote participants up to date, lets the
//! user subscribe to individual remote tracks and drives a push-to-talk
//! microphone. Media transport, signaling and track negotiation are all
//! delegated to the library behind the [`backend`] traits.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  Presentation layer (reads RoomViewState via watch)    │
//! │  ↓ commands                                            │
//! │  RoomClient (connection state machine)                 │
//! │  ├─ Session (room handle + local publications)         │
//! │  ├─ Participant monitor (500ms polling task)           │
//! │  ├─ Local media controller (publish, push-to-talk)     │
//! │  └─ Subscription toggler                               │
//! │     ↓                                                   │
//! │  RoomBackend / Room traits (external media library)    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use roomlink_client::{backend::sim::SimBackend, ClientConfig, RoomClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> roomlink_client::Result<()> {
//! let client = RoomClient::new(Arc::new(SimBackend::new()), ClientConfig::default())?;
//! client.set_url("wss://rooms.example.com").await;
//! client.set_token("<access token>").await;
//! client.connect().await?;
//!
//! client.start_talking().await;
//! client.stop_talking().await;
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod monitor;
pub mod state;

mod client;
mod media;
mod session;
mod subscription;

pub use backend::{RoomBackend, RoomOptions, TrackKind, TrackSource};
pub use client::RoomClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use state::{ConnectionStatus, ParticipantSnapshot, RoomViewState, StatusTone};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
