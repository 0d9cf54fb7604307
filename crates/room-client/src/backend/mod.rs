//! Seam to the external real-time media library
//!
//! The room client never talks to the network itself. Signaling, track
//! negotiation and media transport all live behind these traits, which an
//! adapter implements on top of a concrete SDK. [`sim`] provides an
//! in-process implementation used by tests and the console driver.

pub mod sim;

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Where a track's media originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    Unknown,
    Camera,
    Microphone,
    ScreenShare,
    ScreenShareAudio,
}

/// Kind of track a user can toggle from the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    /// Publication source the roster uses for this kind
    ///
    /// Screen share tracks are not part of the roster, so audio maps to the
    /// microphone and video to the camera.
    pub fn source(self) -> TrackSource {
        match self {
            TrackKind::Audio => TrackSource::Microphone,
            TrackKind::Video => TrackSource::Camera,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(TrackKind::Audio),
            "video" => Ok(TrackKind::Video),
            other => Err(Error::InvalidData(format!(
                "unknown track kind '{}', expected 'audio' or 'video'",
                other
            ))),
        }
    }
}

/// Options passed to [`Room::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomOptions {
    /// Subscribe to every remote publication as soon as it appears
    pub auto_subscribe: bool,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            auto_subscribe: true,
        }
    }
}

/// A local capture track created by the media library's device factories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    /// Library-assigned track identifier
    pub sid: String,

    /// Human-readable track name
    pub name: String,

    /// Capture device kind
    pub source: TrackSource,
}

/// Entry point into the media library: room handles and device tracks
pub trait RoomBackend: Send + Sync {
    /// Allocate a new, not yet connected room handle
    fn new_room(&self) -> Arc<dyn Room>;

    /// Create a track capturing the default microphone
    fn create_microphone_track(&self, name: &str) -> Result<LocalTrack>;

    /// Create a track capturing the default camera
    fn create_camera_track(&self, name: &str) -> Result<LocalTrack>;
}

/// One session with a remote room
#[async_trait]
pub trait Room: Send + Sync {
    /// Join the room at `url` using `token`
    async fn connect(&self, url: &str, token: &str, options: RoomOptions) -> Result<()>;

    /// Leave the room
    async fn disconnect(&self) -> Result<()>;

    /// Room name as reported by the server, if any
    fn name(&self) -> Option<String>;

    /// Remote participants in the library's iteration order
    fn remote_participants(&self) -> Result<Vec<Arc<dyn RemoteParticipant>>>;

    /// Look up a remote participant by session identifier
    fn remote_participant(&self, sid: &str) -> Option<Arc<dyn RemoteParticipant>>;

    /// The local participant, used for publishing tracks
    fn local_participant(&self) -> Arc<dyn LocalParticipant>;
}

/// A remote participant in the room
pub trait RemoteParticipant: Send + Sync {
    /// Stable session identifier
    fn sid(&self) -> String;

    /// Identity from the participant's access token (may be empty)
    fn identity(&self) -> String;

    /// All track publications advertised by this participant
    fn track_publications(&self) -> Vec<Arc<dyn RemoteTrackPublication>>;
}

/// A track advertised by a remote participant
#[async_trait]
pub trait RemoteTrackPublication: Send + Sync {
    fn sid(&self) -> String;

    fn source(&self) -> TrackSource;

    /// Whether media for this publication currently flows to us
    fn is_subscribed(&self) -> bool;

    /// Request a subscription change
    async fn set_subscribed(&self, subscribed: bool) -> Result<()>;
}

/// The participant representing this client
#[async_trait]
pub trait LocalParticipant: Send + Sync {
    /// Publish a local track to the room
    async fn publish_track(&self, track: LocalTrack) -> Result<Arc<dyn LocalTrackPublication>>;
}

/// A published local track
#[async_trait]
pub trait LocalTrackPublication: Send + Sync {
    fn sid(&self) -> String;

    fn source(&self) -> TrackSource;

    fn is_muted(&self) -> bool;

    async fn mute(&self) -> Result<()>;

    async fn unmute(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_kind_source_mapping() {
        assert_eq!(TrackKind::Audio.source(), TrackSource::Microphone);
        assert_eq!(TrackKind::Video.source(), TrackSource::Camera);
    }

    #[test]
    fn test_track_kind_parse() {
        assert_eq!("audio".parse::<TrackKind>().unwrap(), TrackKind::Audio);
        assert_eq!(" Video ".parse::<TrackKind>().unwrap(), TrackKind::Video);
        assert!("screen".parse::<TrackKind>().is_err());
    }

    #[test]
    fn test_room_options_default() {
        // The library default pulls everything; the client overrides it.
        assert!(RoomOptions::default().auto_subscribe);
    }
}
