//! UI-facing room state
//!
//! Everything in here is a plain value: the client publishes a fresh
//! [`RoomViewState`] after every mutation and the presentation layer only
//! ever reads it.

use crate::backend::{RemoteParticipant, TrackSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection status of the room session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }

    /// Indicator tone for this status
    pub fn tone(self) -> StatusTone {
        match self {
            ConnectionStatus::Disconnected => StatusTone::Neutral,
            ConnectionStatus::Connecting => StatusTone::Pending,
            ConnectionStatus::Connected => StatusTone::Success,
            ConnectionStatus::Error => StatusTone::Failure,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic tone of the status indicator, left to the presentation layer to style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Pending,
    Success,
    Failure,
}

/// Flattened view of one remote participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    /// Remote participant's session identifier
    pub id: String,
    pub display_name: String,
    pub has_audio: bool,
    pub audio_subscribed: bool,
    pub has_video: bool,
    pub video_subscribed: bool,
}

impl ParticipantSnapshot {
    /// Name shown for participants whose token carries no identity
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Build a snapshot from the library's participant object
    ///
    /// Publications are scanned once per source. Only the first microphone
    /// and the first camera publication count; a missing source reports
    /// `has_x = false, x_subscribed = false`.
    pub fn from_participant(participant: &dyn RemoteParticipant) -> Self {
        let publications = participant.track_publications();

        let (has_audio, audio_subscribed) = publications
            .iter()
            .find(|p| p.source() == TrackSource::Microphone)
            .map_or((false, false), |p| (true, p.is_subscribed()));

        let (has_video, video_subscribed) = publications
            .iter()
            .find(|p| p.source() == TrackSource::Camera)
            .map_or((false, false), |p| (true, p.is_subscribed()));

        let identity = participant.identity();
        let display_name = if identity.is_empty() {
            Self::UNKNOWN_NAME.to_string()
        } else {
            identity
        };

        Self {
            id: participant.sid(),
            display_name,
            has_audio,
            audio_subscribed,
            has_video,
            video_subscribed,
        }
    }
}

/// State exposed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomViewState {
    pub connection_status: ConnectionStatus,
    pub status_message: String,
    /// Server URL as currently entered (the token is never exposed)
    pub url: String,
    pub is_talking: bool,
    pub camera_active: bool,
    pub remote_participants: Vec<ParticipantSnapshot>,
}

impl Default for RoomViewState {
    fn default() -> Self {
        Self {
            connection_status: ConnectionStatus::Disconnected,
            status_message: "Ready to connect".to_string(),
            url: String::new(),
            is_talking: false,
            camera_active: false,
            remote_participants: Vec::new(),
        }
    }
}

impl RoomViewState {
    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.connection_status == ConnectionStatus::Connecting
    }

    pub fn status_tone(&self) -> StatusTone {
        self.connection_status.tone()
    }

    /// Look up a participant in the current roster
    pub fn participant(&self, id: &str) -> Option<&ParticipantSnapshot> {
        self.remote_participants.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RemoteTrackPublication;
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubPublication {
        source: TrackSource,
        subscribed: bool,
    }

    #[async_trait]
    impl RemoteTrackPublication for StubPublication {
        fn sid(&self) -> String {
            "TR_stub".to_string()
        }

        fn source(&self) -> TrackSource {
            self.source
        }

        fn is_subscribed(&self) -> bool {
            self.subscribed
        }

        async fn set_subscribed(&self, _subscribed: bool) -> Result<()> {
            Ok(())
        }
    }

    struct StubParticipant {
        identity: String,
        publications: Vec<(TrackSource, bool)>,
    }

    impl RemoteParticipant for StubParticipant {
        fn sid(&self) -> String {
            "PA_stub".to_string()
        }

        fn identity(&self) -> String {
            self.identity.clone()
        }

        fn track_publications(&self) -> Vec<Arc<dyn RemoteTrackPublication>> {
            self.publications
                .iter()
                .map(|&(source, subscribed)| {
                    Arc::new(StubPublication { source, subscribed }) as Arc<dyn RemoteTrackPublication>
                })
                .collect()
        }
    }

    #[test]
    fn test_snapshot_audio_only() {
        let participant = StubParticipant {
            identity: "alice".to_string(),
            publications: vec![(TrackSource::Microphone, true)],
        };

        let snapshot = ParticipantSnapshot::from_participant(&participant);
        assert_eq!(snapshot.id, "PA_stub");
        assert_eq!(snapshot.display_name, "alice");
        assert!(snapshot.has_audio);
        assert!(snapshot.audio_subscribed);
        assert!(!snapshot.has_video);
        assert!(!snapshot.video_subscribed);
    }

    #[test]
    fn test_snapshot_first_publication_per_source_wins() {
        let participant = StubParticipant {
            identity: String::new(),
            publications: vec![
                (TrackSource::ScreenShare, true),
                (TrackSource::Camera, false),
                (TrackSource::Camera, true),
            ],
        };

        let snapshot = ParticipantSnapshot::from_participant(&participant);
        assert_eq!(snapshot.display_name, ParticipantSnapshot::UNKNOWN_NAME);
        assert!(!snapshot.has_audio);
        assert!(snapshot.has_video);
        assert!(!snapshot.video_subscribed);
    }

    #[test]
    fn test_status_tone() {
        let mut state = RoomViewState::default();
        assert_eq!(state.status_tone(), StatusTone::Neutral);
        assert!(!state.is_connected());

        state.connection_status = ConnectionStatus::Connecting;
        assert!(state.is_connecting());
        assert_eq!(state.status_tone(), StatusTone::Pending);

        state.connection_status = ConnectionStatus::Error;
        assert_eq!(state.status_tone(), StatusTone::Failure);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ConnectionStatus::Connected).unwrap();
        assert_eq!(json, "\"connected\"");
        assert_eq!(ConnectionStatus::Error.to_string(), "error");
    }
}
