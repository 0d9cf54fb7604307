//! In-process simulated room backend
//!
//! Keeps a single shared "server side" room in memory. Every handle returned
//! by [`SimBackend::new_room`] joins that room, so tests and the console
//! driver can add or remove remote participants while a client is connected.
//! Each failure class of the client can be triggered with
//! [`SimBackend::inject_fault`].

use super::{
    LocalParticipant, LocalTrack, LocalTrackPublication, RemoteParticipant,
    RemoteTrackPublication, Room, RoomBackend, RoomOptions, TrackSource,
};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Library call that can be made to fail
///
/// Track creation and publishing fail per capture source, so a camera
/// failure can be simulated without touching the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Connect,
    Disconnect,
    EnumerateParticipants,
    CreateTrack(TrackSource),
    PublishTrack(TrackSource),
    Mute,
    Unmute,
    SetSubscribed,
}

/// Remote participant description used to seed a simulated room
///
/// `audio` / `video` hold the initial subscribed flag of a microphone or
/// camera publication; `None` means the participant has no such track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimParticipantSpec {
    pub sid: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub audio: Option<bool>,
    #[serde(default)]
    pub video: Option<bool>,
}

#[derive(Default)]
struct SimState {
    room_name: Option<String>,
    participants: Vec<Arc<SimParticipant>>,
    local_publications: Vec<Arc<SimLocalPublication>>,
    last_options: Option<RoomOptions>,
    last_url: Option<String>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SimState>,
    faults: Mutex<HashMap<FaultPoint, String>>,
    connect_delay: Mutex<Option<Duration>>,
    publish_delay: Mutex<Option<Duration>>,
    connect_calls: AtomicU32,
    disconnect_calls: AtomicU32,
}

impl Shared {
    /// Fail with the error class a real adapter would report at `point`
    fn check(&self, point: FaultPoint) -> Result<()> {
        let Some(message) = self.faults.lock().get(&point).cloned() else {
            return Ok(());
        };

        Err(match point {
            FaultPoint::Connect => Error::ConnectionFailed(message),
            FaultPoint::CreateTrack(_) | FaultPoint::PublishTrack(_) => Error::MediaError(message),
            FaultPoint::Mute | FaultPoint::Unmute | FaultPoint::SetSubscribed => {
                Error::MediaTrackError(message)
            }
            FaultPoint::Disconnect | FaultPoint::EnumerateParticipants => Error::Backend(message),
        })
    }
}

fn new_sid(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Simulated media library
#[derive(Clone, Default)]
pub struct SimBackend {
    shared: Arc<Shared>,
}

impl SimBackend {
    /// Create an empty simulated room without a name
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the room name reported after connecting
    pub fn with_room_name(self, name: impl Into<String>) -> Self {
        self.shared.state.lock().room_name = Some(name.into());
        self
    }

    /// Create a simulated room pre-populated with remote participants
    pub fn from_roster(specs: &[SimParticipantSpec]) -> Self {
        let backend = Self::new();
        for spec in specs {
            backend.add_participant(&spec.sid, &spec.identity);
            if let Some(subscribed) = spec.audio {
                backend.add_publication(&spec.sid, TrackSource::Microphone, subscribed);
            }
            if let Some(subscribed) = spec.video {
                backend.add_publication(&spec.sid, TrackSource::Camera, subscribed);
            }
        }
        backend
    }

    /// Add a remote participant at the end of the iteration order
    pub fn add_participant(&self, sid: &str, identity: &str) {
        let participant = Arc::new(SimParticipant {
            sid: sid.to_string(),
            identity: identity.to_string(),
            publications: Mutex::new(Vec::new()),
        });
        self.shared.state.lock().participants.push(participant);
    }

    /// Remove a remote participant, returning whether it was present
    pub fn remove_participant(&self, sid: &str) -> bool {
        let mut state = self.shared.state.lock();
        let before = state.participants.len();
        state.participants.retain(|p| p.sid != sid);
        state.participants.len() != before
    }

    /// Advertise a track on a remote participant, returning the publication sid
    pub fn add_publication(
        &self,
        participant_sid: &str,
        source: TrackSource,
        subscribed: bool,
    ) -> Option<String> {
        let participant = self.find_participant(participant_sid)?;
        let sid = new_sid("TR");
        participant
            .publications
            .lock()
            .push(Arc::new(SimRemotePublication {
                sid: sid.clone(),
                source,
                subscribed: AtomicBool::new(subscribed),
                shared: Arc::clone(&self.shared),
            }));
        Some(sid)
    }

    /// Current subscribed flag of a participant's first publication from `source`
    pub fn remote_subscribed(&self, participant_sid: &str, source: TrackSource) -> Option<bool> {
        let participant = self.find_participant(participant_sid)?;
        let publications = participant.publications.lock();
        publications
            .iter()
            .find(|p| p.source == source)
            .map(|p| p.subscribed.load(Ordering::SeqCst))
    }

    /// Make every later call at `point` fail with `message`
    pub fn inject_fault(&self, point: FaultPoint, message: impl Into<String>) {
        self.shared.faults.lock().insert(point, message.into());
    }

    pub fn clear_fault(&self, point: FaultPoint) {
        self.shared.faults.lock().remove(&point);
    }

    /// Delay every connect call, e.g. to observe the `connecting` state
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.shared.connect_delay.lock() = Some(delay);
    }

    /// Delay every track publish, e.g. to act while media setup is in flight
    pub fn set_publish_delay(&self, delay: Duration) {
        *self.shared.publish_delay.lock() = Some(delay);
    }

    pub fn connect_calls(&self) -> u32 {
        self.shared.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.shared.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent connect call
    pub fn last_room_options(&self) -> Option<RoomOptions> {
        self.shared.state.lock().last_options
    }

    /// URL passed to the most recent connect call
    pub fn last_url(&self) -> Option<String> {
        self.shared.state.lock().last_url.clone()
    }

    /// Local tracks published so far, oldest first
    pub fn local_publications(&self) -> Vec<Arc<SimLocalPublication>> {
        self.shared.state.lock().local_publications.clone()
    }

    fn find_participant(&self, sid: &str) -> Option<Arc<SimParticipant>> {
        self.shared
            .state
            .lock()
            .participants
            .iter()
            .find(|p| p.sid == sid)
            .cloned()
    }
}

impl RoomBackend for SimBackend {
    fn new_room(&self) -> Arc<dyn Room> {
        Arc::new(SimRoom {
            shared: Arc::clone(&self.shared),
            connected: AtomicBool::new(false),
        })
    }

    fn create_microphone_track(&self, name: &str) -> Result<LocalTrack> {
        self.shared.check(FaultPoint::CreateTrack(TrackSource::Microphone))?;
        Ok(LocalTrack {
            sid: new_sid("TR"),
            name: name.to_string(),
            source: TrackSource::Microphone,
        })
    }

    fn create_camera_track(&self, name: &str) -> Result<LocalTrack> {
        self.shared.check(FaultPoint::CreateTrack(TrackSource::Camera))?;
        Ok(LocalTrack {
            sid: new_sid("TR"),
            name: name.to_string(),
            source: TrackSource::Camera,
        })
    }
}

/// Handle onto the simulated room
pub struct SimRoom {
    shared: Arc<Shared>,
    connected: AtomicBool,
}

#[async_trait]
impl Room for SimRoom {
    async fn connect(&self, url: &str, _token: &str, options: RoomOptions) -> Result<()> {
        self.shared.connect_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.shared.state.lock();
            state.last_options = Some(options);
            state.last_url = Some(url.to_string());
        }

        let delay = *self.shared.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.shared.check(FaultPoint::Connect)?;
        self.connected.store(true, Ordering::SeqCst);
        debug!(url = %url, "Simulated room joined");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shared.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        self.shared.check(FaultPoint::Disconnect)
    }

    fn name(&self) -> Option<String> {
        self.shared.state.lock().room_name.clone()
    }

    fn remote_participants(&self) -> Result<Vec<Arc<dyn RemoteParticipant>>> {
        self.shared.check(FaultPoint::EnumerateParticipants)?;
        if !self.connected.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }

        let state = self.shared.state.lock();
        let participants = state
            .participants
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn RemoteParticipant>)
            .collect();
        Ok(participants)
    }

    fn remote_participant(&self, sid: &str) -> Option<Arc<dyn RemoteParticipant>> {
        if !self.connected.load(Ordering::SeqCst) {
            return None;
        }

        let state = self.shared.state.lock();
        state
            .participants
            .iter()
            .find(|p| p.sid == sid)
            .map(|p| Arc::clone(p) as Arc<dyn RemoteParticipant>)
    }

    fn local_participant(&self) -> Arc<dyn LocalParticipant> {
        Arc::new(SimLocalParticipant {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Remote participant in the simulated room
pub struct SimParticipant {
    sid: String,
    identity: String,
    publications: Mutex<Vec<Arc<SimRemotePublication>>>,
}

impl RemoteParticipant for SimParticipant {
    fn sid(&self) -> String {
        self.sid.clone()
    }

    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn track_publications(&self) -> Vec<Arc<dyn RemoteTrackPublication>> {
        self.publications
            .lock()
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn RemoteTrackPublication>)
            .collect()
    }
}

/// Remote publication in the simulated room
pub struct SimRemotePublication {
    sid: String,
    source: TrackSource,
    subscribed: AtomicBool,
    shared: Arc<Shared>,
}

#[async_trait]
impl RemoteTrackPublication for SimRemotePublication {
    fn sid(&self) -> String {
        self.sid.clone()
    }

    fn source(&self) -> TrackSource {
        self.source
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    async fn set_subscribed(&self, subscribed: bool) -> Result<()> {
        self.shared.check(FaultPoint::SetSubscribed)?;
        self.subscribed.store(subscribed, Ordering::SeqCst);
        Ok(())
    }
}

struct SimLocalParticipant {
    shared: Arc<Shared>,
}

#[async_trait]
impl LocalParticipant for SimLocalParticipant {
    async fn publish_track(&self, track: LocalTrack) -> Result<Arc<dyn LocalTrackPublication>> {
        let delay = *self.shared.publish_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.shared.check(FaultPoint::PublishTrack(track.source))?;

        let publication = Arc::new(SimLocalPublication {
            sid: new_sid("PUB"),
            track,
            muted: AtomicBool::new(false),
            shared: Arc::clone(&self.shared),
        });
        self.shared
            .state
            .lock()
            .local_publications
            .push(Arc::clone(&publication));

        Ok(publication)
    }
}

/// Local publication in the simulated room
pub struct SimLocalPublication {
    sid: String,
    track: LocalTrack,
    muted: AtomicBool,
    shared: Arc<Shared>,
}

impl SimLocalPublication {
    /// The published track
    pub fn track(&self) -> &LocalTrack {
        &self.track
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalTrackPublication for SimLocalPublication {
    fn sid(&self) -> String {
        self.sid.clone()
    }

    fn source(&self) -> TrackSource {
        self.track.source
    }

    fn is_muted(&self) -> bool {
        self.muted()
    }

    async fn mute(&self) -> Result<()> {
        self.shared.check(FaultPoint::Mute)?;
        self.muted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unmute(&self) -> Result<()> {
        self.shared.check(FaultPoint::Unmute)?;
        self.muted.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_records_options() {
        let backend = SimBackend::new().with_room_name("lobby");
        let room = backend.new_room();

        room.connect("wss://sim", "tok", RoomOptions { auto_subscribe: false })
            .await
            .unwrap();

        assert_eq!(backend.connect_calls(), 1);
        assert_eq!(
            backend.last_room_options(),
            Some(RoomOptions { auto_subscribe: false })
        );
        assert_eq!(room.name().as_deref(), Some("lobby"));
    }

    #[tokio::test]
    async fn test_injected_connect_fault() {
        let backend = SimBackend::new();
        backend.inject_fault(FaultPoint::Connect, "Timeout");
        let room = backend.new_room();

        let err = room
            .connect("wss://sim", "tok", RoomOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
        assert_eq!(err.reason(), "Timeout");

        backend.clear_fault(FaultPoint::Connect);
        assert!(room.connect("wss://sim", "tok", RoomOptions::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_participants_keep_insertion_order() {
        let backend = SimBackend::from_roster(&[
            SimParticipantSpec {
                sid: "PA_b".to_string(),
                identity: "bob".to_string(),
                audio: Some(true),
                video: None,
            },
            SimParticipantSpec {
                sid: "PA_a".to_string(),
                identity: "alice".to_string(),
                audio: None,
                video: Some(false),
            },
        ]);
        let room = backend.new_room();
        room.connect("wss://sim", "tok", RoomOptions::default())
            .await
            .unwrap();

        let sids: Vec<String> = room
            .remote_participants()
            .unwrap()
            .iter()
            .map(|p| p.sid())
            .collect();
        assert_eq!(sids, vec!["PA_b", "PA_a"]);
        assert_eq!(
            backend.remote_subscribed("PA_b", TrackSource::Microphone),
            Some(true)
        );
        assert_eq!(backend.remote_subscribed("PA_a", TrackSource::Microphone), None);
    }

    #[tokio::test]
    async fn test_local_publication_mute() {
        let backend = SimBackend::new();
        let room = backend.new_room();
        let track = backend.create_microphone_track("mic_main").unwrap();

        let publication = room.local_participant().publish_track(track).await.unwrap();
        assert!(!publication.is_muted());

        publication.mute().await.unwrap();
        assert!(backend.local_publications()[0].muted());

        backend.inject_fault(FaultPoint::Unmute, "device busy");
        assert!(publication.unmute().await.is_err());
        assert!(publication.is_muted());
    }

    #[tokio::test]
    async fn test_publish_fault_is_per_source() {
        let backend = SimBackend::new();
        backend.inject_fault(FaultPoint::PublishTrack(TrackSource::Camera), "camera busy");
        let room = backend.new_room();
        let local = room.local_participant();

        let microphone = backend.create_microphone_track("mic_main").unwrap();
        assert!(local.publish_track(microphone).await.is_ok());

        let camera = backend.create_camera_track("camera_main").unwrap();
        let result = local.publish_track(camera).await;
        assert!(matches!(result, Err(Error::MediaError(_))));
        assert_eq!(backend.local_publications().len(), 1);
    }

    #[test]
    fn test_remove_participant() {
        let backend = SimBackend::new();
        backend.add_participant("PA_1", "carol");
        assert!(backend.remove_participant("PA_1"));
        assert!(!backend.remove_participant("PA_1"));
        assert!(backend.add_publication("PA_1", TrackSource::Camera, true).is_none());
    }
}
