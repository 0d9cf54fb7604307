//! Resources held for one room connection

use crate::backend::{LocalTrack, LocalTrackPublication, Room};
use std::sync::Arc;
use tracing::debug;

/// A local track together with its publication handle
pub(crate) struct PublishedTrack {
    pub track: LocalTrack,
    pub publication: Arc<dyn LocalTrackPublication>,
}

/// Room handle plus the local media published into it
///
/// Created on the first connect attempt and dropped as a whole on
/// disconnect or failed connect, so no reader ever sees a half-released
/// session.
pub(crate) struct Session {
    pub room: Arc<dyn Room>,

    /// Set once `Room::connect` has succeeded; the monitor only polls joined rooms
    pub joined: bool,

    pub audio: Option<PublishedTrack>,
    pub video: Option<PublishedTrack>,
}

impl Session {
    pub fn new(room: Arc<dyn Room>) -> Self {
        Self {
            room,
            joined: false,
            audio: None,
            video: None,
        }
    }

    /// Microphone publication, if media setup got that far
    pub fn audio_publication(&self) -> Option<Arc<dyn LocalTrackPublication>> {
        self.audio.as_ref().map(|t| Arc::clone(&t.publication))
    }

    pub fn has_local_media(&self) -> bool {
        self.audio.is_some() || self.video.is_some()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let audio = self.audio.take().map(|t| t.track.name);
        let video = self.video.take().map(|t| t.track.name);
        debug!(?audio, ?video, joined = self.joined, "Releasing room session");
    }
}
