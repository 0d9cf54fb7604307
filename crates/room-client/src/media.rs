//! Local media controller
//!
//! Publishes the local microphone and camera after connecting and drives
//! push-to-talk. The microphone publication starts muted and is only
//! unmuted while the talk control is held.

use crate::backend::{LocalTrack, Room};
use crate::client::RoomClient;
use crate::session::{PublishedTrack, Session};
use crate::state::ConnectionStatus;
use crate::{Error, Result};
use tracing::{debug, error, info, warn};

async fn publish(room: &dyn Room, track: LocalTrack) -> Result<PublishedTrack> {
    let publication = room
        .local_participant()
        .publish_track(track.clone())
        .await?;
    info!(track = %track.name, sid = %publication.sid(), "Published local track");
    Ok(PublishedTrack { track, publication })
}

impl RoomClient {
    /// Publish local microphone and camera tracks
    ///
    /// Runs automatically after a successful connect. Does nothing unless
    /// connected, and does nothing if media was already published. A failure
    /// here leaves the connection up and only updates the status message.
    pub async fn setup_media(&self) {
        let mut state = self.shared.state.lock().await;

        if state.status != ConnectionStatus::Connected {
            debug!(status = %state.status, "Skipping media setup, not connected");
            return;
        }
        match state.session.as_ref() {
            Some(session) if !session.has_local_media() => {}
            Some(_) => {
                debug!("Local media already published");
                return;
            }
            None => return,
        }

        state.message = "Setting up media devices...".to_string();
        self.shared.publish(&state);

        let result = match state.session.as_mut() {
            Some(session) => self.publish_local_media(session).await,
            None => return,
        };

        match result {
            Ok(camera_active) => {
                state.camera_active = camera_active;
                state.message = "Connected & Ready".to_string();
                info!(camera_active, "Local media ready");
            }
            Err(e) => {
                error!(error = %e, "Media setup failed");
                state.message = format!("Media Error: {}", e.reason());
            }
        }
        self.shared.publish(&state);
    }

    /// Publish microphone then camera into `session`, returning whether the camera is live
    ///
    /// Each publication is stored as soon as it exists so push-to-talk keeps
    /// working when only the camera fails.
    async fn publish_local_media(&self, session: &mut Session) -> Result<bool> {
        let config = &self.shared.config;
        let backend = &self.shared.backend;
        let room = session.room.clone();

        let microphone = backend.create_microphone_track(&config.microphone_track_name)?;
        let audio = publish(room.as_ref(), microphone).await?;
        let publication = audio.publication.clone();
        session.audio = Some(audio);
        if config.start_muted {
            if let Err(e) = publication.mute().await {
                warn!(
                    track = %config.microphone_track_name,
                    error = %e,
                    "Microphone is live: initial mute failed"
                );
                return Err(Error::MediaTrackError(format!(
                    "microphone left unmuted: {}",
                    e.reason()
                )));
            }
        }

        if !config.publish_camera {
            return Ok(false);
        }

        let camera = backend.create_camera_track(&config.camera_track_name)?;
        session.video = Some(publish(room.as_ref(), camera).await?);
        Ok(true)
    }

    /// Push-to-talk pressed: unmute the microphone publication
    ///
    /// `is_talking` only becomes true once the unmute succeeded.
    pub async fn start_talking(&self) {
        let mut state = self.shared.state.lock().await;

        let Some(publication) = state.session.as_ref().and_then(Session::audio_publication) else {
            debug!("No microphone publication, ignoring talk request");
            return;
        };

        match publication.unmute().await {
            Ok(()) => {
                state.is_talking = true;
                self.shared.publish(&state);
            }
            Err(e) => error!(error = %e, "Failed to unmute microphone"),
        }
    }

    /// Push-to-talk released: mute the microphone publication
    ///
    /// `is_talking` is cleared even when muting fails, so the UI never stays
    /// stuck in the transmitting state.
    pub async fn stop_talking(&self) {
        let mut state = self.shared.state.lock().await;

        if let Some(publication) = state.session.as_ref().and_then(Session::audio_publication) {
            if let Err(e) = publication.mute().await {
                warn!(error = %e, "Failed to mute microphone");
            }
        }

        state.is_talking = false;
        self.shared.publish(&state);
    }
}
