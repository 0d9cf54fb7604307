//! Subscription toggling for remote tracks

use crate::backend::{RemoteParticipant, RemoteTrackPublication, TrackKind};
use crate::client::RoomClient;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// First publication of `participant` matching the roster source for `kind`
pub(crate) fn find_publication(
    participant: &dyn RemoteParticipant,
    kind: TrackKind,
) -> Option<Arc<dyn RemoteTrackPublication>> {
    let source = kind.source();
    participant
        .track_publications()
        .into_iter()
        .find(|p| p.source() == source)
}

impl RoomClient {
    /// Flip the subscription of a remote participant's audio or video track
    ///
    /// The participant may have left between render and click; that and
    /// every library failure is logged and otherwise ignored. The roster
    /// is not touched here: the next monitor cycle reports the new flag.
    pub async fn toggle_subscription(&self, participant_id: &str, kind: TrackKind) {
        match self.try_toggle_subscription(participant_id, kind).await {
            Ok(()) => {}
            Err(e @ (Error::NotConnected | Error::ParticipantNotFound(_))) => {
                warn!(participant = %participant_id, %kind, error = %e, "Ignoring subscription toggle");
            }
            Err(e) => error!(
                participant = %participant_id,
                %kind,
                error = %e,
                "Failed to toggle subscription"
            ),
        }
    }

    async fn try_toggle_subscription(&self, participant_id: &str, kind: TrackKind) -> Result<()> {
        let state = self.shared.state.lock().await;

        let session = state.session.as_ref().ok_or(Error::NotConnected)?;
        let participant = session
            .room
            .remote_participant(participant_id)
            .ok_or_else(|| Error::ParticipantNotFound(participant_id.to_string()))?;

        let Some(publication) = find_publication(participant.as_ref(), kind) else {
            debug!(participant = %participant_id, %kind, "Participant has no matching track");
            return Ok(());
        };

        let subscribed = !publication.is_subscribed();
        publication.set_subscribed(subscribed).await?;
        info!(
            identity = %participant.identity(),
            %kind,
            subscribed,
            "Set subscription"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sim::SimBackend;
    use crate::backend::TrackSource;
    use crate::ClientConfig;

    #[tokio::test]
    async fn test_toggle_reports_missing_session_and_participant() {
        let backend = SimBackend::new();
        backend.add_participant("PA_1", "alice");
        backend.add_publication("PA_1", TrackSource::Microphone, false);
        let client = RoomClient::new(Arc::new(backend.clone()), ClientConfig::default()).unwrap();

        let err = client
            .try_toggle_subscription("PA_1", TrackKind::Audio)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        client.set_url("wss://x").await;
        client.set_token("tok").await;
        client.connect().await.unwrap();

        let err = client
            .try_toggle_subscription("PA_gone", TrackKind::Audio)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParticipantNotFound(ref id) if id == "PA_gone"));

        client
            .try_toggle_subscription("PA_1", TrackKind::Audio)
            .await
            .unwrap();
        assert_eq!(
            backend.remote_subscribed("PA_1", TrackSource::Microphone),
            Some(true)
        );

        client.disconnect().await;
    }
}
