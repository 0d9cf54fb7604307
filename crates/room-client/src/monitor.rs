//! Participant monitor
//!
//! A polling task started once per successful connection. Every cycle it
//! rebuilds the whole roster from the room's remote participants and
//! replaces the published list in one update. The task stops on its own
//! once the client leaves `connected` or monitoring is switched off, and
//! is aborted on disconnect so a quick reconnect never runs two loops.

use crate::backend::Room;
use crate::client::Shared;
use crate::state::{ConnectionStatus, ParticipantSnapshot};
use crate::Result;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Snapshot every remote participant of `room`, in the room's iteration order
pub fn collect_snapshots(room: &dyn Room) -> Result<Vec<ParticipantSnapshot>> {
    let participants = room.remote_participants()?;

    Ok(participants
        .iter()
        .map(|p| ParticipantSnapshot::from_participant(p.as_ref()))
        .collect())
}

/// Outcome of a single monitor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Continue,
    Stop,
}

/// Spawn the monitor loop for the client behind `shared`
///
/// The task only holds a weak reference, so dropping every client handle
/// also ends the loop.
pub(crate) fn spawn(shared: &Arc<Shared>) -> JoinHandle<()> {
    let weak = Arc::downgrade(shared);
    let interval = shared.config.monitor_interval();

    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Participant monitor started");
        run(weak, interval).await;
        info!("Participant monitor stopped");
    })
}

async fn run(shared: Weak<Shared>, interval: Duration) {
    loop {
        let Some(strong) = shared.upgrade() else {
            break;
        };

        if poll_once(&strong).await == Cycle::Stop {
            break;
        }
        drop(strong);

        tokio::time::sleep(interval).await;
    }
}

async fn poll_once(shared: &Shared) -> Cycle {
    let mut state = shared.state.lock().await;

    if state.status != ConnectionStatus::Connected || !state.monitoring {
        debug!(status = %state.status, monitoring = state.monitoring, "Monitor exit condition reached");
        return Cycle::Stop;
    }

    let Some(session) = state.session.as_ref() else {
        return Cycle::Stop;
    };
    debug_assert!(session.joined, "connected status without a joined room");

    match collect_snapshots(session.room.as_ref()) {
        Ok(participants) => {
            debug!(count = participants.len(), "Roster refreshed");
            state.participants = participants;
            shared.publish(&state);
        }
        Err(e) => {
            warn!(error = %e, "Error monitoring room, keeping previous roster");
        }
    }

    Cycle::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sim::{FaultPoint, SimBackend};
    use crate::backend::{RoomBackend, RoomOptions, TrackSource};

    #[tokio::test]
    async fn test_collect_snapshots_two_participants() {
        let backend = SimBackend::new();
        backend.add_participant("PA_1", "alice");
        backend.add_publication("PA_1", TrackSource::Microphone, true);
        backend.add_participant("PA_2", "bob");
        backend.add_publication("PA_2", TrackSource::Camera, true);

        let room = backend.new_room();
        room.connect("wss://sim", "tok", RoomOptions::default())
            .await
            .unwrap();

        let snapshots = collect_snapshots(room.as_ref()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(
            snapshots[0],
            ParticipantSnapshot {
                id: "PA_1".to_string(),
                display_name: "alice".to_string(),
                has_audio: true,
                audio_subscribed: true,
                has_video: false,
                video_subscribed: false,
            }
        );
        assert!(!snapshots[1].has_audio);
        assert!(snapshots[1].has_video && snapshots[1].video_subscribed);
    }

    #[tokio::test]
    async fn test_collect_snapshots_propagates_enumeration_error() {
        let backend = SimBackend::new();
        backend.inject_fault(FaultPoint::EnumerateParticipants, "engine gone");
        let room = backend.new_room();

        assert!(collect_snapshots(room.as_ref()).is_err());
    }
}
