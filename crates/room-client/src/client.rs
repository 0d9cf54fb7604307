//! Room client: connection state machine
//!
//! `RoomClient` owns the single room session of a UI session and drives it
//! through `disconnected → connecting → {connected | error}`. All mutable
//! state sits behind one async mutex; every command takes it for its whole
//! run, so commands, media setup and monitor cycles apply as atomic units.
//! After each unit the resulting [`RoomViewState`] is published on a
//! `watch` channel, which is the only thing the presentation layer reads.

use crate::backend::{RoomBackend, RoomOptions};
use crate::config::ClientConfig;
use crate::monitor;
use crate::session::Session;
use crate::state::{ConnectionStatus, ParticipantSnapshot, RoomViewState};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Room name shown when the server does not report one
const UNKNOWN_ROOM: &str = "Unknown Room";

/// Mutable state of one UI session
pub(crate) struct ClientState {
    pub url: String,
    pub token: String,
    pub status: ConnectionStatus,
    pub message: String,
    pub is_talking: bool,
    pub camera_active: bool,
    /// Cooperative stop flag for the participant monitor
    pub monitoring: bool,
    pub participants: Vec<ParticipantSnapshot>,
    pub session: Option<Session>,
    pub monitor_task: Option<JoinHandle<()>>,
}

impl ClientState {
    fn new() -> Self {
        let view = RoomViewState::default();
        Self {
            url: view.url,
            token: String::new(),
            status: view.connection_status,
            message: view.status_message,
            is_talking: view.is_talking,
            camera_active: view.camera_active,
            monitoring: false,
            participants: view.remote_participants,
            session: None,
            monitor_task: None,
        }
    }

    fn view(&self) -> RoomViewState {
        RoomViewState {
            connection_status: self.status,
            status_message: self.message.clone(),
            url: self.url.clone(),
            is_talking: self.is_talking,
            camera_active: self.camera_active,
            remote_participants: self.participants.clone(),
        }
    }

    fn set_status(&mut self, status: ConnectionStatus, message: impl Into<String>) {
        if self.status != status {
            debug!("Connection status transition: {} -> {}", self.status, status);
        }
        self.status = status;
        self.message = message.into();
    }

    fn stop_monitor(&mut self) {
        self.monitoring = false;
        if let Some(task) = self.monitor_task.take() {
            task.abort();
        }
    }
}

/// State shared between client handles and background tasks
pub(crate) struct Shared {
    pub state: Mutex<ClientState>,
    pub backend: Arc<dyn RoomBackend>,
    pub config: ClientConfig,
    view_tx: watch::Sender<RoomViewState>,
}

impl Shared {
    /// Publish the view of `state`, waking receivers only when it changed
    pub fn publish(&self, state: &ClientState) {
        let view = state.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

/// Client for one real-time room session
///
/// Cloning yields another handle onto the same session.
#[derive(Clone)]
pub struct RoomClient {
    pub(crate) shared: Arc<Shared>,
}

impl RoomClient {
    /// Create a new client on top of a media library backend
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn new(backend: Arc<dyn RoomBackend>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(backend, config))
    }

    /// Create a client with the default configuration
    pub fn with_defaults(backend: Arc<dyn RoomBackend>) -> Self {
        Self::build(backend, ClientConfig::default())
    }

    fn build(backend: Arc<dyn RoomBackend>, config: ClientConfig) -> Self {
        let (view_tx, _) = watch::channel(RoomViewState::default());

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ClientState::new()),
                backend,
                config,
                view_tx,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Latest published view state
    pub fn state(&self) -> RoomViewState {
        self.shared.view_tx.borrow().clone()
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<RoomViewState> {
        self.shared.view_tx.subscribe()
    }

    pub async fn set_url(&self, url: impl Into<String>) {
        let mut state = self.shared.state.lock().await;
        state.url = url.into();
        self.shared.publish(&state);
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        let mut state = self.shared.state.lock().await;
        state.token = token.into();
    }

    /// Whether a room handle is currently held
    pub async fn has_session(&self) -> bool {
        self.shared.state.lock().await.session.is_some()
    }

    /// Whether the participant monitor is enabled and its task still running
    pub async fn is_monitoring(&self) -> bool {
        let state = self.shared.state.lock().await;
        state.monitoring
            && state
                .monitor_task
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    /// Connect to the room using the current url and token
    ///
    /// On success the participant monitor and local media setup are started
    /// as follow-on tasks; they run after this call has released the state.
    /// The outcome is also reflected in the published state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] without any network activity if
    /// url or token is empty, [`Error::Timeout`] if joining takes longer than
    /// `connect_timeout_ms`, or the media library's error if joining fails.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;

        if matches!(
            state.status,
            ConnectionStatus::Connected | ConnectionStatus::Connecting
        ) {
            warn!(status = %state.status, "Connect requested while already {}; ignoring", state.status);
            return Ok(());
        }

        if state.url.is_empty() || state.token.is_empty() {
            let err = Error::MissingCredentials;
            state.set_status(ConnectionStatus::Error, err.to_string());
            self.shared.publish(&state);
            return Err(err);
        }

        state.set_status(ConnectionStatus::Connecting, "Establishing connection...");
        self.shared.publish(&state);
        tokio::task::yield_now().await;

        let backend = &self.shared.backend;
        let room = Arc::clone(
            &state
                .session
                .get_or_insert_with(|| Session::new(backend.new_room()))
                .room,
        );

        let options = RoomOptions {
            auto_subscribe: self.shared.config.auto_subscribe,
        };
        let url = state.url.clone();
        let token = state.token.clone();

        info!(url = %url, auto_subscribe = options.auto_subscribe, "Connecting to room");

        let connect_timeout = self.shared.config.connect_timeout();
        let result = match tokio::time::timeout(
            connect_timeout,
            room.connect(&url, &token, options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "no response from {} after {}ms",
                url,
                connect_timeout.as_millis()
            ))),
        };

        match result {
            Ok(()) => {
                if let Some(session) = state.session.as_mut() {
                    session.joined = true;
                }

                let room_name = room
                    .name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ROOM.to_string());
                state.set_status(
                    ConnectionStatus::Connected,
                    format!("Connected to room: {}", room_name),
                );
                info!(room = %room_name, "Successfully connected to room");

                state.stop_monitor();
                state.monitoring = true;
                state.monitor_task = Some(monitor::spawn(&self.shared));
                self.shared.publish(&state);
                drop(state);

                let client = self.clone();
                tokio::spawn(async move {
                    client.setup_media().await;
                });

                Ok(())
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to connect to room");
                state.set_status(
                    ConnectionStatus::Error,
                    format!("Connection failed: {}", e.reason()),
                );

                if let Some(session) = state.session.take() {
                    if let Err(disconnect_err) = session.room.disconnect().await {
                        warn!(
                            error = %disconnect_err,
                            "Error disconnecting after failed connection"
                        );
                    }
                }

                self.shared.publish(&state);
                Err(e)
            }
        }
    }

    /// Leave the room and release every session resource
    ///
    /// Safe to call in any state; always ends in `disconnected`. Errors
    /// from the media library are logged and swallowed.
    pub async fn disconnect(&self) {
        let mut state = self.shared.state.lock().await;

        state.is_talking = false;
        state.camera_active = false;
        state.stop_monitor();
        state.participants.clear();
        self.shared.publish(&state);

        if let Some(session) = state.session.take() {
            info!("Disconnecting from room");
            if let Err(e) = session.room.disconnect().await {
                warn!(error = %e, "Error during disconnect");
            }
        }

        state.set_status(ConnectionStatus::Disconnected, "Disconnected");
        self.shared.publish(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sim::SimBackend;

    fn client(backend: &SimBackend) -> RoomClient {
        RoomClient::new(
            Arc::new(backend.clone()),
            ClientConfig::default().with_monitor_interval_ms(50),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let backend = SimBackend::new();
        let result = RoomClient::new(
            Arc::new(backend),
            ClientConfig::default().with_monitor_interval_ms(0),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_initial_state() {
        let backend = SimBackend::new();
        let client = client(&backend);

        let state = client.state();
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(state.status_message, "Ready to connect");
        assert!(!client.has_session().await);
        assert!(!client.is_monitoring().await);
    }

    #[tokio::test]
    async fn test_set_url_is_published_token_is_not() {
        let backend = SimBackend::new();
        let client = client(&backend);

        client.set_url("wss://example").await;
        client.set_token("secret").await;

        let state = client.state();
        assert_eq!(state.url, "wss://example");
        assert!(!format!("{:?}", state).contains("secret"));
    }

    #[tokio::test]
    async fn test_missing_token_never_calls_library() {
        let backend = SimBackend::new();
        let client = client(&backend);
        client.set_url("wss://x").await;

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));

        let state = client.state();
        assert_eq!(state.connection_status, ConnectionStatus::Error);
        assert_eq!(state.status_message, "URL and Token are required.");
        assert_eq!(backend.connect_calls(), 0);
        assert!(!client.has_session().await);
    }

    #[tokio::test]
    async fn test_connect_disables_auto_subscribe() {
        let backend = SimBackend::new().with_room_name("standup");
        let client = client(&backend);
        client.set_url("wss://x").await;
        client.set_token("tok").await;

        client.connect().await.unwrap();

        assert_eq!(
            backend.last_room_options(),
            Some(RoomOptions { auto_subscribe: false })
        );
        assert_eq!(client.state().connection_status, ConnectionStatus::Connected);
        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_idempotent() {
        let backend = SimBackend::new();
        let client = client(&backend);

        client.disconnect().await;
        client.disconnect().await;

        let state = client.state();
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(state.status_message, "Disconnected");
        assert_eq!(backend.disconnect_calls(), 0);
    }
}
