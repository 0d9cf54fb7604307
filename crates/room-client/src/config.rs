//! Configuration types for the room client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for RoomClient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Participant monitor polling interval in milliseconds (default: 500ms, range: 50-10000ms)
    pub monitor_interval_ms: u64,

    /// Upper bound for joining a room in milliseconds (default: 15000ms, range: 100-120000ms)
    pub connect_timeout_ms: u64,

    /// Let the media library subscribe to every remote track on join (default: false)
    ///
    /// Left off so remote media only flows after an explicit subscription.
    pub auto_subscribe: bool,

    /// Name given to the local microphone track (default: "mic_main")
    pub microphone_track_name: String,

    /// Name given to the local camera track (default: "camera_main")
    pub camera_track_name: String,

    /// Publish the local camera after connecting (default: true)
    pub publish_camera: bool,

    /// Mute the microphone publication right after publishing (default: true)
    pub start_muted: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ms: 500,
            connect_timeout_ms: 15_000,
            auto_subscribe: false,
            microphone_track_name: "mic_main".to_string(),
            camera_track_name: "camera_main".to_string(),
            publish_camera: true,
            start_muted: true,
        }
    }
}

impl ClientConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `monitor_interval_ms` is not in range 50-10000
    /// - `connect_timeout_ms` is not in range 100-120000
    /// - either track name is empty
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if self.monitor_interval_ms < 50 || self.monitor_interval_ms > 10_000 {
            return Err(Error::InvalidConfig(format!(
                "monitor_interval_ms must be in range 50-10000, got {}",
                self.monitor_interval_ms
            )));
        }

        if self.connect_timeout_ms < 100 || self.connect_timeout_ms > 120_000 {
            return Err(Error::InvalidConfig(format!(
                "connect_timeout_ms must be in range 100-120000, got {}",
                self.connect_timeout_ms
            )));
        }

        if self.microphone_track_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "microphone_track_name must not be empty".to_string(),
            ));
        }

        if self.camera_track_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "camera_track_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Polling interval as a Duration
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Parse and validate a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> crate::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, choosing the format from its extension
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Set the monitor polling interval
    ///
    /// Useful for chaining with `Default::default()`.
    pub fn with_monitor_interval_ms(mut self, interval_ms: u64) -> Self {
        self.monitor_interval_ms = interval_ms;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable automatic subscription to remote tracks
    pub fn with_auto_subscribe(mut self, auto_subscribe: bool) -> Self {
        self.auto_subscribe = auto_subscribe;
        self
    }

    /// Enable or disable publishing the local camera
    pub fn with_camera(mut self, publish_camera: bool) -> Self {
        self.publish_camera = publish_camera;
        self
    }
}
