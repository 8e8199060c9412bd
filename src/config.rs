//! Node configuration record
//!
//! Network credentials plus the tunables of the sync loop and the
//! WebSocket endpoint.  Loaded once at boot from NVS (see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)).  The record is a
//! positional postcard blob: one written by a different field layout does
//! not decode and loads as `ConfigError::Corrupted`, after which the node
//! boots on [`NodeConfig::default`].

use serde::{Deserialize, Serialize};

use crate::pins;

/// Maximum SSID length accepted by the WiFi driver.
pub const SSID_MAX_LEN: usize = 32;
/// Maximum WPA2 passphrase length.
pub const PASSWORD_MAX_LEN: usize = 64;

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Network ---
    /// Station-mode SSID
    pub wifi_ssid: heapless::String<SSID_MAX_LEN>,
    /// Station-mode passphrase (empty for open networks)
    pub wifi_password: heapless::String<PASSWORD_MAX_LEN>,

    // --- Web endpoint ---
    /// TCP port of the page + WebSocket server
    pub http_port: u16,
    /// Live WebSocket sessions kept before the oldest are closed
    pub max_sessions: u8,

    // --- Sensors ---
    /// Raw full-scale value of the analog inputs
    pub analog_max: u16,

    // --- Timing ---
    /// Snapshot poll-and-broadcast period (milliseconds)
    pub sync_interval_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),

            // Web endpoint
            http_port: 80,
            max_sessions: 8,

            // Sensors
            analog_max: pins::ADC_FULL_SCALE,

            // Timing
            sync_interval_ms: 100, // 10 Hz
        }
    }
}

impl NodeConfig {
    /// Whether station credentials have been provisioned.
    pub fn has_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}
