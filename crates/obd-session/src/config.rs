//! Session Configuration

use serde::{Deserialize, Serialize};

use obd_fallback::FallbackConfig;

use crate::transport::DeviceFilter;

/// Configuration for an adapter session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between telemetry PID polls once the session is ready
    pub poll_interval_ms: u64,
    /// BLE service/characteristic filter handed to the transport opener
    pub device_filter: DeviceFilter,
    /// Schedule and envelopes for the synthetic fallback
    pub fallback: FallbackConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            device_filter: DeviceFilter::default(),
            fallback: FallbackConfig::default(),
        }
    }
}
