//! Partial Telemetry Updates
//!
//! A decoded response rarely carries every field, so updates are partial:
//! `None` means "unchanged", not zero. Callers fold samples into their own
//! last-known state with [`TelemetrySample::merge`].

use serde::{Deserialize, Serialize};

/// A partial telemetry update pushed to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Engine RPM
    pub rpm: Option<f64>,
    /// Vehicle speed (km/h)
    pub speed_kph: Option<f64>,
    /// Coolant temperature (°C, may be negative)
    pub coolant_temp_c: Option<f64>,
    /// Stored trouble codes. `Some` replaces the previous list wholesale,
    /// empty list included: a scan is an idempotent snapshot, not a delta.
    pub dtcs: Option<Vec<String>>,
    /// Connection status change
    pub is_connected: Option<bool>,
}

impl TelemetrySample {
    /// Fold a newer partial update into this one, field by field.
    /// Absent fields in `other` leave the existing value untouched.
    pub fn merge(&mut self, other: TelemetrySample) {
        if other.rpm.is_some() {
            self.rpm = other.rpm;
        }
        if other.speed_kph.is_some() {
            self.speed_kph = other.speed_kph;
        }
        if other.coolant_temp_c.is_some() {
            self.coolant_temp_c = other.coolant_temp_c;
        }
        if other.dtcs.is_some() {
            self.dtcs = other.dtcs;
        }
        if other.is_connected.is_some() {
            self.is_connected = other.is_connected;
        }
    }

    /// True when no field is set; such samples are never emitted.
    pub fn is_empty(&self) -> bool {
        self.rpm.is_none()
            && self.speed_kph.is_none()
            && self.coolant_temp_c.is_none()
            && self.dtcs.is_none()
            && self.is_connected.is_none()
    }
}
