//! Synthetic Telemetry Generation

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Instant};
use tracing::{debug, info};

use obd_codec::TelemetrySample;

/// Timing and value envelopes for synthetic telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Delay before the synthetic "connected" status is emitted
    pub connect_delay_ms: u64,
    /// Interval between synthetic telemetry updates
    pub update_interval_ms: u64,
    /// Delay before the one-shot synthetic DTC list is emitted
    pub dtc_delay_ms: u64,
    /// RPM envelope (min, max)
    pub rpm_range: (f64, f64),
    /// Speed envelope in km/h (min, max)
    pub speed_range: (f64, f64),
    /// Coolant temperature envelope in °C (min, max)
    pub coolant_range: (f64, f64),
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: 500,
            update_interval_ms: 1000,
            dtc_delay_ms: 3000,
            rpm_range: (1000.0, 4000.0),
            speed_range: (30.0, 80.0),
            coolant_range: (85.0, 95.0),
        }
    }
}

/// Demo trouble codes reported once per fallback run
const DEMO_DTCS: [&str; 2] = ["P0301", "P0420"];

/// Emits randomized telemetry on a fixed cadence until its future is
/// dropped. The owning session selects over [`run`](Self::run) and the
/// disconnect signal, so teardown cancels every pending timer.
pub struct FallbackGenerator {
    config: FallbackConfig,
    updates: mpsc::UnboundedSender<TelemetrySample>,
}

impl FallbackGenerator {
    /// Create a generator pushing into the given update channel
    pub fn new(config: FallbackConfig, updates: mpsc::UnboundedSender<TelemetrySample>) -> Self {
        Self { config, updates }
    }

    /// Run the emission schedule. Returns when the update receiver is
    /// dropped; otherwise loops forever and relies on being dropped.
    pub async fn run(self) {
        info!("starting fallback telemetry generator");
        let dtc_at = Instant::now() + Duration::from_millis(self.config.dtc_delay_ms);

        sleep(Duration::from_millis(self.config.connect_delay_ms)).await;
        if self.emit(TelemetrySample {
            is_connected: Some(true),
            ..Default::default()
        }) {
            return;
        }

        let mut ticker = interval(Duration::from_millis(self.config.update_interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick of a tokio interval fires immediately; skip it so the
        // first sample lands one full interval after the status update.
        ticker.tick().await;

        let dtc_timer = tokio::time::sleep_until(dtc_at);
        tokio::pin!(dtc_timer);
        let mut dtcs_sent = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.emit(Self::random_sample(&self.config)) {
                        return;
                    }
                }
                _ = &mut dtc_timer, if !dtcs_sent => {
                    dtcs_sent = true;
                    let dtcs = DEMO_DTCS.iter().map(|c| c.to_string()).collect();
                    if self.emit(TelemetrySample {
                        dtcs: Some(dtcs),
                        ..Default::default()
                    }) {
                        return;
                    }
                }
            }
        }
    }

    /// Send one update; true means the receiver is gone and the run is over.
    fn emit(&self, sample: TelemetrySample) -> bool {
        if self.updates.send(sample).is_err() {
            debug!("update receiver dropped, stopping fallback generator");
            return true;
        }
        false
    }

    fn random_sample(config: &FallbackConfig) -> TelemetrySample {
        let mut rng = rand::thread_rng();
        TelemetrySample {
            rpm: Some(rng.gen_range(config.rpm_range.0..=config.rpm_range.1).round()),
            speed_kph: Some(
                rng.gen_range(config.speed_range.0..=config.speed_range.1).round(),
            ),
            coolant_temp_c: Some(
                rng.gen_range(config.coolant_range.0..=config.coolant_range.1).round(),
            ),
            ..Default::default()
        }
    }
}
