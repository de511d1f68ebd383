//! Value stabilization for intermittent sensor feeds.
//!
//! Field transmitters on the biodigesters drop out for seconds at a time.
//! Rather than flickering between live values and error placeholders, the
//! stabilizer keeps the last known-good value per sensor and serves it while
//! the feed is down, bounded by a staleness window. Once the value is older
//! than the window the sensor is reported as errored and callers render a
//! placeholder.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::backend::Backend;

/// Where a stabilized value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    /// Fresh value straight from the backend.
    Live,
    /// Last known-good value, younger than the stale window.
    Cache,
    /// No live value and nothing recent enough to fall back on.
    Error,
}

/// A reading after stabilization. `value` is `None` only when `source`
/// is [`ReadingSource::Error`].
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StabilizedReading {
    pub sensor_id: String,
    pub value: Option<f64>,
    pub source: ReadingSource,
    /// When the served value was actually observed (wall clock, for display).
    pub observed_at: chrono::DateTime<chrono::Utc>,
    pub consecutive_failures: u32,
}

/// Per-sensor rolling state. Lives for the process lifetime; reset only by
/// restarting the gateway.
#[derive(Debug, Default)]
struct SensorRecord {
    last_value: Option<f64>,
    last_good_at: Option<Instant>,
    last_good_wall: Option<chrono::DateTime<chrono::Utc>>,
    consecutive_failures: u32,
}

pub struct SensorStabilizer<B> {
    backend: Arc<B>,
    records: Mutex<HashMap<String, SensorRecord>>,
    stale_window: Duration,
    jump_warn_pct: f64,
}

impl<B: Backend> SensorStabilizer<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, stale_window: Duration, jump_warn_pct: f64) -> Self {
        Self {
            backend,
            records: Mutex::new(HashMap::new()),
            stale_window,
            jump_warn_pct,
        }
    }

    /// Fetch a sensor value, falling back to the last known-good value when
    /// the live fetch fails or returns a null/missing `valor`.
    ///
    /// Never returns an error: failures are absorbed into the `cache` or
    /// `error` source and surfaced through `consecutive_failures`.
    pub async fn get_stabilized(&self, path: &str, sensor_id: &str) -> StabilizedReading {
        let result = self.backend.get_reading(path).await;
        let now = Instant::now();
        let wall_now = chrono::Utc::now();

        let mut records = self.records.lock().await;
        let record = records.entry(sensor_id.to_string()).or_default();

        match result {
            Ok(reading) => {
                if let Some(value) = reading.value {
                    // Large jumps are logged but still accepted; rejection
                    // was never enforced in the plant dashboard.
                    if let Some(previous) = record.last_value {
                        if previous != 0.0 {
                            let variation = ((value - previous) / previous * 100.0).abs();
                            if variation > self.jump_warn_pct {
                                tracing::warn!(
                                    sensor_id = %sensor_id,
                                    previous,
                                    value,
                                    variation_pct = format!("{variation:.1}"),
                                    "Large jump between consecutive readings"
                                );
                            }
                        }
                    }

                    record.last_value = Some(value);
                    record.last_good_at = Some(now);
                    record.last_good_wall = Some(wall_now);
                    record.consecutive_failures = 0;

                    return StabilizedReading {
                        sensor_id: sensor_id.to_string(),
                        value: Some(value),
                        source: ReadingSource::Live,
                        observed_at: wall_now,
                        consecutive_failures: 0,
                    };
                }

                record.consecutive_failures += 1;
                tracing::warn!(
                    sensor_id = %sensor_id,
                    failures = record.consecutive_failures,
                    "Sensor returned null value"
                );
            }
            Err(e) => {
                record.consecutive_failures += 1;
                tracing::warn!(
                    sensor_id = %sensor_id,
                    error = %e,
                    failures = record.consecutive_failures,
                    "Sensor fetch failed"
                );
            }
        }

        // Live fetch failed or payload was invalid: serve the cached value
        // while it is younger than the stale window.
        if let (Some(value), Some(good_at)) = (record.last_value, record.last_good_at) {
            if now.duration_since(good_at) < self.stale_window {
                return StabilizedReading {
                    sensor_id: sensor_id.to_string(),
                    value: Some(value),
                    source: ReadingSource::Cache,
                    observed_at: record.last_good_wall.unwrap_or(wall_now),
                    consecutive_failures: record.consecutive_failures,
                };
            }
        }

        StabilizedReading {
            sensor_id: sensor_id.to_string(),
            value: None,
            source: ReadingSource::Error,
            observed_at: wall_now,
            consecutive_failures: record.consecutive_failures,
        }
    }
}
