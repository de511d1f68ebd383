//! Panel refresh operations.
//!
//! Each function fetches one panel's data through the cache or the
//! stabilizer and writes the result into the snapshot store. Failures are
//! logged and leave the previous snapshot in place; nothing here propagates
//! an error to the scheduler.

use futures::future::join_all;
use std::time::Duration;

use crate::common::state::AppState;
use crate::common::{PressurePanel, PressureStatus};
use crate::services::stabilizer::StabilizedReading;

/// Tags of the two biodigester pressure transmitters driving the panel.
const PRESSURE_BIO1: &str = "040PT01";
const PRESSURE_BIO2: &str = "050PT01";

/// Backend path for a sensor tag, e.g. "040PT01" -> "/040pt01".
#[must_use]
pub fn sensor_path(tag: &str) -> String {
    format!("/{}", tag.to_lowercase())
}

/// Overall pressure status: NORMAL when both pressures sit in the normal
/// band, ALERT when both are at least within the wider alert band,
/// CRITICAL otherwise. Bands are in bar.
#[must_use]
pub fn pressure_status(bio1: f64, bio2: f64) -> PressureStatus {
    const NORMAL: (f64, f64) = (0.02, 0.08);
    const ALERT: (f64, f64) = (0.01, 0.10);

    let within = |value: f64, (lo, hi): (f64, f64)| value >= lo && value <= hi;

    if within(bio1, NORMAL) && within(bio2, NORMAL) {
        PressureStatus::Normal
    } else if within(bio1, ALERT) && within(bio2, ALERT) {
        PressureStatus::Alert
    } else {
        PressureStatus::Critical
    }
}

fn pressure_panel(readings: &[StabilizedReading]) -> Option<PressurePanel> {
    let value_of = |tag: &str| {
        readings
            .iter()
            .find(|r| r.sensor_id == tag)
            .and_then(|r| r.value)
    };

    let bio1 = value_of(PRESSURE_BIO1);
    let bio2 = value_of(PRESSURE_BIO2);

    if bio1.is_none() && bio2.is_none() {
        return None;
    }

    let (difference, status) = match (bio1, bio2) {
        (Some(p1), Some(p2)) => (Some((p1 - p2).abs()), Some(pressure_status(p1, p2))),
        _ => (None, None),
    };

    Some(PressurePanel {
        bio1,
        bio2,
        difference,
        status,
    })
}

/// Refresh all configured sensors through the stabilizer and rebuild the
/// pressure panel. Sensors are fetched concurrently, matching the parallel
/// fetch of both pressures in the plant dashboard.
pub async fn refresh_sensors(state: AppState) {
    let tags = &state.config.sensor_tags;

    let readings: Vec<StabilizedReading> = join_all(tags.iter().map(|tag| {
        let path = sensor_path(tag);
        let stabilizer = state.stabilizer.clone();
        async move { stabilizer.get_stabilized(&path, tag).await }
    }))
    .await;

    let live = readings
        .iter()
        .filter(|r| r.source == crate::services::stabilizer::ReadingSource::Live)
        .count();
    tracing::debug!(total = readings.len(), live, "Sensor refresh completed");

    let panel = pressure_panel(&readings);
    state.snapshot.update_sensors(readings, panel).await;
}

/// Refresh the KPI panel from `/datos_kpi` through the request cache.
pub async fn refresh_kpis(state: AppState) {
    let ttl = Duration::from_secs(state.config.cache_ttl_seconds);
    match state.cache.fetch_cached("/datos_kpi", ttl).await {
        Ok(value) => {
            state.snapshot.update_kpis((*value).clone()).await;
            tracing::debug!("KPI refresh completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "KPI refresh failed");
        }
    }
}

/// Refresh the 15-minute register panel from `/registros_15min` through the
/// request cache.
pub async fn refresh_registers(state: AppState) {
    let ttl = Duration::from_secs(state.config.cache_ttl_seconds);
    match state.cache.fetch_cached("/registros_15min", ttl).await {
        Ok(value) => {
            state.snapshot.update_registers((*value).clone()).await;
            tracing::debug!("Register refresh completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Register refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_status_bands() {
        assert_eq!(pressure_status(0.05, 0.05), PressureStatus::Normal);
        assert_eq!(pressure_status(0.02, 0.08), PressureStatus::Normal);
        assert_eq!(pressure_status(0.015, 0.05), PressureStatus::Alert);
        assert_eq!(pressure_status(0.095, 0.012), PressureStatus::Alert);
        assert_eq!(pressure_status(0.005, 0.05), PressureStatus::Critical);
        assert_eq!(pressure_status(0.12, 0.05), PressureStatus::Critical);
    }

    #[test]
    fn sensor_path_lowercases_tag() {
        assert_eq!(sensor_path("040PT01"), "/040pt01");
        assert_eq!(sensor_path("050FT01"), "/050ft01");
    }
}
