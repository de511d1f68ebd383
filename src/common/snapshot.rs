//! Latest consolidated dashboard state.
//!
//! The pollers write here and the HTTP routes read here; this takes the
//! place of the direct DOM writes in the original plant dashboard. Each
//! panel has exactly one writer (the single-flight guard in the scheduler
//! guarantees it), so last-write-wins per panel is safe.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::services::stabilizer::StabilizedReading;

/// Overall pressure panel status for the two biodigesters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PressureStatus {
    Normal,
    Alert,
    Critical,
}

/// Derived view over the two biodigester pressure transmitters.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PressurePanel {
    /// 040PT01, biodigester 1, bar.
    pub bio1: Option<f64>,
    /// 050PT01, biodigester 2, bar.
    pub bio2: Option<f64>,
    /// Absolute difference, only when both values are present.
    pub difference: Option<f64>,
    pub status: Option<PressureStatus>,
}

/// When each panel last refreshed successfully.
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct PanelTimes {
    pub sensors: Option<DateTime<Utc>>,
    pub kpis: Option<DateTime<Utc>>,
    pub registers: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct DashboardSnapshot {
    /// Latest stabilized reading per sensor tag.
    pub readings: HashMap<String, StabilizedReading>,
    pub pressures: Option<PressurePanel>,
    /// Raw KPI payload from `/datos_kpi`.
    #[schema(value_type = Option<Object>)]
    pub kpis: Option<Value>,
    /// Raw 15-minute register payload from `/registros_15min`.
    #[schema(value_type = Option<Object>)]
    pub registers: Option<Value>,
    pub refreshed: PanelTimes,
}

#[derive(Default)]
pub struct SnapshotStore {
    inner: RwLock<DashboardSnapshot>,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dashboard(&self) -> DashboardSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn reading(&self, sensor_id: &str) -> Option<StabilizedReading> {
        self.inner.read().await.readings.get(sensor_id).cloned()
    }

    pub async fn update_sensors(
        &self,
        readings: Vec<StabilizedReading>,
        pressures: Option<PressurePanel>,
    ) {
        let mut snapshot = self.inner.write().await;
        for reading in readings {
            snapshot.readings.insert(reading.sensor_id.clone(), reading);
        }
        snapshot.pressures = pressures;
        snapshot.refreshed.sensors = Some(Utc::now());
    }

    pub async fn update_kpis(&self, kpis: Value) {
        let mut snapshot = self.inner.write().await;
        snapshot.kpis = Some(kpis);
        snapshot.refreshed.kpis = Some(Utc::now());
    }

    pub async fn update_registers(&self, registers: Value) {
        let mut snapshot = self.inner.write().await;
        snapshot.registers = Some(registers);
        snapshot.refreshed.registers = Some(Utc::now());
    }
}
