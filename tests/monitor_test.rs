//! Integration tests for the connectivity monitor.
//!
//! Run with: cargo test --test monitor_test

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use sibia_gateway::backend::Backend;
use sibia_gateway::backend::models::SensorReading;
use sibia_gateway::error::{AppError, AppResult};
use sibia_gateway::services::monitor::{
    Connectivity, ConnectivityMonitor, LinkEvent, MonitorSettings,
};

/// Scripted probe target: each entry is one probe outcome. The last entry
/// repeats once exhausted.
struct ProbeTarget {
    script: std::sync::Mutex<Vec<bool>>,
}

impl ProbeTarget {
    fn new(script: Vec<bool>) -> Self {
        Self {
            script: std::sync::Mutex::new(script),
        }
    }
}

impl Backend for ProbeTarget {
    async fn get_json(&self, _path: &str) -> AppResult<Value> {
        Err(AppError::Internal("not used in monitor tests".to_string()))
    }

    async fn get_reading(&self, _path: &str) -> AppResult<SensorReading> {
        Err(AppError::Internal("not used in monitor tests".to_string()))
    }

    async fn probe(&self, _path: &str) -> AppResult<()> {
        let mut script = self.script.lock().unwrap();
        let ok = if script.len() > 1 {
            script.remove(0)
        } else {
            script[0]
        };
        if ok {
            Ok(())
        } else {
            Err(AppError::Network("connection refused".to_string()))
        }
    }
}

fn monitor(script: Vec<bool>, max_retries: u32) -> ConnectivityMonitor<ProbeTarget> {
    ConnectivityMonitor::new(
        Arc::new(ProbeTarget::new(script)),
        MonitorSettings {
            probe_path: "/ping".to_string(),
            check_interval: Duration::from_secs(30),
            retry_interval: Duration::from_secs(5),
            max_retries,
        },
    )
}

#[tokio::test]
async fn exactly_max_retries_failures_disconnect() {
    let mon = monitor(vec![false], 3);

    assert_eq!(mon.status().state, Connectivity::Connected);

    // Failures at t=0, 5, 10: the third one exhausts the budget
    assert_eq!(mon.probe_once().await, None);
    assert_eq!(mon.status().state, Connectivity::Retrying);
    assert_eq!(mon.probe_once().await, None);
    assert_eq!(mon.probe_once().await, Some(LinkEvent::Lost));
    assert_eq!(mon.status().state, Connectivity::Disconnected);

    // A fourth failure keeps the state, with no duplicate Lost event
    assert_eq!(mon.probe_once().await, None);
    assert_eq!(mon.status().state, Connectivity::Disconnected);
}

#[tokio::test]
async fn success_during_retries_restores_exactly_once() {
    let mon = monitor(vec![false, false, true], 3);

    mon.probe_once().await;
    mon.probe_once().await;
    assert_eq!(mon.status().state, Connectivity::Retrying);

    let mut restored = 0;
    if mon.probe_once().await == Some(LinkEvent::Restored) {
        restored += 1;
    }
    if mon.probe_once().await == Some(LinkEvent::Restored) {
        restored += 1;
    }

    assert_eq!(restored, 1);
    assert_eq!(mon.status().state, Connectivity::Connected);
    assert_eq!(mon.status().consecutive_failures, 0);
}

#[tokio::test]
async fn scheduled_probe_recovers_from_disconnected() {
    let mon = monitor(vec![false, false, true], 2);

    mon.probe_once().await;
    assert_eq!(mon.probe_once().await, Some(LinkEvent::Lost));
    assert_eq!(mon.status().state, Connectivity::Disconnected);

    assert_eq!(mon.probe_once().await, Some(LinkEvent::Restored));
    assert_eq!(mon.status().state, Connectivity::Connected);
}

#[tokio::test]
async fn manual_reconnect_resets_budget_and_recovers() {
    let mon = monitor(vec![false, false, false, true], 3);

    mon.probe_once().await;
    mon.probe_once().await;
    mon.probe_once().await;
    assert_eq!(mon.status().state, Connectivity::Disconnected);
    assert_eq!(mon.status().consecutive_failures, 3);

    // The reconnect action resets the retry budget; the probe it triggers
    // (here driven manually) brings the link back up.
    mon.force_reconnect();
    assert_eq!(mon.probe_once().await, Some(LinkEvent::Restored));
    assert_eq!(mon.status().state, Connectivity::Connected);
    assert_eq!(mon.status().consecutive_failures, 0);
}

#[tokio::test]
async fn watch_channel_tracks_transitions() {
    let mon = monitor(vec![false, true], 3);
    let rx = mon.subscribe();

    assert_eq!(rx.borrow().state, Connectivity::Connected);

    mon.probe_once().await;
    assert_eq!(rx.borrow().state, Connectivity::Retrying);
    assert_eq!(rx.borrow().consecutive_failures, 1);

    mon.probe_once().await;
    assert_eq!(rx.borrow().state, Connectivity::Connected);
    assert_eq!(rx.borrow().consecutive_failures, 0);
}
