//! Integration tests for the sensor stabilizer.
//!
//! Run with: cargo test --test stabilizer_test

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use sibia_gateway::backend::Backend;
use sibia_gateway::backend::models::SensorReading;
use sibia_gateway::error::{AppError, AppResult};
use sibia_gateway::services::stabilizer::{ReadingSource, SensorStabilizer};

const STALE_WINDOW: Duration = Duration::from_secs(60);
const JUMP_WARN_PCT: f64 = 20.0;

/// Scripted sensor feed: each entry is the outcome of one poll attempt.
/// `Some(Some(v))` is a good reading, `Some(None)` a null `valor`,
/// `None` a network failure. The last entry repeats once exhausted.
struct SensorFeed {
    script: std::sync::Mutex<Vec<Option<Option<f64>>>>,
}

impl SensorFeed {
    fn new(script: Vec<Option<Option<f64>>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script),
        }
    }
}

impl Backend for SensorFeed {
    async fn get_json(&self, _path: &str) -> AppResult<Value> {
        Err(AppError::Internal("not used in stabilizer tests".to_string()))
    }

    async fn get_reading(&self, _path: &str) -> AppResult<SensorReading> {
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.remove(0)
        } else {
            script[0]
        };
        match next {
            Some(value) => Ok(SensorReading {
                value,
                status: Some("ok".to_string()),
                timestamp: None,
            }),
            None => Err(AppError::Network("timed out".to_string())),
        }
    }

    async fn probe(&self, _path: &str) -> AppResult<()> {
        Err(AppError::Internal("not used in stabilizer tests".to_string()))
    }
}

fn stabilizer(script: Vec<Option<Option<f64>>>) -> SensorStabilizer<SensorFeed> {
    SensorStabilizer::new(Arc::new(SensorFeed::new(script)), STALE_WINDOW, JUMP_WARN_PCT)
}

#[tokio::test]
async fn live_value_is_served_and_resets_failures() {
    let stab = stabilizer(vec![None, Some(Some(1.2))]);

    // First poll fails with no cache to fall back on
    let r = stab.get_stabilized("/040pt01", "040PT01").await;
    assert_eq!(r.source, ReadingSource::Error);
    assert_eq!(r.value, None);
    assert_eq!(r.consecutive_failures, 1);

    // Second poll succeeds and resets the failure counter
    let r = stab.get_stabilized("/040pt01", "040PT01").await;
    assert_eq!(r.source, ReadingSource::Live);
    assert_eq!(r.value, Some(1.2));
    assert_eq!(r.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn recent_good_value_is_served_on_failure() {
    let stab = stabilizer(vec![Some(Some(1.2)), None]);

    // t=-10s relative to the failure: good value recorded
    let r = stab.get_stabilized("/040pt01", "040PT01").await;
    assert_eq!(r.source, ReadingSource::Live);

    // t=+10s: live fetch fails, cached value is younger than the window
    tokio::time::advance(Duration::from_secs(10)).await;
    let r = stab.get_stabilized("/040pt01", "040PT01").await;
    assert_eq!(r.source, ReadingSource::Cache);
    assert_eq!(r.value, Some(1.2));
    assert_eq!(r.consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn stale_value_is_not_served() {
    let stab = stabilizer(vec![Some(Some(1.2)), None]);

    stab.get_stabilized("/040pt01", "040PT01").await;

    // t=+70s: past the 60s stale window, the old value must not be served
    tokio::time::advance(Duration::from_secs(70)).await;
    let r = stab.get_stabilized("/040pt01", "040PT01").await;
    assert_eq!(r.source, ReadingSource::Error);
    assert_eq!(r.value, None);
}

#[tokio::test]
async fn null_valor_counts_as_failure() {
    let stab = stabilizer(vec![Some(Some(2.0)), Some(None)]);

    stab.get_stabilized("/040tt01", "040TT01").await;

    // Null valor: invalid payload, falls back to the cached value
    let r = stab.get_stabilized("/040tt01", "040TT01").await;
    assert_eq!(r.source, ReadingSource::Cache);
    assert_eq!(r.value, Some(2.0));
    assert_eq!(r.consecutive_failures, 1);
}

#[tokio::test]
async fn consecutive_failures_accumulate_per_sensor() {
    let stab = stabilizer(vec![None]);

    let r = stab.get_stabilized("/040lt01", "040LT01").await;
    assert_eq!(r.consecutive_failures, 1);
    let r = stab.get_stabilized("/040lt01", "040LT01").await;
    assert_eq!(r.consecutive_failures, 2);

    // A different sensor keeps its own counter
    let r = stab.get_stabilized("/050lt01", "050LT01").await;
    assert_eq!(r.consecutive_failures, 1);
}

#[tokio::test]
async fn large_jump_is_accepted_not_rejected() {
    // 1.0 -> 2.0 is a 100% jump; it must still be cached and served
    let stab = stabilizer(vec![Some(Some(1.0)), Some(Some(2.0)), None]);

    stab.get_stabilized("/040ft01", "040FT01").await;
    let r = stab.get_stabilized("/040ft01", "040FT01").await;
    assert_eq!(r.source, ReadingSource::Live);
    assert_eq!(r.value, Some(2.0));

    // The jumped value is what the cache now serves
    let r = stab.get_stabilized("/040ft01", "040FT01").await;
    assert_eq!(r.source, ReadingSource::Cache);
    assert_eq!(r.value, Some(2.0));
}
