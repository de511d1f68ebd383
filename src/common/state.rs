use std::sync::Arc;
use std::time::Duration;

use crate::backend::BackendClient;
use crate::common::SnapshotStore;
use crate::config::Config;
use crate::services::cache::RequestCache;
use crate::services::monitor::{ConnectivityMonitor, MonitorSettings};
use crate::services::stabilizer::SensorStabilizer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<RequestCache<BackendClient>>,
    pub stabilizer: Arc<SensorStabilizer<BackendClient>>,
    pub monitor: Arc<ConnectivityMonitor<BackendClient>>,
    pub snapshot: Arc<SnapshotStore>,
}

impl AppState {
    pub fn new(config: Config, backend: BackendClient) -> Self {
        let backend = Arc::new(backend);

        let cache = RequestCache::new(backend.clone(), config.cache_max_entries);

        let stabilizer = SensorStabilizer::new(
            backend.clone(),
            Duration::from_secs(config.stale_window_seconds),
            config.jump_warn_pct,
        );

        let monitor = ConnectivityMonitor::new(
            backend,
            MonitorSettings {
                probe_path: config.probe_path.clone(),
                check_interval: Duration::from_secs(config.check_interval_seconds),
                retry_interval: Duration::from_secs(config.retry_interval_seconds),
                max_retries: config.max_retries,
            },
        );

        Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
            stabilizer: Arc::new(stabilizer),
            monitor: Arc::new(monitor),
            snapshot: Arc::new(SnapshotStore::new()),
        }
    }
}
