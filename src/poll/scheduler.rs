//! Unified poll scheduler.
//!
//! A single base tick drives every panel at its own cadence: sensors every
//! 2 ticks, KPIs every 3, 15-minute registers every 4 (10/15/20 s at the
//! default 5 s tick). Each panel refresh runs behind a single-flight guard:
//! if the previous refresh is still in flight when the cadence fires again,
//! the tick is skipped rather than overlapped.
//!
//! The scheduler also consumes the connectivity watch channel: polling
//! pauses entirely while the backend is disconnected, and the first tick
//! after recovery refreshes every panel at once instead of silently resuming
//! on stale cadences.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;

use crate::common::state::AppState;
use crate::poll::worker;
use crate::services::monitor::Connectivity;

/// Panel cadences in base ticks.
const SENSOR_CADENCE: u32 = 2;
const KPI_CADENCE: u32 = 3;
const REGISTER_CADENCE: u32 = 4;

/// One guard per panel; `try_lock` failure means the previous refresh is
/// still running and this tick is skipped.
#[derive(Default)]
struct PanelGuards {
    sensors: Arc<Mutex<()>>,
    kpis: Arc<Mutex<()>>,
    registers: Arc<Mutex<()>>,
}

fn spawn_guarded<F, Fut>(guard: Arc<Mutex<()>>, panel: &'static str, refresh: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let Ok(_in_flight) = guard.try_lock() else {
            tracing::warn!(panel, "Previous refresh still in flight, skipping tick");
            return;
        };
        refresh().await;
    });
}

fn refresh_all(state: &AppState, guards: &PanelGuards) {
    let st = state.clone();
    spawn_guarded(guards.sensors.clone(), "sensors", move || {
        worker::refresh_sensors(st)
    });
    let st = state.clone();
    spawn_guarded(guards.kpis.clone(), "kpis", move || worker::refresh_kpis(st));
    let st = state.clone();
    spawn_guarded(guards.registers.clone(), "registers", move || {
        worker::refresh_registers(st)
    });
}

/// Run the panel poll loop. Never returns; spawned once at startup.
pub async fn run_poller(state: AppState) {
    let base_tick = Duration::from_secs(state.config.base_tick_seconds);

    tracing::info!(
        base_tick_secs = base_tick.as_secs(),
        sensor_cadence = SENSOR_CADENCE,
        kpi_cadence = KPI_CADENCE,
        register_cadence = REGISTER_CADENCE,
        "Starting panel poll scheduler"
    );

    let guards = PanelGuards::default();
    let mut conn_rx = state.monitor.subscribe();
    let mut ticker = interval(base_tick);

    let mut previous_state = Connectivity::Connected;
    let mut sensor_ticks = 0u32;
    let mut kpi_ticks = 0u32;
    let mut register_ticks = 0u32;

    // First tick fires immediately: populate every panel on startup.
    ticker.tick().await;
    refresh_all(&state, &guards);

    loop {
        ticker.tick().await;

        let conn_state = conn_rx.borrow_and_update().state;

        if conn_state == Connectivity::Disconnected {
            if previous_state != Connectivity::Disconnected {
                tracing::warn!("Backend disconnected, pausing panel polling");
            }
            previous_state = conn_state;
            continue;
        }

        // One-shot refresh on recovery, then fall back to normal cadences.
        if previous_state != Connectivity::Connected && conn_state == Connectivity::Connected {
            tracing::info!("Backend restored, refreshing all panels");
            refresh_all(&state, &guards);
            previous_state = conn_state;
            sensor_ticks = 0;
            kpi_ticks = 0;
            register_ticks = 0;
            continue;
        }
        previous_state = conn_state;

        sensor_ticks += 1;
        kpi_ticks += 1;
        register_ticks += 1;

        if sensor_ticks >= SENSOR_CADENCE {
            sensor_ticks = 0;
            let st = state.clone();
            spawn_guarded(guards.sensors.clone(), "sensors", move || {
                worker::refresh_sensors(st)
            });
        }

        if kpi_ticks >= KPI_CADENCE {
            kpi_ticks = 0;
            let st = state.clone();
            spawn_guarded(guards.kpis.clone(), "kpis", move || worker::refresh_kpis(st));
        }

        if register_ticks >= REGISTER_CADENCE {
            register_ticks = 0;
            let st = state.clone();
            spawn_guarded(guards.registers.clone(), "registers", move || {
                worker::refresh_registers(st)
            });
        }
    }
}
