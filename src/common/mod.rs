pub mod snapshot;
pub mod state;

pub use snapshot::{DashboardSnapshot, PanelTimes, PressurePanel, PressureStatus, SnapshotStore};
pub use state::AppState;
