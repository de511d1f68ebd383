//! Backend connectivity monitoring.
//!
//! A periodic probe against a lightweight endpoint drives a three-state
//! machine:
//!
//! - `Connected` (initial, optimistic) → probe fails → `Retrying`
//! - `Retrying` → probe succeeds → `Connected`, `Restored` event fires once
//! - `Retrying` → max consecutive failures reached → `Disconnected`, `Lost`
//!   event fires once
//! - `Disconnected` → scheduled probe or manual reconnect succeeds →
//!   `Connected`
//!
//! A failure never skips `Retrying` on the way down, and re-entering the
//! current state is a no-op. The state is published through a watch channel
//! so the poll scheduler can pause while disconnected and refresh everything
//! once the link comes back.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::time::interval;

use crate::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Connected,
    Retrying,
    Disconnected,
}

/// Edge-triggered transition events, fired at most once per episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Lost,
    Restored,
}

/// Snapshot of the monitor state as served over the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ConnectivityStatus {
    pub state: Connectivity,
    pub consecutive_failures: u32,
}

/// The pure state machine. Kept free of I/O so transitions can be tested
/// without a backend.
#[derive(Debug)]
pub struct LinkState {
    state: Connectivity,
    consecutive_failures: u32,
    max_retries: u32,
}

impl LinkState {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: Connectivity::Connected,
            consecutive_failures: 0,
            max_retries,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectivityStatus {
        ConnectivityStatus {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Record a failed probe. The failure that leaves `Connected` counts as
    /// retry 1 of N; reaching N consecutive failures transitions to
    /// `Disconnected` and fires `Lost`.
    pub fn record_failure(&mut self) -> Option<LinkEvent> {
        if self.state == Connectivity::Connected {
            self.state = Connectivity::Retrying;
        }
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.state == Connectivity::Retrying && self.consecutive_failures >= self.max_retries {
            self.state = Connectivity::Disconnected;
            return Some(LinkEvent::Lost);
        }
        None
    }

    /// Record a successful probe. Any success returns to `Connected`;
    /// `Restored` fires only when the link was actually down.
    pub fn record_success(&mut self) -> Option<LinkEvent> {
        let was_down = self.state != Connectivity::Connected;
        self.state = Connectivity::Connected;
        self.consecutive_failures = 0;
        was_down.then_some(LinkEvent::Restored)
    }

    /// Reset the retry budget ahead of a manual reconnect attempt.
    pub fn reset_retries(&mut self) {
        self.consecutive_failures = 0;
    }
}

/// Probe loop settings, injected rather than read from globals.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub probe_path: String,
    pub check_interval: Duration,
    pub retry_interval: Duration,
    pub max_retries: u32,
}

pub struct ConnectivityMonitor<B> {
    backend: Arc<B>,
    link: Mutex<LinkState>,
    tx: watch::Sender<ConnectivityStatus>,
    settings: MonitorSettings,
    reconnect: Notify,
}

impl<B: Backend> ConnectivityMonitor<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, settings: MonitorSettings) -> Self {
        let link = LinkState::new(settings.max_retries);
        let (tx, _rx) = watch::channel(link.status());

        Self {
            backend,
            link: Mutex::new(link),
            tx,
            settings,
            reconnect: Notify::new(),
        }
    }

    /// Subscribe to state changes. Used by the poll scheduler for its
    /// pause/resume signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> ConnectivityStatus {
        *self.tx.borrow()
    }

    /// Reset the retry budget and trigger an immediate probe. Exposed over
    /// the gateway API as the manual "Reconnect" action.
    pub fn force_reconnect(&self) {
        let status = {
            let mut link = self.link.lock().expect("link state lock poisoned");
            link.reset_retries();
            link.status()
        };
        self.tx.send_replace(status);
        self.reconnect.notify_one();
        tracing::info!("Manual reconnect requested");
    }

    /// Run one probe cycle and apply the result to the state machine.
    /// Returns the transition event, if the probe caused one.
    pub async fn probe_once(&self) -> Option<LinkEvent> {
        let result = self.backend.probe(&self.settings.probe_path).await;

        let (event, status) = {
            let mut link = self.link.lock().expect("link state lock poisoned");
            let event = match result {
                Ok(()) => link.record_success(),
                Err(ref e) => {
                    tracing::debug!(error = %e, "Probe failed");
                    link.record_failure()
                }
            };
            (event, link.status())
        };

        self.tx.send_replace(status);

        match event {
            Some(LinkEvent::Lost) => {
                tracing::error!(
                    max_retries = self.settings.max_retries,
                    "Backend connection lost after exhausting retries"
                );
            }
            Some(LinkEvent::Restored) => {
                tracing::info!("Backend connection restored");
            }
            None => {}
        }

        event
    }

    /// Run the probe loop. Probes at the check interval while the link is
    /// healthy and at the shorter retry interval while retrying; a manual
    /// reconnect wakes the loop immediately.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            probe_path = %self.settings.probe_path,
            check_interval_secs = self.settings.check_interval.as_secs(),
            retry_interval_secs = self.settings.retry_interval.as_secs(),
            max_retries = self.settings.max_retries,
            "Starting connectivity monitor"
        );

        let mut ticker = interval(self.settings.check_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.reconnect.notified() => {}
            }

            self.probe_once().await;

            // While retrying, probe at the shorter interval until the link
            // either recovers or is declared lost.
            while self.status().state == Connectivity::Retrying {
                tokio::time::sleep(self.settings.retry_interval).await;
                self.probe_once().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_consecutive_failure_disconnects_not_fourth() {
        let mut link = LinkState::new(3);

        assert_eq!(link.record_failure(), None);
        assert_eq!(link.status().state, Connectivity::Retrying);
        assert_eq!(link.record_failure(), None);
        assert_eq!(link.record_failure(), Some(LinkEvent::Lost));
        assert_eq!(link.status().state, Connectivity::Disconnected);

        // A fourth failure is a no-op re-entry, not a second Lost event.
        assert_eq!(link.record_failure(), None);
        assert_eq!(link.status().state, Connectivity::Disconnected);
    }

    #[test]
    fn success_before_exhaustion_restores_once() {
        let mut link = LinkState::new(3);

        link.record_failure();
        link.record_failure();
        assert_eq!(link.record_success(), Some(LinkEvent::Restored));
        assert_eq!(link.status().state, Connectivity::Connected);
        assert_eq!(link.status().consecutive_failures, 0);

        // Already connected: success is idempotent, no second event.
        assert_eq!(link.record_success(), None);
    }

    #[test]
    fn failure_never_skips_retrying() {
        let mut link = LinkState::new(1);

        // Even with a budget of one, the machine passes through Retrying
        // before declaring the link lost.
        assert_eq!(link.record_failure(), Some(LinkEvent::Lost));
        assert_eq!(link.status().state, Connectivity::Disconnected);

        assert_eq!(link.record_success(), Some(LinkEvent::Restored));
    }

    #[test]
    fn disconnected_recovers_on_success() {
        let mut link = LinkState::new(2);

        link.record_failure();
        link.record_failure();
        assert_eq!(link.status().state, Connectivity::Disconnected);

        assert_eq!(link.record_success(), Some(LinkEvent::Restored));
        assert_eq!(link.status().state, Connectivity::Connected);
    }
}
