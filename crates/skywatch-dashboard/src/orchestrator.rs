//! Dashboard orchestrator: owns the client state for the selected city and
//! keeps it fresh.
//!
//! A fetch cycle joins the three reads for one city and only then touches
//! state. Cycles are tagged with the generation that was current when they
//! started; activation and deactivation bump the generation, so a cycle for
//! an abandoned city settles without effect. Cycles for the same generation
//! are not serialized and the last one to settle wins.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use skywatch_weather::{ApiError, WeatherApi, DEFAULT_SUMMARY_DAYS};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::scheduler::RefreshSchedule;
use crate::state::{ClientState, CycleData};

/// Default period between automatic refreshes (5 minutes)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(300_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub refresh_interval: Duration,
    pub summary_days: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            summary_days: DEFAULT_SUMMARY_DAYS,
        }
    }
}

/// Identifies the activation a cycle belongs to
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub(crate) generation: u64,
    pub(crate) city: String,
}

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) generation: u64,
    pub(crate) active: bool,
    in_flight: usize,
    pub(crate) state: ClientState,
}

impl Shared {
    pub(crate) fn ticket(&self) -> Option<Ticket> {
        match (&self.state.city, self.active) {
            (Some(city), true) => Some(Ticket {
                generation: self.generation,
                city: city.clone(),
            }),
            _ => None,
        }
    }

    pub(crate) fn is_current(&self, ticket: &Ticket) -> bool {
        self.active && self.generation == ticket.generation
    }
}

pub(crate) struct Inner {
    pub(crate) api: Arc<dyn WeatherApi>,
    options: DashboardOptions,
    pub(crate) shared: Mutex<Shared>,
    tx: watch::Sender<ClientState>,
}

impl Inner {
    pub(crate) fn publish(&self, shared: &Shared) {
        self.tx.send_replace(shared.state.clone());
    }

    /// Mark a cycle as started for the active city.
    fn begin(&self) -> Option<Ticket> {
        let mut shared = self.shared.lock();
        let ticket = Self::begin_locked(&mut shared)?;
        self.publish(&shared);
        Some(ticket)
    }

    fn begin_locked(shared: &mut Shared) -> Option<Ticket> {
        let ticket = shared.ticket()?;
        shared.in_flight += 1;
        shared.state.begin_cycle();
        Some(ticket)
    }

    fn spawn_cycle(self: &Arc<Self>) -> Option<JoinHandle<bool>> {
        let ticket = self.begin()?;
        let inner = self.clone();
        Some(tokio::spawn(async move { inner.run_cycle(ticket).await }))
    }

    /// Fetch and apply one cycle. Returns false when the result was stale.
    async fn run_cycle(&self, ticket: Ticket) -> bool {
        let result = self.fetch(&ticket.city).await;
        self.settle(&ticket, result)
    }

    async fn fetch(&self, city: &str) -> Result<CycleData, ApiError> {
        let (readings, summaries, alerts) = tokio::join!(
            self.api.current_weather(Some(city)),
            self.api.weather_summary(city, self.options.summary_days),
            self.api.alerts(Some(city)),
        );

        Ok(CycleData {
            readings: or_empty("current weather", city, readings)?,
            summaries: or_empty("weather summary", city, summaries)?,
            alerts: or_empty("alerts", city, alerts)?,
        })
    }

    fn settle(&self, ticket: &Ticket, result: Result<CycleData, ApiError>) -> bool {
        let mut shared = self.shared.lock();
        if !shared.is_current(ticket) {
            tracing::debug!(
                "Discarding stale cycle for {} (generation {}, now {})",
                ticket.city,
                ticket.generation,
                shared.generation
            );
            return false;
        }

        shared.in_flight = shared.in_flight.saturating_sub(1);
        let still_loading = shared.in_flight > 0;

        match result {
            Ok(data) => {
                tracing::info!(
                    "Refreshed {}: {} reading(s), {} summary day(s), {} alert(s)",
                    ticket.city,
                    data.readings.len(),
                    data.summaries.len(),
                    data.alerts.len()
                );
                shared.state.apply_cycle(data, still_loading);
            }
            Err(e) => {
                tracing::error!("Fetch cycle for {} failed: {}", ticket.city, e);
                shared.state.fail_cycle(still_loading);
            }
        }

        self.publish(&shared);
        true
    }
}

/// Transport failures on reads count as "no data".
fn or_empty<T>(what: &str, city: &str, result: Result<Vec<T>, ApiError>) -> Result<Vec<T>, ApiError> {
    match result {
        Err(e) if e.is_transport() => {
            tracing::warn!("Fetching {} for {} failed, treating as empty: {}", what, city, e);
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Keeps a [`ClientState`] fresh for one selected city at a time.
pub struct Dashboard {
    pub(crate) inner: Arc<Inner>,
    schedule: Mutex<Option<RefreshSchedule>>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn WeatherApi>, options: DashboardOptions) -> Self {
        let (tx, _) = watch::channel(ClientState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                options,
                shared: Mutex::new(Shared::default()),
                tx,
            }),
            schedule: Mutex::new(None),
        }
    }

    pub fn options(&self) -> DashboardOptions {
        self.inner.options
    }

    /// Select `city` and start refreshing it.
    ///
    /// Invalidates in-flight cycles, drops data for any other city, runs
    /// one cycle immediately and restarts the refresh timer. The returned
    /// handle resolves once that first cycle has settled; dropping it does
    /// not cancel the cycle. Must be called from within a tokio runtime.
    pub fn activate(&self, city: &str) -> JoinHandle<bool> {
        let ticket = {
            let mut shared = self.inner.shared.lock();
            shared.generation += 1;
            shared.active = true;
            shared.in_flight = 0;
            shared.state.select(city);
            let ticket = Inner::begin_locked(&mut shared);
            self.inner.publish(&shared);
            ticket
        };
        tracing::info!("Dashboard active for {}", city);

        self.restart_schedule();

        let inner = self.inner.clone();
        tokio::spawn(async move {
            match ticket {
                Some(ticket) => inner.run_cycle(ticket).await,
                None => false,
            }
        })
    }

    /// Run one cycle for the active city now and wait for it to settle.
    ///
    /// The cycle runs on its own task, so dropping this future does not
    /// abandon it. Returns false when inactive or when the cycle was
    /// superseded.
    pub async fn refresh(&self) -> bool {
        let Some(handle) = self.inner.spawn_cycle() else {
            tracing::debug!("Refresh requested while inactive");
            return false;
        };

        match handle.await {
            Ok(applied) => applied,
            Err(e) => {
                tracing::error!("Refresh task failed: {}", e);
                false
            }
        }
    }

    /// Stop refreshing. In-flight cycles are discarded when they settle.
    pub fn deactivate(&self) {
        if let Some(schedule) = self.schedule.lock().take() {
            schedule.cancel();
        }

        let mut shared = self.inner.shared.lock();
        if !shared.active {
            return;
        }
        shared.generation += 1;
        shared.active = false;
        shared.in_flight = 0;
        if shared.state.stop() {
            self.inner.publish(&shared);
        }
        tracing::info!("Dashboard deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.inner.shared.lock().active
    }

    pub fn city(&self) -> Option<String> {
        self.inner.shared.lock().state.city.clone()
    }

    pub fn snapshot(&self) -> ClientState {
        self.inner.shared.lock().state.clone()
    }

    /// Receiver updated after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.inner.tx.subscribe()
    }

    fn restart_schedule(&self) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let schedule = RefreshSchedule::start(self.inner.options.refresh_interval, move || {
            if let Some(inner) = weak.upgrade() {
                inner.spawn_cycle();
            }
        });

        // Replacing the old schedule drops it, which cancels its timer.
        *self.schedule.lock() = Some(schedule);
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("Dashboard")
            .field("city", &shared.state.city)
            .field("active", &shared.active)
            .field("generation", &shared.generation)
            .field("options", &self.inner.options)
            .finish()
    }
}
