use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::monitor::checker::Checker;
use crate::monitor::error::SchedulerError;
use crate::monitor::state::{SchedulerState, SweepState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// At second 0 of every minute-of-hour divisible by `minutes` (UTC),
    /// like a `*/N * * * *` cron entry.
    WallClock { minutes: u32 },
    Every(Duration),
}

impl Cadence {
    pub fn interval_minutes(&self) -> Option<u32> {
        match self {
            Self::WallClock { minutes } => Some(*minutes),
            Self::Every(_) => None,
        }
    }
}

/// First wall-clock minute strictly after `now` whose minute-of-hour is a
/// multiple of `minutes`.
pub fn next_tick_after(now: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let step = minutes.max(1);
    let floor = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let mut candidate = floor + TimeDelta::minutes(1);
    while candidate.minute() % step != 0 {
        candidate += TimeDelta::minutes(1);
    }
    candidate
}

/// Next wall-clock tick, never at or before the previously scheduled one even
/// if the system clock is behind the timer that woke us.
fn next_wall_tick(
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
    minutes: u32,
) -> DateTime<Utc> {
    let from = previous.map_or(now, |p| p.max(now));
    next_tick_after(from, minutes)
}

/// Ticks never overlap sweeps: a tick that arrives while the previous sweep is
/// still running is dropped. Stopping ends the timer loop but lets an
/// in-flight sweep finish.
pub struct Scheduler {
    checker: Checker,
    state: Arc<RwLock<SchedulerState>>,
    sweep_running: Arc<AtomicBool>,
    cadence: RwLock<Option<Cadence>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(checker: Checker) -> Self {
        Self {
            checker,
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            sweep_running: Arc::new(AtomicBool::new(false)),
            cadence: RwLock::new(None),
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    pub fn sweep_state(&self) -> SweepState {
        if self.sweep_running.load(Ordering::Acquire) {
            SweepState::Running
        } else {
            SweepState::Idle
        }
    }

    pub async fn cadence(&self) -> Option<Cadence> {
        *self.cadence.read().await
    }

    pub async fn start(&self, interval_minutes: u32) -> Result<(), SchedulerError> {
        if !(1..=59).contains(&interval_minutes) {
            return Err(SchedulerError::InvalidInterval(interval_minutes));
        }
        self.start_with(Cadence::WallClock {
            minutes: interval_minutes,
        })
        .await;
        Ok(())
    }

    /// No-op unless the scheduler is idle or stopped.
    pub async fn start_with(&self, cadence: Cadence) {
        {
            let mut state = self.state.write().await;
            if !state.can_transition_to(SchedulerState::Active) {
                debug!(state = %*state, "Scheduler not startable, ignoring start");
                return;
            }
            *state = SchedulerState::Active;
        }
        *self.cadence.write().await = Some(cadence);

        let (tx, rx) = watch::channel(false);
        *self.shutdown.lock().await = Some(tx);

        info!(?cadence, "Starting scheduler");
        let handle = tokio::spawn(run_loop(
            self.checker.clone(),
            cadence,
            Arc::clone(&self.state),
            Arc::clone(&self.sweep_running),
            rx,
        ));
        *self.handle.lock().await = Some(handle);
    }

    pub async fn stop(&self) {
        {
            let mut state = self.state.write().await;
            if !state.can_transition_to(SchedulerState::Stopping) {
                return;
            }
            *state = SchedulerState::Stopping;
        }
        info!("Stopping scheduler");

        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduler loop ended abnormally");
                *self.state.write().await = SchedulerState::Stopped;
            }
        }
    }
}

async fn run_loop(
    checker: Checker,
    cadence: Cadence,
    state: Arc<RwLock<SchedulerState>>,
    sweep_running: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut scheduled = None;
    loop {
        let delay = match cadence {
            Cadence::WallClock { minutes } => {
                let now = Utc::now();
                let tick = next_wall_tick(now, scheduled, minutes);
                scheduled = Some(tick);
                (tick - now).to_std().unwrap_or(Duration::ZERO)
            }
            Cadence::Every(period) => period,
        };
        debug!(delay_ms = delay.as_millis() as u64, "Waiting for next tick");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
        on_tick(&checker, &sweep_running);
    }

    *state.write().await = SchedulerState::Stopped;
    info!("Scheduler stopped");
}

fn on_tick(checker: &Checker, sweep_running: &Arc<AtomicBool>) {
    if sweep_running
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        info!("Previous sweep still running, skipping tick");
        return;
    }

    info!("Running scheduled target checks");
    let checker = checker.clone();
    let guard = SweepGuard(Arc::clone(sweep_running));
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = checker.check_all_now().await {
            error!(error = %e, "Scheduled sweep failed");
        }
    });
}

/// Returns the sweep state to idle however the sweep task ends.
struct SweepGuard(Arc<AtomicBool>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
