#![forbid(unsafe_code)]

pub mod config;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod probe;
pub mod stats;
pub mod store;

pub use config::MonitorConfig;
pub use model::{CheckResult, Group, Target, TargetStatus};
pub use monitor::{
    is_alert_worthy, Cadence, CheckError, Checker, GroupCheckSummary, Recorder, Scheduler,
    SchedulerError, SchedulerState, SweepState, SweepSummary,
};
pub use notify::{DispatchError, Notifier, TelegramDefaults, TelegramNotifier};
pub use probe::{HttpProber, ProbeError, ProbeOutcome, Prober};
pub use stats::Availability;
pub use store::{MemoryStore, SettingsStore, StoreError, TargetStore};
