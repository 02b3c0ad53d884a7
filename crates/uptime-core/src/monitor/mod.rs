pub mod checker;
pub mod error;
pub mod recorder;
pub mod scheduler;
pub mod state;
pub mod transition;

pub use checker::{Checker, GroupCheckSummary, SweepSummary};
pub use error::{CheckError, SchedulerError};
pub use recorder::Recorder;
pub use scheduler::{next_tick_after, Cadence, Scheduler};
pub use state::{SchedulerState, SweepState};
pub use transition::is_alert_worthy;
