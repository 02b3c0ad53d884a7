use crate::model::TargetStatus;

/// Edge trigger: only the leading edge of an outage (`up` → `down`) alerts.
/// Targets that start `unknown` or stay `down` stay silent, and so does recovery.
pub fn is_alert_worthy(previous: TargetStatus, current: TargetStatus) -> bool {
    previous == TargetStatus::Up && current == TargetStatus::Down
}
