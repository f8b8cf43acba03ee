//! Text rendering for the terminal

use mzuzu_core::models::{Config, TimerSnapshot, TimerState, TimerStatus};
use mzuzu_core::time::{format_countdown, remaining_minutes};

pub fn state_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Running => "Meditating",
        TimerState::Paused => "Paused",
        TimerState::Stopped => "Stopped",
        TimerState::Completed => "Completed",
    }
}

pub fn status_line(status: &TimerStatus) -> String {
    let mut line = format!(
        "{:<10} {}",
        state_label(status.state),
        status.remaining_display
    );

    if status.total_millis != status.selected_millis {
        line.push_str(&format!(
            "  (session {} min, {} min added)",
            remaining_minutes(status.selected_millis),
            remaining_minutes(status.total_millis - status.selected_millis)
        ));
    } else {
        line.push_str(&format!(
            "  (session {} min)",
            remaining_minutes(status.selected_millis)
        ));
    }

    line
}

pub fn snapshot_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "{:<10} {}",
        state_label(snapshot.state),
        format_countdown(snapshot.remaining_millis)
    )
}

pub fn config_lines(config: &Config) -> Vec<String> {
    vec![
        format!("socket:        {}", config.daemon.socket_path),
        format!("log level:     {}", config.daemon.log_level),
        format!(
            "session:       {} min",
            remaining_minutes(config.timer.selected_duration_millis)
        ),
        format!(
            "snooze:        {} min",
            remaining_minutes(config.timer.snooze_millis)
        ),
        format!("tick interval: {} ms", config.timer.tick_interval_millis),
        format!("max session:   {} min", config.timer.max_duration_minutes),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: TimerState, remaining: i64, selected: i64, total: i64) -> TimerStatus {
        serde_json::from_value(serde_json::json!({
            "state": state,
            "remaining_millis": remaining,
            "remaining_display": format_countdown(remaining),
            "selected_millis": selected,
            "total_millis": total,
            "session_id": "00000000-0000-0000-0000-000000000000",
        }))
        .unwrap()
    }

    #[test]
    fn test_status_line() {
        let running = status(TimerState::Running, 240_000, 300_000, 300_000);
        assert_eq!(status_line(&running), "Meditating 04:00  (session 5 min)");

        let snoozed = status(TimerState::Paused, 330_500, 300_000, 420_000);
        assert_eq!(
            status_line(&snoozed),
            "Paused     05:31  (session 5 min, 2 min added)"
        );
    }

    #[test]
    fn test_snapshot_line() {
        let snapshot = TimerSnapshot {
            state: TimerState::Completed,
            remaining_millis: 0,
        };
        assert_eq!(snapshot_line(&snapshot), "Completed  00:00");
    }

    #[test]
    fn test_config_lines() {
        let lines = config_lines(&Config::default());
        assert_eq!(lines.len(), 6);
        assert!(lines[2].ends_with("5 min"));
        assert!(lines[3].ends_with("2 min"));
    }
}
