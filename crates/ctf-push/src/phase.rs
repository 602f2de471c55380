use chrono::DateTime;
use chrono::Utc;
use std::fmt;

/// The contest's coarse phase, as reported by the `/info` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::NotStarted => "not started",
            Phase::Running => "running",
            Phase::Completed => "completed",
        })
    }
}

/// Phase and time-remaining-until-next-transition, given the contest
/// window — spec.md §4.7 "info: ... send the contest phase ... with
/// remaining HH:MM:SS".
pub fn phase_at(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> (Phase, chrono::Duration) {
    if now < start {
        (Phase::NotStarted, start - now)
    } else if now < end {
        (Phase::Running, end - now)
    } else {
        (Phase::Completed, chrono::Duration::zero())
    }
}

/// Renders a `chrono::Duration` as `HH:MM:SS`, clamped to zero.
pub fn format_remaining(remaining: chrono::Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_remaining_duration() {
        assert_eq!(format_remaining(chrono::Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_remaining(chrono::Duration::seconds(0)), "00:00:00");
    }

    #[test]
    fn phase_transitions_on_boundaries() {
        let start: DateTime<Utc> = "2026-01-01T10:00:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2026-01-02T10:00:00Z".parse().unwrap();
        assert_eq!(phase_at(start - chrono::Duration::seconds(1), start, end).0, Phase::NotStarted);
        assert_eq!(phase_at(start, start, end).0, Phase::Running);
        assert_eq!(phase_at(end, start, end).0, Phase::Completed);
    }
}
