//! Task durations from free-form clock strings

use chrono::NaiveTime;

use crate::task::Task;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Clock notations accepted in `time_start` / `time_end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockFormat {
    /// `HH:mm`, e.g. `09:00` or `17:45`
    TwentyFourHour,
    /// `h:mm a`, e.g. `9:00 AM`
    TwelveHour,
}

impl ClockFormat {
    /// Formats in the order they are tried
    pub const ALL: [ClockFormat; 2] = [ClockFormat::TwentyFourHour, ClockFormat::TwelveHour];

    fn pattern(self) -> &'static str {
        match self {
            Self::TwentyFourHour => "%H:%M",
            Self::TwelveHour => "%I:%M %p",
        }
    }

    pub fn parse(self, raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw.trim(), self.pattern()).ok()
    }
}

/// Minutes from `start` to `end`, treating an earlier end as the next day.
///
/// Both endpoints must parse in the same notation. The first notation that
/// reads both wins; the other is not consulted.
pub fn span_minutes(start: &str, end: &str) -> Option<i64> {
    ClockFormat::ALL.iter().find_map(|format| {
        let start = format.parse(start)?;
        let end = format.parse(end)?;
        let minutes = (end - start).num_minutes();
        Some(if minutes < 0 {
            minutes + MINUTES_PER_DAY
        } else {
            minutes
        })
    })
}

/// Duration a task contributes; 0 when either time is missing or unreadable
pub fn task_minutes(task: &Task) -> i64 {
    match (task.time_start.as_deref(), task.time_end.as_deref()) {
        (Some(start), Some(end)) => span_minutes(start, end).unwrap_or(0),
        _ => 0,
    }
}

/// Render minutes as `"{h}h {m}m"`, or `"{m}m"` under an hour
pub fn format_minutes(total: i64) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Read a label produced by [`format_minutes`] back into minutes.
///
/// Unreadable parts count as zero.
pub fn parse_minutes_label(label: &str) -> i64 {
    label
        .split_whitespace()
        .map(|part| {
            if let Some(hours) = part.strip_suffix('h') {
                hours.parse::<i64>().map_or(0, |h| h * 60)
            } else if let Some(minutes) = part.strip_suffix('m') {
                minutes.parse::<i64>().unwrap_or(0)
            } else {
                0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timed(start: &str, end: &str) -> Task {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Task::new("t", date).with_time_range(start, end)
    }

    #[test]
    fn test_twenty_four_hour_span() {
        assert_eq!(span_minutes("09:00", "10:30"), Some(90));
        assert_eq!(span_minutes("9:00", "17:15"), Some(495));
    }

    #[test]
    fn test_twelve_hour_span() {
        assert_eq!(span_minutes("9:00 AM", "10:30 AM"), Some(90));
        assert_eq!(span_minutes("11:30 AM", "1:00 PM"), Some(90));
    }

    #[test]
    fn test_overnight_span_wraps() {
        assert_eq!(span_minutes("23:00", "01:00"), Some(120));
        assert_eq!(span_minutes("11:00 PM", "1:00 AM"), Some(120));
    }

    #[test]
    fn test_equal_endpoints_are_zero() {
        assert_eq!(span_minutes("08:00", "08:00"), Some(0));
    }

    #[test]
    fn test_unreadable_or_mixed_is_zero() {
        assert_eq!(span_minutes("soon", "later"), None);
        assert_eq!(span_minutes("09:00", "10:30 AM"), None);
        assert_eq!(task_minutes(&timed("09:00", "10:30 AM")), 0);
        assert_eq!(task_minutes(&timed("", "10:30")), 0);

        let mut untimed = timed("09:00", "10:00");
        untimed.time_end = None;
        assert_eq!(task_minutes(&untimed), 0);
    }

    #[test]
    fn test_twelve_hour_counted_once() {
        assert_eq!(task_minutes(&timed("9:00 AM", "10:30 AM")), 90);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(135), "2h 15m");
    }

    #[test]
    fn test_label_reads_back() {
        for minutes in [0, 7, 60, 90, 1441] {
            assert_eq!(parse_minutes_label(&format_minutes(minutes)), minutes);
        }
        assert_eq!(parse_minutes_label("xh 5m"), 5);
    }
}
