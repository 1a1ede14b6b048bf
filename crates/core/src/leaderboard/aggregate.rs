//! Per-user summaries and rankings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::duration::{format_minutes, task_minutes};
use crate::profile::Profile;
use crate::task::{DateWindow, Task, TaskPriority};

/// A user taking part in a leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contestant {
    pub user_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for Contestant {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id.clone(),
            name: profile.display_name().to_string(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Derived statistics for one user over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub user_id: String,
    pub name: String,
    /// Focused time label, e.g. `"2h 15m"`
    pub hours: String,
    pub total_minutes: i64,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub score: f64,
    pub avatar_url: Option<String>,
}

/// The two rankings shown on the leaderboard screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    /// Most focused time first
    pub by_time: Vec<UserAggregate>,
    /// Highest score first
    pub by_score: Vec<UserAggregate>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }
}

/// Score of one completed task; unknown codes weigh as low priority
pub fn priority_weight(code: &str) -> f64 {
    TaskPriority::from_code(code)
        .unwrap_or(TaskPriority::Low)
        .weight()
}

/// Summarize one user's tasks.
///
/// Only completed tasks contribute time and score.
pub fn summarize<'a>(
    contestant: &Contestant,
    tasks: impl IntoIterator<Item = &'a Task>,
) -> UserAggregate {
    let mut completed_tasks = 0;
    let mut pending_tasks = 0;
    let mut total_minutes = 0;
    let mut score = 0.0;

    for task in tasks {
        if task.is_completed {
            completed_tasks += 1;
            total_minutes += task_minutes(task);
            score += priority_weight(&task.priority_code);
        } else {
            pending_tasks += 1;
        }
    }

    UserAggregate {
        user_id: contestant.user_id.clone(),
        name: contestant.name.clone(),
        hours: format_minutes(total_minutes),
        total_minutes,
        completed_tasks,
        pending_tasks,
        score,
        avatar_url: contestant.avatar_url.clone(),
    }
}

/// Rank every contestant by the tasks they own inside `window`.
///
/// Contestants without tasks still appear with zero totals. Tasks of unknown
/// users, or dated outside the window, are ignored; malformed dates count as
/// `today`. Both rankings keep contestant order among equal keys.
pub fn aggregate(
    tasks: &[Task],
    contestants: &[Contestant],
    window: &DateWindow,
    today: NaiveDate,
) -> Leaderboard {
    let mut by_user: HashMap<&str, Vec<&Task>> = HashMap::new();
    for task in tasks {
        let Some(user_id) = task.user_id.as_deref() else {
            continue;
        };
        if window.contains(task.day(today)) {
            by_user.entry(user_id).or_default().push(task);
        }
    }

    let summaries: Vec<UserAggregate> = contestants
        .iter()
        .map(|contestant| {
            let owned = by_user
                .get(contestant.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            summarize(contestant, owned.iter().copied())
        })
        .collect();

    let mut by_time = summaries.clone();
    by_time.sort_by(|a, b| b.total_minutes.cmp(&a.total_minutes));

    let mut by_score = summaries;
    by_score.sort_by(|a, b| b.score.total_cmp(&a.score));

    Leaderboard { by_time, by_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::parse_minutes_label;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contestant(id: &str) -> Contestant {
        Contestant {
            user_id: id.to_string(),
            name: id.to_uppercase(),
            avatar_url: None,
        }
    }

    fn done(user: &str, code: &str, start: &str, end: &str) -> Task {
        let mut task = Task::new("t", day(2024, 5, 10))
            .with_user_id(user)
            .with_time_range(start, end)
            .completed(true);
        task.priority_code = code.to_string();
        task
    }

    fn pending(user: &str) -> Task {
        Task::new("t", day(2024, 5, 10)).with_user_id(user)
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(priority_weight("3"), 3.0);
        assert_eq!(priority_weight("2"), 2.0);
        assert_eq!(priority_weight("1"), 1.0);
        assert_eq!(priority_weight("9"), 1.0);
        assert_eq!(priority_weight(""), 1.0);
    }

    #[test]
    fn test_summarize_scores_completed_only() {
        let tasks = vec![
            done("a", "3", "09:00", "10:00"),
            done("a", "2", "10:00", "10:30"),
            done("a", "1", "9:00 PM", "9:15 PM"),
            pending("a"),
        ];
        let summary = summarize(&contestant("a"), &tasks);

        assert_eq!(summary.score, 6.0);
        assert_eq!(summary.completed_tasks, 3);
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.total_minutes, 105);
        assert_eq!(summary.hours, "1h 45m");
    }

    #[test]
    fn test_unknown_code_scores_one() {
        let tasks = vec![done("a", "purple", "09:00", "09:30")];
        assert_eq!(summarize(&contestant("a"), &tasks).score, 1.0);
    }

    #[test]
    fn test_counts_add_up_per_user() {
        let tasks = vec![
            done("a", "1", "09:00", "10:00"),
            pending("a"),
            pending("b"),
            pending("b"),
            done("b", "2", "", ""),
        ];
        let board = aggregate(
            &tasks,
            &[contestant("a"), contestant("b")],
            &DateWindow::month_of(day(2024, 5, 1)),
            day(2024, 5, 20),
        );

        for summary in &board.by_time {
            let owned = tasks
                .iter()
                .filter(|t| t.user_id.as_deref() == Some(summary.user_id.as_str()))
                .count();
            assert_eq!(summary.completed_tasks + summary.pending_tasks, owned);
        }
    }

    #[test]
    fn test_rankings_sort_descending() {
        let tasks = vec![
            done("a", "3", "09:00", "09:30"),
            done("b", "1", "09:00", "12:00"),
            done("c", "2", "23:00", "01:00"),
        ];
        let board = aggregate(
            &tasks,
            &[contestant("a"), contestant("b"), contestant("c")],
            &DateWindow::month_of(day(2024, 5, 1)),
            day(2024, 5, 20),
        );

        let by_time: Vec<&str> = board.by_time.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(by_time, vec!["b", "c", "a"]);
        let by_score: Vec<&str> = board.by_score.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(by_score, vec!["a", "c", "b"]);

        // Sorting by the stored total matches sorting by the rendered label
        for pair in board.by_time.windows(2) {
            assert!(parse_minutes_label(&pair[0].hours) >= parse_minutes_label(&pair[1].hours));
        }
    }

    #[test]
    fn test_ties_keep_contestant_order() {
        let board = aggregate(
            &[],
            &[contestant("x"), contestant("y"), contestant("z")],
            &DateWindow::month_of(day(2024, 5, 1)),
            day(2024, 5, 20),
        );

        let ids: Vec<&str> = board.by_score.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        let ids: Vec<&str> = board.by_time.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        assert!(board.by_time.iter().all(|u| u.hours == "0m"));
    }

    #[test]
    fn test_window_and_unknown_users_filtered() {
        let mut outside = done("a", "3", "09:00", "10:00");
        outside.date = "2024-04-30".to_string();
        let mut malformed = done("a", "2", "09:00", "09:10");
        malformed.date = "not a date".to_string();
        let mut orphan = done("a", "3", "09:00", "10:00");
        orphan.user_id = None;
        let stranger = done("zz", "3", "09:00", "10:00");

        let board = aggregate(
            &[outside, malformed, orphan, stranger],
            &[contestant("a")],
            &DateWindow::month_of(day(2024, 5, 1)),
            day(2024, 5, 20),
        );

        assert_eq!(board.by_time.len(), 1);
        let a = &board.by_time[0];
        assert_eq!(a.completed_tasks, 1);
        assert_eq!(a.total_minutes, 10);
        assert_eq!(a.score, 2.0);
    }

    #[test]
    fn test_contestant_from_profile() {
        let profile = Profile::new("u-1", "sam@example.com")
            .with_username("sam")
            .with_avatar_url("https://img/sam.png");
        let contestant = Contestant::from(&profile);
        assert_eq!(contestant.name, "sam");
        assert_eq!(contestant.avatar_url.as_deref(), Some("https://img/sam.png"));
    }
}
