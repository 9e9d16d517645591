//! Task data structure and related functionality.
//!
//! This module defines the `Task` record, the `TaskStatus` catalog entry it
//! references, and the calculations that depend only on the task's own fields
//! (planned duration, effective duration, display title).

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::fields::EffectiveDuration;

/// Display value used whenever a title or metric is absent.
pub const NOT_APPLICABLE: &str = "n/a";

/// A status value a task can be in. Only `is_done` carries reporting semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_done: bool,
}

impl TaskStatus {
    pub fn new(id: u64, title: impl Into<String>, is_done: bool) -> Self {
        TaskStatus {
            id,
            title: title.into(),
            description: None,
            is_done,
        }
    }
}

/// A unit of planned work belonging to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: Option<String>,
    pub planned_start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub project: u64,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub last_status_change: NaiveDate,
}

impl Task {
    /// Create a task with no dates, description or status.
    pub fn new(id: u64, project: u64, last_status_change: NaiveDate) -> Self {
        Task {
            id,
            title: None,
            planned_start_date: None,
            planned_end_date: None,
            project,
            description: None,
            status: None,
            last_status_change,
        }
    }

    /// The title, or `"n/a"` when it is unset or empty.
    pub fn get_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => NOT_APPLICABLE,
        }
    }

    /// Planned end minus planned start.
    ///
    /// Zero when either date is missing or the range is inverted.
    pub fn planned_duration(&self) -> Duration {
        match (self.planned_start_date, self.planned_end_date) {
            (Some(start), Some(end)) if start <= end => end - start,
            _ => Duration::zero(),
        }
    }

    /// Time from planned start to the status change that marked the task done.
    ///
    /// Only a done task has an effective duration; everything else, including a
    /// done task that never had a planned start, is `NotApplicable`.
    pub fn effective_duration(&self) -> EffectiveDuration {
        if !self.is_done() {
            return EffectiveDuration::NotApplicable;
        }
        match self.planned_start_date {
            Some(start) if start > self.last_status_change => {
                EffectiveDuration::Elapsed(Duration::zero())
            }
            Some(start) => EffectiveDuration::Elapsed(self.last_status_change - start),
            None => EffectiveDuration::NotApplicable,
        }
    }

    /// Change the status, stamping `last_status_change` when it actually changed.
    pub fn set_status(&mut self, status: Option<TaskStatus>, today: NaiveDate) -> bool {
        let changed = self.status.as_ref().map(|s| s.id) != status.as_ref().map(|s| s.id);
        self.status = status;
        if changed {
            self.last_status_change = today;
        }
        changed
    }

    /// Whether the task's status is flagged as done.
    pub fn is_done(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_done)
    }

    /// The structured representation exchanged with API consumers.
    pub fn to_json(&self) -> TaskJson {
        TaskJson {
            id: self.id,
            title: self.title.clone(),
            planned_end_date: self.planned_end_date,
            planned_start_date: self.planned_start_date,
            project: self.project,
            description: self.description.clone(),
            status: self.status.as_ref().map(|s| s.id),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.get_title())
    }
}

/// Projection of a task without any derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskJson {
    pub id: u64,
    pub title: Option<String>,
    pub planned_end_date: Option<NaiveDate>,
    pub planned_start_date: Option<NaiveDate>,
    pub project: u64,
    pub description: Option<String>,
    pub status: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task() -> Task {
        Task::new(7, 1, date(2024, 1, 5))
    }

    #[test]
    fn test_planned_duration_without_dates_is_zero() {
        let mut t = task();
        assert_eq!(t.planned_duration(), Duration::zero());
        t.planned_start_date = Some(date(2024, 1, 1));
        assert_eq!(t.planned_duration(), Duration::zero());
        t.planned_start_date = None;
        t.planned_end_date = Some(date(2024, 1, 1));
        assert_eq!(t.planned_duration(), Duration::zero());
    }

    #[test]
    fn test_planned_duration_inverted_range_is_zero() {
        let mut t = task();
        t.planned_start_date = Some(date(2024, 2, 1));
        t.planned_end_date = Some(date(2024, 1, 1));
        assert_eq!(t.planned_duration(), Duration::zero());
    }

    #[test]
    fn test_planned_duration_counts_days() {
        let mut t = task();
        t.planned_start_date = Some(date(2024, 1, 1));
        t.planned_end_date = Some(date(2024, 1, 10));
        assert_eq!(t.planned_duration(), Duration::days(9));
    }

    #[test]
    fn test_effective_duration_requires_done_status() {
        let mut t = task();
        t.planned_start_date = Some(date(2024, 1, 1));
        assert_eq!(t.effective_duration(), EffectiveDuration::NotApplicable);

        t.status = Some(TaskStatus::new(2, "Started", false));
        assert_eq!(t.effective_duration(), EffectiveDuration::NotApplicable);
    }

    #[test]
    fn test_effective_duration_for_done_task() {
        let mut t = task();
        t.planned_start_date = Some(date(2024, 1, 1));
        t.status = Some(TaskStatus::new(3, "Done", true));
        assert_eq!(t.effective_duration(), EffectiveDuration::Elapsed(Duration::days(4)));

        t.last_status_change = date(2023, 12, 24);
        assert_eq!(t.effective_duration(), EffectiveDuration::Elapsed(Duration::zero()));
    }

    #[test]
    fn test_effective_duration_done_without_start() {
        let mut t = task();
        t.status = Some(TaskStatus::new(3, "Done", true));
        assert_eq!(t.effective_duration(), EffectiveDuration::NotApplicable);
    }

    #[test]
    fn test_title_and_display() {
        let mut t = task();
        assert_eq!(t.get_title(), "n/a");
        assert_eq!(t.to_string(), "7 n/a");

        t.title = Some(String::new());
        assert_eq!(t.get_title(), "n/a");

        t.title = Some("Write invoice module".into());
        assert_eq!(t.get_title(), "Write invoice module");
        assert_eq!(t.to_string(), "7 Write invoice module");
    }

    #[test]
    fn test_set_status_stamps_change_date() {
        let mut t = task();
        let today = date(2024, 3, 1);
        assert!(t.set_status(Some(TaskStatus::new(1, "Planned", false)), today));
        assert_eq!(t.last_status_change, today);

        let later = date(2024, 3, 9);
        assert!(!t.set_status(Some(TaskStatus::new(1, "Planned", false)), later));
        assert_eq!(t.last_status_change, today);
    }

    #[test]
    fn test_json_projection_excludes_metrics() {
        let mut t = task();
        t.title = Some("Spec".into());
        t.status = Some(TaskStatus::new(3, "Done", true));
        let value = serde_json::to_value(t.to_json()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 7);
        assert!(!keys.contains(&"last_status_change"));
        assert!(!keys.iter().any(|k| k.contains("effort") || k.contains("duration")));
        assert_eq!(value["status"], 3);
    }
}
