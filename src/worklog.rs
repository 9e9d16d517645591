//! Records attached to a task: logged work intervals and planned assignments.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A logged interval of actual work against a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkEntry {
    pub id: u64,
    pub task: u64,
    pub employee: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveDateTime>,
    pub stop_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl WorkEntry {
    /// Both timestamps are present.
    pub fn is_complete(&self) -> bool {
        self.start_time.is_some() && self.stop_time.is_some()
    }

    /// Start lies after stop.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start_time, self.stop_time), (Some(start), Some(stop)) if start > stop)
    }

    /// Logged work in seconds, 0 when a timestamp is missing.
    pub fn effort(&self) -> i64 {
        match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => (stop - start).num_seconds(),
            _ => 0,
        }
    }
}

/// A planned-effort allocation of an employee to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAssignment {
    pub id: u64,
    pub task: u64,
    pub employee: String,
    /// Planned effort in hours.
    pub planned_effort: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn entry(start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> WorkEntry {
        WorkEntry {
            id: 1,
            task: 1,
            employee: "jdoe".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            start_time: start,
            stop_time: stop,
            short_description: None,
            description: None,
        }
    }

    #[test]
    fn test_effort_in_seconds() {
        assert_eq!(entry(Some(at(9, 0)), Some(at(10, 30))).effort(), 5400);
        assert_eq!(entry(Some(at(9, 0)), None).effort(), 0);
    }

    #[test]
    fn test_completeness_and_inversion() {
        assert!(!entry(None, Some(at(9, 0))).is_complete());
        assert!(entry(Some(at(11, 0)), Some(at(9, 0))).is_inverted());
        assert!(!entry(Some(at(9, 0)), Some(at(9, 0))).is_inverted());
    }
}
