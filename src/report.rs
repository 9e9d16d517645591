//! Derived reporting metrics for tasks.
//!
//! `TaskReporter` reads the work log and assignments of a task through the
//! injected repositories on every call and folds them into effort figures. It
//! also composes the task's export document: the task itself, one merged
//! document per work entry, and the four metrics appended to the task object.

use chrono::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::export::{serialize_object, ExportEngine, TASK_MODEL};
use crate::fields::{EffectiveDuration, IncompleteEntryPolicy};
use crate::repository::{AssignmentRepository, WorkLogRepository};
use crate::task::Task;
use crate::worklog::WorkEntry;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// All four metrics of a task, computed together for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskMetrics {
    pub planned_duration: Duration,
    pub planned_effort: f64,
    pub effective_duration: EffectiveDuration,
    pub effective_effort: f64,
}

/// Computes metrics from a work-log repository and an assignment repository.
pub struct TaskReporter<W, A> {
    work_log: W,
    assignments: A,
    policy: IncompleteEntryPolicy,
}

impl<W: WorkLogRepository, A: AssignmentRepository> TaskReporter<W, A> {
    pub fn new(work_log: W, assignments: A) -> Self {
        TaskReporter {
            work_log,
            assignments,
            policy: IncompleteEntryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IncompleteEntryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sum of the planned effort of every assignment to the task.
    pub fn planned_effort(&self, task: &Task) -> Result<f64> {
        let assignments = self.assignments.find_assignments_by_task(task.id)?;
        let total: f64 = assignments.iter().map(|a| a.planned_effort).sum();
        debug!(task = task.id, assignments = assignments.len(), total, "planned effort");
        Ok(total)
    }

    /// Logged work on the task, in hours.
    pub fn effective_effort(&self, task: &Task) -> Result<f64> {
        let entries = self.work_log.find_work_entries_by_task(task.id)?;
        let seconds = sum_effort(task.id, &entries, self.policy);
        debug!(task = task.id, entries = entries.len(), seconds, "effective effort");
        Ok(seconds as f64 / SECONDS_PER_HOUR)
    }

    pub fn planned_duration(&self, task: &Task) -> Duration {
        task.planned_duration()
    }

    pub fn effective_duration(&self, task: &Task) -> EffectiveDuration {
        task.effective_duration()
    }

    pub fn metrics(&self, task: &Task) -> Result<TaskMetrics> {
        Ok(TaskMetrics {
            planned_duration: task.planned_duration(),
            planned_effort: self.planned_effort(task)?,
            effective_duration: task.effective_duration(),
            effective_effort: self.effective_effort(task)?,
        })
    }

    /// Export the task together with its work entries and metrics.
    pub fn serialize_to_xml<E: ExportEngine>(&self, task: &Task, engine: &E) -> Result<E::Document> {
        let mut doc = serialize_object(engine, task);
        for entry in self.work_log.find_work_entries_by_task(task.id)? {
            let entry_doc = serialize_object(engine, &entry);
            doc = engine.merge_documents(doc, entry_doc);
        }

        let selector = format!("object/[@model='{TASK_MODEL}']");
        let fields = [
            ("Effective_Effort", format_hours(self.effective_effort(task)?)),
            ("Planned_Effort", format_hours(self.planned_effort(task)?)),
            ("Effective_Duration", task.effective_duration().to_string()),
            ("Planned_Duration", format_days(task.planned_duration())),
        ];
        for (name, value) in fields {
            doc = engine.append_field(doc, &selector, name, &value)?;
        }
        Ok(doc)
    }
}

/// Fold work entries into seconds of effort.
///
/// Inverted entries count as zero. Incomplete entries follow `policy`.
pub fn sum_effort(task_id: u64, entries: &[WorkEntry], policy: IncompleteEntryPolicy) -> i64 {
    let mut total = 0;
    for entry in entries {
        if !entry.is_complete() {
            warn!(task = task_id, entry = entry.id, ?policy, "work entry without start or stop time");
            if policy == IncompleteEntryPolicy::Reset {
                total = 0;
            }
        } else if !entry.is_inverted() {
            total += entry.effort();
        }
    }
    total
}

/// Hours rendered with at most two decimals and no trailing zeros.
pub fn format_hours(hours: f64) -> String {
    let s = format!("{hours:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Whole days of a duration.
pub fn format_days(d: Duration) -> String {
    d.num_days().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{XmlExport, WORK_MODEL};
    use crate::task::TaskStatus;
    use crate::worklog::EmployeeAssignment;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeRepo {
        entries: Vec<WorkEntry>,
        assignments: Vec<EmployeeAssignment>,
        reads: Cell<usize>,
    }

    impl WorkLogRepository for FakeRepo {
        fn find_work_entries_by_task(&self, task_id: u64) -> Result<Vec<WorkEntry>> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.entries.iter().filter(|e| e.task == task_id).cloned().collect())
        }
    }

    impl AssignmentRepository for FakeRepo {
        fn find_assignments_by_task(&self, task_id: u64) -> Result<Vec<EmployeeAssignment>> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.assignments.iter().filter(|a| a.task == task_id).cloned().collect())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        date(2024, 1, 2).and_hms_opt(h, m, 0).unwrap()
    }

    fn entry(id: u64, task: u64, start: Option<NaiveDateTime>, stop: Option<NaiveDateTime>) -> WorkEntry {
        WorkEntry {
            id,
            task,
            employee: "jdoe".into(),
            date: date(2024, 1, 2),
            start_time: start,
            stop_time: stop,
            short_description: None,
            description: None,
        }
    }

    fn assignment(id: u64, task: u64, effort: f64) -> EmployeeAssignment {
        EmployeeAssignment {
            id,
            task,
            employee: "jdoe".into(),
            planned_effort: effort,
            description: None,
        }
    }

    fn task(id: u64) -> Task {
        Task::new(id, 1, date(2024, 1, 5))
    }

    #[test]
    fn test_planned_effort_sums_assignments() {
        let repo = FakeRepo {
            assignments: vec![assignment(1, 1, 3.0), assignment(2, 1, 5.0), assignment(3, 1, 2.0), assignment(4, 2, 40.0)],
            ..Default::default()
        };
        let reporter = TaskReporter::new(&repo, &repo);
        assert_eq!(reporter.planned_effort(&task(1)).unwrap(), 10.0);
        assert_eq!(reporter.planned_effort(&task(3)).unwrap(), 0.0);
    }

    #[test]
    fn test_effective_effort_resets_on_incomplete_entry() {
        let repo = FakeRepo {
            entries: vec![
                entry(1, 1, Some(at(9, 0)), Some(at(10, 0))),
                entry(2, 1, Some(at(11, 0)), None),
                entry(3, 1, Some(at(13, 0)), Some(at(13, 30))),
            ],
            ..Default::default()
        };
        let reporter = TaskReporter::new(&repo, &repo);
        assert_eq!(reporter.effective_effort(&task(1)).unwrap(), 0.5);

        let reporter = reporter.with_policy(IncompleteEntryPolicy::Skip);
        assert_eq!(reporter.effective_effort(&task(1)).unwrap(), 1.5);
    }

    #[test]
    fn test_effective_effort_ignores_inverted_entries() {
        let repo = FakeRepo {
            entries: vec![
                entry(1, 1, Some(at(9, 0)), Some(at(10, 0))),
                entry(2, 1, Some(at(12, 0)), Some(at(11, 0))),
                entry(3, 1, Some(at(13, 0)), Some(at(13, 30))),
            ],
            ..Default::default()
        };
        let reporter = TaskReporter::new(&repo, &repo);
        assert_eq!(reporter.effective_effort(&task(1)).unwrap(), 1.5);
        assert_eq!(reporter.effective_effort(&task(2)).unwrap(), 0.0);
    }

    #[test]
    fn test_metrics_are_recomputed_on_each_call() {
        let repo = FakeRepo {
            assignments: vec![assignment(1, 1, 4.0)],
            ..Default::default()
        };
        let reporter = TaskReporter::new(&repo, &repo);
        reporter.metrics(&task(1)).unwrap();
        reporter.metrics(&task(1)).unwrap();
        assert_eq!(repo.reads.get(), 4);
    }

    #[test]
    fn test_serialize_to_xml_merges_entries_and_appends_metrics() {
        let repo = FakeRepo {
            entries: vec![
                entry(10, 1, Some(at(9, 0)), Some(at(10, 0))),
                entry(11, 1, Some(at(10, 0)), Some(at(11, 30))),
                entry(12, 2, Some(at(9, 0)), Some(at(17, 0))),
            ],
            assignments: vec![assignment(1, 1, 3.0), assignment(2, 1, 5.0)],
            ..Default::default()
        };
        let mut t = task(1);
        t.title = Some("Migrate ledger".into());
        t.planned_start_date = Some(date(2024, 1, 1));
        t.planned_end_date = Some(date(2024, 1, 10));
        t.status = Some(TaskStatus::new(3, "Done", true));

        let reporter = TaskReporter::new(&repo, &repo);
        let doc = reporter.serialize_to_xml(&t, &XmlExport).unwrap();

        let tasks: Vec<_> = doc.objects_of(TASK_MODEL).collect();
        assert_eq!(tasks.len(), 1);
        let names: Vec<&str> = tasks[0].appended.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Effective_Effort", "Planned_Effort", "Effective_Duration", "Planned_Duration"]);
        let values: Vec<&str> = tasks[0].appended.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["2.5", "8", "4", "9"]);

        let work_pks: Vec<u64> = doc.objects_of(WORK_MODEL).map(|o| o.pk).collect();
        assert_eq!(work_pks, vec![10, 11]);
        assert!(doc.objects_of(WORK_MODEL).all(|o| o.appended.is_empty()));
    }

    #[test]
    fn test_serialize_to_xml_marks_not_applicable() {
        let repo = FakeRepo::default();
        let reporter = TaskReporter::new(&repo, &repo);
        let xml = reporter.serialize_to_xml(&task(5), &XmlExport).unwrap().to_xml_string();
        assert!(xml.contains("<Effective_Duration>n/a</Effective_Duration>"));
        assert!(xml.contains("<Planned_Duration>0</Planned_Duration>"));
        assert!(xml.contains("<Effective_Effort>0</Effective_Effort>"));
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0.0), "0");
        assert_eq!(format_hours(10.0), "10");
        assert_eq!(format_hours(0.5), "0.5");
        assert_eq!(format_hours(1.0 / 3.0), "0.33");
    }
}
