//! Read interfaces the reporting code consumes.
//!
//! Implementations return records in their natural order (ascending id for
//! the JSON `Database`). Nothing here caches: every call observes whatever the
//! backing store holds at that moment.

use crate::error::Result;
use crate::worklog::{EmployeeAssignment, WorkEntry};

pub trait AssignmentRepository {
    fn find_assignments_by_task(&self, task_id: u64) -> Result<Vec<EmployeeAssignment>>;
}

pub trait WorkLogRepository {
    fn find_work_entries_by_task(&self, task_id: u64) -> Result<Vec<WorkEntry>>;
}

impl<T: AssignmentRepository + ?Sized> AssignmentRepository for &T {
    fn find_assignments_by_task(&self, task_id: u64) -> Result<Vec<EmployeeAssignment>> {
        (**self).find_assignments_by_task(task_id)
    }
}

impl<T: WorkLogRepository + ?Sized> WorkLogRepository for &T {
    fn find_work_entries_by_task(&self, task_id: u64) -> Result<Vec<WorkEntry>> {
        (**self).find_work_entries_by_task(task_id)
    }
}
