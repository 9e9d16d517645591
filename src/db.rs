//! Database operations and utility functions for task reporting.
//!
//! This module provides the JSON-file backed `Database` that stores projects,
//! statuses, tasks, work entries and assignments, implements the repository
//! traits the reporting code reads through, and hosts the parsing and
//! formatting helpers used by the command handlers.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::project::Project;
use crate::report::{format_days, format_hours, TaskMetrics};
use crate::repository::{AssignmentRepository, WorkLogRepository};
use crate::task::{Task, TaskStatus};
use crate::worklog::{EmployeeAssignment, WorkEntry};

/// In-memory database persisted as a single JSON file.
#[derive(Debug, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<TaskStatus>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub work_entries: Vec<WorkEntry>,
    #[serde(default)]
    pub assignments: Vec<EmployeeAssignment>,
}

fn default_statuses() -> Vec<TaskStatus> {
    vec![
        TaskStatus::new(1, "Planned", false),
        TaskStatus::new(2, "Started", false),
        TaskStatus::new(3, "Done", true),
    ]
}

impl Default for Database {
    fn default() -> Self {
        Database {
            projects: Vec::new(),
            statuses: default_statuses(),
            tasks: Vec::new(),
            work_entries: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

impl Database {
    /// Load database from JSON file, starting empty if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database file, starting empty");
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let mut db: Database = serde_json::from_str(&buf)?;
        db.resolve_statuses()?;
        Ok(db)
    }

    /// Refresh each task's status from the catalog so `statuses` stays the
    /// source of truth for `is_done`.
    fn resolve_statuses(&mut self) -> Result<()> {
        for task in self.tasks.iter_mut() {
            if let Some(current) = task.status.as_ref() {
                let resolved = self
                    .statuses
                    .iter()
                    .find(|s| s.id == current.id)
                    .cloned()
                    .ok_or_else(|| Error::StatusNotFound(current.id.to_string()))?;
                task.status = Some(resolved);
            }
        }
        Ok(())
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn next_project_id(&self) -> u64 {
        self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    fn next_work_entry_id(&self) -> u64 {
        self.work_entries.iter().map(|w| w.id).max().unwrap_or(0) + 1
    }

    fn next_assignment_id(&self) -> u64 {
        self.assignments.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    /// Create a project and return its id.
    pub fn add_project(&mut self, title: &str, description: Option<String>) -> Result<u64> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("Project title cannot be empty".into()));
        }
        let mut project = Project::new(self.next_project_id(), title);
        project.description = description;
        let id = project.id;
        info!(project = id, title = %project.title, "project created");
        self.projects.push(project);
        Ok(id)
    }

    /// Get a project by ID.
    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Look up a status by id or by case-insensitive title.
    pub fn find_status(&self, key: &str) -> Result<TaskStatus> {
        let key = key.trim();
        let found = match key.parse::<u64>() {
            Ok(id) => self.statuses.iter().find(|s| s.id == id),
            Err(_) => self.statuses.iter().find(|s| s.title.eq_ignore_ascii_case(key)),
        };
        found.cloned().ok_or_else(|| Error::StatusNotFound(key.to_string()))
    }

    /// Store a new task, assigning its id and stamping `last_status_change`.
    pub fn add_task(&mut self, mut task: Task, today: NaiveDate) -> Result<u64> {
        if self.project(task.project).is_none() {
            return Err(Error::ProjectNotFound(task.project));
        }
        task.id = self.next_task_id();
        task.last_status_change = today;
        let id = task.id;
        info!(task = id, project = task.project, "task created");
        self.tasks.push(task);
        Ok(id)
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Change a task's status; the change date is stamped when the status differs.
    pub fn set_task_status(&mut self, id: u64, status: Option<TaskStatus>, today: NaiveDate) -> Result<bool> {
        let task = self.get_mut(id).ok_or(Error::TaskNotFound(id))?;
        let changed = task.set_status(status, today);
        if changed {
            info!(task = id, status = ?task.status.as_ref().map(|s| &s.title), "task status changed");
        }
        Ok(changed)
    }

    /// Remove a task together with its work entries and assignments.
    pub fn delete_task(&mut self, id: u64) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        let task = self.tasks.remove(idx);
        let before = (self.work_entries.len(), self.assignments.len());
        self.work_entries.retain(|w| w.task != id);
        self.assignments.retain(|a| a.task != id);
        info!(
            task = id,
            work_entries = before.0 - self.work_entries.len(),
            assignments = before.1 - self.assignments.len(),
            "task deleted"
        );
        Ok(task)
    }

    /// Remove a project and every task belonging to it.
    pub fn delete_project(&mut self, id: u64) -> Result<Project> {
        let idx = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(Error::ProjectNotFound(id))?;
        let ids: HashSet<u64> = self.tasks.iter().filter(|t| t.project == id).map(|t| t.id).collect();
        for task_id in ids {
            self.delete_task(task_id)?;
        }
        Ok(self.projects.remove(idx))
    }

    /// Store a work entry against an existing task and return its id.
    pub fn add_work_entry(&mut self, mut entry: WorkEntry) -> Result<u64> {
        if self.get(entry.task).is_none() {
            return Err(Error::TaskNotFound(entry.task));
        }
        entry.id = self.next_work_entry_id();
        let id = entry.id;
        info!(work_entry = id, task = entry.task, seconds = entry.effort(), "work logged");
        self.work_entries.push(entry);
        Ok(id)
    }

    /// Remove a work entry by ID.
    pub fn delete_work_entry(&mut self, id: u64) -> Result<WorkEntry> {
        let idx = self
            .work_entries
            .iter()
            .position(|w| w.id == id)
            .ok_or(Error::WorkEntryNotFound(id))?;
        Ok(self.work_entries.remove(idx))
    }

    /// Store an assignment against an existing task and return its id.
    pub fn add_assignment(&mut self, mut assignment: EmployeeAssignment) -> Result<u64> {
        if self.get(assignment.task).is_none() {
            return Err(Error::TaskNotFound(assignment.task));
        }
        if !assignment.planned_effort.is_finite() {
            return Err(Error::InvalidInput("Planned effort must be a finite number".into()));
        }
        assignment.id = self.next_assignment_id();
        let id = assignment.id;
        info!(assignment = id, task = assignment.task, effort = assignment.planned_effort, "employee assigned");
        self.assignments.push(assignment);
        Ok(id)
    }

    /// Remove an assignment by ID.
    pub fn delete_assignment(&mut self, id: u64) -> Result<EmployeeAssignment> {
        let idx = self
            .assignments
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::AssignmentNotFound(id))?;
        Ok(self.assignments.remove(idx))
    }
}

impl WorkLogRepository for Database {
    fn find_work_entries_by_task(&self, task_id: u64) -> Result<Vec<WorkEntry>> {
        let mut entries: Vec<WorkEntry> = self.work_entries.iter().filter(|w| w.task == task_id).cloned().collect();
        entries.sort_by_key(|w| w.id);
        debug!(task = task_id, count = entries.len(), "work entries read");
        Ok(entries)
    }
}

impl AssignmentRepository for Database {
    fn find_assignments_by_task(&self, task_id: u64) -> Result<Vec<EmployeeAssignment>> {
        let mut assignments: Vec<EmployeeAssignment> =
            self.assignments.iter().filter(|a| a.task == task_id).cloned().collect();
        assignments.sort_by_key(|a| a.id);
        debug!(task = task_id, count = assignments.len(), "assignments read");
        Ok(assignments)
    }
}

/// Parse a date: "today", "tomorrow", "yesterday", "in Nd", "in Nw" or YYYY-MM-DD.
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        // Out-of-range offsets are rejected rather than overflowing.
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Parse a timestamp, either full ("YYYY-MM-DD HH:MM[:SS]", 'T' separator allowed)
/// or a bare time of day on `date`.
pub fn parse_time_input(s: &str, date: NaiveDate) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(date.and_time(t));
        }
    }
    None
}

/// Format an optional date for display.
pub fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

/// Print tasks with their metrics in a formatted table.
pub fn print_table(rows: &[(&Task, TaskMetrics)], db: &Database) {
    println!(
        "{:<5} {:<24} {:<14} {:<10} {:<10} {:<10} {:>6} {:>8} {:>6} {:>8}",
        "ID", "Title", "Project", "Status", "Start", "End", "P.Days", "P.Effort", "E.Days", "E.Effort"
    );
    for (t, m) in rows {
        let project = db.project(t.project).map(|p| p.title.as_str()).unwrap_or("-");
        let status = t.status.as_ref().map(|s| s.title.as_str()).unwrap_or("-");
        println!(
            "{:<5} {:<24} {:<14} {:<10} {:<10} {:<10} {:>6} {:>8} {:>6} {:>8}",
            t.id,
            truncate(t.get_title(), 24),
            truncate(project, 14),
            truncate(status, 10),
            format_date(t.planned_start_date),
            format_date(t.planned_end_date),
            format_days(m.planned_duration),
            format_hours(m.planned_effort),
            m.effective_duration,
            format_hours(m.effective_effort),
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
