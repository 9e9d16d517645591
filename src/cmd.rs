//! Command implementations for the CLI interface.
//!
//! Each handler loads what it needs from the `Database`, reports through
//! `TaskReporter`, and prints to stdout. Failures are printed to stderr and
//! exit with status 1.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tracing::info;

use crm_reporting::db::*;
use crm_reporting::export::XmlExport;
use crm_reporting::fields::{IncompleteEntryPolicy, SortKey};
use crm_reporting::report::{format_days, format_hours, TaskMetrics, TaskReporter};
use crm_reporting::task::{Task, TaskJson};
use crm_reporting::worklog::{EmployeeAssignment, WorkEntry};

use crate::cli::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// List the task status catalog.
    Statuses,

    /// Add a new task to a project.
    Add {
        /// Owning project ID.
        #[arg(long)]
        project: u64,
        /// Short title for the task.
        #[arg(long)]
        title: Option<String>,
        /// Planned start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
        /// Planned end date, same formats as --start.
        #[arg(long)]
        end: Option<String>,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Initial status, by title or ID.
        #[arg(long)]
        status: Option<String>,
    },

    /// Update fields on a task.
    Update {
        /// Task ID.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Move the task to another project.
        #[arg(long)]
        project: Option<u64>,
        /// Clear the planned start date.
        #[arg(long)]
        clear_start: bool,
        /// Clear the planned end date.
        #[arg(long)]
        clear_end: bool,
    },

    /// Change a task's status ("none" clears it).
    SetStatus {
        /// Task ID.
        id: u64,
        /// Status title or ID.
        status: String,
    },

    /// Assign planned effort on a task to an employee.
    Assign {
        /// Task ID.
        task: u64,
        #[arg(long)]
        employee: String,
        /// Planned effort in hours.
        #[arg(long)]
        effort: f64,
        #[arg(long)]
        desc: Option<String>,
    },

    /// Remove an assignment by ID.
    Unassign {
        id: u64,
    },

    /// Log a work interval against a task.
    Log {
        /// Task ID.
        task: u64,
        #[arg(long)]
        employee: String,
        /// Day of the work (default: today).
        #[arg(long)]
        date: Option<String>,
        /// Start time: HH:MM or "YYYY-MM-DD HH:MM".
        #[arg(long)]
        start: Option<String>,
        /// Stop time: HH:MM or "YYYY-MM-DD HH:MM".
        #[arg(long)]
        stop: Option<String>,
        /// One-line summary.
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        desc: Option<String>,
    },

    /// Remove a work entry by ID.
    Unlog {
        id: u64,
    },

    /// List tasks with their metrics.
    List {
        /// Filter by project ID.
        #[arg(long)]
        project: Option<u64>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task with metrics, assignments and work log.
    View {
        id: u64,
    },

    /// Export a task with its work log and metrics as XML.
    Export {
        id: u64,
        /// Output file path (default: stdout).
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Print the JSON representation of one task, or of all tasks.
    Json {
        id: Option<u64>,
    },

    /// Delete a task together with its work entries and assignments.
    Delete {
        id: u64,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        title: String,
        #[arg(long)]
        desc: Option<String>,
    },
    /// List projects with their task counts.
    List,
    /// Delete a project and all of its tasks.
    Delete {
        id: u64,
    },
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn save(db: &Database, db_path: &Path) {
    if let Err(e) = db.save(db_path) {
        fail(format!("Failed to save database {}: {e}", db_path.display()));
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date_arg(label: &str, value: &str) -> NaiveDate {
    parse_date_input(value).unwrap_or_else(|| fail(format!("Invalid {label} date: '{value}'")))
}

fn metrics_or_exit(reporter: &TaskReporter<&Database, &Database>, task: &Task) -> TaskMetrics {
    reporter
        .metrics(task)
        .unwrap_or_else(|e| fail(format!("Failed to compute metrics for task {}: {e}", task.id)))
}

/// Manage projects.
pub fn cmd_project(db: &mut Database, db_path: &Path, action: ProjectAction) {
    match action {
        ProjectAction::Add { title, desc } => match db.add_project(&title, desc) {
            Ok(id) => {
                save(db, db_path);
                println!("Created project {id}: {}", title.trim());
            }
            Err(e) => fail(e),
        },
        ProjectAction::List => {
            if db.projects.is_empty() {
                println!("No projects.");
                return;
            }
            println!("{:<5} {:<30} {}", "ID", "Title", "Tasks");
            for p in &db.projects {
                let count = db.tasks.iter().filter(|t| t.project == p.id).count();
                println!("{:<5} {:<30} {}", p.id, truncate(&p.title, 30), count);
            }
        }
        ProjectAction::Delete { id } => match db.delete_project(id) {
            Ok(p) => {
                save(db, db_path);
                println!("Deleted project {}: {}", p.id, p.title);
            }
            Err(e) => fail(e),
        },
    }
}

/// List the status catalog.
pub fn cmd_statuses(db: &Database) {
    println!("{:<5} {:<20} {}", "ID", "Title", "Done");
    for s in &db.statuses {
        println!("{:<5} {:<20} {}", s.id, s.title, if s.is_done { "yes" } else { "no" });
    }
}

/// Add a new task to the database.
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    project: u64,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    desc: Option<String>,
    status: Option<String>,
) {
    let today = today();
    let mut task = Task::new(0, project, today);
    task.title = title;
    task.description = desc;
    task.planned_start_date = start.as_deref().map(|s| parse_date_arg("start", s));
    task.planned_end_date = end.as_deref().map(|s| parse_date_arg("end", s));
    if let Some(key) = status {
        task.status = Some(db.find_status(&key).unwrap_or_else(|e| fail(e)));
    }

    match db.add_task(task, today) {
        Ok(id) => {
            save(db, db_path);
            if let Some(t) = db.get(id) {
                println!("Added task {t}");
            }
        }
        Err(e) => fail(e),
    }
}

/// Update fields on an existing task.
pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: u64,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    desc: Option<String>,
    project: Option<u64>,
    clear_start: bool,
    clear_end: bool,
) {
    if let Some(p) = project {
        if db.project(p).is_none() {
            fail(format!("Project not found: {p}"));
        }
    }
    let start = start.as_deref().map(|s| parse_date_arg("start", s));
    let end = end.as_deref().map(|s| parse_date_arg("end", s));

    let Some(task) = db.get_mut(id) else {
        fail(format!("Task not found: {id}"));
    };
    if let Some(t) = title {
        task.title = Some(t);
    }
    if let Some(d) = desc {
        task.description = Some(d);
    }
    if let Some(p) = project {
        task.project = p;
    }
    if clear_start {
        task.planned_start_date = None;
    } else if start.is_some() {
        task.planned_start_date = start;
    }
    if clear_end {
        task.planned_end_date = None;
    } else if end.is_some() {
        task.planned_end_date = end;
    }
    let label = task.to_string();
    info!(task = id, "task updated");
    save(db, db_path);
    println!("Updated task {label}");
}

/// Change a task's status.
pub fn cmd_set_status(db: &mut Database, db_path: &Path, id: u64, status: String) {
    let status = if status.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(db.find_status(&status).unwrap_or_else(|e| fail(e)))
    };
    match db.set_task_status(id, status, today()) {
        Ok(true) => {
            save(db, db_path);
            println!("Status of task {id} changed.");
        }
        Ok(false) => println!("Status of task {id} unchanged."),
        Err(e) => fail(e),
    }
}

/// Record a planned-effort assignment.
pub fn cmd_assign(db: &mut Database, db_path: &Path, task: u64, employee: String, effort: f64, desc: Option<String>) {
    let assignment = EmployeeAssignment {
        id: 0,
        task,
        employee,
        planned_effort: effort,
        description: desc,
    };
    match db.add_assignment(assignment) {
        Ok(id) => {
            save(db, db_path);
            println!("Added assignment {id} to task {task}");
        }
        Err(e) => fail(e),
    }
}

/// Remove an assignment.
pub fn cmd_unassign(db: &mut Database, db_path: &Path, id: u64) {
    match db.delete_assignment(id) {
        Ok(a) => {
            save(db, db_path);
            println!("Removed assignment {} from task {}", a.id, a.task);
        }
        Err(e) => fail(e),
    }
}

/// Record a work interval.
pub fn cmd_log(
    db: &mut Database,
    db_path: &Path,
    policy: IncompleteEntryPolicy,
    task: u64,
    employee: String,
    date: Option<String>,
    start: Option<String>,
    stop: Option<String>,
    summary: Option<String>,
    desc: Option<String>,
) {
    let date = date.as_deref().map(|d| parse_date_arg("work", d)).unwrap_or_else(today);
    let parse_time = |label: &str, value: &str| {
        parse_time_input(value, date).unwrap_or_else(|| fail(format!("Invalid {label} time: '{value}'")))
    };
    let entry = WorkEntry {
        id: 0,
        task,
        employee,
        date,
        start_time: start.as_deref().map(|s| parse_time("start", s)),
        stop_time: stop.as_deref().map(|s| parse_time("stop", s)),
        short_description: summary,
        description: desc,
    };
    if !entry.is_complete() {
        eprintln!(
            "Warning: work entry without start or stop time {}.",
            policy.incomplete_entry_effect()
        );
    } else if entry.is_inverted() {
        eprintln!("Warning: start time is after stop time; entry counts as zero effort.");
    }
    match db.add_work_entry(entry) {
        Ok(id) => {
            save(db, db_path);
            println!("Logged work entry {id} on task {task}");
        }
        Err(e) => fail(e),
    }
}

/// Remove a work entry.
pub fn cmd_unlog(db: &mut Database, db_path: &Path, id: u64) {
    match db.delete_work_entry(id) {
        Ok(w) => {
            save(db, db_path);
            println!("Removed work entry {} from task {}", w.id, w.task);
        }
        Err(e) => fail(e),
    }
}

/// List tasks with their derived metrics.
pub fn cmd_list(db: &Database, policy: IncompleteEntryPolicy, project: Option<u64>, sort: SortKey, limit: Option<usize>) {
    let mut tasks: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| project.map_or(true, |p| t.project == p))
        .collect();

    match sort {
        SortKey::Id => tasks.sort_by(|a, b| b.id.cmp(&a.id)),
        SortKey::Title => tasks.sort_by(|a, b| a.get_title().to_lowercase().cmp(&b.get_title().to_lowercase())),
        SortKey::Start => tasks.sort_by_key(|t| (t.planned_start_date.is_none(), t.planned_start_date, t.id)),
    }
    if let Some(n) = limit {
        tasks.truncate(n);
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    let reporter = TaskReporter::new(db, db).with_policy(policy);
    let rows: Vec<(&Task, TaskMetrics)> = tasks.into_iter().map(|t| (t, metrics_or_exit(&reporter, t))).collect();
    print_table(&rows, db);
}

/// Show a single task in detail.
pub fn cmd_view(db: &Database, policy: IncompleteEntryPolicy, id: u64) {
    let Some(t) = db.get(id) else {
        fail(format!("Task not found: {id}"));
    };
    let reporter = TaskReporter::new(db, db).with_policy(policy);
    let m = metrics_or_exit(&reporter, t);
    let project = db.project(t.project).map(|p| p.title.as_str()).unwrap_or("-");

    println!("Task {t}");
    println!("  Project:            {} ({})", project, t.project);
    println!("  Status:             {}", t.status.as_ref().map(|s| s.title.as_str()).unwrap_or("-"));
    println!("  Last status change: {}", t.last_status_change);
    println!("  Planned start:      {}", format_date(t.planned_start_date));
    println!("  Planned end:        {}", format_date(t.planned_end_date));
    if let Some(d) = &t.description {
        println!("  Description:        {d}");
    }
    println!("  Planned duration:   {} days", format_days(m.planned_duration));
    println!("  Planned effort:     {} h", format_hours(m.planned_effort));
    println!("  Effective duration: {}", m.effective_duration);
    println!("  Effective effort:   {} h", format_hours(m.effective_effort));

    let assignments = db.assignments.iter().filter(|a| a.task == id);
    for a in assignments {
        println!("  Assignment {:<4} {:<16} {} h", a.id, truncate(&a.employee, 16), format_hours(a.planned_effort));
    }
    let entries = db.work_entries.iter().filter(|w| w.task == id);
    for w in entries {
        let time = |t: Option<chrono::NaiveDateTime>| t.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".into());
        println!(
            "  Work {:<4} {} {}-{} {:<16} {}",
            w.id,
            w.date,
            time(w.start_time),
            time(w.stop_time),
            truncate(&w.employee, 16),
            w.short_description.as_deref().unwrap_or("")
        );
    }
}

/// Export a task as XML.
pub fn cmd_export(db: &Database, policy: IncompleteEntryPolicy, id: u64, output: Option<String>) {
    let Some(t) = db.get(id) else {
        fail(format!("Task not found: {id}"));
    };
    let reporter = TaskReporter::new(db, db).with_policy(policy);
    let xml = match reporter.serialize_to_xml(t, &XmlExport) {
        Ok(doc) => doc.to_xml_string(),
        Err(e) => fail(format!("Export failed: {e}")),
    };
    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, xml) {
                fail(format!("Failed to write {path}: {e}"));
            }
            println!("Exported task {id} to {path}");
        }
        None => print!("{xml}"),
    }
}

/// Print the JSON projection of tasks.
pub fn cmd_json(db: &Database, id: Option<u64>) {
    let result = match id {
        Some(id) => match db.get(id) {
            Some(t) => serde_json::to_string_pretty(&t.to_json()),
            None => fail(format!("Task not found: {id}")),
        },
        None => {
            let all: Vec<TaskJson> = db.tasks.iter().map(Task::to_json).collect();
            serde_json::to_string_pretty(&all)
        }
    };
    match result {
        Ok(s) => println!("{s}"),
        Err(e) => fail(e),
    }
}

/// Delete a task.
pub fn cmd_delete(db: &mut Database, db_path: &Path, id: u64) {
    match db.delete_task(id) {
        Ok(t) => {
            save(db, db_path);
            println!("Deleted task {t}");
        }
        Err(e) => fail(e),
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
