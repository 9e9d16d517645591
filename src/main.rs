//! # crmr - task reporting CLI
//!
//! Command-line front end of the `crm_reporting` library: manage projects,
//! tasks, employee assignments and the work log in a local JSON database, and
//! report the planned and effective effort and duration of each task.
//!
//! ## Quick Start
//!
//! ```bash
//! crmr project add "Website relaunch"
//! crmr add --project 1 --title "Design review" --start 2024-01-01 --end 2024-01-10
//! crmr assign 1 --employee jdoe --effort 8
//! crmr log 1 --employee jdoe --date 2024-01-02 --start 09:00 --stop 12:30
//! crmr set-status 1 done
//! crmr list
//! crmr export 1 -o task-1.xml
//! ```
//!
//! Data is stored in `~/.crmr/reporting.json` unless `--db` or `CRMR_DB` is set.
//! Diagnostics go to stderr and are controlled with `RUST_LOG`.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crm_reporting::db::Database;
use crm_reporting::project::resolve_db_path;

mod cli;
mod cmd;

use cli::Cli;
use cmd::*;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "crm_reporting=warn,crmr=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let db_path = match resolve_db_path(cli.db.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to prepare database location: {e}");
            std::process::exit(1);
        }
    };
    let mut db = match Database::load(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load database {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };
    let policy = cli.incomplete_entries;

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Project { action } => cmd_project(&mut db, &db_path, action),

        Commands::Statuses => cmd_statuses(&db),

        Commands::Add { project, title, start, end, desc, status } =>
            cmd_add(&mut db, &db_path, project, title, start, end, desc, status),

        Commands::Update { id, title, start, end, desc, project, clear_start, clear_end } =>
            cmd_update(&mut db, &db_path, id, title, start, end, desc, project, clear_start, clear_end),

        Commands::SetStatus { id, status } => cmd_set_status(&mut db, &db_path, id, status),

        Commands::Assign { task, employee, effort, desc } =>
            cmd_assign(&mut db, &db_path, task, employee, effort, desc),

        Commands::Unassign { id } => cmd_unassign(&mut db, &db_path, id),

        Commands::Log { task, employee, date, start, stop, summary, desc } =>
            cmd_log(&mut db, &db_path, policy, task, employee, date, start, stop, summary, desc),

        Commands::Unlog { id } => cmd_unlog(&mut db, &db_path, id),

        Commands::List { project, sort, limit } => cmd_list(&db, policy, project, sort, limit),

        Commands::View { id } => cmd_view(&db, policy, id),

        Commands::Export { id, output } => cmd_export(&db, policy, id, output),

        Commands::Json { id } => cmd_json(&db, id),

        Commands::Delete { id } => cmd_delete(&mut db, &db_path, id),
    }
}
