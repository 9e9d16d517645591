use std::path::PathBuf;

use clap::Parser;

use crm_reporting::fields::IncompleteEntryPolicy;

use crate::cmd::Commands;

/// Task reporting CLI for the CRM project-management model.
/// Storage defaults to ~/.crmr/reporting.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "crmr", version, about = "Task effort and duration reporting")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true, env = "CRMR_DB")]
    pub db: Option<PathBuf>,

    /// How work entries missing a start or stop time affect effective effort.
    #[arg(long, global = true, value_enum, default_value_t = IncompleteEntryPolicy::Reset)]
    pub incomplete_entries: IncompleteEntryPolicy,

    #[command(subcommand)]
    pub command: Commands,
}
