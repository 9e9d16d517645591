//! # crm_reporting
//!
//! The task reporting model of a project-management CRM. A [`task::Task`]
//! belongs to a project and carries planned dates and a status; its effort and
//! duration metrics are derived on demand from the work log and the employee
//! assignments recorded against it.
//!
//! - [`report::TaskReporter`] computes planned/effective effort and duration
//!   through the [`repository`] traits and composes the task's export document.
//! - [`export::XmlExport`] is the bundled document engine.
//! - [`db::Database`] is a JSON-file store implementing the repositories.
//!
//! ```no_run
//! use crm_reporting::db::Database;
//! use crm_reporting::export::XmlExport;
//! use crm_reporting::report::TaskReporter;
//!
//! let db = Database::load(std::path::Path::new("reporting.json"))?;
//! let reporter = TaskReporter::new(&db, &db);
//! if let Some(task) = db.get(1) {
//!     println!("{} h logged", reporter.effective_effort(task)?);
//!     print!("{}", reporter.serialize_to_xml(task, &XmlExport)?.to_xml_string());
//! }
//! # Ok::<(), crm_reporting::error::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod export;
pub mod fields;
pub mod project;
pub mod report;
pub mod repository;
pub mod task;
pub mod worklog;

pub use error::{Error, Result};
