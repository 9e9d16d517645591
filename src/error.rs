use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(u64),

    #[error("Project not found: {0}")]
    ProjectNotFound(u64),

    #[error("Task status not found: {0}")]
    StatusNotFound(String),

    #[error("Work entry not found: {0}")]
    WorkEntryNotFound(u64),

    #[error("Assignment not found: {0}")]
    AssignmentNotFound(u64),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
