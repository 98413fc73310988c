use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("A project list refresh is already in flight")]
    RefreshInFlight,

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },
}

/// Errors reported by the repository inspection service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Inspection service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Unknown project: {id}")]
    UnknownProject { id: String },

    #[error("Unknown commit: {id}")]
    UnknownCommit { id: String },

    #[error("Backend error: {source}")]
    Backend {
        #[from]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
