use thiserror::Error;

/// Errors surfaced by the attendance core.
///
/// `Config`, `Load` and `Render` are fatal to a session. `EmptyInput` and `Validation`
/// are expected per-operation outcomes that the presentation layer renders as a message.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load attendance data: {0}")]
    Load(String),

    #[error("No data found: {0}")]
    EmptyInput(String),

    #[error("Invalid selection: {0}")]
    Validation(String),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl DashboardError {
    /// Returns `true` for errors that should halt rendering entirely.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DashboardError::Config(_) | DashboardError::Load(_) | DashboardError::Render(_)
        )
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Load(err.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Load(err.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Load(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
