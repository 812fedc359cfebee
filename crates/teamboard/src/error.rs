#![forbid(unsafe_code)]

use teamboard_runtime::DashboardError;

use crate::demo::DemoError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Demo(#[from] DemoError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("terminal: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cli(String),
}
