//! Error types for the basketbook CLI.

use std::path::PathBuf;

/// All errors that can occur while loading inputs or running a basket.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("schedule error: {0}")]
    Schedule(String),

    #[error("failed to read schedule file {path}: {source}")]
    ScheduleRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse schedule JSON: {0}")]
    ScheduleParse(#[from] serde_json::Error),

    #[error("price file error: {0}")]
    Prices(String),

    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    /// Rejected by the engine: bad weights or schedule dates, or a failed walk
    #[error(transparent)]
    Engine(#[from] basketbook::Error),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Process exit code: 2 when the walk itself failed, 1 for any bad input.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Engine(basketbook::Error::DegenerateBasket { .. } | basketbook::Error::NotRun) => 2,
            _ => 1,
        }
    }

    /// True when the inputs were accepted but the simulation could not complete.
    pub fn is_simulation_failure(&self) -> bool {
        self.exit_code() == 2
    }
}

pub type Result<T> = std::result::Result<T, Error>;
