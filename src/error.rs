use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaDocError {
    #[error("failed to read file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    JsonParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("could not find 'all-table-columns' with the expected [type, list] structure")]
    MissingColumnBlock,

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("invalid trace mode '{0}': must be 'AND' or 'OR'")]
    InvalidTraceMode(String),

    #[error("invalid search pair '{0}': expected column=value")]
    InvalidSearchPair(String),

    #[error("missing database settings: {}", .0.join(", "))]
    MissingConnectionSettings(Vec<String>),

    #[error("columns do not exist in {table}: {}", .columns.join(", "))]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("failed to launch {program}: {source}")]
    ProcessLaunch {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ProcessFailed { program: String, status: String },
}
