use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum EmlError {
    #[error("EML package precondition violated: {0}")]
    #[diagnostic(help("sections must be added in order: eml root, dataset, related projects"))]
    PreconditionViolated(&'static str),

    #[error("additional metadata describes unknown id: {0}")]
    UnknownDescribes(String),

    #[error("invalid package id: {0}")]
    InvalidPackageId(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("missing config file eml.json in current directory or config directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read source snapshot at {0}")]
    SourceRead(PathBuf),

    #[error("failed to parse source snapshot: {0}")]
    SourceParse(String),

    #[error("project not found: {0}")]
    ProjectNotFound(u64),

    #[error("survey not found: {0}")]
    SurveyNotFound(u64),

    #[error("taxonomy request failed: {0}")]
    TaxonomyHttp(String),

    #[error("taxonomy service returned status {status}: {message}")]
    TaxonomyStatus { status: u16, message: String },

    #[error("failed to serialize EML section: {0}")]
    Serialize(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
