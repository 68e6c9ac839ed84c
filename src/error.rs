use std::path::PathBuf;

use thiserror::Error;

/// Failure while turning a graph description into an in-memory graph.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Internal graph invariant violation detected before enumeration.
///
/// Unreachable for graphs built through ingestion; it indicates a bug in
/// graph construction, not bad user input.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("graph invariant violated: {0}")]
    CorruptGraph(String),
}

#[derive(Debug, Error)]
pub enum DotcyclesError {
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DotcyclesError>;
