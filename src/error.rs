use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file {path:?} not found")]
    Missing { path: PathBuf },
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path:?} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path:?} has no columns")]
    NoColumns { path: PathBuf },
}

#[derive(Debug, Error)]
#[error("site dataset unavailable")]
pub struct DataUnavailable(#[from] pub LoadError);

#[derive(Debug, Error)]
#[error("preselection unavailable")]
pub struct PreselectionUnavailable(#[from] pub LoadError);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown category {0:?}")]
    UnknownCategory(String),
}
