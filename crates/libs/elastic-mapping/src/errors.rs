use std::path::PathBuf;

use thiserror::Error;

use crate::schema::Violation;

pub type Result<T> = std::result::Result<T, MappingError>;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Mapping file '{path}' not found: {source}")]
    MappingNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed mapping file '{path}': {violation}")]
    MalformedMapping { path: PathBuf, violation: Violation },

    #[error("No mapping for class '{class}' in '{path}'")]
    ClassNotMapped { class: String, path: PathBuf },

    #[error("Unknown field datatype '{0}'")]
    UnknownDataType(String),
}
