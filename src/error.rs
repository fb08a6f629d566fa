use std::path::PathBuf;

use thiserror::Error;

/// Classifies errors so callers can pick an exit path without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A range table could not be built; fatal at startup
    Config,
    /// The command line asked for something impossible
    Usage,
    /// Reading input or writing output failed
    Io,
}

/// ipfilter error types
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("{source_name}: parse error at line {line} on {entry:?}: {reason}")]
    InvalidCidr {
        source_name: String,
        line: usize,
        entry: String,
        reason: ipnet::AddrParseError,
    },

    #[error("failed to read range file '{}': {source}", .path.display())]
    RangeFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid worker count {0}: must be at least 1")]
    InvalidProcs(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilterError {
    /// Which class of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::InvalidCidr { .. } | FilterError::RangeFile { .. } => ErrorKind::Config,
            FilterError::InvalidProcs(_) => ErrorKind::Usage,
            FilterError::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
