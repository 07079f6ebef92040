//! Error types for the probe layer.

use std::io;
use thiserror::Error;

/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Failure while reading or parsing a hardware signal source.
///
/// These never cross the public probe surface; every failure collapses to
/// an unknown metric there. Callers test for absence with `Option`, not
/// with error handling.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_display_parse() {
        let err = ProbeError::Parse("bad cpu range".to_string());
        assert_eq!(err.to_string(), "Parse error: bad cpu range");
    }

    #[test]
    fn test_probe_error_display_unsupported() {
        let err = ProbeError::Unsupported("sysinfo(2)".to_string());
        assert_eq!(err.to_string(), "Unsupported: sysinfo(2)");
    }

    #[test]
    fn test_probe_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err: ProbeError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }
}
