//! # Menu Error Types Module
//!
//! This module defines the error type shared by the menu data source, the
//! admin tooling and the external classifier. Row-level problems never reach
//! this type: they are collected into discard and warning lists instead.

/// Custom error types for menu operations
#[derive(Debug, Clone, PartialEq)]
pub enum MenuError {
    /// A file the operation depends on does not exist
    MissingResource(String),
    /// Input that cannot be interpreted at all (empty header, bad argument)
    MalformedInput(String),
    /// Required columns absent from the data source header
    MissingColumns(Vec<String>),
    /// Reading or writing a file failed
    Storage(String),
    /// The external classification service failed or timed out
    UpstreamUnavailable(String),
    /// No backup snapshot is available to restore
    NoBackup(String),
    /// A vote outside the accepted star range
    InvalidVote(String),
}

impl std::fmt::Display for MenuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuError::MissingResource(msg) => write!(f, "Missing resource: {msg}"),
            MenuError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            MenuError::MissingColumns(cols) => write!(f, "Missing columns: {}", cols.join(", ")),
            MenuError::Storage(msg) => write!(f, "Storage error: {msg}"),
            MenuError::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {msg}"),
            MenuError::NoBackup(msg) => write!(f, "No backup found: {msg}"),
            MenuError::InvalidVote(msg) => write!(f, "Invalid vote: {msg}"),
        }
    }
}

impl std::error::Error for MenuError {}

impl From<std::io::Error> for MenuError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            MenuError::MissingResource(err.to_string())
        } else {
            MenuError::Storage(err.to_string())
        }
    }
}

impl From<csv::Error> for MenuError {
    fn from(err: csv::Error) -> Self {
        MenuError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(err: serde_json::Error) -> Self {
        MenuError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for MenuError {
    fn from(err: reqwest::Error) -> Self {
        MenuError::UpstreamUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_display() {
        let err = MenuError::MissingColumns(vec!["data".to_string(), "prezzo".to_string()]);
        assert_eq!(err.to_string(), "Missing columns: data, prezzo");
    }

    #[test]
    fn test_io_not_found_maps_to_missing_resource() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "menu_database.csv");
        assert!(matches!(MenuError::from(io), MenuError::MissingResource(_)));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(MenuError::from(io), MenuError::Storage(_)));
    }
}
