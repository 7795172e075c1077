//! Unified application error model and mapping helpers.
//! This module provides a common error enum used across the loader, the entity
//! model and the renderer, along with a mapper to process exit codes.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
pub enum DocError {
    /// Connection or authentication failure against the database.
    Connect { code: String, message: String },
    /// A schema name requested by the caller does not exist in the catalog.
    NotFound { code: String, message: String },
    /// A lazy reference pointed at an identifier absent from the snapshot.
    Reference { code: String, message: String },
    /// A catalog query failed or returned a row the model cannot read.
    Catalog { code: String, message: String },
    /// Filesystem failure while writing report output.
    Io { code: String, message: String },
}

impl DocError {
    pub fn code_str(&self) -> &str {
        match self {
            DocError::Connect { code, .. }
            | DocError::NotFound { code, .. }
            | DocError::Reference { code, .. }
            | DocError::Catalog { code, .. }
            | DocError::Io { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DocError::Connect { message, .. }
            | DocError::NotFound { message, .. }
            | DocError::Reference { message, .. }
            | DocError::Catalog { message, .. }
            | DocError::Io { message, .. } => message.as_str(),
        }
    }

    pub fn connect<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DocError::Connect { code: code.into(), message: msg.into() } }
    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DocError::NotFound { code: code.into(), message: msg.into() } }
    pub fn reference<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DocError::Reference { code: code.into(), message: msg.into() } }
    pub fn catalog<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DocError::Catalog { code: code.into(), message: msg.into() } }
    pub fn io<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { DocError::Io { code: code.into(), message: msg.into() } }

    /// Map to a process exit code. Nothing here is retried or downgraded;
    /// any failure ends the run with a class-specific status.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocError::Connect { .. } => 2,
            DocError::NotFound { .. } => 3,
            DocError::Reference { .. } => 4,
            DocError::Catalog { .. } => 5,
            DocError::Io { .. } => 6,
        }
    }
}

impl Display for DocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for DocError {}

pub type DocResult<T> = Result<T, DocError>;

impl From<tokio_postgres::Error> for DocError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Closed connections are connectivity problems; everything else is a
        // malformed query or an unreadable row.
        if err.is_closed() {
            DocError::Connect { code: "connection_closed".into(), message: err.to_string() }
        } else {
            DocError::Catalog { code: "catalog_query".into(), message: err.to_string() }
        }
    }
}

impl From<std::io::Error> for DocError {
    fn from(err: std::io::Error) -> Self {
        DocError::Io { code: "io_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_mapping() {
        assert_eq!(DocError::connect("conn", "refused").exit_code(), 2);
        assert_eq!(DocError::not_found("no_schema", "missing").exit_code(), 3);
        assert_eq!(DocError::reference("dangling_ref", "oid 9").exit_code(), 4);
        assert_eq!(DocError::catalog("catalog_query", "bad row").exit_code(), 5);
        assert_eq!(DocError::io("io_error", "denied").exit_code(), 6);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = DocError::not_found("no_schema", "no schema named minerva");
        assert_eq!(err.to_string(), "no_schema: no schema named minerva");
        assert_eq!(err.code_str(), "no_schema");
        assert_eq!(err.message(), "no schema named minerva");
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DocError = io.into();
        match err {
            DocError::Io { .. } => {}
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
