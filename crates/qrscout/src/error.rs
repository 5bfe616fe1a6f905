//! Error types for qrscout.
//!
//! This module defines the error type shared by the form model, the codecs,
//! the local store and the scanner plumbing. None of these errors are fatal to
//! a scouting session; callers log them and carry on with a usable form.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for qrscout operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the local store.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Application Settings Errors ===
    /// Failed to load application settings.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Application settings failed validation.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Document Errors ===
    /// A form document was not valid JSON or did not match the document shape.
    #[error("failed to parse form document: {0}")]
    FormParse(#[source] serde_json::Error),

    /// A form document parsed but breaks a structural rule.
    #[error("invalid form document: {message}")]
    FormShape {
        /// Description of the broken rule.
        message: String,
    },

    // === Form Lookup Errors ===
    /// No section with the given name exists.
    #[error("couldn't find section '{name}'")]
    SectionNotFound {
        /// The requested section name.
        name: String,
    },

    /// No field with the given code exists in the section.
    #[error("couldn't find field '{code}' in section '{section}'")]
    FieldNotFound {
        /// The section that was searched.
        section: String,
        /// The requested field code.
        code: String,
    },

    /// The field was supplied by the leader station and cannot be edited.
    #[error("field '{code}' is locked")]
    FieldLocked {
        /// The locked field code.
        code: String,
    },

    /// User input could not be converted to the field's value domain.
    #[error("invalid value '{input}' for {kind} field")]
    InvalidValue {
        /// Name of the field type.
        kind: String,
        /// The rejected input.
        input: String,
    },

    // === Scanner Errors ===
    /// A payload source or device enumeration failed.
    #[error("scanner error: {0}")]
    Scanner(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for qrscout operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::FormParse(err)
    }
}

impl Error {
    /// Create a new form shape error.
    #[must_use]
    pub fn form_shape(message: impl Into<String>) -> Self {
        Self::FormShape {
            message: message.into(),
        }
    }

    /// Create a section lookup error.
    #[must_use]
    pub fn section_not_found(name: impl Into<String>) -> Self {
        Self::SectionNotFound { name: name.into() }
    }

    /// Create a field lookup error.
    #[must_use]
    pub fn field_not_found(section: impl Into<String>, code: impl Into<String>) -> Self {
        Self::FieldNotFound {
            section: section.into(),
            code: code.into(),
        }
    }

    /// Create a new scanner error.
    #[must_use]
    pub fn scanner(message: impl Into<String>) -> Self {
        Self::Scanner(message.into())
    }

    /// Check if this error is a section or field lookup failure.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::SectionNotFound { .. } | Self::FieldNotFound { .. }
        )
    }

    /// Check if this error came from reading a form document.
    #[must_use]
    pub fn is_form_error(&self) -> bool {
        matches!(self, Self::FormParse(_) | Self::FormShape { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::section_not_found("Autonomous");
        assert_eq!(err.to_string(), "couldn't find section 'Autonomous'");

        let err = Error::scanner("camera unplugged");
        assert_eq!(err.to_string(), "scanner error: camera unplugged");
    }

    #[test]
    fn test_field_not_found_display() {
        let err = Error::field_not_found("Metadata", "teamNumber9");
        let msg = err.to_string();
        assert!(msg.contains("teamNumber9"));
        assert!(msg.contains("Metadata"));
    }

    #[test]
    fn test_is_lookup_error() {
        assert!(Error::section_not_found("x").is_lookup_error());
        assert!(Error::field_not_found("x", "y").is_lookup_error());
        assert!(!Error::scanner("x").is_lookup_error());
    }

    #[test]
    fn test_is_form_error() {
        assert!(Error::form_shape("duplicate code").is_form_error());
        let json_err = serde_json::from_str::<i32>("{").unwrap_err();
        assert!(Error::from(json_err).is_form_error());
        assert!(!Error::scanner("x").is_form_error());
    }

    #[test]
    fn test_field_locked_display() {
        let err = Error::FieldLocked {
            code: "scouter".to_string(),
        };
        assert_eq!(err.to_string(), "field 'scouter' is locked");
    }

    #[test]
    fn test_invalid_value_display() {
        let err = Error::InvalidValue {
            kind: "number".to_string(),
            input: "twelve".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("twelve"));
        assert!(msg.contains("number"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "scan_delay_ms must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("scan_delay_ms"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
