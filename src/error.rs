//! Error types for variant generation, loading, emission and validation.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::VariantKind;

/// Malformed type reference text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type \"{input}\" at offset {offset}: {message}")]
pub struct TypeParseError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

/// Configuration errors. Fatal to the entity they occur in, not to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("{entity}.{field}: field is in {kind}{entity} but absent from Partial{entity}, cannot build toPartial")]
    MissingPartialField {
        entity: String,
        field: String,
        kind: VariantKind,
    },

    #[error("{entity}.{field}: invalid override type name \"{type_name}\" for {kind}")]
    InvalidOverrideType {
        entity: String,
        field: String,
        kind: VariantKind,
        type_name: String,
    },

    #[error("{entity}.{field}: override type \"{type_name}\" for {kind} does not resolve to any known type")]
    UnresolvedOverrideType {
        entity: String,
        field: String,
        kind: VariantKind,
        type_name: String,
    },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// Name of the entity whose generation failed.
    pub fn entity(&self) -> &str {
        match self {
            Self::MissingPartialField { entity, .. }
            | Self::InvalidOverrideType { entity, .. }
            | Self::UnresolvedOverrideType { entity, .. } => entity,
        }
    }
}

/// Errors while loading entity definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid entity definition: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors while rendering or writing artifacts.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot render {name}")]
    Render {
        name: String,
        #[source]
        source: std::fmt::Error,
    },
}

impl EmitError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            EmitError::Write { .. } => 3,
            EmitError::Serialize { .. } | EmitError::Render { .. } => 2,
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid variant schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("user.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn generate_error_names_entity_field_and_kind() {
        let err = GenerateError::MissingPartialField {
            entity: "User".into(),
            field: "secret".into(),
            kind: VariantKind::Create,
        };
        assert_eq!(err.entity(), "User");
        assert_eq!(err.exit_code(), 2);
        let message = err.to_string();
        assert!(message.contains("User.secret"));
        assert!(message.contains("CreateUser"));
    }

    #[test]
    fn emit_error_exit_codes() {
        let err = EmitError::Write {
            path: PathBuf::from("out/CreateUser.kt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = EmitError::Render {
            name: "CreateUser".into(),
            source: std::fmt::Error,
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "cannot render CreateUser");
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError {
                path: "/id".into(),
                message: "missing required field".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::InvalidSchema {
            message: "bad".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/address/city".into(),
            message: "expected string, got number".into(),
        };
        assert_eq!(err.to_string(), "/address/city: expected string, got number");
    }
}
