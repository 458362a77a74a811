//! Entity definition loading from various sources.
//!
//! Handles loading definitions from files, strings, and HTTP URLs. A document
//! holds either a single entity, a JSON array of entities, or an object with
//! an `entities` array.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;
use crate::types::EntitySchema;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load entity definitions from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't a valid definition document.
pub fn load_entities(path: &Path) -> Result<Vec<EntitySchema>, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let entities = load_entities_str(&content)?;
    debug!(path = %path.display(), count = entities.len(), "loaded entities");
    Ok(entities)
}

/// Load entity definitions from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't a valid definition document.
pub fn load_entities_str(content: &str) -> Result<Vec<EntitySchema>, LoadError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    parse_entities(value)
}

/// Interpret an already-parsed definition document.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the document doesn't describe entities.
pub fn parse_entities(value: Value) -> Result<Vec<EntitySchema>, LoadError> {
    let result = match value {
        Value::Array(_) => serde_json::from_value(value),
        Value::Object(mut map) => match map.remove("entities") {
            Some(entities) => serde_json::from_value(entities),
            None => serde_json::from_value(Value::Object(map)).map(|entity| vec![entity]),
        },
        // Let serde report the type mismatch
        other => serde_json::from_value::<EntitySchema>(other).map(|entity| vec![entity]),
    };
    result.map_err(|source| LoadError::InvalidJson { source })
}

/// Load entity definitions from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails,
/// or `LoadError::InvalidJson` if the response isn't a valid definition document.
#[cfg(feature = "remote")]
pub fn load_entities_url(url: &str) -> Result<Vec<EntitySchema>, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let response = response
        .error_for_status()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let value: Value = response.json().map_err(|source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    })?;
    parse_entities(value)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load entity definitions from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_entities_auto(source: &str) -> Result<Vec<EntitySchema>, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_entities_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_entities(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Marker, Requiredness, VariantKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const USER: &str = r#"{
        "name": "User",
        "package": "com.example",
        "variants": ["Create", "Partial"],
        "fields": [
            { "name": "id", "type": "java.lang.String", "markers": ["creatable"] },
            { "name": "tags", "type": "java.util.Map<java.lang.String, java.lang.String>",
              "markers": ["has_nullable_values"] }
        ]
    }"#;

    #[test]
    fn load_entities_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", USER).unwrap();

        let entities = load_entities(file.path()).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "User");
        assert_eq!(
            entities[0].variants,
            vec![VariantKind::Create, VariantKind::Partial]
        );
        assert_eq!(entities[0].fields[0].markers, vec![Marker::Creatable]);
        assert_eq!(entities[0].fields[1].ty.args.len(), 2);
    }

    #[test]
    fn load_entities_file_not_found() {
        let result = load_entities(Path::new("/nonexistent/entities.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_entities_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_entities(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_entities_str_array_and_batch() {
        let list = load_entities_str(r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        assert_eq!(list.len(), 2);

        let batch = load_entities_str(r#"{"entities": [{"name": "A"}]}"#).unwrap();
        assert_eq!(batch[0].name, "A");
    }

    #[test]
    fn load_entities_str_rejects_bad_type() {
        let result = load_entities_str(
            r#"{"name": "A", "fields": [{"name": "x", "type": "List<String"}]}"#,
        );
        match result {
            Err(LoadError::InvalidJson { source }) => {
                assert!(source.to_string().contains("unclosed"));
            }
            other => panic!("expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn load_entities_str_rejects_unknown_marker() {
        let result =
            load_entities_str(r#"{"name": "A", "fields": [{"name": "x", "type": "int", "markers": ["sometimes"]}]}"#);
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_entities_str_accepts_mixed_case_requiredness() {
        let entities = load_entities_str(
            r#"{"name": "A", "fields": [{"name": "x", "type": "int", "markers": [
                {"rule": {"kind": "Dto", "required": "Required"}},
                {"rule": {"kind": "Create", "required": "Absent"}},
                {"rule": {"kind": "Update", "required": "OPTIONAL"}}
            ]}]}"#,
        )
        .unwrap();
        let rules: Vec<_> = entities[0].fields[0].rules().map(|r| r.required).collect();
        assert_eq!(
            rules,
            [
                Requiredness::Required,
                Requiredness::Absent,
                Requiredness::Optional
            ]
        );
    }

    #[test]
    fn load_entities_str_rejects_unknown_requiredness() {
        let result = load_entities_str(
            r#"{"name": "A", "fields": [{"name": "x", "type": "int", "markers": [
                {"rule": {"kind": "Dto", "required": "sometimes"}}
            ]}]}"#,
        );
        match result {
            Err(LoadError::InvalidJson { source }) => {
                assert!(source.to_string().contains("unknown requiredness"));
            }
            other => panic!("expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn load_entities_str_rejects_non_object() {
        assert!(matches!(
            load_entities_str("42"),
            Err(LoadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/entities.json"));
    }

    #[test]
    fn is_url_http() {
        assert!(is_url("http://example.com/entities.json"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/entities.json"));
        assert!(!is_url("./entities.json"));
        assert!(!is_url("entities.json"));
    }

    #[test]
    fn load_entities_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name": "Note"}}"#).unwrap();

        let entities = load_entities_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(entities[0].name, "Note");
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_entities_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/entities.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(USER)
                .create();

            let url = format!("{}/entities.json", server.url());
            let entities = load_entities_auto(&url).unwrap();
            assert_eq!(entities[0].name, "User");
            mock.assert();
        }

        #[test]
        fn load_entities_url_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let url = format!("{}/missing.json", server.url());
            let result = load_entities_url(&url);
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }

        #[test]
        fn load_entities_url_invalid_host() {
            let result =
                load_entities_url("https://this-domain-does-not-exist-12345.invalid/entities.json");
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }
    }
}
