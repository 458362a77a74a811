//! Entity definition linting - static analysis of definition files.
//!
//! Checks definition files for:
//! - JSON syntax and shape errors (including malformed type references)
//! - Duplicate entity and field names
//! - Configuration errors that would fail generation
//! - Rules and variant requests that have no effect

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::generator::generate_entity;
use crate::loader::load_entities;
use crate::types::{EntitySchema, GenerateOptions, COMPANION_FIELD};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// Location of the issue (e.g., "User.email")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_definition_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        total_warnings += file_result
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single definition file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let display_file = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();

    // Loading checks syntax, shape and type references
    let entities = match load_entities(file) {
        Ok(entities) => entities,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E001".to_string(),
                file: file.to_path_buf(),
                path: "/".to_string(),
                message: format!("cannot load definitions: {}", e),
            });
            return FileResult {
                file: display_file,
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    let mut seen_entities = HashSet::new();
    for entity in &entities {
        if !seen_entities.insert(entity.name.as_str()) {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: "E004".to_string(),
                file: file.to_path_buf(),
                path: entity.name.clone(),
                message: format!("entity \"{}\" is defined more than once", entity.name),
            });
        }
        check_entity(entity, file, &mut diagnostics);
    }

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: display_file,
        status,
        diagnostics,
    }
}

fn check_entity(entity: &EntitySchema, file: &Path, diagnostics: &mut Vec<Diagnostic>) {
    let mut push = |severity: Severity, code: &str, path: String, message: String| {
        diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: file.to_path_buf(),
            path,
            message,
        });
    };

    if entity.variants.is_empty() {
        push(
            Severity::Warning,
            "W002",
            entity.name.clone(),
            "entity requests no variants, nothing will be generated".to_string(),
        );
    }

    let mut seen_kinds = HashSet::new();
    for kind in &entity.variants {
        if !seen_kinds.insert(kind) {
            push(
                Severity::Warning,
                "W003",
                entity.name.clone(),
                format!("variant {} is requested more than once", kind),
            );
        }
    }

    let mut seen_fields = HashSet::new();
    for field in &entity.fields {
        let field_path = format!("{}.{}", entity.name, field.name);

        if !seen_fields.insert(field.name.as_str()) {
            push(
                Severity::Error,
                "E002",
                field_path.clone(),
                format!("duplicate field \"{}\"", field.name),
            );
        }

        if field.name == COMPANION_FIELD && !field.is_static {
            push(
                Severity::Warning,
                "W004",
                field_path.clone(),
                "field named Companion is never included in variants".to_string(),
            );
        }

        for rule in field.rules() {
            if !entity.requests(&rule.kind) {
                push(
                    Severity::Warning,
                    "W001",
                    field_path.clone(),
                    format!(
                        "rule for {} has no effect: {} does not request it",
                        rule.kind, entity.name
                    ),
                );
            }
        }
    }

    if let Err(e) = generate_entity(entity, &GenerateOptions::new()) {
        push(Severity::Error, "E003", entity.name.clone(), e.to_string());
    }
}

fn collect_definition_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
