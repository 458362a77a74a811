//! Artifact emission - renders variant schemas and hands them to a sink.
//!
//! Generation never touches the filesystem. An [`Emitter`] turns a
//! [`VariantSchema`] into source text and an [`ArtifactSink`] decides where
//! that text goes.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::EmitError;
use crate::types::{Marker, TypeRef, VariantArtifact, VariantSchema};

/// Packages imported by default in Kotlin sources.
const DEFAULT_IMPORTS: &[&str] = &["kotlin.collections.", "kotlin."];

/// Renders one variant into source text.
pub trait Emitter {
    /// File extension of rendered artifacts, without the dot.
    fn extension(&self) -> &'static str;

    /// Render a variant.
    ///
    /// # Errors
    ///
    /// Returns `EmitError` if the variant cannot be rendered.
    fn render(&self, variant: &VariantSchema) -> Result<String, EmitError>;
}

/// Destination for rendered artifacts.
pub trait ArtifactSink {
    /// Store the rendered contents of one artifact.
    ///
    /// # Errors
    ///
    /// Returns `EmitError` if the contents cannot be written.
    fn write(&mut self, name: &str, extension: &str, contents: &str) -> Result<(), EmitError>;
}

/// Render every artifact and write it to `sink`. Returns the number written.
///
/// # Errors
///
/// Stops at the first rendering or write failure.
pub fn emit_artifacts(
    artifacts: &[VariantArtifact],
    emitter: &dyn Emitter,
    sink: &mut dyn ArtifactSink,
) -> Result<usize, EmitError> {
    for artifact in artifacts {
        let contents = emitter.render(&artifact.schema)?;
        sink.write(&artifact.name, emitter.extension(), &contents)?;
        debug!(artifact = %artifact.name, bytes = contents.len(), "emitted artifact");
    }
    info!(count = artifacts.len(), "emitted artifacts");
    Ok(artifacts.len())
}

// --- Emitters ---

/// Renders variants as Kotlin data classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinEmitter;

impl Emitter for KotlinEmitter {
    fn extension(&self) -> &'static str {
        "kt"
    }

    fn render(&self, variant: &VariantSchema) -> Result<String, EmitError> {
        render_kotlin(variant).map_err(|source| EmitError::Render {
            name: variant.name.clone(),
            source,
        })
    }
}

/// Renders variants as pretty-printed JSON descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, variant: &VariantSchema) -> Result<String, EmitError> {
        serde_json::to_string_pretty(variant).map_err(|source| EmitError::Serialize {
            name: variant.name.clone(),
            source,
        })
    }
}

fn render_kotlin(variant: &VariantSchema) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let package = variant.package.as_str();

    if !package.is_empty() {
        writeln!(out, "package {}\n", package)?;
    }

    for marker in &variant.markers {
        if let Marker::Annotation(text) = marker {
            writeln!(out, "@{}", text)?;
        }
    }

    if variant.fields.is_empty() {
        writeln!(out, "class {}() {{", variant.name)?;
    } else {
        writeln!(out, "data class {}(", variant.name)?;
        let last = variant.fields.len() - 1;
        for (i, field) in variant.fields.iter().enumerate() {
            for annotation in &field.annotations {
                writeln!(out, "    @field:{}", annotation)?;
            }
            let default = if field.has_default() { " = null" } else { "" };
            let separator = if i == last { "" } else { "," };
            writeln!(
                out,
                "    val {}: {}{}{}",
                field.name,
                kotlin_type(&field.ty, package),
                default,
                separator
            )?;
        }
        writeln!(out, ") {{")?;
    }

    let from_base = &variant.from_base;
    writeln!(
        out,
        "    constructor({}: {}) : this({})",
        from_base.parameter.as_deref().unwrap_or("base"),
        from_base.source,
        named_arguments(from_base.mappings.iter().map(|m| (&m.target, &m.source)))
    )?;

    if let Some(to_partial) = &variant.to_partial {
        writeln!(out)?;
        writeln!(out, "    fun {}(): {} {{", to_partial.name, to_partial.target)?;
        writeln!(
            out,
            "        return {}({})",
            to_partial.target,
            named_arguments(to_partial.mappings.iter().map(|m| (&m.target, &m.source)))
        )?;
        writeln!(out, "    }}")?;
    }

    writeln!(out, "}}")?;
    Ok(out)
}

fn named_arguments<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    pairs
        .map(|(target, source)| format!("{} = {}", target, source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Kotlin spelling of a type, dropping default-imported and same-package prefixes.
fn kotlin_type(ty: &TypeRef, package: &str) -> String {
    let mut out = short_name(&ty.name, package).to_string();
    if ty.is_parameterized() {
        let args: Vec<String> = ty.args.iter().map(|a| kotlin_type(a, package)).collect();
        out.push('<');
        out.push_str(&args.join(", "));
        out.push('>');
    }
    if ty.nullable {
        out.push('?');
    }
    out
}

fn short_name<'a>(name: &'a str, package: &str) -> &'a str {
    let own_prefix = format!("{}.", package);
    let mut prefixes: Vec<&str> = DEFAULT_IMPORTS.to_vec();
    if !package.is_empty() {
        prefixes.push(&own_prefix);
    }

    for prefix in prefixes {
        if let Some(rest) = name.strip_prefix(prefix) {
            // Only strip when the remainder is a top-level name (`Map.Entry` counts)
            if rest.split('.').all(is_type_segment) {
                return rest;
            }
        }
    }
    name
}

fn is_type_segment(segment: &str) -> bool {
    segment.chars().next().map_or(false, char::is_uppercase)
}

// --- Sinks ---

/// Writes each artifact to `{dir}/{name}.{extension}`.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirSink {
    fn write(&mut self, name: &str, extension: &str, contents: &str) -> Result<(), EmitError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| EmitError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{}.{}", name, extension));
        std::fs::write(&path, contents).map_err(|source| EmitError::Write { path, source })
    }
}

/// Collects artifacts in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, name: &str, extension: &str, contents: &str) -> Result<(), EmitError> {
        self.files
            .insert(format!("{}.{}", name, extension), contents.to_string());
        Ok(())
    }
}

/// Streams artifacts to a writer (e.g. stdout), one after another.
pub struct WriterSink<W> {
    writer: W,
}

impl<W: std::io::Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> ArtifactSink for WriterSink<W> {
    fn write(&mut self, name: &str, extension: &str, contents: &str) -> Result<(), EmitError> {
        let path = PathBuf::from(format!("{}.{}", name, extension));
        writeln!(self.writer, "{}", contents.trim_end())
            .and_then(|()| self.writer.flush())
            .map_err(|source| EmitError::Write { path, source })
    }
}
