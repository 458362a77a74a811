//! Variant Schema Generator
//!
//! Derives `Partial`, `Create`, `Update` and `Dto` record variants from
//! annotated entity definitions, together with the conversions between the
//! base entity and each variant.
//!
//! Generation is a two-stage pipeline: [`generate`] resolves every requested
//! variant into a neutral [`VariantSchema`], and an [`Emitter`] renders those
//! schemas into source text for an [`ArtifactSink`].
//!
//! # Example
//!
//! ```
//! use variant_schema::{generate, EntitySchema, FieldDescriptor, GenerateOptions, Marker, TypeRef};
//!
//! let user = EntitySchema::new("User")
//!     .with_variants(["Create", "Update", "Partial"])
//!     .with_field(
//!         FieldDescriptor::new("id", TypeRef::named("java.lang.String"))
//!             .with_marker(Marker::Creatable),
//!     )
//!     .with_field(
//!         FieldDescriptor::new("name", TypeRef::named("java.lang.String"))
//!             .with_marker(Marker::Updatable)
//!             .with_marker(Marker::Nullable),
//!     );
//!
//! let report = generate(&[user], &GenerateOptions::new());
//!
//! // "id" is only creatable, so it never appears in the update variant
//! let update = &report.artifact("UpdateUser").unwrap().schema;
//! assert_eq!(update.field_names(), ["name"]);
//! assert!(update.to_partial.is_some());
//! ```
//!
//! # Resolution Rules
//!
//! | Kind | Included when | Required when |
//! |------|---------------|---------------|
//! | `Create` | creatable or updatable | not nullable |
//! | `Update` | updatable | never |
//! | `Dto` | not dto-absent | dto-required or api-required |
//! | `Partial`, custom | always | never |
//!
//! An explicit rule for the kind overrides all of the above.
//!
//! # Definition Format
//!
//! ```json
//! {
//!   "name": "User",
//!   "package": "com.example",
//!   "variants": ["Create", "Update", "Partial"],
//!   "fields": [
//!     { "name": "id", "type": "java.lang.String", "markers": ["creatable"] },
//!     { "name": "address", "type": "com.example.Address",
//!       "markers": [{ "rule": { "kind": "Dto", "required": "required", "type_name": "AddressDto" } }] }
//!   ]
//! }
//! ```

mod builder;
mod emit;
mod error;
mod generator;
mod linter;
mod loader;
mod resolver;
mod type_map;
mod types;
mod validator;

pub use builder::{build_variant, partial_field_names, TO_PARTIAL};
pub use emit::{
    emit_artifacts, ArtifactSink, DirSink, Emitter, JsonEmitter, KotlinEmitter, MemorySink,
    WriterSink,
};
pub use error::{EmitError, GenerateError, LoadError, SchemaError, TypeParseError, ValidateError};
pub use generator::{generate, generate_entity, EntityFailure, GenerateReport};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{is_url, load_entities, load_entities_auto, load_entities_str, parse_entities};
pub use resolver::{explicit_rule, is_data_field, resolve_requiredness};
pub use type_map::{resolve_type, TypeResolver, PLATFORM_TYPES};
pub use types::{
    Conversion, EntitySchema, ExplicitRule, FieldDescriptor, FieldMapping, GenerateOptions,
    Marker, Requiredness, TypeRef, VariantArtifact, VariantField, VariantKind, VariantSchema,
    DEFAULT_VARIANTS,
};
pub use validator::{validate, validate_against_schema, variant_json_schema};

#[cfg(feature = "remote")]
pub use loader::load_entities_url;
