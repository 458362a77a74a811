//! Core types for variant generation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeParseError;
use crate::type_map::TypeResolver;

/// Kinds generated when an entity does not list any.
pub const DEFAULT_VARIANTS: &[&str] = &["Partial", "Update", "Create", "Dto"];

/// Field name reserved for the companion slot of the base entity.
pub const COMPANION_FIELD: &str = "Companion";

/// Entity annotations that trigger generation and are not copied onto variants.
pub const GENERATION_TRIGGERS: &[&str] = &["PartialDataObjects", "DtoGenerate"];

/// Compiler metadata annotation, never copied onto variants.
pub const KOTLIN_METADATA: &str = "kotlin.Metadata";

/// Field annotations dropped when copying onto variant fields.
/// Nullability is decided by the variant, not the base entity.
pub const STRIPPED_FIELD_ANNOTATIONS: &[&str] = &["NotNull", "Nullable"];

/// Last segment of a dotted path (`a.b.C` -> `C`).
pub(crate) fn simple_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Simple name of an annotation, ignoring any argument list
/// (`a.b.JsonInclude(JsonInclude.Include.NON_NULL)` -> `JsonInclude`).
pub(crate) fn annotation_name(text: &str) -> &str {
    simple_name(text.split('(').next().unwrap_or(text).trim())
}

/// A reference to a type, possibly parameterized and nullable.
///
/// Written as `name<arg, arg>?`, e.g. `java.util.Map<java.lang.String, java.lang.Long>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub nullable: bool,
}

impl TypeRef {
    /// A non-parameterized, non-nullable type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    /// A parameterized, non-nullable type.
    pub fn parameterized(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            nullable: false,
        }
    }

    /// Copy of this type with the given nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    /// Unqualified name of the raw type.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(ty),
            Some(c) => Err(parser.error(format!("unexpected '{}'", c))),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: String) -> TypeParseError {
        TypeParseError {
            input: self.src.to_string(),
            offset: self.pos,
            message,
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeParseError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            // `$` for nested JVM classes, `*` for star projections
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '*') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected type name".to_string()));
        }
        let name = self.src[start..self.pos].to_string();

        self.skip_ws();
        let mut args = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
                    None => return Err(self.error("unclosed '<'".to_string())),
                }
            }
            self.skip_ws();
        }

        let nullable = self.peek() == Some('?');
        if nullable {
            self.pos += 1;
        }

        Ok(TypeRef {
            name,
            args,
            nullable,
        })
    }
}

/// Variant kind requested for an entity.
///
/// The four magic kinds carry built-in resolution rules; any other name is a
/// custom kind and resolves with the generic rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariantKind {
    Partial,
    Create,
    Update,
    Dto,
    Custom(String),
}

impl VariantKind {
    /// Parse a kind name. Magic names match exactly; anything else is custom.
    pub fn parse(name: &str) -> Self {
        match name {
            "Partial" => VariantKind::Partial,
            "Create" => VariantKind::Create,
            "Update" => VariantKind::Update,
            "Dto" => VariantKind::Dto,
            other => VariantKind::Custom(other.to_string()),
        }
    }

    /// Name used as the prefix of generated artifacts.
    pub fn name(&self) -> &str {
        match self {
            VariantKind::Partial => "Partial",
            VariantKind::Create => "Create",
            VariantKind::Update => "Update",
            VariantKind::Dto => "Dto",
            VariantKind::Custom(name) => name,
        }
    }

    /// Artifact name for this kind and a base entity (`Create` + `User` = `CreateUser`).
    pub fn artifact_name(&self, entity: &str) -> String {
        format!("{}{}", self.name(), entity)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for VariantKind {
    fn from(value: &str) -> Self {
        VariantKind::parse(value)
    }
}

impl From<String> for VariantKind {
    fn from(value: String) -> Self {
        VariantKind::parse(&value)
    }
}

impl From<VariantKind> for String {
    fn from(value: VariantKind) -> Self {
        value.name().to_string()
    }
}

/// Inclusion state of a field within one variant.
///
/// Serialized lowercase; deserialized case-insensitively through [`Requiredness::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Requiredness {
    /// Present, non-nullable, no default.
    Required,
    /// Present, nullable, defaults to absent.
    #[default]
    Optional,
    /// Excluded from the variant and its conversions.
    Absent,
}

impl Requiredness {
    /// Parse a requiredness value, case-insensitive.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "required" => Some(Requiredness::Required),
            "optional" => Some(Requiredness::Optional),
            "absent" => Some(Requiredness::Absent),
            _ => None,
        }
    }
}

impl TryFrom<String> for Requiredness {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Requiredness::parse(&value).ok_or_else(|| {
            format!(
                "unknown requiredness \"{}\", expected required, optional or absent",
                value
            )
        })
    }
}

fn default_rule_kind() -> VariantKind {
    VariantKind::Partial
}

/// Per-field override of the resolution rules for one variant kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExplicitRule {
    #[serde(default = "default_rule_kind")]
    pub kind: VariantKind,
    #[serde(default)]
    pub required: Requiredness,
    /// Name of a type in the variant's package that replaces the declared type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl ExplicitRule {
    pub fn new(kind: impl Into<VariantKind>, required: Requiredness) -> Self {
        Self {
            kind: kind.into(),
            required,
            type_name: None,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// A tag attached to a field or an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Creatable,
    Updatable,
    Nullable,
    /// API documentation declares the field as required.
    ApiRequired,
    DtoRequired,
    DtoAbsent,
    /// The value type (last type argument) of a container may be null.
    HasNullableValues,
    Rule(ExplicitRule),
    /// Any other annotation, copied through onto generated shapes.
    Annotation(String),
}

/// A field of a base entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    #[serde(default, rename = "static", skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            markers: Vec::new(),
            is_static: false,
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn has(&self, marker: &Marker) -> bool {
        self.markers.contains(marker)
    }

    /// Explicit rules attached to this field, in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &ExplicitRule> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Rule(rule) => Some(rule),
            _ => None,
        })
    }

    /// Opaque annotations attached to this field.
    pub fn annotations(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().filter_map(|m| match m {
            Marker::Annotation(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn default_variants() -> Vec<VariantKind> {
    DEFAULT_VARIANTS.iter().map(|k| VariantKind::parse(k)).collect()
}

/// A base entity definition, as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    pub package: String,
    /// Requested variant kinds, in declared order.
    #[serde(default = "default_variants")]
    pub variants: Vec<VariantKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntitySchema {
    /// New entity in the root package requesting the default variants.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: String::new(),
            variants: default_variants(),
            markers: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_variants<K: Into<VariantKind>>(mut self, kinds: impl IntoIterator<Item = K>) -> Self {
        self.variants = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn requests(&self, kind: &VariantKind) -> bool {
        self.variants.contains(kind)
    }

    /// Parameter name used by conversion-from-base functions (`User` -> `user`).
    pub fn parameter_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Fully qualified name of a type living in this entity's package.
    pub fn qualify(&self, name: &str) -> String {
        if self.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.package, name)
        }
    }
}

/// A field retained in a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantField {
    pub name: String,
    pub requiredness: Requiredness,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
}

impl VariantField {
    /// Optional fields default to absent; required fields have no default.
    pub fn has_default(&self) -> bool {
        self.requiredness == Requiredness::Optional
    }
}

/// One entry of a conversion: `target` is assigned from `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMapping {
    pub target: String,
    pub source: String,
}

/// Declarative field-to-field mapping between two record shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub name: String,
    /// Parameter holding the source instance; `None` when converting from `self`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub source: String,
    pub target: String,
    pub mappings: Vec<FieldMapping>,
}

/// A fully built variant of one base entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSchema {
    pub name: String,
    pub base_name: String,
    pub kind: VariantKind,
    pub package: String,
    pub fields: Vec<VariantField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    pub from_base: Conversion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_partial: Option<Conversion>,
}

impl VariantSchema {
    pub fn field(&self, name: &str) -> Option<&VariantField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// One generated unit handed to an emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantArtifact {
    pub name: String,
    pub package: String,
    pub schema: VariantSchema,
}

/// Options for a generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// When true, every override type name, qualified with the entity's
    /// package, must resolve to a type in the batch or in `known_types`.
    pub strict: bool,
    /// Fully qualified types reachable at emission time besides the batch's own.
    pub known_types: BTreeSet<String>,
    pub type_resolver: TypeResolver,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn known_type(mut self, name: impl Into<String>) -> Self {
        self.known_types.insert(name.into());
        self
    }

    pub fn type_resolver(mut self, resolver: TypeResolver) -> Self {
        self.type_resolver = resolver;
        self
    }
}
