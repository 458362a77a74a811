//! Type resolution - maps declared JVM types onto their Kotlin equivalents.

use std::collections::BTreeMap;

use crate::types::{Marker, TypeRef};

/// Platform types with a Kotlin counterpart. Anything not listed passes through.
pub const PLATFORM_TYPES: &[(&str, &str)] = &[
    ("java.lang.Object", "kotlin.Any"),
    ("java.lang.String", "kotlin.String"),
    ("java.lang.CharSequence", "kotlin.CharSequence"),
    ("java.lang.Throwable", "kotlin.Throwable"),
    ("java.lang.Cloneable", "kotlin.Cloneable"),
    ("java.lang.Number", "kotlin.Number"),
    ("java.lang.Comparable", "kotlin.Comparable"),
    ("java.lang.Enum", "kotlin.Enum"),
    ("java.lang.annotation.Annotation", "kotlin.Annotation"),
    ("java.lang.Boolean", "kotlin.Boolean"),
    ("java.lang.Character", "kotlin.Char"),
    ("java.lang.Byte", "kotlin.Byte"),
    ("java.lang.Short", "kotlin.Short"),
    ("java.lang.Integer", "kotlin.Int"),
    ("java.lang.Long", "kotlin.Long"),
    ("java.lang.Float", "kotlin.Float"),
    ("java.lang.Double", "kotlin.Double"),
    ("boolean", "kotlin.Boolean"),
    ("char", "kotlin.Char"),
    ("byte", "kotlin.Byte"),
    ("short", "kotlin.Short"),
    ("int", "kotlin.Int"),
    ("long", "kotlin.Long"),
    ("float", "kotlin.Float"),
    ("double", "kotlin.Double"),
    ("java.lang.Iterable", "kotlin.collections.Iterable"),
    ("java.util.Iterator", "kotlin.collections.Iterator"),
    ("java.util.ListIterator", "kotlin.collections.ListIterator"),
    ("java.util.Collection", "kotlin.collections.Collection"),
    ("java.util.List", "kotlin.collections.List"),
    ("java.util.Set", "kotlin.collections.Set"),
    ("java.util.Map", "kotlin.collections.Map"),
    ("java.util.Map.Entry", "kotlin.collections.Map.Entry"),
];

/// Resolves declared field types into target types.
///
/// Carries the built-in platform table plus any configured overrides.
#[derive(Debug, Clone)]
pub struct TypeResolver {
    mappings: BTreeMap<String, String>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self {
            mappings: PLATFORM_TYPES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl TypeResolver {
    /// Resolver with no mappings at all; every type passes through.
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    /// Add or replace a mapping.
    pub fn with_mapping(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.mappings.insert(from.into(), to.into());
        self
    }

    /// Target name for a raw (non-parameterized) type name, if mapped.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.mappings.get(name).map(String::as_str)
    }

    /// Resolve a declared type.
    ///
    /// Type arguments resolve without markers. With `HasNullableValues`, the
    /// last type argument of a parameterized type becomes nullable. Unknown
    /// types are returned unchanged.
    pub fn resolve(&self, ty: &TypeRef, markers: &[Marker]) -> TypeRef {
        let name = self
            .lookup(&ty.name)
            .map(str::to_string)
            .unwrap_or_else(|| ty.name.clone());

        if !ty.is_parameterized() {
            return TypeRef::named(name).with_nullable(ty.nullable);
        }

        let mut args: Vec<TypeRef> = ty.args.iter().map(|arg| self.resolve(arg, &[])).collect();
        if markers.contains(&Marker::HasNullableValues) {
            if let Some(last) = args.last_mut() {
                last.nullable = true;
            }
        }

        TypeRef::parameterized(name, args).with_nullable(ty.nullable)
    }
}

/// Resolve a declared type with the built-in platform table.
pub fn resolve_type(ty: &TypeRef, markers: &[Marker]) -> TypeRef {
    TypeResolver::default().resolve(ty, markers)
}
