//! Variant building - assembles one variant shape and its conversions.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::GenerateError;
use crate::resolver::{explicit_rule, is_data_field, resolve_requiredness};
use crate::type_map::TypeResolver;
use crate::types::{
    annotation_name, Conversion, EntitySchema, FieldDescriptor, FieldMapping, Marker, Requiredness,
    TypeRef, VariantField, VariantKind, VariantSchema, GENERATION_TRIGGERS, KOTLIN_METADATA,
    STRIPPED_FIELD_ANNOTATIONS,
};

/// Name of the generated variant-to-partial conversion.
pub const TO_PARTIAL: &str = "toPartial";

/// Build the variant of `entity` for `kind`.
///
/// Fields keep their declaration order; absent, static and companion fields
/// are dropped. When `include_to_partial` is set, a `toPartial` conversion is
/// attached and every retained field must also exist in the Partial variant.
///
/// # Errors
///
/// Returns `GenerateError` if an override type name is malformed or a
/// retained field has no counterpart in the Partial variant.
pub fn build_variant(
    entity: &EntitySchema,
    kind: &VariantKind,
    include_to_partial: bool,
    resolver: &TypeResolver,
) -> Result<VariantSchema, GenerateError> {
    let name = kind.artifact_name(&entity.name);
    let mut fields = Vec::new();

    for field in entity.fields.iter().filter(|f| is_data_field(f)) {
        let requiredness = resolve_requiredness(field, kind);
        if requiredness == Requiredness::Absent {
            trace!(variant = %name, field = %field.name, "field absent");
            continue;
        }

        let ty = match explicit_rule(field, kind).and_then(|r| r.type_name.as_deref()) {
            Some(type_name) => {
                check_override_name(entity, field, kind, type_name)?;
                TypeRef::named(entity.qualify(type_name))
            }
            None => resolver.resolve(&field.ty, &field.markers),
        };

        fields.push(VariantField {
            name: field.name.clone(),
            requiredness,
            ty: ty.with_nullable(requiredness == Requiredness::Optional),
            annotations: copied_field_annotations(field),
        });
    }

    let from_base = from_base_conversion(entity, &name, &fields);
    let to_partial = if include_to_partial {
        Some(to_partial_conversion(entity, kind, &name, &fields)?)
    } else {
        None
    };

    debug!(
        variant = %name,
        fields = fields.len(),
        to_partial = to_partial.is_some(),
        "built variant"
    );

    Ok(VariantSchema {
        name,
        base_name: entity.name.clone(),
        kind: kind.clone(),
        package: entity.package.clone(),
        fields,
        markers: copied_entity_markers(entity),
        from_base,
        to_partial,
    })
}

/// Names of the fields retained by the Partial variant of `entity`.
pub fn partial_field_names(entity: &EntitySchema) -> HashSet<&str> {
    entity
        .fields
        .iter()
        .filter(|f| is_data_field(f))
        .filter(|f| resolve_requiredness(f, &VariantKind::Partial) != Requiredness::Absent)
        .map(|f| f.name.as_str())
        .collect()
}

fn from_base_conversion(entity: &EntitySchema, variant: &str, fields: &[VariantField]) -> Conversion {
    let parameter = entity.parameter_name();
    let mappings = fields
        .iter()
        .map(|f| FieldMapping {
            target: f.name.clone(),
            source: format!("{}.{}", parameter, f.name),
        })
        .collect();

    Conversion {
        name: variant.to_string(),
        parameter: Some(parameter),
        source: entity.name.clone(),
        target: variant.to_string(),
        mappings,
    }
}

fn to_partial_conversion(
    entity: &EntitySchema,
    kind: &VariantKind,
    variant: &str,
    fields: &[VariantField],
) -> Result<Conversion, GenerateError> {
    let partial_fields = partial_field_names(entity);
    let mut mappings = Vec::with_capacity(fields.len());

    for f in fields {
        if !partial_fields.contains(f.name.as_str()) {
            return Err(GenerateError::MissingPartialField {
                entity: entity.name.clone(),
                field: f.name.clone(),
                kind: kind.clone(),
            });
        }
        mappings.push(FieldMapping {
            target: f.name.clone(),
            source: f.name.clone(),
        });
    }

    Ok(Conversion {
        name: TO_PARTIAL.to_string(),
        parameter: None,
        source: variant.to_string(),
        target: VariantKind::Partial.artifact_name(&entity.name),
        mappings,
    })
}

fn check_override_name(
    entity: &EntitySchema,
    field: &FieldDescriptor,
    kind: &VariantKind,
    type_name: &str,
) -> Result<(), GenerateError> {
    if is_type_path(type_name) {
        Ok(())
    } else {
        Err(GenerateError::InvalidOverrideType {
            entity: entity.name.clone(),
            field: field.name.clone(),
            kind: kind.clone(),
            type_name: type_name.to_string(),
        })
    }
}

/// `Name` or `outer.Name`: non-empty segments of identifier characters.
fn is_type_path(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() || first == '_' => {
                    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
                }
                _ => false,
            }
        })
}

fn copied_field_annotations(field: &FieldDescriptor) -> Vec<String> {
    field
        .annotations()
        .filter(|name| !STRIPPED_FIELD_ANNOTATIONS.contains(&annotation_name(name)))
        .map(String::from)
        .collect()
}

fn copied_entity_markers(entity: &EntitySchema) -> Vec<Marker> {
    entity
        .markers
        .iter()
        .filter(|m| match m {
            Marker::Annotation(name) => {
                name != KOTLIN_METADATA && !GENERATION_TRIGGERS.contains(&annotation_name(name))
            }
            _ => true,
        })
        .cloned()
        .collect()
}
