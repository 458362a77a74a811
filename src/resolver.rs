//! Requiredness resolution - decides how each field appears in a variant.
//!
//! Rules are evaluated in order, first match wins:
//!
//! | Step | Applies to | Outcome |
//! |------|------------|---------|
//! | 1 | explicit rule for the kind | the rule's requiredness |
//! | 2 | `Create` | absent unless creatable/updatable; optional if nullable, else required |
//! | 3 | `Update` | absent unless updatable; otherwise optional |
//! | 4 | `Dto` | absent if dto-absent; required if dto-required or api-required; else optional |
//! | 5 | `Partial` and custom kinds | optional |

use crate::types::{
    ExplicitRule, FieldDescriptor, Marker, Requiredness, VariantKind, COMPANION_FIELD,
};

/// Whether a field carries data at all.
///
/// Static fields and the companion slot never appear in any variant.
pub fn is_data_field(field: &FieldDescriptor) -> bool {
    !field.is_static && field.name != COMPANION_FIELD
}

/// The first explicit rule on `field` targeting `kind`, if any.
pub fn explicit_rule<'a>(field: &'a FieldDescriptor, kind: &VariantKind) -> Option<&'a ExplicitRule> {
    field.rules().find(|rule| &rule.kind == kind)
}

/// Resolve the requiredness of a field for a variant kind.
///
/// Pure function of its inputs. Does not consider [`is_data_field`]; the
/// builder filters infrastructure fields before asking.
pub fn resolve_requiredness(field: &FieldDescriptor, kind: &VariantKind) -> Requiredness {
    if let Some(rule) = explicit_rule(field, kind) {
        return rule.required;
    }

    match kind {
        VariantKind::Create => resolve_create(field),
        VariantKind::Update => resolve_update(field),
        VariantKind::Dto => resolve_dto(field),
        VariantKind::Partial | VariantKind::Custom(_) => Requiredness::Optional,
    }
}

fn resolve_create(field: &FieldDescriptor) -> Requiredness {
    if !field.has(&Marker::Creatable) && !field.has(&Marker::Updatable) {
        return Requiredness::Absent;
    }
    if field.has(&Marker::Nullable) {
        Requiredness::Optional
    } else {
        Requiredness::Required
    }
}

fn resolve_update(field: &FieldDescriptor) -> Requiredness {
    if field.has(&Marker::Updatable) {
        Requiredness::Optional
    } else {
        Requiredness::Absent
    }
}

fn resolve_dto(field: &FieldDescriptor) -> Requiredness {
    // Absent dominates both required flags
    if field.has(&Marker::DtoAbsent) {
        return Requiredness::Absent;
    }
    if field.has(&Marker::DtoRequired) || field.has(&Marker::ApiRequired) {
        Requiredness::Required
    } else {
        Requiredness::Optional
    }
}
