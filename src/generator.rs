//! Generation driver - builds every requested variant of every entity.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::builder::build_variant;
use crate::error::GenerateError;
use crate::resolver::{explicit_rule, is_data_field};
use crate::types::{
    EntitySchema, GenerateOptions, Requiredness, VariantArtifact, VariantKind,
};

/// An entity whose generation failed. Its artifacts are not reported.
#[derive(Debug, Clone, Serialize)]
pub struct EntityFailure {
    pub entity: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: GenerateError,
}

fn serialize_display<S: serde::Serializer>(
    error: &GenerateError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of a generation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
    pub artifacts: Vec<VariantArtifact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EntityFailure>,
}

impl GenerateReport {
    /// Returns true if every entity generated.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, name: &str) -> Option<&VariantArtifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }
}

/// Generate all requested variants for a batch of entities.
///
/// A configuration error fails only the entity it occurs in; the remaining
/// entities are still generated.
pub fn generate(entities: &[EntitySchema], options: &GenerateOptions) -> GenerateReport {
    let reachable = options
        .strict
        .then(|| reachable_types(entities, options));

    let mut report = GenerateReport::default();
    for entity in entities {
        match generate_with(entity, options, reachable.as_ref()) {
            Ok(artifacts) => report.artifacts.extend(artifacts),
            Err(error) => {
                warn!(entity = %entity.name, %error, "skipping entity");
                report.failures.push(EntityFailure {
                    entity: entity.name.clone(),
                    error,
                });
            }
        }
    }

    info!(
        entities = entities.len(),
        artifacts = report.artifacts.len(),
        failures = report.failures.len(),
        "generation finished"
    );
    report
}

/// Generate all requested variants of a single entity.
///
/// In strict mode only the entity's own types and `options.known_types`
/// are reachable.
///
/// # Errors
///
/// Returns the first `GenerateError` met while building the entity's variants.
pub fn generate_entity(
    entity: &EntitySchema,
    options: &GenerateOptions,
) -> Result<Vec<VariantArtifact>, GenerateError> {
    let reachable = options
        .strict
        .then(|| reachable_types(std::slice::from_ref(entity), options));
    generate_with(entity, options, reachable.as_ref())
}

fn generate_with(
    entity: &EntitySchema,
    options: &GenerateOptions,
    reachable: Option<&HashSet<String>>,
) -> Result<Vec<VariantArtifact>, GenerateError> {
    let wants_partial = entity.requests(&VariantKind::Partial);
    let mut artifacts = Vec::with_capacity(entity.variants.len());

    for kind in &entity.variants {
        if let Some(reachable) = reachable {
            check_override_types(entity, kind, reachable)?;
        }

        let include_to_partial = *kind != VariantKind::Partial && wants_partial;
        let schema = build_variant(entity, kind, include_to_partial, &options.type_resolver)?;
        artifacts.push(VariantArtifact {
            name: schema.name.clone(),
            package: entity.package.clone(),
            schema,
        });
    }

    Ok(artifacts)
}

/// Every fully qualified type name an override may point at: the batch's
/// entities, their generated variants and the configured known types.
fn reachable_types(entities: &[EntitySchema], options: &GenerateOptions) -> HashSet<String> {
    let mut types: HashSet<String> = options.known_types.iter().cloned().collect();
    for entity in entities {
        types.insert(entity.qualify(&entity.name));
        types.extend(
            entity
                .variants
                .iter()
                .map(|k| entity.qualify(&k.artifact_name(&entity.name))),
        );
    }
    types
}

fn check_override_types(
    entity: &EntitySchema,
    kind: &VariantKind,
    reachable: &HashSet<String>,
) -> Result<(), GenerateError> {
    for field in entity.fields.iter().filter(|f| is_data_field(f)) {
        let Some(rule) = explicit_rule(field, kind) else {
            continue;
        };
        let Some(type_name) = rule.type_name.as_deref() else {
            continue;
        };
        if rule.required == Requiredness::Absent {
            continue;
        }
        // Overrides are always emitted in the entity's own package
        if !reachable.contains(&entity.qualify(type_name)) {
            return Err(GenerateError::UnresolvedOverrideType {
                entity: entity.name.clone(),
                field: field.name.clone(),
                kind: kind.clone(),
                type_name: type_name.to_string(),
            });
        }
    }
    Ok(())
}
