// ID参照の検証
//
// アリーナ間のID参照が範囲内で、役割とファクト型の対応が一致しているかを確認します。
// 後続の検証はこの検証が通った語彙に対してのみ実行されます。

use crate::core::conceptual::{FactTypeId, Vocabulary};
use crate::core::error::{ErrorLocation, ValidationError, ValidationResult};

fn dangling(message: String, location: ErrorLocation) -> ValidationError {
    ValidationError::Reference {
        message,
        location: Some(location),
        suggestion: None,
    }
}

/// ID参照の検証
pub fn validate_references(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    let concepts = vocabulary.concepts.len();
    let fact_types = vocabulary.fact_types.len();
    let roles = vocabulary.roles.len();
    let sequences = vocabulary.role_sequences.len();
    let constraints = vocabulary.constraints.len();

    for (index, role) in vocabulary.roles.iter().enumerate() {
        let location = ErrorLocation {
            role: Some(index),
            ..ErrorLocation::default()
        };
        if role.concept.0 >= concepts {
            result.add_error(dangling(
                format!("Role {} is played by unknown concept {}", index, role.concept),
                location.clone(),
            ));
        }
        if role.fact_type.0 >= fact_types {
            result.add_error(dangling(
                format!("Role {} belongs to unknown fact type {}", index, role.fact_type),
                location,
            ));
        }
    }

    for (index, fact_type) in vocabulary.fact_types.iter().enumerate() {
        let location = ErrorLocation::with_fact_type(FactTypeId(index).to_string());
        for role in &fact_type.roles {
            if role.0 >= roles {
                result.add_error(dangling(
                    format!("Fact type {} has unknown role {}", index, role),
                    location.clone(),
                ));
            } else if vocabulary.role(*role).fact_type.0 != index {
                result.add_error(dangling(
                    format!("Role {} is listed by fact type {} but belongs to another", role, index),
                    location.clone(),
                ));
            }
        }
        for reading in &fact_type.readings {
            if reading.role_sequence.0 >= sequences {
                result.add_error(dangling(
                    format!("Reading of fact type {} uses unknown role sequence", index),
                    location.clone(),
                ));
            }
        }
        if let Some(entity) = fact_type.objectified_as {
            if entity.0 >= concepts {
                result.add_error(dangling(
                    format!("Fact type {} is objectified by unknown concept {}", index, entity),
                    location.clone(),
                ));
            }
        }
    }

    for (index, sequence) in vocabulary.role_sequences.iter().enumerate() {
        for role_ref in &sequence.role_refs {
            if role_ref.role.0 >= roles {
                result.add_error(dangling(
                    format!("Role sequence {} has unknown role {}", index, role_ref.role),
                    ErrorLocation::new(),
                ));
            }
        }
    }

    for (index, constraint) in vocabulary.constraints.iter().enumerate() {
        if constraint.role_sequence.0 >= sequences {
            result.add_error(dangling(
                format!("Constraint {} uses unknown role sequence", index),
                ErrorLocation::new(),
            ));
        }
    }

    for concept in &vocabulary.concepts {
        let location = ErrorLocation::with_concept(&concept.name);
        if let Some(entity) = concept.as_entity() {
            if entity.preferred_identifier.is_some_and(|pi| pi.0 >= constraints) {
                result.add_error(dangling(
                    format!("Entity type '{}' has an unknown preferred identifier", concept.name),
                    location.clone(),
                ));
            }
            if entity.fact_type.is_some_and(|ft| ft.0 >= fact_types) {
                result.add_error(dangling(
                    format!("Entity type '{}' objectifies an unknown fact type", concept.name),
                    location.clone(),
                ));
            }
        }
        if let Some(value) = concept.as_value() {
            if value.supertype.is_some_and(|sup| sup.0 >= concepts) {
                result.add_error(dangling(
                    format!("Value type '{}' has an unknown supertype", concept.name),
                    location,
                ));
            }
        }
    }

    result
}
