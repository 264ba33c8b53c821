// 存在制約の検証

use crate::core::conceptual::Vocabulary;
use crate::core::error::{ErrorLocation, ValidationError, ValidationResult};

/// 制約の形の検証（空の役割列、頻度の矛盾）
pub fn validate_constraint_shapes(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    for id in vocabulary.constraint_ids() {
        let constraint = vocabulary.constraint(id);
        let label = constraint
            .name
            .clone()
            .unwrap_or_else(|| format!("constraint {}", id));

        if vocabulary.sequence_roles(constraint.role_sequence).is_empty() {
            result.add_error(ValidationError::Structure {
                message: format!("Constraint '{}' spans no roles", label),
                location: None,
                suggestion: None,
            });
        }

        if let (Some(min), Some(max)) = (constraint.min_frequency, constraint.max_frequency) {
            if min > max {
                result.add_error(ValidationError::Constraint {
                    message: format!(
                        "Constraint '{}' has min frequency {} greater than max frequency {}",
                        label, min, max
                    ),
                    location: None,
                    suggestion: None,
                });
            }
        }
    }
    result
}

/// 優先識別子の検証
///
/// - 一意性制約でない
/// - 識別する役割のファクト型にエンティティ型自身が参加していない（客体化を除く）
pub fn validate_preferred_identifiers(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    for concept in vocabulary.concept_ids() {
        let name = &vocabulary.concept(concept).name;
        let Some(pi) = vocabulary
            .concept(concept)
            .as_entity()
            .and_then(|e| e.preferred_identifier)
        else {
            continue;
        };
        let constraint = vocabulary.constraint(pi);

        if !constraint.is_uniqueness() {
            result.add_error(ValidationError::Constraint {
                message: format!(
                    "Preferred identifier of '{}' is not a uniqueness constraint",
                    name
                ),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: Some("Use a constraint with max frequency 1".to_string()),
            });
        }

        for role in vocabulary.sequence_roles(constraint.role_sequence) {
            let fact_type_id = vocabulary.role(role).fact_type;
            let fact_type = vocabulary.fact_type(fact_type_id);
            let participates = fact_type.objectified_as == Some(concept)
                || fact_type
                    .roles
                    .iter()
                    .any(|r| *r != role && vocabulary.role(*r).concept == concept);
            if !participates {
                result.add_error(ValidationError::Constraint {
                    message: format!(
                        "Preferred identifier of '{}' uses a role of '{}' which '{}' does not take part in",
                        name,
                        vocabulary.fact_type_label(fact_type_id),
                        name
                    ),
                    location: Some(ErrorLocation {
                        concept: Some(name.clone()),
                        fact_type: Some(vocabulary.fact_type_label(fact_type_id)),
                        role: Some(vocabulary.role(role).ordinal),
                    }),
                    suggestion: None,
                });
            }
        }
    }
    result
}
