// ファクト型の検証

use crate::core::conceptual::{FactTypeId, Vocabulary};
use crate::core::error::{
    ErrorLocation, ValidationError, ValidationResult, ValidationWarning, WarningKind,
};
use crate::core::relational::RoleType;
use crate::services::role_classifier::RoleClassifier;

/// ファクト型の構造検証
///
/// - 役割のないファクト型
/// - 二項でない、またはエンティティ型以外が担う継承ファクト型
/// - 関数的な役割を持つのに相手役割が1つに定まらない多項ファクト型
pub fn validate_structure(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    let classifier = RoleClassifier::new(vocabulary);

    for id in vocabulary.fact_type_ids() {
        let fact_type = vocabulary.fact_type(id);
        let label = vocabulary.fact_type_label(id);
        let location = Some(ErrorLocation::with_fact_type(&label));

        if fact_type.roles.is_empty() {
            result.add_error(ValidationError::Structure {
                message: format!("Fact type {} has no roles", id),
                location,
                suggestion: Some("Declare at least one role".to_string()),
            });
            continue;
        }

        if fact_type.is_subtyping() {
            let players_are_entities = fact_type
                .roles
                .iter()
                .all(|r| vocabulary.concept(vocabulary.role(*r).concept).is_entity());
            if fact_type.arity() != 2 || !players_are_entities {
                result.add_error(ValidationError::Structure {
                    message: format!("Subtyping fact type '{}' must relate two entity types", label),
                    location,
                    suggestion: None,
                });
            }
            continue;
        }

        if fact_type.arity() > 2 && fact_type.objectified_as.is_none() {
            let functional = fact_type.roles.iter().find(|r| {
                matches!(
                    classifier.role_type(**r),
                    RoleType::ManyOne | RoleType::OneOne
                )
            });
            if let Some(role) = functional {
                result.add_error(ValidationError::Constraint {
                    message: format!(
                        "Fact type '{}' has a uniqueness constraint on the single role of '{}' but {} counterparts",
                        label,
                        vocabulary.concept(vocabulary.role(*role).concept).name,
                        fact_type.arity() - 1
                    ),
                    location,
                    suggestion: Some(
                        "Split the fact type, or objectify it so it can be mapped".to_string(),
                    ),
                });
            }
        }
    }

    result
}

/// マッピング結果に影響するファクト型の警告
///
/// - 列にならず結合表候補として残るファクト型
/// - 読みのない単項ファクト型（列名を導出できない）
/// - 吸収の向きが名前順で決まる任意の一対一ファクト型
pub fn validate_mapping_hints(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    let classifier = RoleClassifier::new(vocabulary);

    for id in vocabulary.fact_type_ids() {
        let fact_type = vocabulary.fact_type(id);
        if fact_type.roles.is_empty() || fact_type.is_subtyping() {
            continue;
        }
        let label = vocabulary.fact_type_label(id);

        if fact_type.arity() == 1 {
            let has_reading = fact_type
                .readings
                .first()
                .is_some_and(|r| !r.text.trim().is_empty());
            if !has_reading {
                result.add_warning(ValidationWarning::new(
                    format!(
                        "Unary fact type {} of '{}' has no reading to name its column",
                        id,
                        vocabulary.concept(vocabulary.role(fact_type.roles[0]).concept).name
                    ),
                    Some(ErrorLocation::with_fact_type(&label)),
                    WarningKind::MissingReading,
                ));
            }
            continue;
        }

        if fact_type.objectified_as.is_none()
            && fact_type
                .roles
                .iter()
                .all(|r| classifier.role_type(*r) == RoleType::ManyMany)
        {
            result.add_warning(ValidationWarning::new(
                format!("Fact type '{}' has no functional role and will not be mapped to columns", label),
                Some(ErrorLocation::with_fact_type(&label)),
                WarningKind::Unmapped,
            ));
        }

        if is_ambiguous_one_to_one(vocabulary, &classifier, id) {
            result.add_warning(ValidationWarning::new(
                format!(
                    "Optional one-to-one fact type '{}' is absorbed by name order; mark one side independent to choose",
                    label
                ),
                Some(ErrorLocation::with_fact_type(&label)),
                WarningKind::Ambiguous,
            ));
        }
    }

    result
}

/// 両側とも任意・非独立のエンティティ型どうしの一対一ファクトか
fn is_ambiguous_one_to_one(
    vocabulary: &Vocabulary,
    classifier: &RoleClassifier<'_>,
    id: FactTypeId,
) -> bool {
    let fact_type = vocabulary.fact_type(id);
    if fact_type.arity() != 2 || fact_type.objectified_as.is_some() {
        return false;
    }
    fact_type.roles.iter().all(|role| {
        let player = vocabulary.concept(vocabulary.role(*role).concept);
        classifier.role_type(*role) == RoleType::OneOne
            && player.is_entity()
            && !player.is_independent
            && !vocabulary.is_mandatory(*role)
    })
}
