// 概念の検証

use crate::core::conceptual::{ConceptId, Vocabulary};
use crate::core::error::{ErrorLocation, ValidationError, ValidationResult};
use std::collections::HashSet;

/// 概念名の重複検証
pub fn validate_duplicate_names(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen = HashSet::new();
    for concept in &vocabulary.concepts {
        if !seen.insert(concept.name.as_str()) {
            result.add_error(ValidationError::Structure {
                message: format!("Duplicate concept name '{}'", concept.name),
                location: Some(ErrorLocation::with_concept(&concept.name)),
                suggestion: Some("Rename one of the concepts".to_string()),
            });
        }
    }
    result
}

/// エンティティ型の識別の検証
///
/// - 優先識別子（継承・客体化を含む）がない
/// - 客体化の対応が双方向で一致しない
pub fn validate_identification(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    for concept in vocabulary.concept_ids() {
        let name = &vocabulary.concept(concept).name;
        let Some(entity) = vocabulary.concept(concept).as_entity() else {
            continue;
        };

        if vocabulary.preferred_identifier_roles(concept).is_empty() {
            result.add_error(ValidationError::Constraint {
                message: format!("Entity type '{}' has no preferred identifier", name),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: Some(
                    "Add 'identified_by', an 'identifier', an objectified fact type or an identifying supertype"
                        .to_string(),
                ),
            });
        }

        if let Some(fact_type) = entity.fact_type {
            if vocabulary.fact_type(fact_type).objectified_as != Some(concept) {
                result.add_error(ValidationError::Structure {
                    message: format!(
                        "Entity type '{}' objectifies fact type '{}' which is not objectified by it",
                        name,
                        vocabulary.fact_type_label(fact_type)
                    ),
                    location: Some(ErrorLocation::with_concept(name)),
                    suggestion: None,
                });
            }
        }
    }
    result
}

/// 値型の特化チェーンの検証（エンティティ型への特化と循環）
pub fn validate_value_supertypes(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    for concept in vocabulary.concept_ids() {
        let name = &vocabulary.concept(concept).name;
        let Some(supertype) = vocabulary.concept(concept).as_value().and_then(|v| v.supertype) else {
            continue;
        };
        if !vocabulary.concept(supertype).is_value() {
            result.add_error(ValidationError::Structure {
                message: format!(
                    "Value type '{}' specializes entity type '{}'",
                    name,
                    vocabulary.concept(supertype).name
                ),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: Some("A value type can only specialize another value type".to_string()),
            });
            continue;
        }
        let chain = vocabulary.value_type_chain(concept);
        let last = chain[chain.len() - 1];
        let closes_cycle = vocabulary
            .concept(last)
            .as_value()
            .and_then(|v| v.supertype)
            .is_some_and(|sup| sup == concept);
        if closes_cycle {
            result.add_error(ValidationError::Structure {
                message: format!("Value type '{}' is part of a supertype cycle", name),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: None,
            });
        }
    }
    result
}

/// サブタイプ関係の循環検証
pub fn validate_subtype_cycles(vocabulary: &Vocabulary) -> ValidationResult {
    let mut result = ValidationResult::new();
    for concept in vocabulary.concept_ids() {
        if reaches(vocabulary, concept, concept) {
            let name = &vocabulary.concept(concept).name;
            result.add_error(ValidationError::Structure {
                message: format!("Entity type '{}' is its own supertype", name),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: Some("Remove one of the subtyping fact types in the cycle".to_string()),
            });
        }
    }
    result
}

/// `from` のスーパータイプを辿って `target` に届くか
fn reaches(vocabulary: &Vocabulary, from: ConceptId, target: ConceptId) -> bool {
    let mut stack: Vec<ConceptId> = vocabulary.supertypes(from).into_iter().map(|(_, s)| s).collect();
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if seen.insert(current) {
            stack.extend(vocabulary.supertypes(current).into_iter().map(|(_, s)| s));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conceptual::VocabularyBuilder;

    #[test]
    fn test_duplicate_names() {
        let mut b = VocabularyBuilder::new("V");
        b.value_type("Name");
        b.value_type("Name");
        let result = validate_duplicate_names(&b.build());
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].is_structure());
    }

    #[test]
    fn test_entity_without_identifier() {
        let mut b = VocabularyBuilder::new("V");
        b.entity_type("Ghost");
        let result = validate_identification(&b.build());
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].is_constraint());
        assert!(result.errors[0].to_string().contains("Ghost"));
    }

    #[test]
    fn test_inherited_identifier_is_accepted() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        let employee = b.entity_type("Employee");
        b.identified_by(person, name);
        b.subtype(employee, person);
        assert!(validate_identification(&b.build()).is_valid());
    }

    #[test]
    fn test_value_supertype_cycle() {
        let mut b = VocabularyBuilder::new("V");
        let a = b.value_type("A");
        let c = b.value_type("C");
        b.value_supertype(a, c);
        b.value_supertype(c, a);
        let result = validate_value_supertypes(&b.build());
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_subtype_cycle() {
        let mut b = VocabularyBuilder::new("V");
        let a = b.entity_type("A");
        let c = b.entity_type("C");
        b.subtype(a, c);
        b.subtype(c, a);
        let result = validate_subtype_cycles(&b.build());
        assert_eq!(result.error_count(), 2);
    }
}
