// 語彙バリデーターサービス
//
// マッピング前に語彙の整合性を検証するサービス。
// ID参照、概念、ファクト型、存在制約を検証し、エラーと警告をまとめて返します。

mod concept_validator;
mod constraint_validator;
mod fact_type_validator;
mod reference_validator;

use crate::core::conceptual::Vocabulary;
use crate::core::error::ValidationResult;

/// 語彙バリデーターサービス
#[derive(Debug, Clone, Default)]
pub struct VocabularyValidatorService {}

impl VocabularyValidatorService {
    /// 新しいVocabularyValidatorServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 語彙の全体的な検証を実行
    ///
    /// ID参照が壊れている場合は、それ以降の検証を行わずに参照エラーだけを返します。
    pub fn validate(&self, vocabulary: &Vocabulary) -> ValidationResult {
        let mut result = self.validate_references(vocabulary);
        if !result.is_valid() {
            return result;
        }

        result.merge_all([
            concept_validator::validate_duplicate_names(vocabulary),
            concept_validator::validate_value_supertypes(vocabulary),
            concept_validator::validate_subtype_cycles(vocabulary),
            constraint_validator::validate_constraint_shapes(vocabulary),
            fact_type_validator::validate_structure(vocabulary),
        ]);

        // 識別の検証は構造が正しい語彙に対してのみ意味を持つ
        if result.is_valid() {
            result.merge_all([
                constraint_validator::validate_preferred_identifiers(vocabulary),
                concept_validator::validate_identification(vocabulary),
            ]);
        }

        result.merge(fact_type_validator::validate_mapping_hints(vocabulary));
        result
    }

    /// ID参照の検証
    pub fn validate_references(&self, vocabulary: &Vocabulary) -> ValidationResult {
        reference_validator::validate_references(vocabulary)
    }
}
