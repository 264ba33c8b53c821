// validateコマンドハンドラー
//
// 語彙検証機能を実装します。
// - 語彙ファイルの読み込み
// - バリデーションルールの実行
// - エラーと警告のフォーマットされた表示
// - 検証結果のサマリー表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::conceptual::Vocabulary;
use crate::core::error::{ErrorLocation, ValidationResult};
use crate::services::vocabulary_validator::VocabularyValidatorService;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// validateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ValidateCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 語彙ファイル
    pub file: PathBuf,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// 検証で見つかった問題
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(message: String, location: Option<&ErrorLocation>, suggestion: Option<&str>) -> Self {
        Self {
            message,
            concept: location.and_then(|l| l.concept.clone()),
            fact_type: location.and_then(|l| l.fact_type.clone()),
            suggestion: suggestion.map(str::to_string),
        }
    }
}

/// 語彙の統計情報
#[derive(Debug, Clone, Serialize)]
pub struct ValidationStatistics {
    pub value_types: usize,
    pub entity_types: usize,
    pub fact_types: usize,
    pub constraints: usize,
}

impl ValidationStatistics {
    /// 語彙から統計情報を計算
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        let entity_types = vocabulary.concepts.iter().filter(|c| c.is_entity()).count();
        Self {
            value_types: vocabulary.concepts.len() - entity_types,
            entity_types,
            fact_types: vocabulary.fact_types.len(),
            constraints: vocabulary.constraints.len(),
        }
    }
}

/// validateコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub is_valid: bool,
    pub vocabulary: String,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub statistics: ValidationStatistics,
}

impl ValidateOutput {
    /// 検証結果から出力を作成
    pub fn new(vocabulary: &Vocabulary, result: &ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid(),
            vocabulary: vocabulary.name.clone(),
            errors: result
                .errors
                .iter()
                .map(|e| ValidationIssue::new(e.to_string(), e.location(), e.suggestion()))
                .collect(),
            warnings: result
                .warnings
                .iter()
                .map(|w| ValidationIssue::new(w.message.clone(), w.location.as_ref(), None))
                .collect(),
            statistics: ValidationStatistics::from_vocabulary(vocabulary),
        }
    }
}

impl CommandOutput for ValidateOutput {
    fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("=== Vocabulary Validation Results: {} ===", self.vocabulary).bold()
        ));

        if !self.errors.is_empty() {
            output.push_str(&format!(
                "{}\n\n",
                format!("✗ {} error(s) found:", self.errors.len()).red()
            ));
            for (i, issue) in self.errors.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, issue.message));
                if let Some(suggestion) = &issue.suggestion {
                    output.push_str(&format!("   Suggestion: {}\n", suggestion));
                }
                output.push('\n');
            }
        }

        if !self.warnings.is_empty() {
            output.push_str(&format!(
                "{}\n\n",
                format!("⚠ {} warning(s) found:", self.warnings.len()).yellow()
            ));
            for (i, issue) in self.warnings.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, issue.message));
            }
            output.push('\n');
        }

        output.push_str("=== Vocabulary Statistics ===\n");
        output.push_str(&format!("Value types: {}\n", self.statistics.value_types));
        output.push_str(&format!("Entity types: {}\n", self.statistics.entity_types));
        output.push_str(&format!("Fact types: {}\n", self.statistics.fact_types));
        output.push_str(&format!("Constraints: {}\n", self.statistics.constraints));

        output.push_str("\n=== Result ===\n");
        if self.is_valid {
            output.push_str(&format!(
                "{}\n",
                "✓ Validation complete. No errors found.".green()
            ));
        } else {
            output.push_str(&format!(
                "{}\n",
                format!("✗ Validation complete. {} error(s) found.", self.errors.len()).red()
            ));
        }

        output
    }
}

/// validateコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct ValidateCommandHandler {}

impl ValidateCommandHandler {
    /// 新しいValidateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// validateコマンドを実行
    ///
    /// # Returns
    ///
    /// 成功時は検証結果のサマリー。エラーがある場合は検証結果を含むエラーを返します。
    pub fn execute(&self, command: &ValidateCommand) -> Result<String> {
        debug!(file = ?command.file, "Executing validate command");

        let context =
            CommandContext::load_with_config(command.project_path.clone(), command.config_path.clone())?;
        let vocabulary = context
            .load_vocabulary(&command.file)
            .with_context(|| "Failed to load vocabulary")?;

        let result = VocabularyValidatorService::new().validate(&vocabulary);
        let output = ValidateOutput::new(&vocabulary, &result);
        let rendered = render_output(&output, &command.format)?;

        if result.is_valid() {
            Ok(rendered)
        } else {
            Err(anyhow!(
                "{}\nVocabulary validation failed with {} error(s)",
                rendered,
                result.error_count()
            ))
        }
    }
}
