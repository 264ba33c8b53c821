// 語彙パーサーサービス
//
// YAML語彙ファイルの読み込みと解析を行うサービス。
// DTO変換はDtoConverterServiceに委譲しています。

use crate::core::conceptual::Vocabulary;
use crate::core::error::IoError;
use crate::services::vocabulary_io::dto::VocabularyDto;
use crate::services::vocabulary_io::dto_converter::DtoConverterService;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 語彙パーサーサービス
#[derive(Debug, Clone, Default)]
pub struct VocabularyParserService {
    /// DTO変換サービス
    dto_converter: DtoConverterService,
}

impl VocabularyParserService {
    /// 新しいVocabularyParserServiceを作成
    pub fn new() -> Self {
        Self {
            dto_converter: DtoConverterService::new(),
        }
    }

    /// YAMLファイルを解析して語彙に変換
    ///
    /// 語彙名が省略されている場合はファイル名（拡張子なし）を使います。
    ///
    /// # Errors
    ///
    /// - ファイルが存在しない場合
    /// - ファイルの読み込みに失敗した場合
    /// - YAMLの解析、または名前の解決に失敗した場合
    pub fn parse_file(&self, file_path: &Path) -> Result<Vocabulary> {
        if !file_path.exists() {
            return Err(IoError::FileNotFound {
                path: file_path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(file_path).map_err(|e| IoError::FileRead {
            path: file_path.display().to_string(),
            cause: e.to_string(),
        })?;

        let mut dto: VocabularyDto =
            serde_saphyr::from_str(&content).map_err(|e| self.format_parse_error(file_path, e))?;
        if dto.name.is_empty() {
            dto.name = file_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }

        let vocabulary = self
            .dto_converter
            .dto_to_vocabulary(&dto)
            .with_context(|| format!("Failed to load vocabulary file: {:?}", file_path))?;
        debug!(
            file = %file_path.display(),
            concepts = vocabulary.concepts.len(),
            fact_types = vocabulary.fact_types.len(),
            "loaded vocabulary"
        );
        Ok(vocabulary)
    }

    /// YAML文字列を解析して語彙に変換
    pub fn parse_str(&self, yaml: &str) -> Result<Vocabulary> {
        let dto: VocabularyDto =
            serde_saphyr::from_str(yaml).with_context(|| "Failed to parse vocabulary YAML")?;
        self.dto_converter.dto_to_vocabulary(&dto)
    }

    /// serde_saphyrエラーから行番号を抽出
    fn extract_line_from_error(&self, error: &serde_saphyr::Error) -> Option<usize> {
        let error_msg = error.to_string();
        let re = Regex::new(r"line (\d+)").ok()?;
        re.captures(&error_msg)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// エラーメッセージのフォーマット
    fn format_parse_error(&self, file_path: &Path, error: serde_saphyr::Error) -> anyhow::Error {
        match self.extract_line_from_error(&error) {
            Some(line) => anyhow::anyhow!(
                "Failed to parse YAML at {}:{}: {}",
                file_path.display(),
                line,
                error
            ),
            None => anyhow::anyhow!("Failed to parse YAML at {}: {}", file_path.display(), error),
        }
    }
}
