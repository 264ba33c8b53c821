// マッピング設定
//
// 列名の連結規則、識別子長の上限、自動採番型の判定パターンなど、
// リレーショナルマッピングの挙動を調整する設定（YAML形式）を扱います。

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 識別子長の下限（ハッシュ接尾辞を付けても意味のある名前が残る長さ）
pub const MIN_IDENTIFIER_LENGTH: usize = 16;

/// マッピング設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// 設定ファイルのバージョン
    #[serde(default = "default_version")]
    pub version: String,

    /// 列名・インデックス名を構成する単語の区切り文字
    #[serde(default)]
    pub joiner: String,

    /// 識別子の最大長（超過分はハッシュ接尾辞で短縮）
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,

    /// 自動採番される値型名のパターン
    #[serde(default = "default_auto_assigned_pattern")]
    pub auto_assigned_pattern: String,

    /// テーブル決定ループのパス数上限（未指定時は概念数から算出）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_passes: Option<usize>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_max_identifier_length() -> usize {
    63 // PostgreSQLの識別子上限
}

fn default_auto_assigned_pattern() -> String {
    r"(?i)^(auto\s*counter|auto\s*increment|auto\s*time\s*stamp|serial|guid)$".to_string()
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            joiner: String::new(),
            max_identifier_length: default_max_identifier_length(),
            auto_assigned_pattern: default_auto_assigned_pattern(),
            max_passes: None,
        }
    }
}

impl MappingConfig {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 区切り文字を差し替えた設定を返す
    pub fn with_joiner(mut self, joiner: &str) -> Self {
        self.joiner = joiner.to_string();
        self
    }

    /// 自動採番パターンをコンパイル
    pub fn auto_assigned_regex(&self) -> Result<Regex> {
        Regex::new(&self.auto_assigned_pattern).with_context(|| {
            format!(
                "Invalid auto_assigned_pattern '{}'",
                self.auto_assigned_pattern
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        if self.max_identifier_length < MIN_IDENTIFIER_LENGTH {
            return Err(anyhow!(
                "max_identifier_length must be at least {} (got {})",
                MIN_IDENTIFIER_LENGTH,
                self.max_identifier_length
            ));
        }

        if self.max_passes == Some(0) {
            return Err(anyhow!("max_passes must be greater than zero"));
        }

        self.auto_assigned_regex()?;

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for MappingConfig {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}
