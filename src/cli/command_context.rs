// コマンド共通コンテキスト
//
// 設定ファイル読み込みや語彙ファイルのパス解決の重複をCLI層で集約する。

use crate::core::conceptual::Vocabulary;
use crate::core::config::MappingConfig;
use crate::core::relational::RelationalModel;
use crate::services::composition::RelationalComposer;
use crate::services::config_loader::ConfigLoader;
use crate::services::vocabulary_io::vocabulary_parser::VocabularyParserService;
use crate::services::vocabulary_validator::VocabularyValidatorService;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    /// 読み込んだ設定ファイル（デフォルト設定を使う場合は None）
    pub config_path: Option<PathBuf>,
    pub config: MappingConfig,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    ///
    /// `.factmap.yaml` がなければデフォルト設定を使います。
    pub fn load(project_path: PathBuf) -> Result<Self> {
        Self::load_with_config(project_path, None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    ///
    /// 明示的に指定された設定ファイルは存在しなければエラーです。
    pub fn load_with_config(
        project_path: PathBuf,
        custom_config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (config_path, config) = match custom_config_path {
            Some(path) => {
                let path = resolve(&project_path, &path);
                let config =
                    ConfigLoader::from_file(&path).with_context(|| "Failed to read config file")?;
                (Some(path), config)
            }
            None => {
                let path = project_path.join(MappingConfig::DEFAULT_CONFIG_PATH);
                if path.exists() {
                    let config = ConfigLoader::from_file(&path)
                        .with_context(|| "Failed to read config file")?;
                    (Some(path), config)
                } else {
                    (None, MappingConfig::default())
                }
            }
        };

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 語彙ファイルの絶対パス
    pub fn vocabulary_path(&self, file: &Path) -> PathBuf {
        resolve(&self.project_path, file)
    }

    /// 語彙ファイルを読み込む
    pub fn load_vocabulary(&self, file: &Path) -> Result<Vocabulary> {
        VocabularyParserService::new().parse_file(&self.vocabulary_path(file))
    }

    /// 語彙を検証してからリレーショナルモデルに変換する
    ///
    /// 検証エラーがあれば変換せずにエラーを返します。警告はログに出力します。
    pub fn map_vocabulary(&self, vocabulary: &Vocabulary) -> Result<RelationalModel> {
        let validation = VocabularyValidatorService::new().validate(vocabulary);
        for warning in &validation.warnings {
            warn!("{}", warning.format());
        }
        if !validation.is_valid() {
            let messages: Vec<String> = validation.errors.iter().map(|e| e.to_string()).collect();
            return Err(anyhow!(
                "Vocabulary '{}' is invalid ({} error(s)):\n  {}",
                vocabulary.name,
                validation.error_count(),
                messages.join("\n  ")
            ));
        }

        let composer = RelationalComposer::new(self.config.clone())?;
        composer
            .compose(vocabulary)
            .with_context(|| format!("Failed to map vocabulary '{}'", vocabulary.name))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
