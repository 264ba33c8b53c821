// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::MappingConfig;
use crate::core::error::IoError;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<MappingConfig> {
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: MappingConfig = content
            .parse()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<MappingConfig> {
        let path = Path::new(MappingConfig::DEFAULT_CONFIG_PATH);
        Self::from_file(path)
    }

    /// ファイルがあれば読み込み、なければデフォルト設定を返す
    pub fn load_or_default(path: &Path) -> Result<MappingConfig> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(MappingConfig::default())
        }
    }
}
