// orderコマンドハンドラー
//
// テーブル（またはすべての概念）を依存関係に従った出力順で表示します。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::conceptual::Vocabulary;
use crate::services::dependency_orderer::{concept_order, table_order, EmissionStep};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// orderコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct OrderCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 語彙ファイル
    pub file: PathBuf,
    /// テーブルではなくすべての概念を並べる
    pub concepts: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// 出力順の1ステップ
#[derive(Debug, Clone, Serialize)]
pub struct OrderStep {
    pub name: String,
    pub forced: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub released: Vec<String>,
}

/// orderコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct OrderOutput {
    pub vocabulary: String,
    /// "tables" または "concepts"
    pub subject: String,
    pub steps: Vec<OrderStep>,
}

impl OrderOutput {
    pub fn new(vocabulary: &Vocabulary, subject: &str, steps: &[EmissionStep]) -> Self {
        Self {
            vocabulary: vocabulary.name.clone(),
            subject: subject.to_string(),
            steps: steps
                .iter()
                .map(|step| OrderStep {
                    name: step.name.clone(),
                    forced: step.forced,
                    released: step
                        .released_fact_types
                        .iter()
                        .map(|ft| vocabulary.fact_type_label(*ft))
                        .collect(),
                })
                .collect(),
        }
    }

    /// 循環を断ち切るために強制されたステップ数
    pub fn forced_count(&self) -> usize {
        self.steps.iter().filter(|s| s.forced).count()
    }
}

impl CommandOutput for OrderOutput {
    fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            format!("=== Emission Order ({}): {} ===", self.subject, self.vocabulary).bold()
        ));

        for (i, step) in self.steps.iter().enumerate() {
            if step.forced {
                output.push_str(&format!(
                    "{:>3}. {} {}\n",
                    i + 1,
                    step.name,
                    "(forced)".yellow()
                ));
            } else {
                output.push_str(&format!("{:>3}. {}\n", i + 1, step.name));
            }
            for fact_type in &step.released {
                output.push_str(&format!("       {}\n", fact_type.dimmed()));
            }
        }

        let forced = self.forced_count();
        if forced > 0 {
            output.push_str(&format!(
                "\n{}\n",
                format!("⚠ {} step(s) forced to break dependency cycles", forced).yellow()
            ));
        }
        output
    }
}

/// orderコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct OrderCommandHandler {}

impl OrderCommandHandler {
    /// 新しいOrderCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// orderコマンドを実行
    pub fn execute(&self, command: &OrderCommand) -> Result<String> {
        debug!(file = ?command.file, concepts = command.concepts, "Executing order command");

        let context =
            CommandContext::load_with_config(command.project_path.clone(), command.config_path.clone())?;
        let vocabulary = context
            .load_vocabulary(&command.file)
            .with_context(|| "Failed to load vocabulary")?;

        let output = if command.concepts {
            OrderOutput::new(&vocabulary, "concepts", &concept_order(&vocabulary))
        } else {
            let model = context.map_vocabulary(&vocabulary)?;
            let steps = table_order(&model)?;
            OrderOutput::new(&vocabulary, "tables", &steps)
        };
        render_output(&output, &command.format)
    }
}
