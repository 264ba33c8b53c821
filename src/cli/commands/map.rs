// mapコマンドハンドラー
//
// 語彙をリレーショナルモデルに変換して表示します。
// - 語彙ファイルの読み込みと検証（エラーがあれば変換しない）
// - テーブル、列、インデックス、外部キーの導出
// - 吸収された概念と列にならなかったファクト型の表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::error::MappingError;
use crate::core::relational::{Placement, RelationalModel};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// mapコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct MapCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 語彙ファイル
    pub file: PathBuf,
    /// 設定の区切り文字を上書きする
    pub joiner: Option<String>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// 列の出力
#[derive(Debug, Clone, Serialize)]
pub struct ColumnOutput {
    pub name: String,
    pub data_type: String,
    pub mandatory: bool,
    pub auto_assigned: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_restrictions: Vec<String>,
}

/// インデックスの出力
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutput {
    pub name: String,
    pub columns: Vec<String>,
    pub primary: bool,
}

/// 外部キーの出力
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyOutput {
    pub to_table: String,
    pub from_columns: Vec<String>,
    pub to_columns: Vec<String>,
}

/// テーブルの出力
#[derive(Debug, Clone, Serialize)]
pub struct TableOutput {
    pub name: String,
    /// 既定の判断でテーブルになったか
    pub tentative: bool,
    pub columns: Vec<ColumnOutput>,
    pub primary_key: Vec<String>,
    pub indices: Vec<IndexOutput>,
    pub foreign_keys: Vec<ForeignKeyOutput>,
}

/// 吸収された概念の出力
#[derive(Debug, Clone, Serialize)]
pub struct AbsorptionOutput {
    pub concept: String,
    /// 吸収先の概念
    pub into: String,
    pub reference: String,
}

/// mapコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct MapOutput {
    pub vocabulary: String,
    pub tables: Vec<TableOutput>,
    pub absorbed: Vec<AbsorptionOutput>,
    pub unmapped_fact_types: Vec<String>,
    pub passes: usize,
}

impl MapOutput {
    /// リレーショナルモデルから出力を作成
    pub fn from_model(model: &RelationalModel, joiner: &str) -> Result<Self, MappingError> {
        let vocabulary = model.vocabulary();

        let mut tables = Vec::with_capacity(model.tables().len());
        for table in model.tables() {
            let names = table.column_names(joiner);
            let pick = |positions: &[usize]| -> Vec<String> {
                positions.iter().map(|p| names[*p].clone()).collect()
            };

            let foreign_keys = model
                .foreign_keys(table)?
                .into_iter()
                .map(|fk| {
                    let target_names = model
                        .table_for(fk.to)
                        .map(|t| t.column_names(joiner))
                        .unwrap_or_default();
                    ForeignKeyOutput {
                        to_table: fk.to_table,
                        from_columns: pick(&fk.from_columns),
                        to_columns: fk
                            .to_columns
                            .iter()
                            .filter_map(|p| target_names.get(*p).cloned())
                            .collect(),
                    }
                })
                .collect();

            tables.push(TableOutput {
                name: table.name.clone(),
                tentative: model.is_tentative(table.concept),
                columns: table
                    .columns
                    .iter()
                    .zip(&names)
                    .map(|(column, name)| ColumnOutput {
                        name: name.clone(),
                        data_type: column.data_type.to_string(),
                        mandatory: column.is_mandatory,
                        auto_assigned: column.is_auto_assigned,
                        value_restrictions: column.data_type.value_restrictions.clone(),
                    })
                    .collect(),
                primary_key: pick(&table.identifier),
                indices: table
                    .indices
                    .iter()
                    .map(|index| IndexOutput {
                        name: index.name.clone(),
                        columns: pick(&index.columns),
                        primary: index.is_primary,
                    })
                    .collect(),
                foreign_keys,
            });
        }

        let mut absorbed: Vec<AbsorptionOutput> = vocabulary
            .concept_ids()
            .filter_map(|concept| match model.placement(concept) {
                Placement::Absorbed(via) => {
                    let reference = model.reference(via);
                    Some(AbsorptionOutput {
                        concept: model.concept_name(concept).to_string(),
                        into: model.concept_name(reference.from).to_string(),
                        reference: reference.describe(vocabulary),
                    })
                }
                _ => None,
            })
            .collect();
        absorbed.sort_by(|a, b| a.concept.cmp(&b.concept));

        Ok(Self {
            vocabulary: vocabulary.name.clone(),
            tables,
            absorbed,
            unmapped_fact_types: model
                .unmapped_fact_types()
                .iter()
                .map(|ft| vocabulary.fact_type_label(*ft))
                .collect(),
            passes: model.passes(),
        })
    }
}

impl CommandOutput for MapOutput {
    fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            format!("=== Relational Mapping: {} ===", self.vocabulary).bold()
        ));

        for table in &self.tables {
            output.push('\n');
            let marker = if table.tentative { " (tentative)" } else { "" };
            output.push_str(&format!("{}{}\n", table.name.bold(), marker.yellow()));

            for column in &table.columns {
                let mut flags = Vec::new();
                if table.primary_key.contains(&column.name) {
                    flags.push("PK".to_string());
                }
                flags.push(if column.mandatory { "NOT NULL" } else { "NULL" }.to_string());
                if column.auto_assigned {
                    flags.push("AUTO".to_string());
                }
                if !column.value_restrictions.is_empty() {
                    flags.push(format!("IN ({})", column.value_restrictions.join(", ")));
                }
                output.push_str(&format!(
                    "  {} {} {}\n",
                    column.name,
                    column.data_type.cyan(),
                    flags.join(" ")
                ));
            }

            for index in &table.indices {
                let kind = if index.primary { "PRIMARY KEY" } else { "UNIQUE" };
                output.push_str(&format!(
                    "  {} {} ({})\n",
                    kind.green(),
                    index.name,
                    index.columns.join(", ")
                ));
            }

            for fk in &table.foreign_keys {
                output.push_str(&format!(
                    "  {} ({}) → {} ({})\n",
                    "FOREIGN KEY".blue(),
                    fk.from_columns.join(", "),
                    fk.to_table,
                    fk.to_columns.join(", ")
                ));
            }
        }

        if !self.absorbed.is_empty() {
            output.push_str(&format!("\n{}\n", "--- Absorbed ---".bold()));
            for absorbed in &self.absorbed {
                output.push_str(&format!(
                    "  {} into {} via {}\n",
                    absorbed.concept, absorbed.into, absorbed.reference
                ));
            }
        }

        if !self.unmapped_fact_types.is_empty() {
            output.push_str(&format!("\n{}\n", "--- Unmapped fact types ---".yellow().bold()));
            for fact_type in &self.unmapped_fact_types {
                output.push_str(&format!("  {}\n", fact_type));
            }
        }

        output.push_str(&format!(
            "\n{} table(s), {} absorbed concept(s), decided in {} pass(es)\n",
            self.tables.len(),
            self.absorbed.len(),
            self.passes
        ));
        output
    }
}

/// mapコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct MapCommandHandler {}

impl MapCommandHandler {
    /// 新しいMapCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// mapコマンドを実行
    pub fn execute(&self, command: &MapCommand) -> Result<String> {
        debug!(file = ?command.file, "Executing map command");

        let mut context =
            CommandContext::load_with_config(command.project_path.clone(), command.config_path.clone())?;
        let vocabulary = context
            .load_vocabulary(&command.file)
            .with_context(|| "Failed to load vocabulary")?;

        if let Some(joiner) = &command.joiner {
            context.config = context.config.with_joiner(joiner);
        }
        let model = context.map_vocabulary(&vocabulary)?;

        let output = MapOutput::from_model(&model, &context.config.joiner)?;
        render_output(&output, &command.format)
    }
}
