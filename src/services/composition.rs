// 合成パイプライン
//
// 語彙を受け取り、参照構築、テーブル決定、列・インデックス導出、外部キー検証を順に実行して
// 読み取り専用のリレーショナルモデルを作成します。途中で失敗した場合は部分的なモデルを返しません。

use crate::core::conceptual::{ConceptId, Vocabulary};
use crate::core::config::MappingConfig;
use crate::core::error::MappingError;
use crate::core::relational::{capitalize, truncate_identifier, Placement, RelationalModel, Table};
use crate::services::column_deriver::ColumnDeriver;
use crate::services::index_deriver::IndexDeriver;
use crate::services::reference_builder::ReferenceBuilder;
use crate::services::table_decision::TableDecisionEngine;
use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

/// リレーショナルモデル合成サービス
#[derive(Debug, Clone)]
pub struct RelationalComposer {
    config: MappingConfig,
    auto_assigned: Regex,
}

impl RelationalComposer {
    /// 設定を検証して新しいRelationalComposerを作成
    pub fn new(config: MappingConfig) -> Result<Self> {
        config.validate()?;
        let auto_assigned = config.auto_assigned_regex()?;
        Ok(Self {
            config,
            auto_assigned,
        })
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// 語彙をリレーショナルモデルに変換
    ///
    /// # Errors
    ///
    /// - 関数的な役割に相手役割がないなど、語彙がマッピングできない場合
    /// - テーブル決定が上限パス数内に収束しない場合
    /// - 参照経路に対応する参照先の識別子列が見つからない場合
    pub fn compose(&self, vocabulary: &Vocabulary) -> Result<RelationalModel, MappingError> {
        let built = ReferenceBuilder::new(vocabulary).build()?;
        let mut graph = built.graph;

        let engine = TableDecisionEngine::new(vocabulary, &self.auto_assigned, self.config.max_passes);
        let mut state = engine.decide(&mut graph)?;
        engine.repair_identifier_ownership(&mut graph, &mut state);
        engine.repair_stranded(&graph, &mut state);

        let placements = state.placements();
        let joiner = self.config.joiner.as_str();
        let max_length = self.config.max_identifier_length;

        let mut tables = Vec::new();
        {
            let columns = ColumnDeriver::new(
                vocabulary,
                &graph,
                &placements,
                &self.auto_assigned,
                max_length,
            );
            let indices = IndexDeriver::new(vocabulary, &graph, joiner, max_length);

            for concept in vocabulary.concept_ids() {
                if placements[concept.0] != Placement::Table {
                    continue;
                }
                let name = self.table_name(vocabulary, concept);
                let derived = columns.derive(concept)?;
                let table_indices = indices.derive(concept, &name, &derived.columns, &derived.identifier);
                debug!(
                    table = %name,
                    columns = derived.columns.len(),
                    indices = table_indices.len(),
                    "derived table"
                );
                tables.push(Table {
                    concept,
                    name,
                    columns: derived.columns,
                    indices: table_indices,
                    identifier: derived.identifier,
                });
            }
        }

        let tentative = state.tentative_flags();
        let passes = state.passes();
        let model = RelationalModel::new(
            vocabulary.clone(),
            graph,
            placements,
            tentative,
            tables,
            built.unmapped_fact_types,
            passes,
        );

        let mut foreign_keys = 0;
        for table in model.tables() {
            foreign_keys += model.foreign_keys(table)?.len();
        }

        let absorbed = vocabulary
            .concept_ids()
            .filter(|c| model.absorbed_via(*c).is_some())
            .count();
        info!(
            vocabulary = %vocabulary.name,
            tables = model.tables().len(),
            absorbed,
            foreign_keys,
            unmapped = model.unmapped_fact_types().len(),
            passes,
            "composed relational model"
        );
        Ok(model)
    }

    /// テーブル名（概念名の各単語を大文字で始めて連結）
    fn table_name(&self, vocabulary: &Vocabulary, concept: ConceptId) -> String {
        let name = vocabulary
            .concept(concept)
            .name
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(&self.config.joiner);
        truncate_identifier(&name, self.config.max_identifier_length)
    }
}
