// 列導出サービス
//
// 決定済みのテーブルから参照グラフを辿り、吸収された概念を平坦化した列の一覧を導出します。
// 各列は参照の経路を持ち、経路の各ホップから列名、必須性、データ型を求めます。

use crate::core::conceptual::{ConceptId, Vocabulary};
use crate::core::error::MappingError;
use crate::core::relational::{Column, DataType, Placement, ReferenceGraph, ReferenceId, RoleType};
use regex::Regex;

/// 参照の経路
pub type Path = Vec<ReferenceId>;

/// テーブルの列と識別子列の位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedColumns {
    pub columns: Vec<Column>,
    pub identifier: Vec<usize>,
}

/// 列導出サービス
#[derive(Debug, Clone)]
pub struct ColumnDeriver<'a> {
    vocabulary: &'a Vocabulary,
    graph: &'a ReferenceGraph,
    placements: &'a [Placement],
    auto_assigned: &'a Regex,
    max_name_length: usize,
}

impl<'a> ColumnDeriver<'a> {
    /// 新しいColumnDeriverを作成
    pub fn new(
        vocabulary: &'a Vocabulary,
        graph: &'a ReferenceGraph,
        placements: &'a [Placement],
        auto_assigned: &'a Regex,
        max_name_length: usize,
    ) -> Self {
        Self {
            vocabulary,
            graph,
            placements,
            auto_assigned,
            max_name_length,
        }
    }

    /// テーブルの列と識別子列を導出
    pub fn derive(&self, table: ConceptId) -> Result<DerivedColumns, MappingError> {
        let columns = self.all_columns(table)?;
        let mut identifier = Vec::new();
        for path in self.identifier_paths(table)? {
            let position = columns
                .iter()
                .position(|c| c.references == path)
                .ok_or_else(|| {
                    MappingError::inconsistency(
                        "identifier is not carried by the table's own columns",
                        &self.vocabulary.concept(table).name,
                    )
                })?;
            if !identifier.contains(&position) {
                identifier.push(position);
            }
        }
        Ok(DerivedColumns { columns, identifier })
    }

    /// テーブルの全列
    ///
    /// 継承先への参照、識別子の参照、その他の参照、吸収されたサブタイプへの参照の順に並びます。
    pub fn all_columns(&self, table: ConceptId) -> Result<Vec<Column>, MappingError> {
        let mut visiting = Vec::new();
        let paths = self.absorbed_paths(table, None, &mut visiting)?;
        Ok(paths
            .into_iter()
            .map(|path| self.column(table, path))
            .collect())
    }

    /// 概念の識別子を構成する経路（優先識別子の役割順）
    pub fn identifier_paths(&self, concept: ConceptId) -> Result<Vec<Path>, MappingError> {
        let mut stack = Vec::new();
        self.identifier_paths_within(concept, &mut stack)
    }

    fn identifier_paths_within(
        &self,
        concept: ConceptId,
        stack: &mut Vec<ConceptId>,
    ) -> Result<Vec<Path>, MappingError> {
        let c = self.vocabulary.concept(concept);
        if c.is_value() {
            return Ok(vec![Vec::new()]);
        }
        if stack.contains(&concept) {
            return Err(MappingError::inconsistency("cyclic identification", &c.name));
        }
        stack.push(concept);

        let own = self.vocabulary.own_identifier_roles(concept);
        let mut paths = Vec::new();
        if own.is_empty() {
            let (fact_type, supertype) = self
                .vocabulary
                .identifying_supertype(concept)
                .ok_or_else(|| {
                    MappingError::inconsistency("entity type has no preferred identifier", &c.name)
                })?;
            let inherited = self.identifier_paths_within(supertype, stack)?;
            let subtype_reference = self.graph.references_from(concept).iter().copied().find(|id| {
                let reference = self.graph.get(*id);
                reference.fact_type == fact_type && reference.role_type == RoleType::Subtype
            });
            match subtype_reference {
                Some(id) => paths.extend(inherited.into_iter().map(|suffix| prepend(id, suffix))),
                None => paths.extend(inherited),
            }
        } else {
            for role in own {
                let outgoing = self
                    .graph
                    .references_from(concept)
                    .iter()
                    .copied()
                    .find(|id| self.graph.get(*id).to_role == Some(role));
                if let Some(id) = outgoing {
                    let suffixes = match self.graph.get(id).to {
                        Some(to) => self.identifier_paths_within(to, stack)?,
                        None => vec![Vec::new()],
                    };
                    paths.extend(suffixes.into_iter().map(|suffix| prepend(id, suffix)));
                    continue;
                }

                let incoming = self
                    .graph
                    .references_to(concept)
                    .iter()
                    .copied()
                    .find(|id| self.graph.get(*id).from_role == Some(role));
                match incoming {
                    Some(id) => {
                        let from = self.graph.get(id).from;
                        paths.extend(self.identifier_paths_within(from, stack)?);
                    }
                    None => {
                        return Err(MappingError::inconsistency(
                            "preferred identifier role is not reachable through any reference",
                            &c.name,
                        ))
                    }
                }
            }
        }

        stack.pop();
        Ok(paths)
    }

    /// 概念を吸収したときの経路（`arriving` は吸収に使った参照）
    fn absorbed_paths(
        &self,
        concept: ConceptId,
        arriving: Option<ReferenceId>,
        visiting: &mut Vec<ConceptId>,
    ) -> Result<Vec<Path>, MappingError> {
        if visiting.contains(&concept) {
            return Err(self.cyclic_absorption(arriving, concept));
        }
        visiting.push(concept);

        let mut paths = Vec::new();
        if self.vocabulary.concept(concept).is_value() {
            paths.push(Vec::new());
        }
        let arriving_fact_type = arriving.map(|id| self.graph.get(id).fact_type);
        for id in self.ordered_references(concept) {
            if Some(self.graph.get(id).fact_type) == arriving_fact_type {
                continue;
            }
            for suffix in self.reference_suffixes(id, visiting)? {
                paths.push(prepend(id, suffix));
            }
        }

        visiting.pop();
        Ok(paths)
    }

    fn reference_suffixes(
        &self,
        id: ReferenceId,
        visiting: &mut Vec<ConceptId>,
    ) -> Result<Vec<Path>, MappingError> {
        let reference = self.graph.get(id);
        let Some(to) = reference.to else {
            return Ok(vec![Vec::new()]);
        };

        if reference.role_type == RoleType::Unary {
            let mut suffixes = vec![Vec::new()];
            if self.placements[to.0] == Placement::Absorbed(id) {
                suffixes.extend(self.absorbed_paths(to, Some(id), visiting)?);
            }
            return Ok(suffixes);
        }

        match self.placements[to.0] {
            Placement::Absorbed(via) if via == id => self.absorbed_paths(to, Some(id), visiting),
            _ => self.identifier_paths(to),
        }
    }

    /// 列の並び順に並べた出ていく参照
    fn ordered_references(&self, concept: ConceptId) -> Vec<ReferenceId> {
        let identifier = self.vocabulary.preferred_identifier_roles(concept);
        let outgoing = self.graph.references_from(concept);

        let mut ordered: Vec<ReferenceId> = outgoing
            .iter()
            .copied()
            .filter(|id| self.graph.get(*id).role_type == RoleType::Subtype)
            .collect();
        for role in &identifier {
            ordered.extend(outgoing.iter().copied().filter(|id| {
                let reference = self.graph.get(*id);
                reference.role_type != RoleType::Subtype
                    && reference.role_type != RoleType::Supertype
                    && reference.to_role == Some(*role)
            }));
        }
        let rest: Vec<ReferenceId> = outgoing
            .iter()
            .copied()
            .filter(|id| {
                let reference = self.graph.get(*id);
                !ordered.contains(id) && reference.role_type != RoleType::Supertype
            })
            .collect();
        ordered.extend(rest);
        ordered.extend(
            outgoing
                .iter()
                .copied()
                .filter(|id| self.graph.get(*id).role_type == RoleType::Supertype),
        );
        ordered
    }

    fn column(&self, table: ConceptId, path: Path) -> Column {
        let words = self.words(table, &path);
        let is_mandatory = path.iter().all(|id| self.graph.get(*id).is_mandatory());
        let terminal = self.terminal(table, &path);
        let is_auto_assigned = path.len() <= 1
            && terminal.is_some_and(|c| {
                self.vocabulary.concept(c).is_value() && self.is_auto_assigned_value(c)
            });
        let data_type = self.data_type(table, &path);
        Column::new(
            path,
            words,
            is_mandatory,
            is_auto_assigned,
            data_type,
            self.max_name_length,
        )
    }

    /// 経路の各ホップ名を連結した単語列
    ///
    /// 直前の単語と同じ単語は省き、直前の単語で始まる単語はその部分を取り除きます。
    fn words(&self, table: ConceptId, path: &[ReferenceId]) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for id in path {
            let mut names = self.hop_names(*id);
            if let (Some(previous), Some(first)) = (words.last().cloned(), names.first().cloned()) {
                let previous_lower = previous.to_lowercase();
                let first_lower = first.to_lowercase();
                if first_lower == previous_lower {
                    names.remove(0);
                } else if first_lower.starts_with(&previous_lower) {
                    names[0] = first.chars().skip(previous.chars().count()).collect();
                }
            }
            words.extend(names.into_iter().filter(|w| !w.is_empty()));
        }
        if words.is_empty() {
            words = split_words(&self.vocabulary.concept(table).name);
        }
        words
    }

    /// ホップの名前（役割名、形容詞付きの概念名、または単項ファクトの読み）
    fn hop_names(&self, id: ReferenceId) -> Vec<String> {
        let reference = self.graph.get(id);
        match (reference.to_role, reference.to) {
            (Some(role), Some(to)) => {
                if let Some(name) = &self.vocabulary.role(role).role_name {
                    return split_words(name);
                }
                let (leading, trailing) = self.vocabulary.role_adjectives(role);
                let mut words = Vec::new();
                if let Some(adjective) = leading {
                    words.extend(split_words(adjective));
                }
                words.extend(split_words(&self.vocabulary.concept(to).name));
                if let Some(adjective) = trailing {
                    words.extend(split_words(adjective));
                }
                words
            }
            (None, Some(to)) => split_words(&self.vocabulary.concept(to).name),
            (_, None) => {
                let fact_type = self.vocabulary.fact_type(reference.fact_type);
                let text = fact_type
                    .readings
                    .first()
                    .map(|r| strip_placeholders(&r.text))
                    .unwrap_or_default();
                split_words(&text)
            }
        }
    }

    /// 経路の終端の概念（単項ファクトは None）
    fn terminal(&self, table: ConceptId, path: &[ReferenceId]) -> Option<ConceptId> {
        match path.last() {
            None => Some(table),
            Some(id) => {
                let reference = self.graph.get(*id);
                if reference.role_type == RoleType::Unary {
                    None
                } else {
                    reference.to
                }
            }
        }
    }

    fn data_type(&self, table: ConceptId, path: &[ReferenceId]) -> DataType {
        let Some(terminal) = self.terminal(table, path) else {
            return DataType {
                base_type: "Boolean".to_string(),
                ..DataType::default()
            };
        };
        if self.vocabulary.concept(terminal).is_entity() {
            return DataType {
                base_type: self.vocabulary.concept(terminal).name.clone(),
                ..DataType::default()
            };
        }

        let chain = self.vocabulary.value_type_chain(terminal);
        let defs: Vec<_> = chain
            .iter()
            .filter_map(|c| self.vocabulary.concept(*c).as_value())
            .collect();
        let base = chain.last().copied().unwrap_or(terminal);

        let role_restriction = path
            .last()
            .and_then(|id| self.graph.get(*id).to_role)
            .map(|role| self.vocabulary.role(role).value_restriction.clone())
            .filter(|values| !values.is_empty());
        let value_restrictions = role_restriction
            .or_else(|| {
                defs.iter()
                    .map(|d| d.value_restriction.clone())
                    .find(|values| !values.is_empty())
            })
            .unwrap_or_default();

        DataType {
            base_type: self.vocabulary.concept(base).name.clone(),
            length: defs.iter().find_map(|d| d.length),
            scale: defs.iter().find_map(|d| d.scale),
            value_restrictions,
        }
    }

    fn is_auto_assigned_value(&self, concept: ConceptId) -> bool {
        self.vocabulary
            .value_type_chain(concept)
            .iter()
            .any(|c| self.auto_assigned.is_match(&self.vocabulary.concept(*c).name))
    }

    fn cyclic_absorption(&self, arriving: Option<ReferenceId>, concept: ConceptId) -> MappingError {
        match arriving {
            Some(id) => {
                let reference = self.graph.get(id);
                MappingError::MappingFailure {
                    reference: reference.describe(self.vocabulary),
                    fact_type: self.vocabulary.fact_type_label(reference.fact_type),
                    message: "cyclic absorption".to_string(),
                }
            }
            None => MappingError::inconsistency(
                "cyclic absorption",
                &self.vocabulary.concept(concept).name,
            ),
        }
    }
}

fn prepend(id: ReferenceId, suffix: Path) -> Path {
    let mut path = Vec::with_capacity(suffix.len() + 1);
    path.push(id);
    path.extend(suffix);
    path
}

fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// 読みから `{0}` 形式のプレースホルダーを取り除く
fn strip_placeholders(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_placeholder = false;
    for ch in text.chars() {
        match ch {
            '{' => in_placeholder = true,
            '}' if in_placeholder => in_placeholder = false,
            _ if !in_placeholder => result.push(ch),
            _ => {}
        }
    }
    result
}
