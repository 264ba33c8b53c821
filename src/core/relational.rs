// リレーショナルモデル
//
// 概念モデルから導出される参照グラフ、テーブル決定、列、インデックス、外部キーを表現します。
// 参照はアリーナ上に保持し、反転は同じスロット内のフィールド交換として扱います。

use crate::core::conceptual::{ConceptId, ConstraintId, FactTypeId, RoleId, Vocabulary};
use crate::core::error::MappingError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// ハッシュ接尾辞の長さ（16進数の文字数）
const HASH_SUFFIX_LENGTH: usize = 8;

/// 参照のID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceId(pub usize);

impl ReferenceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference#{}", self.0)
    }
}

/// 役割の種別（カーディナリティ分類）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Unary,
    OneOne,
    OneMany,
    ManyOne,
    ManyMany,
    Subtype,
    Supertype,
}

impl RoleType {
    /// 反転後の種別
    fn flipped(self) -> Self {
        match self {
            RoleType::Subtype => RoleType::Supertype,
            RoleType::Supertype => RoleType::Subtype,
            RoleType::OneMany => RoleType::ManyOne,
            RoleType::ManyOne => RoleType::OneMany,
            other => other,
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleType::Unary => "unary",
            RoleType::OneOne => "one_one",
            RoleType::OneMany => "one_many",
            RoleType::ManyOne => "many_one",
            RoleType::ManyMany => "many_many",
            RoleType::Subtype => "subtype",
            RoleType::Supertype => "supertype",
        };
        write!(f, "{}", name)
    }
}

/// 参照（概念から概念への有向辺）
///
/// `from` の各インスタンスは高々1つの `to` に対応します。
/// 単項ファクトでは `to` が存在せず、客体化ファクトの辺では片方の役割が存在しません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub from: ConceptId,
    pub to: Option<ConceptId>,
    pub from_role: Option<RoleId>,
    pub to_role: Option<RoleId>,
    /// 由来となったファクト型
    pub fact_type: FactTypeId,
    pub role_type: RoleType,
    /// すべての `from` が `to` を持つか
    pub from_mandatory: bool,
    /// すべての `to` が `from` を持つか
    pub to_mandatory: bool,
}

impl Reference {
    /// 参照を辿る列が必須かどうか
    pub fn is_mandatory(&self) -> bool {
        self.from_mandatory
    }

    /// 一対一の参照かどうか（継承を含む）
    pub fn is_one_to_one(&self) -> bool {
        match self.role_type {
            RoleType::OneOne | RoleType::Subtype | RoleType::Supertype => true,
            RoleType::Unary => self.to.is_some(),
            _ => false,
        }
    }

    /// 継承ファクト型由来の参照かどうか
    pub fn is_inheritance(&self) -> bool {
        matches!(self.role_type, RoleType::Subtype | RoleType::Supertype)
    }

    /// 自己参照かどうか
    pub fn is_self_loop(&self) -> bool {
        self.to == Some(self.from)
    }

    /// "From -> To" 形式の説明
    pub fn describe(&self, vocabulary: &Vocabulary) -> String {
        let from = &vocabulary.concept(self.from).name;
        match self.to {
            Some(to) => format!("{} -> {}", from, vocabulary.concept(to).name),
            None => format!("{} -> (unary)", from),
        }
    }
}

/// 参照グラフ
///
/// 参照をアリーナに保持し、概念ごとの入出力リストをID順で管理します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceGraph {
    references: Vec<Reference>,
    from_index: Vec<Vec<ReferenceId>>,
    to_index: Vec<Vec<ReferenceId>>,
}

impl ReferenceGraph {
    /// 概念数を指定してグラフを作成
    pub fn new(concept_count: usize) -> Self {
        Self {
            references: Vec::new(),
            from_index: vec![Vec::new(); concept_count],
            to_index: vec![Vec::new(); concept_count],
        }
    }

    /// 参照を追加し、両端の概念に登録
    pub fn add(&mut self, reference: Reference) -> ReferenceId {
        let id = ReferenceId(self.references.len());
        self.from_index[reference.from.0].push(id);
        if let Some(to) = reference.to {
            self.to_index[to.0].push(id);
        }
        self.references.push(reference);
        id
    }

    /// 参照を反転（from/to、役割、必須性を入れ替え）
    ///
    /// `to` を持たない参照は反転できず、false を返します。
    pub fn flip(&mut self, id: ReferenceId) -> bool {
        let reference = &self.references[id.0];
        let Some(to) = reference.to else {
            return false;
        };
        let from = reference.from;

        detach(&mut self.from_index[from.0], id);
        detach(&mut self.to_index[to.0], id);

        let reference = &mut self.references[id.0];
        reference.from = to;
        reference.to = Some(from);
        std::mem::swap(&mut reference.from_role, &mut reference.to_role);
        std::mem::swap(&mut reference.from_mandatory, &mut reference.to_mandatory);
        reference.role_type = reference.role_type.flipped();

        attach(&mut self.from_index[to.0], id);
        attach(&mut self.to_index[from.0], id);
        true
    }

    pub fn get(&self, id: ReferenceId) -> &Reference {
        &self.references[id.0]
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn ids(&self) -> impl Iterator<Item = ReferenceId> {
        (0..self.references.len()).map(ReferenceId)
    }

    /// 概念から出ていく参照（ID順）
    pub fn references_from(&self, concept: ConceptId) -> &[ReferenceId] {
        &self.from_index[concept.0]
    }

    /// 概念に入ってくる参照（ID順）
    pub fn references_to(&self, concept: ConceptId) -> &[ReferenceId] {
        &self.to_index[concept.0]
    }

    /// 概念がいずれかの参照に関わっているか
    pub fn is_referenced(&self, concept: ConceptId) -> bool {
        !self.from_index[concept.0].is_empty() || !self.to_index[concept.0].is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

fn detach(list: &mut Vec<ReferenceId>, id: ReferenceId) {
    list.retain(|r| *r != id);
}

fn attach(list: &mut Vec<ReferenceId>, id: ReferenceId) {
    let position = list.partition_point(|r| *r < id);
    list.insert(position, id);
}

/// 概念の配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// 独立したテーブル
    Table,
    /// 参照を通じて別のテーブルに吸収
    Absorbed(ReferenceId),
}

/// 列のデータ型
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataType {
    /// 基底型名（値型チェーンの根）
    pub base_type: String,
    pub length: Option<u32>,
    pub scale: Option<u32>,
    pub value_restrictions: Vec<String>,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_type)?;
        match (self.length, self.scale) {
            (Some(length), Some(scale)) => write!(f, "({}, {})", length, scale),
            (Some(length), None) => write!(f, "({})", length),
            _ => Ok(()),
        }
    }
}

/// 列
///
/// `references` はテーブルから葉の値型までの吸収経路です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub references: Vec<ReferenceId>,
    /// 名前を構成する単語（経路の各ホップから導出）
    pub words: Vec<String>,
    pub is_mandatory: bool,
    pub is_auto_assigned: bool,
    pub data_type: DataType,
    max_name_length: usize,
}

impl Column {
    pub fn new(
        references: Vec<ReferenceId>,
        words: Vec<String>,
        is_mandatory: bool,
        is_auto_assigned: bool,
        data_type: DataType,
        max_name_length: usize,
    ) -> Self {
        Self {
            references,
            words,
            is_mandatory,
            is_auto_assigned,
            data_type,
            max_name_length,
        }
    }

    /// 区切り文字で単語を連結した列名（長すぎる場合は短縮）
    pub fn name(&self, joiner: &str) -> String {
        let full = self
            .words
            .iter()
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(joiner);
        truncate_identifier(&full, self.max_name_length)
    }
}

/// 単語の先頭文字を大文字にする
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 識別子を上限長に収める
///
/// 上限を超える場合は先頭部分を残し、元の名前のSHA-256ハッシュから作った接尾辞を付けます。
/// 同じ入力には常に同じ結果を返します。
pub fn truncate_identifier(name: &str, max_length: usize) -> String {
    if name.chars().count() <= max_length {
        return name.to_string();
    }
    let digest = Sha256::digest(name.as_bytes());
    let suffix: String = digest
        .iter()
        .take(HASH_SUFFIX_LENGTH / 2)
        .map(|b| format!("{:02x}", b))
        .collect();
    let keep = max_length.saturating_sub(HASH_SUFFIX_LENGTH);
    let prefix: String = name.chars().take(keep).collect();
    format!("{}{}", prefix, suffix)
}

/// インデックス（一意性制約の実体化）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    /// インデックスを持つテーブルの概念
    pub on: ConceptId,
    /// 論理的に制約される概念（吸収されている場合は `on` と異なる）
    pub over: ConceptId,
    /// テーブル内の列位置
    pub columns: Vec<usize>,
    pub is_primary: bool,
    /// 由来となった一意性制約（識別子列から補った主キーは None）
    pub constraint: Option<ConstraintId>,
}

/// 外部キー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from: ConceptId,
    pub to: ConceptId,
    pub from_table: String,
    pub to_table: String,
    /// 外部キーの由来となった参照
    pub reference: ReferenceId,
    /// 参照元テーブル内の列位置
    pub from_columns: Vec<usize>,
    /// 参照先テーブル内の識別子列の位置
    pub to_columns: Vec<usize>,
}

/// テーブル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub concept: ConceptId,
    pub name: String,
    pub columns: Vec<Column>,
    pub indices: Vec<Index>,
    /// 識別子列の位置（優先識別子の役割順）
    pub identifier: Vec<usize>,
}

impl Table {
    /// 識別子列
    pub fn identifier_columns(&self) -> Vec<&Column> {
        self.identifier.iter().map(|i| &self.columns[*i]).collect()
    }

    /// 列名の一覧
    pub fn column_names(&self, joiner: &str) -> Vec<String> {
        self.columns.iter().map(|c| c.name(joiner)).collect()
    }

    /// 名前で列を検索
    pub fn column(&self, name: &str, joiner: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name(joiner) == name)
    }

    /// 主キーインデックス
    pub fn primary_index(&self) -> Option<&Index> {
        self.indices.iter().find(|i| i.is_primary)
    }
}

/// リレーショナルモデル
///
/// 変換結果全体。作成後は読み取り専用です。
#[derive(Debug, Clone)]
pub struct RelationalModel {
    vocabulary: Vocabulary,
    graph: ReferenceGraph,
    placements: Vec<Placement>,
    tentative: Vec<bool>,
    tables: Vec<Table>,
    unmapped: Vec<FactTypeId>,
    passes: usize,
}

impl RelationalModel {
    /// 決定済みの状態からモデルを作成（テーブルは名前順に並べ替える）
    pub fn new(
        vocabulary: Vocabulary,
        graph: ReferenceGraph,
        placements: Vec<Placement>,
        tentative: Vec<bool>,
        mut tables: Vec<Table>,
        unmapped: Vec<FactTypeId>,
        passes: usize,
    ) -> Self {
        tables.sort_by(|a, b| a.name.cmp(&b.name).then(a.concept.cmp(&b.concept)));
        Self {
            vocabulary,
            graph,
            placements,
            tentative,
            tables,
            unmapped,
            passes,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    /// すべての参照
    pub fn references(&self) -> &[Reference] {
        self.graph.references()
    }

    pub fn reference(&self, id: ReferenceId) -> &Reference {
        self.graph.get(id)
    }

    /// テーブル（名前順）
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// 名前でテーブルを検索
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// 概念に対応するテーブル
    pub fn table_for(&self, concept: ConceptId) -> Option<&Table> {
        self.tables.iter().find(|t| t.concept == concept)
    }

    pub fn placement(&self, concept: ConceptId) -> Placement {
        self.placements[concept.0]
    }

    pub fn is_table(&self, concept: ConceptId) -> bool {
        self.placements[concept.0] == Placement::Table
    }

    /// 概念を吸収している参照
    pub fn absorbed_via(&self, concept: ConceptId) -> Option<ReferenceId> {
        match self.placements[concept.0] {
            Placement::Absorbed(reference) => Some(reference),
            _ => None,
        }
    }

    /// 決定が既定値によるもの（暫定）かどうか
    pub fn is_tentative(&self, concept: ConceptId) -> bool {
        self.tentative[concept.0]
    }

    /// 列にマッピングされなかったファクト型（結合表候補）
    pub fn unmapped_fact_types(&self) -> &[FactTypeId] {
        &self.unmapped
    }

    /// テーブル決定ループのパス数
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn concept_name(&self, concept: ConceptId) -> &str {
        &self.vocabulary.concept(concept).name
    }

    /// テーブルの外部キーを導出
    ///
    /// 各列について、経路上で最初にテーブルへ到達するホップまでを接頭辞としてまとめ、
    /// 接頭辞ごとに1つの外部キーを作ります。参照先の識別子列は識別子の順に対応付けます。
    pub fn foreign_keys(&self, table: &Table) -> Result<Vec<ForeignKey>, MappingError> {
        let mut groups: Vec<(Vec<ReferenceId>, ConceptId, Vec<usize>)> = Vec::new();

        for (position, column) in table.columns.iter().enumerate() {
            let hop = column
                .references
                .iter()
                .enumerate()
                .find_map(|(k, id)| self.foreign_key_target(*id).map(|target| (k, target)));
            let Some((hop, target)) = hop else {
                continue;
            };
            let prefix = column.references[..=hop].to_vec();
            match groups.iter_mut().find(|(p, _, _)| *p == prefix) {
                Some((_, _, columns)) => columns.push(position),
                None => groups.push((prefix, target, vec![position])),
            }
        }

        let mut foreign_keys = Vec::with_capacity(groups.len());
        for (prefix, target, columns) in groups {
            let reference_id = prefix[prefix.len() - 1];
            let reference = self.graph.get(reference_id);
            let failure = |message: String| MappingError::MappingFailure {
                reference: reference.describe(&self.vocabulary),
                fact_type: self.vocabulary.fact_type_label(reference.fact_type),
                message,
            };

            let target_table = self.table_for(target).ok_or_else(|| {
                failure(format!(
                    "target '{}' is not a table",
                    self.concept_name(target)
                ))
            })?;
            if target_table.identifier.is_empty() {
                return Err(failure(format!(
                    "table '{}' has no identifier columns",
                    target_table.name
                )));
            }

            let mut from_columns = Vec::with_capacity(target_table.identifier.len());
            for to_position in &target_table.identifier {
                let wanted = &target_table.columns[*to_position].references;
                let found = columns.iter().copied().find(|from_position| {
                    &table.columns[*from_position].references[prefix.len()..] == wanted.as_slice()
                });
                match found {
                    Some(from_position) => from_columns.push(from_position),
                    None => {
                        return Err(failure(format!(
                            "no column of '{}' matches identifier column '{}' of '{}'",
                            table.name,
                            target_table.columns[*to_position].name(""),
                            target_table.name
                        )))
                    }
                }
            }

            foreign_keys.push(ForeignKey {
                from: table.concept,
                to: target,
                from_table: table.name.clone(),
                to_table: target_table.name.clone(),
                reference: reference_id,
                from_columns,
                to_columns: target_table.identifier.clone(),
            });
        }

        Ok(foreign_keys)
    }

    /// 参照が外部キーになる場合の参照先テーブル
    ///
    /// 参照先がテーブルならそのテーブル、スーパータイプに吸収されたサブタイプなら
    /// スーパータイプ側のテーブルです。単項ファクトと吸収サブタイプへの参照は対象外です。
    fn foreign_key_target(&self, id: ReferenceId) -> Option<ConceptId> {
        let reference = self.graph.get(id);
        let to = reference.to?;
        if reference.role_type == RoleType::Unary {
            return None;
        }
        if self.is_table(to) {
            return Some(to);
        }
        if reference.role_type == RoleType::Supertype {
            return None;
        }
        self.identification_target(to)
    }

    /// サブタイプの吸収を遡って、概念の識別を担うテーブルを求める
    fn identification_target(&self, concept: ConceptId) -> Option<ConceptId> {
        let mut current = concept;
        for _ in 0..self.placements.len() {
            if self.is_table(current) {
                return Some(current);
            }
            let via = self.graph.get(self.absorbed_via(current)?);
            if via.role_type != RoleType::Supertype {
                return None;
            }
            current = via.from;
        }
        None
    }
}
