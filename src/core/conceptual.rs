// 概念モデル
//
// ファクト指向の概念スキーマ（値型、エンティティ型、ファクト型、役割、制約）を表現する型システム。
// 外部のパーサーが構築し、マッピング処理からは読み取り専用として扱います。
// 要素同士の参照はすべてアリーナ上の添字（ID）で表現します。

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            /// アリーナ上の添字
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// 概念（値型・エンティティ型）のID
    ConceptId
);
arena_id!(
    /// ファクト型のID
    FactTypeId
);
arena_id!(
    /// 役割のID
    RoleId
);
arena_id!(
    /// 役割列のID
    RoleSequenceId
);
arena_id!(
    /// 存在制約のID
    ConstraintId
);

/// サブタイプの同化方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assimilation {
    /// スーパータイプのテーブルに吸収する（既定）
    #[default]
    Absorbed,
    /// サブタイプを独立したテーブルにする
    Separate,
    /// スーパータイプをサブタイプごとに分割する
    Partitioned,
}

/// サブタイプ関係（継承ファクト型）の属性
///
/// 継承ファクト型の役割0はサブタイプ、役割1はスーパータイプが担います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtyping {
    /// スーパータイプがサブタイプの識別を提供するか
    pub provides_identification: bool,
    /// 同化方式
    pub assimilation: Assimilation,
}

impl Default for Subtyping {
    fn default() -> Self {
        Self {
            provides_identification: true,
            assimilation: Assimilation::Absorbed,
        }
    }
}

/// 値型の定義
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTypeDef {
    /// 特化元の値型
    pub supertype: Option<ConceptId>,
    /// 長さファセット
    pub length: Option<u32>,
    /// スケールファセット
    pub scale: Option<u32>,
    /// 値制約
    pub value_restriction: Vec<String>,
}

/// エンティティ型の定義
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTypeDef {
    /// 客体化しているファクト型
    pub fact_type: Option<FactTypeId>,
    /// 優先識別子（一意性制約）
    pub preferred_identifier: Option<ConstraintId>,
}

/// 概念の種別
#[derive(Debug, Clone, PartialEq)]
pub enum ConceptKind {
    Value(ValueTypeDef),
    Entity(EntityTypeDef),
}

/// 概念
///
/// 役割を担う対象。値型かエンティティ型のいずれかです。
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    /// 概念名
    pub name: String,
    /// 作成者による独立テーブル指定
    pub is_independent: bool,
    /// 種別ごとの定義
    pub kind: ConceptKind,
}

impl Concept {
    /// エンティティ型かどうか
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, ConceptKind::Entity(_))
    }

    /// 値型かどうか
    pub fn is_value(&self) -> bool {
        matches!(self.kind, ConceptKind::Value(_))
    }

    pub fn as_entity(&self) -> Option<&EntityTypeDef> {
        match &self.kind {
            ConceptKind::Entity(entity) => Some(entity),
            ConceptKind::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueTypeDef> {
        match &self.kind {
            ConceptKind::Value(value) => Some(value),
            ConceptKind::Entity(_) => None,
        }
    }
}

/// 役割
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    /// 所属するファクト型
    pub fact_type: FactTypeId,
    /// 役割を担う概念
    pub concept: ConceptId,
    /// ファクト型内の序数
    pub ordinal: usize,
    /// 役割名
    pub role_name: Option<String>,
    /// 役割に対する値制約
    pub value_restriction: Vec<String>,
}

/// 役割参照（形容詞付き）
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRef {
    pub role: RoleId,
    pub leading_adjective: Option<String>,
    pub trailing_adjective: Option<String>,
}

impl RoleRef {
    pub fn new(role: RoleId) -> Self {
        Self {
            role,
            leading_adjective: None,
            trailing_adjective: None,
        }
    }
}

/// 役割列
///
/// 読みと制約の両方から参照される、空でない役割参照の並びです。
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSequence {
    pub role_refs: Vec<RoleRef>,
}

impl RoleSequence {
    /// 役割列に含まれる役割
    pub fn roles(&self) -> Vec<RoleId> {
        self.role_refs.iter().map(|rr| rr.role).collect()
    }

    /// 役割の位置
    pub fn position(&self, role: RoleId) -> Option<usize> {
        self.role_refs.iter().position(|rr| rr.role == role)
    }
}

/// 読み
///
/// `{0}` `{1}` … のプレースホルダーが役割列の各要素を表します。
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub role_sequence: RoleSequenceId,
    pub text: String,
}

/// ファクト型
#[derive(Debug, Clone, PartialEq)]
pub struct FactType {
    /// 役割（序数順）
    pub roles: Vec<RoleId>,
    /// 読み（先頭が既定の読み）
    pub readings: Vec<Reading>,
    /// 客体化しているエンティティ型
    pub objectified_as: Option<ConceptId>,
    /// 継承ファクト型の場合の属性
    pub subtyping: Option<Subtyping>,
}

impl FactType {
    pub fn arity(&self) -> usize {
        self.roles.len()
    }

    /// 継承ファクト型かどうか
    pub fn is_subtyping(&self) -> bool {
        self.subtyping.is_some()
    }
}

/// 存在制約
///
/// `max_frequency == Some(1)` の制約は一意性制約として働きます。
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceConstraint {
    pub name: Option<String>,
    pub role_sequence: RoleSequenceId,
    pub min_frequency: Option<u32>,
    pub max_frequency: Option<u32>,
    pub is_mandatory: bool,
    pub is_preferred_identifier: bool,
}

impl PresenceConstraint {
    /// 一意性制約かどうか
    pub fn is_uniqueness(&self) -> bool {
        self.max_frequency == Some(1)
    }
}

/// 語彙
///
/// 概念モデル全体を保持するアリーナです。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    pub name: String,
    pub concepts: Vec<Concept>,
    pub fact_types: Vec<FactType>,
    pub roles: Vec<Role>,
    pub role_sequences: Vec<RoleSequence>,
    pub constraints: Vec<PresenceConstraint>,
}

impl Vocabulary {
    pub fn concept(&self, id: ConceptId) -> &Concept {
        &self.concepts[id.0]
    }

    pub fn fact_type(&self, id: FactTypeId) -> &FactType {
        &self.fact_types[id.0]
    }

    pub fn role(&self, id: RoleId) -> &Role {
        &self.roles[id.0]
    }

    pub fn role_sequence(&self, id: RoleSequenceId) -> &RoleSequence {
        &self.role_sequences[id.0]
    }

    pub fn constraint(&self, id: ConstraintId) -> &PresenceConstraint {
        &self.constraints[id.0]
    }

    pub fn concept_ids(&self) -> impl Iterator<Item = ConceptId> {
        (0..self.concepts.len()).map(ConceptId)
    }

    pub fn fact_type_ids(&self) -> impl Iterator<Item = FactTypeId> {
        (0..self.fact_types.len()).map(FactTypeId)
    }

    pub fn constraint_ids(&self) -> impl Iterator<Item = ConstraintId> {
        (0..self.constraints.len()).map(ConstraintId)
    }

    /// 名前で概念を検索
    pub fn find_concept(&self, name: &str) -> Option<ConceptId> {
        self.concepts
            .iter()
            .position(|c| c.name == name)
            .map(ConceptId)
    }

    /// 概念が担う役割（ID順）
    pub fn roles_played_by(&self, concept: ConceptId) -> Vec<RoleId> {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, role)| role.concept == concept)
            .map(|(i, _)| RoleId(i))
            .collect()
    }

    /// 役割列に含まれる役割
    pub fn sequence_roles(&self, sequence: RoleSequenceId) -> Vec<RoleId> {
        self.role_sequence(sequence).roles()
    }

    /// 二項ファクト型における相手側の役割
    pub fn counterpart(&self, role: RoleId) -> Option<RoleId> {
        let fact_type = self.fact_type(self.role(role).fact_type);
        if fact_type.arity() != 2 {
            return None;
        }
        fact_type.roles.iter().copied().find(|r| *r != role)
    }

    /// ファクト型の役割だけで構成される一意性制約
    pub fn uniqueness_constraints_of(&self, fact_type: FactTypeId) -> Vec<ConstraintId> {
        let roles = &self.fact_type(fact_type).roles;
        self.constraint_ids()
            .filter(|id| {
                let constraint = self.constraint(*id);
                let sequence = self.sequence_roles(constraint.role_sequence);
                constraint.is_uniqueness()
                    && !sequence.is_empty()
                    && sequence.iter().all(|r| roles.contains(r))
            })
            .collect()
    }

    /// 指定した役割を含む一意性制約
    pub fn uniqueness_constraints_over(&self, role: RoleId) -> Vec<ConstraintId> {
        self.constraint_ids()
            .filter(|id| {
                let constraint = self.constraint(*id);
                constraint.is_uniqueness()
                    && self
                        .role_sequence(constraint.role_sequence)
                        .position(role)
                        .is_some()
            })
            .collect()
    }

    /// 概念の直接のスーパータイプ（継承ファクト型とスーパータイプの組）
    pub fn supertypes(&self, concept: ConceptId) -> Vec<(FactTypeId, ConceptId)> {
        self.fact_type_ids()
            .filter_map(|id| {
                let fact_type = self.fact_type(id);
                if !fact_type.is_subtyping() || fact_type.arity() != 2 {
                    return None;
                }
                let sub = self.role(fact_type.roles[0]).concept;
                let sup = self.role(fact_type.roles[1]).concept;
                (sub == concept).then_some((id, sup))
            })
            .collect()
    }

    /// 概念の直接のサブタイプ
    pub fn subtypes(&self, concept: ConceptId) -> Vec<(FactTypeId, ConceptId)> {
        self.fact_type_ids()
            .filter_map(|id| {
                let fact_type = self.fact_type(id);
                if !fact_type.is_subtyping() || fact_type.arity() != 2 {
                    return None;
                }
                let sub = self.role(fact_type.roles[0]).concept;
                let sup = self.role(fact_type.roles[1]).concept;
                (sup == concept).then_some((id, sub))
            })
            .collect()
    }

    /// 継承ファクト型のサブタイプが独立したテーブル側に置かれるか
    ///
    /// サブタイプが独立指定されている、同化方式が separate/partitioned、
    /// あるいは識別を提供しないスーパータイプへの継承である場合に真となります。
    pub fn is_separate_subtyping(&self, fact_type: FactTypeId) -> bool {
        let ft = self.fact_type(fact_type);
        let Some(subtyping) = ft.subtyping else {
            return false;
        };
        let subtype = self.concept(self.role(ft.roles[0]).concept);
        subtype.is_independent
            || subtyping.assimilation != Assimilation::Absorbed
            || !subtyping.provides_identification
    }

    /// 概念自身が宣言する識別役割
    ///
    /// 明示的な優先識別子、なければ客体化したファクト型の全役割です。
    pub fn own_identifier_roles(&self, concept: ConceptId) -> Vec<RoleId> {
        let Some(entity) = self.concept(concept).as_entity() else {
            return Vec::new();
        };
        if let Some(pi) = entity.preferred_identifier {
            return self.sequence_roles(self.constraint(pi).role_sequence);
        }
        match entity.fact_type {
            Some(fact_type) => self.fact_type(fact_type).roles.clone(),
            None => Vec::new(),
        }
    }

    /// 識別を提供するスーパータイプ（自身の識別子を持たない場合のみ）
    pub fn identifying_supertype(&self, concept: ConceptId) -> Option<(FactTypeId, ConceptId)> {
        if !self.own_identifier_roles(concept).is_empty() {
            return None;
        }
        self.supertypes(concept).into_iter().find(|(fact_type, _)| {
            self.fact_type(*fact_type)
                .subtyping
                .is_some_and(|s| s.provides_identification)
        })
    }

    /// 優先識別子の役割（継承を含む）
    pub fn preferred_identifier_roles(&self, concept: ConceptId) -> Vec<RoleId> {
        let mut current = concept;
        let mut seen = vec![concept];
        loop {
            let own = self.own_identifier_roles(current);
            if !own.is_empty() {
                return own;
            }
            match self.identifying_supertype(current) {
                Some((_, sup)) if !seen.contains(&sup) => {
                    seen.push(sup);
                    current = sup;
                }
                _ => return Vec::new(),
            }
        }
    }

    /// 優先識別子の制約（継承を含む）
    pub fn preferred_identifier(&self, concept: ConceptId) -> Option<ConstraintId> {
        let mut current = concept;
        let mut seen = vec![concept];
        loop {
            if let Some(pi) = self
                .concept(current)
                .as_entity()
                .and_then(|e| e.preferred_identifier)
            {
                return Some(pi);
            }
            match self.identifying_supertype(current) {
                Some((_, sup)) if !seen.contains(&sup) => {
                    seen.push(sup);
                    current = sup;
                }
                _ => return None,
            }
        }
    }

    /// 役割が必須かどうか
    ///
    /// 単一役割への必須制約があるか、役割を担う概念の識別にファクト型が使われている場合に必須です。
    /// 継承ファクト型ではサブタイプ側の役割が必須になります。
    pub fn is_mandatory(&self, role: RoleId) -> bool {
        let r = self.role(role);
        let fact_type = self.fact_type(r.fact_type);
        if fact_type.is_subtyping() {
            return r.ordinal == 0;
        }

        let explicit = self.constraints.iter().any(|c| {
            c.is_mandatory && self.sequence_roles(c.role_sequence) == vec![role]
        });
        if explicit {
            return true;
        }

        let identifying = self.preferred_identifier_roles(r.concept);
        fact_type
            .roles
            .iter()
            .any(|other| *other != role && identifying.contains(other))
    }

    /// 値型の特化チェーン（自身から根へ）
    pub fn value_type_chain(&self, concept: ConceptId) -> Vec<ConceptId> {
        let mut chain = vec![concept];
        let mut current = concept;
        while let Some(sup) = self.concept(current).as_value().and_then(|v| v.supertype) {
            if chain.contains(&sup) {
                break;
            }
            chain.push(sup);
            current = sup;
        }
        chain
    }

    /// 既定の読みにおける役割の形容詞（前置, 後置）
    pub fn role_adjectives(&self, role: RoleId) -> (Option<&str>, Option<&str>) {
        let fact_type = self.fact_type(self.role(role).fact_type);
        for reading in &fact_type.readings {
            let sequence = self.role_sequence(reading.role_sequence);
            if let Some(rr) = sequence.role_refs.iter().find(|rr| rr.role == role) {
                return (
                    rr.leading_adjective.as_deref(),
                    rr.trailing_adjective.as_deref(),
                );
            }
        }
        (None, None)
    }

    /// ファクト型の表示名（既定の読みに役割を担う概念名を埋め込んだもの）
    pub fn fact_type_label(&self, id: FactTypeId) -> String {
        let fact_type = self.fact_type(id);
        match fact_type.readings.first() {
            Some(reading) => {
                let sequence = self.role_sequence(reading.role_sequence);
                let mut text = reading.text.clone();
                for (i, rr) in sequence.role_refs.iter().enumerate() {
                    let player = &self.concept(self.role(rr.role).concept).name;
                    text = text.replace(&format!("{{{}}}", i), player);
                }
                text
            }
            None => fact_type
                .roles
                .iter()
                .map(|r| self.concept(self.role(*r).concept).name.as_str())
                .collect::<Vec<_>>()
                .join(" / "),
        }
    }
}

/// 語彙ビルダー
///
/// 外部パーサーやテストが概念モデルを組み立てるためのAPIです。
#[derive(Debug, Clone, Default)]
pub struct VocabularyBuilder {
    vocabulary: Vocabulary,
}

impl VocabularyBuilder {
    /// 新しいビルダーを作成
    pub fn new(name: &str) -> Self {
        Self {
            vocabulary: Vocabulary {
                name: name.to_string(),
                ..Vocabulary::default()
            },
        }
    }

    fn add_concept(&mut self, name: &str, kind: ConceptKind) -> ConceptId {
        self.vocabulary.concepts.push(Concept {
            name: name.to_string(),
            is_independent: false,
            kind,
        });
        ConceptId(self.vocabulary.concepts.len() - 1)
    }

    /// 値型を追加
    pub fn value_type(&mut self, name: &str) -> ConceptId {
        self.add_concept(name, ConceptKind::Value(ValueTypeDef::default()))
    }

    /// エンティティ型を追加
    pub fn entity_type(&mut self, name: &str) -> ConceptId {
        self.add_concept(name, ConceptKind::Entity(EntityTypeDef::default()))
    }

    /// 独立テーブル指定
    pub fn independent(&mut self, concept: ConceptId) -> &mut Self {
        self.vocabulary.concepts[concept.0].is_independent = true;
        self
    }

    fn value_def_mut(&mut self, concept: ConceptId) -> Option<&mut ValueTypeDef> {
        match &mut self.vocabulary.concepts[concept.0].kind {
            ConceptKind::Value(value) => Some(value),
            ConceptKind::Entity(_) => None,
        }
    }

    fn entity_def_mut(&mut self, concept: ConceptId) -> Option<&mut EntityTypeDef> {
        match &mut self.vocabulary.concepts[concept.0].kind {
            ConceptKind::Entity(entity) => Some(entity),
            ConceptKind::Value(_) => None,
        }
    }

    /// 値型の長さ・スケールを設定
    pub fn value_facets(
        &mut self,
        concept: ConceptId,
        length: Option<u32>,
        scale: Option<u32>,
    ) -> &mut Self {
        if let Some(value) = self.value_def_mut(concept) {
            value.length = length;
            value.scale = scale;
        }
        self
    }

    /// 値型の特化元を設定
    pub fn value_supertype(&mut self, concept: ConceptId, supertype: ConceptId) -> &mut Self {
        if let Some(value) = self.value_def_mut(concept) {
            value.supertype = Some(supertype);
        }
        self
    }

    /// 値型の値制約を設定
    pub fn value_restriction(&mut self, concept: ConceptId, values: &[&str]) -> &mut Self {
        if let Some(value) = self.value_def_mut(concept) {
            value.value_restriction = values.iter().map(|v| v.to_string()).collect();
        }
        self
    }

    fn add_role_sequence(&mut self, roles: &[RoleId]) -> RoleSequenceId {
        self.vocabulary.role_sequences.push(RoleSequence {
            role_refs: roles.iter().map(|r| RoleRef::new(*r)).collect(),
        });
        RoleSequenceId(self.vocabulary.role_sequences.len() - 1)
    }

    /// ファクト型を追加
    ///
    /// 読みの `{i}` は `players[i]` の役割を指します。
    pub fn fact_type(&mut self, players: &[ConceptId], reading: &str) -> FactTypeId {
        let id = FactTypeId(self.vocabulary.fact_types.len());
        let mut roles = Vec::with_capacity(players.len());
        for (ordinal, player) in players.iter().enumerate() {
            self.vocabulary.roles.push(Role {
                fact_type: id,
                concept: *player,
                ordinal,
                role_name: None,
                value_restriction: Vec::new(),
            });
            roles.push(RoleId(self.vocabulary.roles.len() - 1));
        }
        let sequence = self.add_role_sequence(&roles);
        self.vocabulary.fact_types.push(FactType {
            roles,
            readings: vec![Reading {
                role_sequence: sequence,
                text: reading.to_string(),
            }],
            objectified_as: None,
            subtyping: None,
        });
        id
    }

    /// ファクト型の役割を取得
    pub fn role(&self, fact_type: FactTypeId, ordinal: usize) -> RoleId {
        self.vocabulary.fact_types[fact_type.0].roles[ordinal]
    }

    /// 二項ファクト型を追加
    pub fn binary(
        &mut self,
        first: ConceptId,
        second: ConceptId,
        reading: &str,
    ) -> (FactTypeId, RoleId, RoleId) {
        let id = self.fact_type(&[first, second], reading);
        (id, self.role(id, 0), self.role(id, 1))
    }

    /// 単項ファクト型を追加
    pub fn unary(&mut self, player: ConceptId, reading: &str) -> (FactTypeId, RoleId) {
        let id = self.fact_type(&[player], reading);
        (id, self.role(id, 0))
    }

    /// 役割名を設定
    pub fn role_name(&mut self, role: RoleId, name: &str) -> &mut Self {
        self.vocabulary.roles[role.0].role_name = Some(name.to_string());
        self
    }

    /// 役割の値制約を設定
    pub fn role_values(&mut self, role: RoleId, values: &[&str]) -> &mut Self {
        self.vocabulary.roles[role.0].value_restriction =
            values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// 既定の読みにおける役割の形容詞を設定
    pub fn adjectives(
        &mut self,
        role: RoleId,
        leading: Option<&str>,
        trailing: Option<&str>,
    ) -> &mut Self {
        let fact_type = self.vocabulary.roles[role.0].fact_type;
        let Some(sequence) = self.vocabulary.fact_types[fact_type.0]
            .readings
            .first()
            .map(|r| r.role_sequence)
        else {
            return self;
        };
        if let Some(rr) = self.vocabulary.role_sequences[sequence.0]
            .role_refs
            .iter_mut()
            .find(|rr| rr.role == role)
        {
            rr.leading_adjective = leading.map(str::to_string);
            rr.trailing_adjective = trailing.map(str::to_string);
        }
        self
    }

    fn add_constraint(&mut self, roles: &[RoleId], constraint: PresenceConstraint) -> ConstraintId {
        let sequence = self.add_role_sequence(roles);
        self.vocabulary.constraints.push(PresenceConstraint {
            role_sequence: sequence,
            ..constraint
        });
        ConstraintId(self.vocabulary.constraints.len() - 1)
    }

    /// 一意性制約を追加
    pub fn uniqueness(&mut self, roles: &[RoleId]) -> ConstraintId {
        self.add_constraint(
            roles,
            PresenceConstraint {
                name: None,
                role_sequence: RoleSequenceId(0),
                min_frequency: None,
                max_frequency: Some(1),
                is_mandatory: false,
                is_preferred_identifier: false,
            },
        )
    }

    /// 必須制約を追加
    pub fn mandatory(&mut self, role: RoleId) -> ConstraintId {
        self.add_constraint(
            &[role],
            PresenceConstraint {
                name: None,
                role_sequence: RoleSequenceId(0),
                min_frequency: Some(1),
                max_frequency: None,
                is_mandatory: true,
                is_preferred_identifier: false,
            },
        )
    }

    /// 制約に名前を付ける
    pub fn constraint_name(&mut self, constraint: ConstraintId, name: &str) -> &mut Self {
        self.vocabulary.constraints[constraint.0].name = Some(name.to_string());
        self
    }

    /// 既存の一意性制約をエンティティ型の優先識別子にする
    pub fn preferred_identifier(&mut self, entity: ConceptId, constraint: ConstraintId) -> &mut Self {
        self.vocabulary.constraints[constraint.0].is_preferred_identifier = true;
        if let Some(def) = self.entity_def_mut(entity) {
            def.preferred_identifier = Some(constraint);
        }
        self
    }

    /// 役割の組でエンティティ型を識別する
    pub fn identify(&mut self, entity: ConceptId, roles: &[RoleId]) -> ConstraintId {
        let constraint = self.uniqueness(roles);
        self.preferred_identifier(entity, constraint);
        constraint
    }

    /// 値型による単純識別（"Entity has Value" の1対1ファクト）
    pub fn identified_by(&mut self, entity: ConceptId, value: ConceptId) -> FactTypeId {
        let (fact_type, entity_role, value_role) = self.binary(entity, value, "{0} has {1}");
        self.uniqueness(&[entity_role]);
        self.mandatory(entity_role);
        self.identify(entity, &[value_role]);
        fact_type
    }

    /// 多対一ファクト（`from` 側の役割が一意）
    pub fn many_to_one(
        &mut self,
        from: ConceptId,
        to: ConceptId,
        reading: &str,
        mandatory: bool,
    ) -> (FactTypeId, RoleId, RoleId) {
        let (fact_type, from_role, to_role) = self.binary(from, to, reading);
        self.uniqueness(&[from_role]);
        if mandatory {
            self.mandatory(from_role);
        }
        (fact_type, from_role, to_role)
    }

    /// 一対一ファクト（両側の役割が一意）
    pub fn one_to_one(
        &mut self,
        first: ConceptId,
        second: ConceptId,
        reading: &str,
        first_mandatory: bool,
        second_mandatory: bool,
    ) -> (FactTypeId, RoleId, RoleId) {
        let (fact_type, first_role, second_role) = self.binary(first, second, reading);
        self.uniqueness(&[first_role]);
        self.uniqueness(&[second_role]);
        if first_mandatory {
            self.mandatory(first_role);
        }
        if second_mandatory {
            self.mandatory(second_role);
        }
        (fact_type, first_role, second_role)
    }

    /// 既定の属性でサブタイプ関係を追加
    pub fn subtype(&mut self, subtype: ConceptId, supertype: ConceptId) -> FactTypeId {
        self.subtype_with(subtype, supertype, Subtyping::default())
    }

    /// サブタイプ関係を追加
    pub fn subtype_with(
        &mut self,
        subtype: ConceptId,
        supertype: ConceptId,
        subtyping: Subtyping,
    ) -> FactTypeId {
        let id = self.fact_type(&[subtype, supertype], "{0} is a kind of {1}");
        self.vocabulary.fact_types[id.0].subtyping = Some(subtyping);
        id
    }

    /// エンティティ型にファクト型を客体化させる
    pub fn objectify(&mut self, entity: ConceptId, fact_type: FactTypeId) -> &mut Self {
        self.vocabulary.fact_types[fact_type.0].objectified_as = Some(entity);
        if let Some(def) = self.entity_def_mut(entity) {
            def.fact_type = Some(fact_type);
        }
        self
    }

    /// 構築中の語彙を参照
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// 語彙を確定
    pub fn build(self) -> Vocabulary {
        self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_vocabulary() -> (Vocabulary, ConceptId, ConceptId) {
        let mut b = VocabularyBuilder::new("People");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        b.identified_by(person, name);
        (b.build(), person, name)
    }

    #[test]
    fn test_builder_creates_roles_and_readings() {
        let (vocabulary, person, name) = person_vocabulary();
        assert_eq!(vocabulary.fact_types.len(), 1);
        let fact_type = vocabulary.fact_type(FactTypeId(0));
        assert_eq!(fact_type.arity(), 2);
        assert_eq!(vocabulary.role(fact_type.roles[0]).concept, person);
        assert_eq!(vocabulary.role(fact_type.roles[1]).concept, name);
        assert_eq!(vocabulary.fact_type_label(FactTypeId(0)), "Person has Name");
    }

    #[test]
    fn test_preferred_identifier_roles() {
        let (vocabulary, person, name) = person_vocabulary();
        let roles = vocabulary.preferred_identifier_roles(person);
        assert_eq!(roles.len(), 1);
        assert_eq!(vocabulary.role(roles[0]).concept, name);
        assert!(vocabulary.preferred_identifier_roles(name).is_empty());
    }

    #[test]
    fn test_identifying_role_is_mandatory() {
        let (vocabulary, person, name) = person_vocabulary();
        let person_role = vocabulary.roles_played_by(person)[0];
        let name_role = vocabulary.roles_played_by(name)[0];
        assert!(vocabulary.is_mandatory(person_role));
        assert!(!vocabulary.is_mandatory(name_role));
    }

    #[test]
    fn test_counterpart_only_for_binary() {
        let mut b = VocabularyBuilder::new("V");
        let a = b.entity_type("A");
        let c = b.entity_type("C");
        let (_, ra, rc) = b.binary(a, c, "{0} likes {1}");
        let (_, unary) = b.unary(a, "{0} smokes");
        let vocabulary = b.build();
        assert_eq!(vocabulary.counterpart(ra), Some(rc));
        assert_eq!(vocabulary.counterpart(rc), Some(ra));
        assert_eq!(vocabulary.counterpart(unary), None);
    }

    #[test]
    fn test_subtype_inherits_identifier() {
        let mut b = VocabularyBuilder::new("V");
        let nr = b.value_type("EmployeeNr");
        let employee = b.entity_type("Employee");
        let manager = b.entity_type("Manager");
        b.identified_by(employee, nr);
        let subtyping = b.subtype(manager, employee);
        let vocabulary = b.build();

        assert_eq!(vocabulary.supertypes(manager), vec![(subtyping, employee)]);
        assert_eq!(vocabulary.subtypes(employee), vec![(subtyping, manager)]);
        assert_eq!(
            vocabulary.preferred_identifier_roles(manager),
            vocabulary.preferred_identifier_roles(employee)
        );
        assert_eq!(
            vocabulary.preferred_identifier(manager),
            vocabulary.preferred_identifier(employee)
        );
        assert!(!vocabulary.is_separate_subtyping(subtyping));
    }

    #[test]
    fn test_separate_subtyping() {
        let mut b = VocabularyBuilder::new("V");
        let employee = b.entity_type("Employee");
        let manager = b.entity_type("Manager");
        let subtyping = b.subtype_with(
            manager,
            employee,
            Subtyping {
                provides_identification: true,
                assimilation: Assimilation::Separate,
            },
        );
        assert!(b.vocabulary().is_separate_subtyping(subtyping));
    }

    #[test]
    fn test_objectification_identifier_defaults_to_fact_roles() {
        let mut b = VocabularyBuilder::new("V");
        let person = b.entity_type("Person");
        let sport = b.value_type("Sport");
        let playing = b.entity_type("Playing");
        let (fact_type, rp, rs) = b.binary(person, sport, "{0} plays {1}");
        b.uniqueness(&[rp, rs]);
        b.objectify(playing, fact_type);
        let vocabulary = b.build();
        assert_eq!(vocabulary.preferred_identifier_roles(playing), vec![rp, rs]);
        assert_eq!(vocabulary.uniqueness_constraints_of(fact_type).len(), 1);
    }

    #[test]
    fn test_value_type_chain_stops_on_cycle() {
        let mut b = VocabularyBuilder::new("V");
        let auto = b.value_type("AutoCounter");
        let id = b.value_type("EmployeeId");
        b.value_supertype(id, auto);
        b.value_supertype(auto, id);
        let vocabulary = b.build();
        assert_eq!(vocabulary.value_type_chain(id), vec![id, auto]);
    }

    #[test]
    fn test_role_adjectives() {
        let mut b = VocabularyBuilder::new("V");
        let person = b.entity_type("Person");
        let name = b.value_type("Name");
        let (_, _, role) = b.binary(person, name, "{0} has {1}");
        b.adjectives(role, Some("given"), None);
        let vocabulary = b.build();
        assert_eq!(vocabulary.role_adjectives(role), (Some("given"), None));
    }
}
