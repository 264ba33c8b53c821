// 依存順序付けサービス
//
// 先行関係に従って概念（テーブル）を出力順に並べます。
// 各パスで先行がすべて出力済みのノードをまとめて出力し、進めなくなった場合は
// 後続の多いノードを強制的に出力して循環を断ち切ります。

use crate::core::conceptual::{ConceptId, FactTypeId, Vocabulary};
use crate::core::error::MappingError;
use crate::core::relational::{RelationalModel, RoleType};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 出力の1ステップ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionStep {
    pub concept: ConceptId,
    pub name: String,
    /// 循環を断ち切るために強制的に出力されたか
    pub forced: bool,
    /// このステップで出力可能になったファクト型
    pub released_fact_types: Vec<FactTypeId>,
}

/// 依存順序付け
#[derive(Debug, Clone, Default)]
pub struct DependencyOrderer {
    nodes: Vec<(ConceptId, String)>,
    precursors: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    supertypes: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
}

impl DependencyOrderer {
    /// 新しいDependencyOrdererを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ノードを追加
    pub fn add_node(&mut self, concept: ConceptId, name: &str) {
        if !self.nodes.iter().any(|(c, _)| *c == concept) {
            self.nodes.push((concept, name.to_string()));
        }
    }

    /// `precursor` を `node` より先に出力する
    pub fn add_precursor(&mut self, node: ConceptId, precursor: ConceptId) {
        if node != precursor {
            self.precursors.entry(node).or_default().insert(precursor);
        }
    }

    /// スーパータイプは先行でもあり、強制出力の候補選びにも使われる
    pub fn add_supertype(&mut self, node: ConceptId, supertype: ConceptId) {
        if node != supertype {
            self.add_precursor(node, supertype);
            self.supertypes.entry(node).or_default().insert(supertype);
        }
    }

    /// 出力順を求める
    pub fn order(&self) -> Vec<EmissionStep> {
        let mut sorted = self.nodes.clone();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let known: BTreeSet<ConceptId> = sorted.iter().map(|(c, _)| *c).collect();

        let mut remaining: Vec<(ConceptId, String)> = sorted;
        let mut emitted: BTreeSet<ConceptId> = BTreeSet::new();
        let mut steps = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let ready: Vec<(ConceptId, String)> = remaining
                .iter()
                .filter(|(c, _)| {
                    self.precursors_of(*c)
                        .iter()
                        .all(|p| emitted.contains(p) || !known.contains(p))
                })
                .cloned()
                .collect();

            let batch = if ready.is_empty() {
                let (concept, name) = self.panic_choice(&remaining, &emitted, &known);
                debug!(concept = %name, "dependency cycle; forcing emission");
                vec![(concept, name, true)]
            } else {
                ready.into_iter().map(|(c, n)| (c, n, false)).collect()
            };

            for (concept, name, forced) in batch {
                remaining.retain(|(c, _)| *c != concept);
                emitted.insert(concept);
                steps.push(EmissionStep {
                    concept,
                    name,
                    forced,
                    released_fact_types: Vec::new(),
                });
            }
        }

        steps
    }

    /// 強制出力するノード
    ///
    /// 未出力のスーパータイプを持たないノードのうち、残りの後続が最も多いもの（同数なら名前順）を選びます。
    fn panic_choice(
        &self,
        remaining: &[(ConceptId, String)],
        emitted: &BTreeSet<ConceptId>,
        known: &BTreeSet<ConceptId>,
    ) -> (ConceptId, String) {
        let without_pending_supertype: Vec<&(ConceptId, String)> = remaining
            .iter()
            .filter(|(c, _)| {
                self.supertypes
                    .get(c)
                    .is_none_or(|s| s.iter().all(|p| emitted.contains(p) || !known.contains(p)))
            })
            .collect();
        let candidates: Vec<&(ConceptId, String)> = if without_pending_supertype.is_empty() {
            remaining.iter().collect()
        } else {
            without_pending_supertype
        };

        let followers = |concept: ConceptId| {
            remaining
                .iter()
                .filter(|(c, _)| self.precursors_of(*c).contains(&concept))
                .count()
        };

        let mut best = candidates[0];
        let mut best_followers = followers(best.0);
        for candidate in candidates.iter().skip(1) {
            let count = followers(candidate.0);
            if count > best_followers {
                best = candidate;
                best_followers = count;
            }
        }
        best.clone()
    }

    fn precursors_of(&self, concept: ConceptId) -> BTreeSet<ConceptId> {
        self.precursors.get(&concept).cloned().unwrap_or_default()
    }
}

/// テーブルの出力順
///
/// 外部キーの参照先（自己参照を除く）と独立したサブタイプのスーパータイプが先行します。
/// 各ステップには、そのテーブルの列として初めて現れたファクト型を付けます。
pub fn table_order(model: &RelationalModel) -> Result<Vec<EmissionStep>, MappingError> {
    let mut orderer = DependencyOrderer::new();
    for table in model.tables() {
        orderer.add_node(table.concept, &table.name);
    }
    for table in model.tables() {
        for foreign_key in model.foreign_keys(table)? {
            orderer.add_precursor(table.concept, foreign_key.to);
        }
        for id in model.graph().references_from(table.concept) {
            let reference = model.reference(*id);
            if reference.role_type == RoleType::Subtype {
                if let Some(to) = reference.to.filter(|to| model.is_table(*to)) {
                    orderer.add_supertype(table.concept, to);
                }
            }
        }
    }

    let mut steps = orderer.order();
    let mut released: BTreeSet<FactTypeId> = BTreeSet::new();
    for step in &mut steps {
        let Some(table) = model.table_for(step.concept) else {
            continue;
        };
        for column in &table.columns {
            for id in &column.references {
                let fact_type = model.reference(*id).fact_type;
                if released.insert(fact_type) {
                    step.released_fact_types.push(fact_type);
                }
            }
        }
    }
    Ok(steps)
}

/// 概念の出力順
///
/// 優先識別子の役割を担う概念とスーパータイプ（値型の特化元を含む）が先行します。
/// 各ステップには、役割の担い手がすべて出力済みになったファクト型を付けます。
pub fn concept_order(vocabulary: &Vocabulary) -> Vec<EmissionStep> {
    let mut orderer = DependencyOrderer::new();
    for concept in vocabulary.concept_ids() {
        orderer.add_node(concept, &vocabulary.concept(concept).name);
    }
    for concept in vocabulary.concept_ids() {
        for role in vocabulary.own_identifier_roles(concept) {
            orderer.add_precursor(concept, vocabulary.role(role).concept);
        }
        for (_, supertype) in vocabulary.supertypes(concept) {
            orderer.add_supertype(concept, supertype);
        }
        if let Some(supertype) = vocabulary.concept(concept).as_value().and_then(|v| v.supertype) {
            orderer.add_supertype(concept, supertype);
        }
    }

    let mut steps = orderer.order();
    let mut emitted: BTreeSet<ConceptId> = BTreeSet::new();
    let mut released: BTreeSet<FactTypeId> = BTreeSet::new();
    for step in &mut steps {
        emitted.insert(step.concept);
        for fact_type in vocabulary.fact_type_ids() {
            if released.contains(&fact_type) {
                continue;
            }
            let roles = &vocabulary.fact_type(fact_type).roles;
            if !roles.is_empty()
                && roles
                    .iter()
                    .all(|r| emitted.contains(&vocabulary.role(*r).concept))
            {
                released.insert(fact_type);
                step.released_fact_types.push(fact_type);
            }
        }
    }
    steps
}
