// テーブル決定サービス
//
// 参照グラフ上の複数パスの不動点計算で、各概念を独立テーブルにするか
// 別のテーブルへ吸収するかを決定します。
// 未決定の概念は毎パス名前順に評価するため、同じ入力には常に同じ分割を返します。

use crate::core::conceptual::{ConceptId, RoleId, Vocabulary};
use crate::core::error::MappingError;
use crate::core::relational::{Placement, ReferenceGraph, ReferenceId, RoleType};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// テーブル決定の状態
///
/// パスをまたいで引き回す決定結果と反転済み参照の集合です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionState {
    is_table: Vec<Option<bool>>,
    absorbed_via: Vec<Option<ReferenceId>>,
    finalized: Vec<bool>,
    tentative: Vec<bool>,
    flipped: BTreeSet<ReferenceId>,
    passes: usize,
}

impl DecisionState {
    fn new(count: usize) -> Self {
        Self {
            is_table: vec![None; count],
            absorbed_via: vec![None; count],
            finalized: vec![false; count],
            tentative: vec![false; count],
            flipped: BTreeSet::new(),
            passes: 0,
        }
    }

    /// テーブル決定（未決定は None）
    pub fn is_table(&self, concept: ConceptId) -> Option<bool> {
        self.is_table[concept.0]
    }

    pub fn absorbed_via(&self, concept: ConceptId) -> Option<ReferenceId> {
        self.absorbed_via[concept.0]
    }

    /// 既定値による決定かどうか
    pub fn is_tentative(&self, concept: ConceptId) -> bool {
        self.tentative[concept.0]
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// 決定の過程で反転した参照
    pub fn flipped(&self) -> &BTreeSet<ReferenceId> {
        &self.flipped
    }

    pub fn placement(&self, concept: ConceptId) -> Placement {
        match (self.is_table[concept.0], self.absorbed_via[concept.0]) {
            (Some(false), Some(reference)) => Placement::Absorbed(reference),
            _ => Placement::Table,
        }
    }

    /// 全概念の配置（概念ID順）
    pub fn placements(&self) -> Vec<Placement> {
        (0..self.is_table.len())
            .map(|i| self.placement(ConceptId(i)))
            .collect()
    }

    /// 全概念の暫定フラグ（概念ID順）
    pub fn tentative_flags(&self) -> Vec<bool> {
        self.tentative.clone()
    }

    fn decide_table(&mut self, concept: ConceptId, tentative: bool) {
        self.is_table[concept.0] = Some(true);
        self.absorbed_via[concept.0] = None;
        self.finalized[concept.0] = true;
        self.tentative[concept.0] = tentative;
    }

    fn decide_absorbed(&mut self, concept: ConceptId, via: ReferenceId, tentative: bool) {
        self.is_table[concept.0] = Some(false);
        self.absorbed_via[concept.0] = Some(via);
        self.finalized[concept.0] = true;
        self.tentative[concept.0] = tentative;
    }
}

/// 1概念に対する1回の評価結果
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Table(&'static str),
    Absorbed(ReferenceId, &'static str),
    Flip(Vec<ReferenceId>),
    Undecided,
}

/// テーブル決定サービス
#[derive(Debug, Clone)]
pub struct TableDecisionEngine<'a> {
    vocabulary: &'a Vocabulary,
    auto_assigned: &'a Regex,
    max_passes: Option<usize>,
}

impl<'a> TableDecisionEngine<'a> {
    /// 新しいTableDecisionEngineを作成
    ///
    /// # Arguments
    ///
    /// * `auto_assigned` - 自動採番される値型名のパターン
    /// * `max_passes` - パス数の上限（None の場合は概念数から算出）
    pub fn new(vocabulary: &'a Vocabulary, auto_assigned: &'a Regex, max_passes: Option<usize>) -> Self {
        Self {
            vocabulary,
            auto_assigned,
            max_passes,
        }
    }

    /// 不動点ループと既定値の適用を行い、全概念の配置を決定
    ///
    /// 一対一参照の反転は `graph` に直接反映されます。
    pub fn decide(&self, graph: &mut ReferenceGraph) -> Result<DecisionState, MappingError> {
        let mut state = DecisionState::new(self.vocabulary.concepts.len());
        self.decide_unreferenced(graph, &mut state);
        let bound = self.pass_bound(graph, &state);

        loop {
            state.passes += 1;
            if state.passes > bound {
                let undecided = self.undecided(&state).len();
                return Err(MappingError::NonConvergence {
                    passes: bound,
                    undecided,
                });
            }

            let mut progress = false;
            let mut pending_flips = Vec::new();
            for concept in self.undecided(&state) {
                match self.evaluate(graph, &state, concept)? {
                    Decision::Table(rule) => {
                        debug!(concept = %self.name(concept), rule, "decided table");
                        state.decide_table(concept, false);
                        progress = true;
                    }
                    Decision::Absorbed(via, rule) => {
                        debug!(
                            concept = %self.name(concept),
                            rule,
                            via = %graph.get(via).describe(self.vocabulary),
                            "decided absorbed"
                        );
                        state.decide_absorbed(concept, via, false);
                        progress = true;
                    }
                    Decision::Flip(references) => pending_flips.push((concept, references)),
                    Decision::Undecided => {}
                }
            }

            let flipped = self.apply_flips(graph, &mut state, pending_flips);
            debug!(
                pass = state.passes,
                progress,
                flipped,
                undecided = self.undecided(&state).len(),
                "table decision pass finished"
            );
            if !progress && flipped == 0 {
                break;
            }
        }

        self.apply_defaults(graph, &mut state);
        Ok(state)
    }

    /// どの参照にも関わらない値型を暫定テーブルにする
    fn decide_unreferenced(&self, graph: &ReferenceGraph, state: &mut DecisionState) {
        for concept in self.vocabulary.concept_ids() {
            if self.vocabulary.concept(concept).is_value() && !graph.is_referenced(concept) {
                warn!(
                    concept = %self.name(concept),
                    "value type plays no role; defaulting to table"
                );
                state.decide_table(concept, true);
            }
        }
    }

    /// 識別役割が入ってくる一対一参照でしか届かない概念について、その参照を反転する
    ///
    /// 反転後はテーブル自身が識別子の列を持ちます。吸収された概念でも、吸収以外の参照から
    /// 識別子を辿られる場合はテーブルに昇格させてから反転します。
    pub fn repair_identifier_ownership(&self, graph: &mut ReferenceGraph, state: &mut DecisionState) {
        for concept in self.vocabulary.concept_ids() {
            if !self.vocabulary.concept(concept).is_entity() {
                continue;
            }
            let borrowed: Vec<ReferenceId> = self
                .vocabulary
                .own_identifier_roles(concept)
                .into_iter()
                .filter_map(|role| self.borrowed_identifier_reference(graph, concept, role))
                .collect();
            if borrowed.is_empty() {
                continue;
            }

            if state.is_table(concept) != Some(true) {
                let absorbed_via = state.absorbed_via(concept);
                let identified_elsewhere = graph
                    .references_to(concept)
                    .iter()
                    .any(|id| Some(*id) != absorbed_via && !borrowed.contains(id));
                if !identified_elsewhere {
                    continue;
                }
                debug!(
                    concept = %self.name(concept),
                    "identifier is borrowed through a one-to-one reference; promoting to table"
                );
                state.decide_table(concept, false);
            }

            for id in borrowed {
                graph.flip(id);
                state.flipped.insert(id);
                debug!(
                    concept = %self.name(concept),
                    reference = %graph.get(id).describe(self.vocabulary),
                    "flipped reference so the table owns its identifier"
                );
            }
        }
    }

    /// 識別役割 `role` を出ていく参照で持たず、入ってくる一対一参照でのみ持つ場合のその参照
    fn borrowed_identifier_reference(
        &self,
        graph: &ReferenceGraph,
        concept: ConceptId,
        role: RoleId,
    ) -> Option<ReferenceId> {
        let owned = graph
            .references_from(concept)
            .iter()
            .any(|id| graph.get(*id).to_role == Some(role));
        if owned {
            return None;
        }
        graph.references_to(concept).iter().copied().find(|id| {
            let reference = graph.get(*id);
            reference.from_role == Some(role)
                && reference.role_type == RoleType::OneOne
                && reference.from != concept
        })
    }

    /// どのテーブルからも吸収経路で届かない概念をテーブルに昇格する
    pub fn repair_stranded(&self, graph: &ReferenceGraph, state: &mut DecisionState) {
        for concept in self.vocabulary.concept_ids() {
            let Some(via) = state.absorbed_via(concept) else {
                continue;
            };
            if graph.get(via).to == Some(concept) {
                continue;
            }
            match self.incoming(graph, concept).first() {
                Some(first) => state.absorbed_via[concept.0] = Some(*first),
                None => state.decide_table(concept, true),
            }
        }

        loop {
            let anchored = self.anchored(graph, state);
            let stranded = self.sorted(
                self.vocabulary
                    .concept_ids()
                    .filter(|c| !anchored[c.0])
                    .collect(),
            );
            let Some(concept) = stranded.first().copied() else {
                break;
            };
            warn!(
                concept = %self.name(concept),
                "absorption chain does not reach any table; promoting to table"
            );
            state.decide_table(concept, true);
        }
    }

    fn anchored(&self, graph: &ReferenceGraph, state: &DecisionState) -> Vec<bool> {
        let mut anchored: Vec<bool> = self
            .vocabulary
            .concept_ids()
            .map(|c| state.is_table(c) == Some(true))
            .collect();
        let mut changed = true;
        while changed {
            changed = false;
            for concept in self.vocabulary.concept_ids() {
                if anchored[concept.0] {
                    continue;
                }
                if let Some(via) = state.absorbed_via(concept) {
                    if anchored[graph.get(via).from.0] {
                        anchored[concept.0] = true;
                        changed = true;
                    }
                }
            }
        }
        anchored
    }

    fn evaluate(
        &self,
        graph: &ReferenceGraph,
        state: &DecisionState,
        concept: ConceptId,
    ) -> Result<Decision, MappingError> {
        let vocabulary = self.vocabulary;
        let c = vocabulary.concept(concept);
        let incoming = self.incoming(graph, concept);
        let outgoing = graph.references_from(concept);

        if c.is_independent {
            return Ok(Decision::Table("independent"));
        }

        if incoming.is_empty() && !outgoing.iter().any(|id| self.can_flip(graph, state, *id)) {
            return Ok(Decision::Table("orphan"));
        }

        let supertypes = vocabulary.supertypes(concept);
        if c.is_entity() && !supertypes.is_empty() {
            if supertypes
                .iter()
                .any(|(fact_type, _)| vocabulary.is_separate_subtyping(*fact_type))
            {
                return Ok(Decision::Table("separate subtype"));
            }
            let via = incoming
                .iter()
                .copied()
                .find(|id| graph.get(*id).role_type == RoleType::Supertype)
                .ok_or_else(|| {
                    MappingError::inconsistency("absorbed subtype has no supertype reference", &c.name)
                })?;
            return Ok(Decision::Absorbed(via, "subtype"));
        }
        // 独立したサブタイプは外部キーでスーパータイプのテーブルを参照する
        if incoming
            .iter()
            .any(|id| graph.get(*id).role_type == RoleType::Subtype)
        {
            return Ok(Decision::Table("supertype of separate subtype"));
        }

        let identifier = vocabulary.preferred_identifier_roles(concept);
        if incoming.len() > 1 && self.has_auto_assigned_identifier(&identifier) {
            return Ok(Decision::Table("auto-assigned identifier"));
        }

        if let Some(fact_type) = c.as_entity().and_then(|e| e.fact_type) {
            let roles = &vocabulary.fact_type(fact_type).roles;
            if roles.len() == 1 {
                let via = incoming
                    .iter()
                    .copied()
                    .find(|id| graph.get(*id).from_role == Some(roles[0]))
                    .ok_or_else(|| {
                        MappingError::inconsistency("objectified unary has no reference", &c.name)
                    })?;
                return Ok(Decision::Absorbed(via, "objectified unary"));
            }
        }

        if identifier.len() == 1 {
            let via = incoming.iter().copied().find(|id| {
                let reference = graph.get(*id);
                reference.from_role == Some(identifier[0])
                    && vocabulary.concept(reference.from).is_entity()
            });
            if let Some(via) = via {
                return Ok(Decision::Absorbed(via, "identifying reference"));
            }
        }

        let non_identifying: Vec<ReferenceId> = outgoing
            .iter()
            .copied()
            .filter(|id| {
                graph
                    .get(*id)
                    .to_role
                    .is_none_or(|role| !identifier.contains(&role))
            })
            .collect();

        let replicated = incoming.len() > 1 || incoming.iter().any(|id| !graph.get(*id).is_one_to_one());
        if replicated && !non_identifying.is_empty() {
            return Ok(Decision::Table("replicated dependent facts"));
        }

        if !non_identifying.is_empty()
            && non_identifying
                .iter()
                .all(|id| self.can_flip(graph, state, *id))
        {
            return Ok(Decision::Flip(non_identifying));
        }

        if non_identifying.is_empty() {
            return Ok(match incoming.first() {
                Some(via) => Decision::Absorbed(*via, "fully absorbed"),
                None => Decision::Table("nothing to absorb into"),
            });
        }

        Ok(Decision::Undecided)
    }

    /// 保留中の反転を、対象がまだ反転可能な場合に限って適用
    fn apply_flips(
        &self,
        graph: &mut ReferenceGraph,
        state: &mut DecisionState,
        pending: Vec<(ConceptId, Vec<ReferenceId>)>,
    ) -> usize {
        let mut count = 0;
        for (concept, references) in pending {
            let still_valid = references.iter().all(|id| {
                graph.get(*id).from == concept && self.can_flip(graph, state, *id)
            });
            if !still_valid {
                continue;
            }
            for id in references {
                graph.flip(id);
                state.flipped.insert(id);
                count += 1;
                debug!(
                    concept = %self.name(concept),
                    reference = %graph.get(id).describe(self.vocabulary),
                    "flipped one-to-one reference"
                );
            }
            state.is_table[concept.0] = Some(false);
        }
        count
    }

    /// ループ終了後も未決定の概念に既定値を与える
    fn apply_defaults(&self, graph: &ReferenceGraph, state: &mut DecisionState) {
        for concept in self.undecided(state) {
            if self.vocabulary.concept(concept).is_value()
                && self.incoming(graph, concept).is_empty()
                && !graph.references_from(concept).is_empty()
            {
                debug!(concept = %self.name(concept), "value type absorbs facts; defaulting to table");
                state.decide_table(concept, true);
            }
        }

        for concept in self.undecided(state) {
            if state.is_table(concept) == Some(false) {
                let incoming = self.incoming(graph, concept);
                let via = incoming
                    .iter()
                    .copied()
                    .find(|id| state.flipped.contains(id))
                    .or_else(|| incoming.first().copied());
                if let Some(via) = via {
                    state.decide_absorbed(concept, via, true);
                    continue;
                }
            }
            warn!(
                concept = %self.name(concept),
                "ambiguous absorption; defaulting to table (mark it independent to make this explicit)"
            );
            state.decide_table(concept, true);
        }
    }

    /// 反転候補（同種の概念間の一対一参照で、どちらの識別にも使われていない）
    fn is_flip_candidate(&self, graph: &ReferenceGraph, id: ReferenceId) -> bool {
        let reference = graph.get(id);
        let (Some(to), Some(from_role), Some(to_role)) =
            (reference.to, reference.from_role, reference.to_role)
        else {
            return false;
        };
        if reference.role_type != RoleType::OneOne || to == reference.from {
            return false;
        }
        let from = self.vocabulary.concept(reference.from);
        if from.is_entity() != self.vocabulary.concept(to).is_entity() {
            return false;
        }
        !self
            .vocabulary
            .preferred_identifier_roles(reference.from)
            .contains(&to_role)
            && !self
                .vocabulary
                .preferred_identifier_roles(to)
                .contains(&from_role)
    }

    /// 反転して `from` 側を吸収させられるか
    fn can_flip(&self, graph: &ReferenceGraph, state: &DecisionState, id: ReferenceId) -> bool {
        let reference = graph.get(id);
        self.is_flip_candidate(graph, id)
            && reference.from_mandatory
            && !state.flipped.contains(&id)
            && reference
                .to
                .is_some_and(|to| state.is_table(to) != Some(false))
    }

    fn has_auto_assigned_identifier(&self, identifier: &[RoleId]) -> bool {
        identifier.iter().any(|role| {
            let player = self.vocabulary.role(*role).concept;
            self.vocabulary.concept(player).is_value()
                && self
                    .vocabulary
                    .value_type_chain(player)
                    .iter()
                    .any(|c| self.auto_assigned.is_match(&self.vocabulary.concept(*c).name))
        })
    }

    /// 自己参照を除いた入ってくる参照
    fn incoming(&self, graph: &ReferenceGraph, concept: ConceptId) -> Vec<ReferenceId> {
        graph
            .references_to(concept)
            .iter()
            .copied()
            .filter(|id| !graph.get(*id).is_self_loop())
            .collect()
    }

    fn undecided(&self, state: &DecisionState) -> Vec<ConceptId> {
        self.sorted(
            self.vocabulary
                .concept_ids()
                .filter(|c| !state.finalized[c.0])
                .collect(),
        )
    }

    fn sorted(&self, mut concepts: Vec<ConceptId>) -> Vec<ConceptId> {
        concepts.sort_by(|a, b| self.name(*a).cmp(self.name(*b)).then(a.cmp(b)));
        concepts
    }

    fn pass_bound(&self, graph: &ReferenceGraph, state: &DecisionState) -> usize {
        self.max_passes.unwrap_or_else(|| {
            let mapped = self.undecided(state).len();
            let flippable = graph
                .ids()
                .filter(|id| self.is_flip_candidate(graph, *id))
                .count();
            mapped + flippable + 2
        })
    }

    fn name(&self, concept: ConceptId) -> &str {
        &self.vocabulary.concept(concept).name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conceptual::{Assimilation, Subtyping, VocabularyBuilder};
    use crate::core::config::MappingConfig;
    use crate::services::reference_builder::ReferenceBuilder;

    fn decide(vocabulary: &Vocabulary) -> (ReferenceGraph, DecisionState) {
        let regex = MappingConfig::default().auto_assigned_regex().unwrap();
        let mut graph = ReferenceBuilder::new(vocabulary).build().unwrap().graph;
        let engine = TableDecisionEngine::new(vocabulary, &regex, None);
        let mut state = engine.decide(&mut graph).unwrap();
        engine.repair_identifier_ownership(&mut graph, &mut state);
        engine.repair_stranded(&graph, &mut state);
        (graph, state)
    }

    #[test]
    fn test_identified_entity_is_orphan_table() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        b.identified_by(person, name);
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(person), Placement::Table);
        assert!(matches!(state.placement(name), Placement::Absorbed(_)));
        assert!(!state.is_tentative(person));
    }

    #[test]
    fn test_independent_value_type_is_table() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        b.identified_by(person, name);
        b.independent(name);
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(name), Placement::Table);
    }

    #[test]
    fn test_value_type_without_roles_is_tentative_table() {
        let mut b = VocabularyBuilder::new("V");
        let unused = b.value_type("Unused");
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(unused), Placement::Table);
        assert_eq!(state.is_table(unused), Some(true));
        assert!(state.absorbed_via(unused).is_none());
        assert!(state.is_tentative(unused));
    }

    #[test]
    fn test_objectified_unary_is_absorbed_into_player() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        let smoking = b.entity_type("Smoking");
        b.identified_by(person, name);
        let (smokes, smokes_role) = b.unary(person, "{0} smokes");
        b.objectify(smoking, smokes);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(person), Placement::Table);
        let via = state.absorbed_via(smoking).unwrap();
        let reference = graph.get(via);
        assert_eq!(reference.from, person);
        assert_eq!(reference.from_role, Some(smokes_role));
        assert_eq!(reference.role_type, RoleType::Unary);
        assert!(!state.is_tentative(smoking));
    }

    #[test]
    fn test_value_type_absorbing_facts_defaults_to_table() {
        // Code -> Color は反転できるが Code -> Shade は反転できないため、ループ後も Code は未決定のまま残る
        let mut b = VocabularyBuilder::new("V");
        let code = b.value_type("Code");
        let color = b.value_type("Color");
        let shade = b.value_type("Shade");
        let hue = b.value_type("Hue");
        let paint_nr = b.value_type("PaintNr");
        let paint = b.entity_type("Paint");
        b.identified_by(paint, paint_nr);
        b.one_to_one(code, color, "{0} denotes {1}", true, true);
        b.many_to_one(code, shade, "{0} is of {1}", false);
        b.many_to_one(color, hue, "{0} has {1}", false);
        b.many_to_one(paint, color, "{0} is painted {1}", true);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(code), Placement::Table);
        assert!(state.is_tentative(code));
        assert_eq!(state.placement(color), Placement::Table);
        assert!(!state.is_tentative(color));
        assert_eq!(graph.get(state.absorbed_via(shade).unwrap()).from, code);
        assert!(state.flipped().is_empty());
    }

    #[test]
    fn test_ambiguous_entity_defaults_to_tentative_table() {
        let mut b = VocabularyBuilder::new("V");
        let badge_nr = b.value_type("BadgeNr");
        let holder_nr = b.value_type("HolderNr");
        let visit_nr = b.value_type("VisitNr");
        let color = b.value_type("Color");
        let name = b.value_type("Name");
        let badge = b.entity_type("Badge");
        let holder = b.entity_type("Holder");
        let visit = b.entity_type("Visit");
        b.identified_by(badge, badge_nr);
        b.identified_by(holder, holder_nr);
        b.identified_by(visit, visit_nr);
        b.one_to_one(badge, holder, "{0} is worn by {1}", true, true);
        b.many_to_one(badge, color, "{0} is {1}", false);
        b.many_to_one(holder, name, "{0} has {1}", true);
        b.many_to_one(visit, holder, "{0} is made by {1}", true);
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(holder), Placement::Table);
        assert!(!state.is_tentative(holder));
        assert_eq!(state.placement(badge), Placement::Table);
        assert!(state.is_tentative(badge));
        assert!(state.flipped().is_empty());
    }

    #[test]
    fn test_absorption_cycle_is_promoted_to_table() {
        // A と B が互いの役割で識別され、互いに吸収し合う
        let mut b = VocabularyBuilder::new("V");
        let a = b.entity_type("A");
        let c = b.entity_type("B");
        let (_, a_first, b_first) = b.binary(a, c, "{0} is paired with {1}");
        b.uniqueness(&[a_first]);
        b.uniqueness(&[b_first]);
        let (_, b_second, a_second) = b.binary(c, a, "{0} is matched with {1}");
        b.uniqueness(&[b_second]);
        b.uniqueness(&[a_second]);
        b.identify(a, &[b_first]);
        b.identify(c, &[a_second]);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(a), Placement::Table);
        assert!(state.is_tentative(a));
        let via = state.absorbed_via(c).unwrap();
        assert_eq!(graph.get(via).from, a);
        assert_eq!(graph.get(via).to, Some(c));
    }

    #[test]
    fn test_borrowed_identifier_referenced_elsewhere_becomes_table() {
        // X は一対一 "X is for Y" の Y 側の役割で識別され、T からも参照される
        let mut b = VocabularyBuilder::new("V");
        let y_nr = b.value_type("YNr");
        let t_nr = b.value_type("TNr");
        let color = b.value_type("Color");
        let y = b.entity_type("Y");
        let x = b.entity_type("X");
        let t = b.entity_type("T");
        b.identified_by(y, y_nr);
        b.identified_by(t, t_nr);
        let (_, x_role, y_role) = b.binary(x, y, "{0} is for {1}");
        b.uniqueness(&[x_role]);
        b.mandatory(x_role);
        b.identify(x, &[y_role]);
        b.many_to_one(x, color, "{0} has {1}", false);
        b.many_to_one(t, x, "{0} concerns {1}", true);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(x), Placement::Table);
        assert_eq!(state.placement(y), Placement::Table);
        let owned = graph
            .references_from(x)
            .iter()
            .copied()
            .find(|id| graph.get(*id).to_role == Some(y_role))
            .unwrap();
        assert_eq!(graph.get(owned).to, Some(y));
        assert!(state.flipped().contains(&owned));
    }

    #[test]
    fn test_borrowed_identifier_without_other_referrers_stays_absorbed() {
        let mut b = VocabularyBuilder::new("V");
        let y_nr = b.value_type("YNr");
        let color = b.value_type("Color");
        let y = b.entity_type("Y");
        let x = b.entity_type("X");
        b.identified_by(y, y_nr);
        let (_, x_role, y_role) = b.binary(x, y, "{0} is for {1}");
        b.uniqueness(&[x_role]);
        b.identify(x, &[y_role]);
        b.many_to_one(x, color, "{0} has {1}", false);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        let via = state.absorbed_via(x).unwrap();
        assert_eq!(graph.get(via).from, y);
        assert_eq!(graph.get(via).from_role, Some(y_role));
        assert!(state.flipped().is_empty());
    }

    #[test]
    fn test_entity_with_only_identifier_is_absorbed() {
        let mut b = VocabularyBuilder::new("V");
        let order_nr = b.value_type("OrderNr");
        let customer_nr = b.value_type("CustomerNr");
        let order = b.entity_type("Order");
        let customer = b.entity_type("Customer");
        b.identified_by(order, order_nr);
        b.identified_by(customer, customer_nr);
        b.many_to_one(order, customer, "{0} was placed by {1}", true);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(order), Placement::Table);
        let via = state.absorbed_via(customer).unwrap();
        assert_eq!(graph.get(via).from, order);
    }

    #[test]
    fn test_entity_with_replicated_facts_is_table() {
        let mut b = VocabularyBuilder::new("V");
        let order_nr = b.value_type("OrderNr");
        let customer_nr = b.value_type("CustomerNr");
        let name = b.value_type("Name");
        let order = b.entity_type("Order");
        let invoice = b.entity_type("Invoice");
        let customer = b.entity_type("Customer");
        b.identified_by(order, order_nr);
        b.identified_by(invoice, order_nr);
        b.identified_by(customer, customer_nr);
        b.many_to_one(order, customer, "{0} was placed by {1}", true);
        b.many_to_one(invoice, customer, "{0} is billed to {1}", true);
        b.many_to_one(customer, name, "{0} has {1}", false);
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(customer), Placement::Table);
        assert!(!state.is_tentative(customer));
    }

    #[test]
    fn test_auto_assigned_identifier_forces_table() {
        let mut b = VocabularyBuilder::new("V");
        let auto = b.value_type("AutoCounter");
        let id = b.value_type("EmployeeId");
        b.value_supertype(id, auto);
        let employee = b.entity_type("Employee");
        b.identified_by(employee, id);
        for holder in ["Payroll", "Timesheet", "Badge"] {
            let h = b.entity_type(holder);
            let nr = b.value_type(&format!("{}Nr", holder));
            b.identified_by(h, nr);
            b.many_to_one(h, employee, "{0} is for {1}", true);
        }
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(employee), Placement::Table);
        assert!(!state.is_tentative(employee));
        assert!(state.is_tentative(auto));
    }

    #[test]
    fn test_absorbed_subtype_and_separate_subtype() {
        let mut b = VocabularyBuilder::new("V");
        let nr = b.value_type("PersonNr");
        let person = b.entity_type("Person");
        let employee = b.entity_type("Employee");
        let contractor = b.entity_type("Contractor");
        b.identified_by(person, nr);
        let absorbed = b.subtype(employee, person);
        b.subtype_with(
            contractor,
            person,
            Subtyping {
                provides_identification: true,
                assimilation: Assimilation::Separate,
            },
        );
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(person), Placement::Table);
        assert_eq!(state.placement(contractor), Placement::Table);
        let via = state.absorbed_via(employee).unwrap();
        assert_eq!(graph.get(via).fact_type, absorbed);
    }

    #[test]
    fn test_mandatory_one_to_one_absorbs_mandatory_side() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let street = b.value_type("Street");
        let person = b.entity_type("Person");
        let address = b.entity_type("Address");
        b.identified_by(person, name);
        b.identified_by(address, street);
        b.one_to_one(person, address, "{0} lives at {1}", true, false);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(address), Placement::Table);
        let via = state.absorbed_via(person).unwrap();
        assert_eq!(graph.get(via).from, address);
        assert!(!state.is_tentative(address));
    }

    #[test]
    fn test_self_loop_does_not_prevent_orphan_rule() {
        let mut b = VocabularyBuilder::new("V");
        let nr = b.value_type("EmployeeNr");
        let employee = b.entity_type("Employee");
        b.identified_by(employee, nr);
        b.many_to_one(employee, employee, "{0} is managed by {1}", false);
        let vocabulary = b.build();

        let (_, state) = decide(&vocabulary);
        assert_eq!(state.placement(employee), Placement::Table);
        assert!(state.passes() >= 1);
    }

    #[test]
    fn test_flip_absorbs_into_table_target() {
        // 両側必須の一対一は名前順で A -> Chair になり、Chair が複数箇所から参照されるテーブルなので反転される
        let mut b = VocabularyBuilder::new("V");
        let anr = b.value_type("ANr");
        let cnr = b.value_type("ChairNr");
        let color = b.value_type("Color");
        let a = b.entity_type("A");
        let chair = b.entity_type("Chair");
        b.identified_by(a, anr);
        b.identified_by(chair, cnr);
        b.many_to_one(chair, color, "{0} has {1}", false);
        for holder in ["Desk", "Room"] {
            let h = b.entity_type(holder);
            let nr = b.value_type(&format!("{}Nr", holder));
            b.identified_by(h, nr);
            b.many_to_one(h, chair, "{0} has {1}", false);
        }
        b.one_to_one(a, chair, "{0} sits on {1}", true, true);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        assert_eq!(state.placement(chair), Placement::Table);
        let via = state.absorbed_via(a).unwrap();
        let reference = graph.get(via);
        assert_eq!(reference.from, chair);
        assert_eq!(reference.to, Some(a));
        assert!(state.flipped().contains(&via));
    }

    #[test]
    fn test_absorbed_concepts_point_at_their_reference() {
        let mut b = VocabularyBuilder::new("V");
        let pnr = b.value_type("PassportNr");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        let passport = b.entity_type("Passport");
        let visa = b.entity_type("Visa");
        b.identified_by(person, name);
        b.identified_by(passport, pnr);
        b.identified_by(visa, pnr);
        b.one_to_one(passport, person, "{0} belongs to {1}", true, false);
        b.many_to_one(visa, person, "{0} is issued to {1}", true);
        let vocabulary = b.build();

        let (graph, state) = decide(&vocabulary);
        for concept in vocabulary.concept_ids() {
            if let Placement::Absorbed(via) = state.placement(concept) {
                assert_eq!(graph.get(via).to, Some(concept));
            }
        }
        assert_eq!(state.placement(person), Placement::Table);
        assert_eq!(state.placement(visa), Placement::Table);
        assert_eq!(graph.get(state.absorbed_via(passport).unwrap()).from, person);
    }

    #[test]
    fn test_max_passes_bound_reports_non_convergence() {
        let mut b = VocabularyBuilder::new("V");
        let name = b.value_type("Name");
        let person = b.entity_type("Person");
        b.identified_by(person, name);
        let vocabulary = b.build();

        let regex = MappingConfig::default().auto_assigned_regex().unwrap();
        let mut graph = ReferenceBuilder::new(&vocabulary).build().unwrap().graph;
        let engine = TableDecisionEngine::new(&vocabulary, &regex, Some(1));
        let err = engine.decide(&mut graph).unwrap_err();
        assert!(err.is_non_convergence());
    }

    #[test]
    fn test_decisions_are_deterministic() {
        let build = || {
            let mut b = VocabularyBuilder::new("V");
            let name = b.value_type("Name");
            let a = b.entity_type("A");
            let c = b.entity_type("C");
            b.identified_by(a, name);
            b.identified_by(c, name);
            b.one_to_one(a, c, "{0} pairs with {1}", true, true);
            b.build()
        };
        let first = build();
        let second = build();
        assert_eq!(decide(&first).1, decide(&second).1);
    }
}
