// 参照構築サービス
//
// 役割の種別に従って、概念間の有向参照（吸収や外部キーの候補となる辺）を構築します。
// 一対一のファクトでは、独立性と識別関係から暫定的な向きを選びます。

use crate::core::conceptual::{ConceptId, FactTypeId, RoleId, Vocabulary};
use crate::core::error::MappingError;
use crate::core::relational::{Reference, ReferenceGraph, RoleType};
use crate::services::role_classifier::RoleClassifier;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// 参照構築の結果
#[derive(Debug, Clone)]
pub struct BuiltReferences {
    pub graph: ReferenceGraph,
    /// どの参照にもならなかったファクト型（結合表候補）
    pub unmapped_fact_types: Vec<FactTypeId>,
}

/// 参照構築サービス
#[derive(Debug, Clone)]
pub struct ReferenceBuilder<'a> {
    vocabulary: &'a Vocabulary,
    classifier: RoleClassifier<'a>,
}

impl<'a> ReferenceBuilder<'a> {
    /// 新しいReferenceBuilderを作成
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self {
            vocabulary,
            classifier: RoleClassifier::new(vocabulary),
        }
    }

    /// すべての概念について参照を構築
    ///
    /// 概念はID順、各概念の役割もID順に処理するため、参照IDは入力に対して決定的です。
    pub fn build(&self) -> Result<BuiltReferences, MappingError> {
        let mut graph = ReferenceGraph::new(self.vocabulary.concepts.len());

        for concept in self.vocabulary.concept_ids() {
            for role in self.vocabulary.roles_played_by(concept) {
                self.populate_role(&mut graph, concept, role)?;
            }
            self.populate_objectification(&mut graph, concept);
        }

        let unmapped_fact_types = self.unmapped_fact_types(&graph);
        for fact_type in &unmapped_fact_types {
            warn!(
                fact_type = %self.vocabulary.fact_type_label(*fact_type),
                "fact type has no functional role and is left unmapped"
            );
        }

        debug!(references = graph.len(), "built reference graph");
        Ok(BuiltReferences {
            graph,
            unmapped_fact_types,
        })
    }

    fn populate_role(
        &self,
        graph: &mut ReferenceGraph,
        concept: ConceptId,
        role: RoleId,
    ) -> Result<(), MappingError> {
        let r = self.vocabulary.role(role);
        let fact_type = self.vocabulary.fact_type(r.fact_type);

        // 客体化された多項ファクトは客体側から参照する
        if fact_type.objectified_as.is_some() && fact_type.arity() > 1 {
            return Ok(());
        }

        match self.classifier.role_type(role) {
            RoleType::Unary => {
                graph.add(Reference {
                    from: concept,
                    to: fact_type.objectified_as,
                    from_role: Some(role),
                    to_role: None,
                    fact_type: r.fact_type,
                    role_type: RoleType::Unary,
                    from_mandatory: self.vocabulary.is_mandatory(role),
                    to_mandatory: fact_type.objectified_as.is_some(),
                });
            }
            RoleType::ManyOne => {
                let counterpart = self.single_counterpart(role)?;
                graph.add(self.binary_reference(role, counterpart, RoleType::ManyOne));
            }
            RoleType::OneOne => {
                let counterpart = self.single_counterpart(role)?;
                if self.prefer_forward(role, counterpart) == Ordering::Less {
                    graph.add(self.binary_reference(role, counterpart, RoleType::OneOne));
                }
            }
            RoleType::OneMany | RoleType::ManyMany => {}
            RoleType::Supertype => {
                if !self.vocabulary.is_separate_subtyping(r.fact_type) {
                    let sub_role = fact_type.roles[0];
                    graph.add(Reference {
                        from: concept,
                        to: Some(self.vocabulary.role(sub_role).concept),
                        from_role: Some(role),
                        to_role: Some(sub_role),
                        fact_type: r.fact_type,
                        role_type: RoleType::Supertype,
                        from_mandatory: false,
                        to_mandatory: true,
                    });
                }
            }
            RoleType::Subtype => {
                if self.vocabulary.is_separate_subtyping(r.fact_type) {
                    let super_role = fact_type.roles[1];
                    graph.add(Reference {
                        from: concept,
                        to: Some(self.vocabulary.role(super_role).concept),
                        from_role: Some(role),
                        to_role: Some(super_role),
                        fact_type: r.fact_type,
                        role_type: RoleType::Subtype,
                        from_mandatory: true,
                        to_mandatory: false,
                    });
                }
            }
        }
        Ok(())
    }

    /// 客体化エンティティから各役割の担い手への参照
    fn populate_objectification(&self, graph: &mut ReferenceGraph, concept: ConceptId) {
        let Some(fact_type_id) = self
            .vocabulary
            .concept(concept)
            .as_entity()
            .and_then(|e| e.fact_type)
        else {
            return;
        };
        let fact_type = self.vocabulary.fact_type(fact_type_id);
        if fact_type.arity() < 2 {
            return;
        }
        for role in &fact_type.roles {
            let role_type = match self.classifier.role_type(*role) {
                RoleType::OneOne => RoleType::OneOne,
                _ => RoleType::ManyOne,
            };
            graph.add(Reference {
                from: concept,
                to: Some(self.vocabulary.role(*role).concept),
                from_role: None,
                to_role: Some(*role),
                fact_type: fact_type_id,
                role_type,
                from_mandatory: true,
                to_mandatory: self.vocabulary.is_mandatory(*role),
            });
        }
    }

    fn binary_reference(&self, role: RoleId, counterpart: RoleId, role_type: RoleType) -> Reference {
        let r = self.vocabulary.role(role);
        Reference {
            from: r.concept,
            to: Some(self.vocabulary.role(counterpart).concept),
            from_role: Some(role),
            to_role: Some(counterpart),
            fact_type: r.fact_type,
            role_type,
            from_mandatory: self.vocabulary.is_mandatory(role),
            to_mandatory: self.vocabulary.is_mandatory(counterpart),
        }
    }

    fn single_counterpart(&self, role: RoleId) -> Result<RoleId, MappingError> {
        self.vocabulary.counterpart(role).ok_or_else(|| {
            let fact_type = self.vocabulary.role(role).fact_type;
            MappingError::inconsistency(
                "functional role has no single counterpart",
                self.vocabulary.fact_type_label(fact_type),
            )
        })
    }

    /// 一対一ファクトで `role` 側の概念から参照を張るべきか
    ///
    /// `Less` なら `role` 側が参照元になります。役割を入れ替えると結果も反転します。
    fn prefer_forward(&self, role: RoleId, counterpart: RoleId) -> Ordering {
        let vocabulary = self.vocabulary;
        let r = vocabulary.role(role);
        let s = vocabulary.role(counterpart);
        let a = vocabulary.concept(r.concept);
        let b = vocabulary.concept(s.concept);

        if r.concept == s.concept {
            return r.ordinal.cmp(&s.ordinal);
        }

        // 値型はエンティティ型に吸収される
        match (a.is_entity(), b.is_entity()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        match (a.is_independent, b.is_independent) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        // 相手の識別子に使われている側が参照元
        if vocabulary
            .preferred_identifier_roles(s.concept)
            .contains(&role)
        {
            return Ordering::Less;
        }
        if vocabulary
            .preferred_identifier_roles(r.concept)
            .contains(&counterpart)
        {
            return Ordering::Greater;
        }

        // 必須側の概念が吸収される
        match (
            vocabulary.is_mandatory(role),
            vocabulary.is_mandatory(counterpart),
        ) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            _ => {}
        }

        a.name
            .cmp(&b.name)
            .then(r.concept.cmp(&s.concept))
            .then(r.ordinal.cmp(&s.ordinal))
    }

    fn unmapped_fact_types(&self, graph: &ReferenceGraph) -> Vec<FactTypeId> {
        self.vocabulary
            .fact_type_ids()
            .filter(|id| {
                let fact_type = self.vocabulary.fact_type(*id);
                !fact_type.is_subtyping()
                    && fact_type.objectified_as.is_none()
                    && fact_type.arity() >= 2
                    && !graph.references().iter().any(|r| r.fact_type == *id)
            })
            .collect()
    }
}
