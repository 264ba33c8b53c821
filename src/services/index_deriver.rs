// インデックス導出サービス
//
// 列の参照経路から到達できる一意性制約をまとめ、テーブルごとのインデックスを導出します。

use crate::core::conceptual::{ConceptId, ConstraintId, RoleId, Vocabulary};
use crate::core::relational::{truncate_identifier, Column, Index, ReferenceGraph, ReferenceId};
use std::collections::BTreeSet;

/// 一意性制約と経路の接頭辞ごとの候補
#[derive(Debug)]
struct Candidate {
    constraint: ConstraintId,
    prefix: Vec<ReferenceId>,
    over: ConceptId,
    members: Vec<(usize, usize)>,
    covered: BTreeSet<RoleId>,
}

/// インデックス導出サービス
#[derive(Debug, Clone)]
pub struct IndexDeriver<'a> {
    vocabulary: &'a Vocabulary,
    graph: &'a ReferenceGraph,
    joiner: &'a str,
    max_name_length: usize,
}

impl<'a> IndexDeriver<'a> {
    /// 新しいIndexDeriverを作成
    pub fn new(
        vocabulary: &'a Vocabulary,
        graph: &'a ReferenceGraph,
        joiner: &'a str,
        max_name_length: usize,
    ) -> Self {
        Self {
            vocabulary,
            graph,
            joiner,
            max_name_length,
        }
    }

    /// テーブルのインデックスを導出
    ///
    /// 一意性制約のすべての役割が同じ接頭辞の列で覆われた場合にだけインデックスになります。
    /// 識別子列と同じ列集合のインデックスが主キーで、見つからなければ識別子列から補います。
    /// 列集合が同じインデックスは1つにまとめます。
    pub fn derive(
        &self,
        table: ConceptId,
        table_name: &str,
        columns: &[Column],
        identifier: &[usize],
    ) -> Vec<Index> {
        let mut candidates: Vec<Candidate> = Vec::new();

        for (position, column) in columns.iter().enumerate() {
            for (k, id) in column.references.iter().enumerate() {
                let injective = column.references[..k]
                    .iter()
                    .all(|earlier| self.graph.get(*earlier).is_one_to_one());
                if !injective {
                    break;
                }
                let reference = self.graph.get(*id);
                let Some(role) = reference.to_role else {
                    continue;
                };
                for constraint in self.vocabulary.uniqueness_constraints_over(role) {
                    let sequence = self
                        .vocabulary
                        .role_sequence(self.vocabulary.constraint(constraint).role_sequence);
                    let role_position = sequence.position(role).unwrap_or(0);
                    let prefix = &column.references[..k];
                    let index = match candidates
                        .iter()
                        .position(|c| c.constraint == constraint && c.prefix == prefix)
                    {
                        Some(index) => index,
                        None => {
                            candidates.push(Candidate {
                                constraint,
                                prefix: prefix.to_vec(),
                                over: reference.from,
                                members: Vec::new(),
                                covered: BTreeSet::new(),
                            });
                            candidates.len() - 1
                        }
                    };
                    let candidate = &mut candidates[index];
                    if !candidate.members.iter().any(|(_, p)| *p == position) {
                        candidate.members.push((role_position, position));
                    }
                    candidate.covered.insert(role);
                }
            }
        }

        let identifier_set: BTreeSet<usize> = identifier.iter().copied().collect();
        let mut indices: Vec<Index> = Vec::new();
        for mut candidate in candidates {
            let required: BTreeSet<RoleId> = self
                .vocabulary
                .sequence_roles(self.vocabulary.constraint(candidate.constraint).role_sequence)
                .into_iter()
                .collect();
            if candidate.covered != required {
                continue;
            }
            candidate.members.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| columns[a.1].name(self.joiner).cmp(&columns[b.1].name(self.joiner)))
            });
            let positions: Vec<usize> = candidate.members.iter().map(|(_, p)| *p).collect();
            let set: BTreeSet<usize> = positions.iter().copied().collect();
            let is_primary = !identifier_set.is_empty() && set == identifier_set;

            match indices.iter_mut().find(|i| column_set(&i.columns) == set) {
                Some(existing) => {
                    if is_primary && !existing.is_primary {
                        existing.is_primary = true;
                        existing.constraint = Some(candidate.constraint);
                        existing.over = candidate.over;
                    }
                }
                None => indices.push(Index {
                    name: String::new(),
                    on: table,
                    over: candidate.over,
                    columns: positions,
                    is_primary,
                    constraint: Some(candidate.constraint),
                }),
            }
        }

        if !identifier.is_empty() && !indices.iter().any(|i| i.is_primary) {
            match indices
                .iter_mut()
                .find(|i| column_set(&i.columns) == identifier_set)
            {
                Some(existing) => existing.is_primary = true,
                None => indices.push(Index {
                    name: String::new(),
                    on: table,
                    over: table,
                    columns: identifier.to_vec(),
                    is_primary: true,
                    constraint: None,
                }),
            }
        }

        for index in &mut indices {
            index.name = self.index_name(table_name, index, columns);
        }
        indices.sort_by(|a, b| b.is_primary.cmp(&a.is_primary).then_with(|| a.name.cmp(&b.name)));
        indices
    }

    fn index_name(&self, table_name: &str, index: &Index, columns: &[Column]) -> String {
        let name = if index.is_primary {
            ["PK", table_name].join(self.joiner)
        } else {
            let mut parts = vec![table_name.to_string(), "By".to_string()];
            parts.extend(index.columns.iter().map(|p| columns[*p].name(self.joiner)));
            parts.join(self.joiner)
        };
        truncate_identifier(&name, self.max_name_length)
    }
}

fn column_set(columns: &[usize]) -> BTreeSet<usize> {
    columns.iter().copied().collect()
}
