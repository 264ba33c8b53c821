// DTO変換サービス
//
// VocabularyDto → Vocabulary の変換を一元管理するサービス。
// 名前で書かれた参照をIDに解決し、VocabularyBuilder を通して語彙を組み立てます。

use crate::core::conceptual::{
    ConceptId, FactTypeId, RoleId, Subtyping, Vocabulary, VocabularyBuilder,
};
use crate::core::error::{ErrorLocation, ValidationError};
use crate::services::vocabulary_io::dto::{EntityTypeDto, FactTypeDto, RoleRefDto, VocabularyDto};
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};

/// DTO変換サービス
#[derive(Debug, Clone, Default)]
pub struct DtoConverterService;

/// 変換中の名前解決テーブル
struct Names {
    concepts: HashMap<String, ConceptId>,
    fact_types: HashMap<String, FactTypeId>,
}

impl DtoConverterService {
    /// 新しいDtoConverterServiceを作成
    pub fn new() -> Self {
        Self
    }

    /// VocabularyDto → Vocabulary 変換
    ///
    /// 値型、エンティティ型、サブタイプ関係、ファクト型、客体化、優先識別子、外部一意性制約の順に組み立てます。
    ///
    /// # Errors
    ///
    /// - 概念名やファクト型IDが重複している場合
    /// - 未定義の概念名、ファクト型ID、役割の序数を参照している場合
    pub fn dto_to_vocabulary(&self, dto: &VocabularyDto) -> Result<Vocabulary> {
        let mut builder = VocabularyBuilder::new(&dto.name);
        let mut names = Names {
            concepts: HashMap::new(),
            fact_types: HashMap::new(),
        };

        // 概念を登録
        for value_type in &dto.value_types {
            let id = builder.value_type(&value_type.name);
            self.register_concept(&mut names, &value_type.name, id)?;
        }
        for entity_type in &dto.entity_types {
            let id = builder.entity_type(&entity_type.name);
            self.register_concept(&mut names, &entity_type.name, id)?;
        }

        // 値型の属性
        for value_type in &dto.value_types {
            let id = names.concepts[&value_type.name];
            if let Some(supertype) = &value_type.supertype {
                let supertype = self.resolve_concept(&names, supertype, &value_type.name)?;
                builder.value_supertype(id, supertype);
            }
            builder.value_facets(id, value_type.length, value_type.scale);
            if !value_type.values.is_empty() {
                builder.value_restriction(id, &as_strs(&value_type.values));
            }
            if value_type.independent {
                builder.independent(id);
            }
        }

        // エンティティ型の独立性、単純識別、サブタイプ関係
        for entity_type in &dto.entity_types {
            let id = names.concepts[&entity_type.name];
            if entity_type.independent {
                builder.independent(id);
            }
            if let Some(value) = &entity_type.identified_by {
                let value = self.resolve_concept(&names, value, &entity_type.name)?;
                builder.identified_by(id, value);
            }
            for supertype in &entity_type.supertypes {
                let supertype_id = self.resolve_concept(&names, &supertype.name, &entity_type.name)?;
                builder.subtype_with(
                    id,
                    supertype_id,
                    Subtyping {
                        provides_identification: supertype.provides_identification,
                        assimilation: supertype.assimilation,
                    },
                );
            }
        }

        // ファクト型
        for fact_type in &dto.fact_types {
            if names.fact_types.contains_key(&fact_type.id) {
                return Err(ValidationError::Structure {
                    message: format!("Duplicate fact type id '{}'", fact_type.id),
                    location: Some(ErrorLocation::with_fact_type(&fact_type.id)),
                    suggestion: Some("Give each fact type a unique id".to_string()),
                }
                .into());
            }
            let id = self.convert_fact_type(&mut builder, &names, fact_type)?;
            names.fact_types.insert(fact_type.id.clone(), id);
        }

        // 客体化と優先識別子（ファクト型の定義後に解決）
        for entity_type in &dto.entity_types {
            let id = names.concepts[&entity_type.name];
            if let Some(objectified) = &entity_type.objectifies {
                let fact_type = self.resolve_fact_type(&names, objectified, &entity_type.name)?;
                builder.objectify(id, fact_type);
            }
            if !entity_type.identifier.is_empty() {
                self.convert_identifier(&mut builder, &names, id, entity_type)?;
            }
        }

        // 外部一意性制約
        for constraint in &dto.constraints {
            let label = constraint.name.as_deref().unwrap_or("constraint");
            let roles = self.resolve_roles(&builder, &names, &constraint.roles, label)?;
            let id = builder.uniqueness(&roles);
            if let Some(name) = &constraint.name {
                builder.constraint_name(id, name);
            }
        }

        Ok(builder.build())
    }

    fn register_concept(&self, names: &mut Names, name: &str, id: ConceptId) -> Result<()> {
        if names.concepts.insert(name.to_string(), id).is_some() {
            return Err(ValidationError::Structure {
                message: format!("Duplicate concept name '{}'", name),
                location: Some(ErrorLocation::with_concept(name)),
                suggestion: Some("Concept names must be unique across value and entity types".to_string()),
            }
            .into());
        }
        Ok(())
    }

    fn convert_fact_type(
        &self,
        builder: &mut VocabularyBuilder,
        names: &Names,
        dto: &FactTypeDto,
    ) -> Result<FactTypeId> {
        let mut players = Vec::with_capacity(dto.roles.len());
        for role in &dto.roles {
            players.push(self.resolve_player(names, &role.player, &dto.id)?);
        }
        let id = builder.fact_type(&players, &dto.reading);

        for (ordinal, role_dto) in dto.roles.iter().enumerate() {
            let role = builder.role(id, ordinal);
            if let Some(name) = &role_dto.name {
                builder.role_name(role, name);
            }
            if role_dto.leading_adjective.is_some() || role_dto.trailing_adjective.is_some() {
                builder.adjectives(
                    role,
                    role_dto.leading_adjective.as_deref(),
                    role_dto.trailing_adjective.as_deref(),
                );
            }
            if !role_dto.values.is_empty() {
                builder.role_values(role, &as_strs(&role_dto.values));
            }
            if role_dto.unique {
                builder.uniqueness(&[role]);
            }
            if role_dto.mandatory {
                builder.mandatory(role);
            }
        }

        for ordinals in &dto.uniqueness {
            let mut roles = Vec::with_capacity(ordinals.len());
            for ordinal in ordinals {
                if *ordinal >= dto.roles.len() {
                    return Err(self.unknown_role(&dto.id, *ordinal));
                }
                roles.push(builder.role(id, *ordinal));
            }
            builder.uniqueness(&roles);
        }

        Ok(id)
    }

    /// 役割の組による優先識別子
    ///
    /// 同じ役割集合の一意性制約が既にあればそれを優先識別子にし、なければ新しく作ります。
    fn convert_identifier(
        &self,
        builder: &mut VocabularyBuilder,
        names: &Names,
        entity: ConceptId,
        dto: &EntityTypeDto,
    ) -> Result<()> {
        let roles = self.resolve_roles(builder, names, &dto.identifier, &dto.name)?;
        let wanted: BTreeSet<RoleId> = roles.iter().copied().collect();

        let vocabulary = builder.vocabulary();
        let existing = vocabulary.constraint_ids().find(|c| {
            let constraint = vocabulary.constraint(*c);
            constraint.is_uniqueness()
                && vocabulary
                    .sequence_roles(constraint.role_sequence)
                    .into_iter()
                    .collect::<BTreeSet<_>>()
                    == wanted
        });
        match existing {
            Some(constraint) => {
                builder.preferred_identifier(entity, constraint);
            }
            None => {
                builder.identify(entity, &roles);
            }
        }
        Ok(())
    }

    fn resolve_roles(
        &self,
        builder: &VocabularyBuilder,
        names: &Names,
        refs: &[RoleRefDto],
        owner: &str,
    ) -> Result<Vec<RoleId>> {
        let mut roles = Vec::with_capacity(refs.len());
        for role_ref in refs {
            let fact_type = self.resolve_fact_type(names, &role_ref.fact_type, owner)?;
            let arity = builder.vocabulary().fact_type(fact_type).arity();
            if role_ref.role >= arity {
                return Err(self.unknown_role(&role_ref.fact_type, role_ref.role));
            }
            roles.push(builder.role(fact_type, role_ref.role));
        }
        Ok(roles)
    }

    fn resolve_concept(&self, names: &Names, name: &str, owner: &str) -> Result<ConceptId> {
        names.concepts.get(name).copied().ok_or_else(|| {
            ValidationError::Reference {
                message: format!("Unknown concept '{}' referenced by '{}'", name, owner),
                location: Some(ErrorLocation::with_concept(owner)),
                suggestion: Some(format!("Declare '{}' as a value type or entity type", name)),
            }
            .into()
        })
    }

    fn resolve_player(&self, names: &Names, name: &str, fact_type: &str) -> Result<ConceptId> {
        names.concepts.get(name).copied().ok_or_else(|| {
            ValidationError::Reference {
                message: format!("Unknown role player '{}'", name),
                location: Some(ErrorLocation::with_fact_type(fact_type)),
                suggestion: Some(format!("Declare '{}' as a value type or entity type", name)),
            }
            .into()
        })
    }

    fn resolve_fact_type(&self, names: &Names, id: &str, owner: &str) -> Result<FactTypeId> {
        names.fact_types.get(id).copied().ok_or_else(|| {
            ValidationError::Reference {
                message: format!("Unknown fact type '{}' referenced by '{}'", id, owner),
                location: Some(ErrorLocation::with_fact_type(id)),
                suggestion: Some("Check the fact type ids under 'fact_types'".to_string()),
            }
            .into()
        })
    }

    fn unknown_role(&self, fact_type: &str, ordinal: usize) -> anyhow::Error {
        ValidationError::Reference {
            message: format!("Fact type '{}' has no role {}", fact_type, ordinal),
            location: Some(ErrorLocation {
                fact_type: Some(fact_type.to_string()),
                role: Some(ordinal),
                ..ErrorLocation::default()
            }),
            suggestion: None,
        }
        .into()
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}
