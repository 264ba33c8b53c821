// 語彙DTO
//
// YAML構造と内部モデル（アリーナ形式の語彙）を分離するためのDTO層。
// 概念やファクト型は名前で参照し、変換時にIDへ解決します。

use crate::core::conceptual::Assimilation;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// YAML 語彙用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyDto {
    /// 語彙名（省略時はファイル名）
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value_types: Vec<ValueTypeDto>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<EntityTypeDto>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fact_types: Vec<FactTypeDto>,

    /// ファクト型をまたぐ一意性制約（外部一意性）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDto>,
}

/// 値型DTO
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTypeDto {
    pub name: String,

    /// 特化元の値型名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// 許容値の列挙
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub independent: bool,
}

/// エンティティ型DTO
///
/// 識別方法は `identified_by`（値型による単純識別）、`identifier`（役割の組）、
/// `objectifies`（客体化したファクト型の役割）、識別を提供するスーパータイプのいずれかです。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDto {
    pub name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub independent: bool,

    /// 識別に使う値型名（"Entity has Value" ファクトを生成）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identified_by: Option<String>,

    /// 優先識別子となる役割の組
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<RoleRefDto>,

    /// 客体化するファクト型のID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectifies: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<SupertypeDto>,
}

/// スーパータイプDTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupertypeDto {
    pub name: String,

    #[serde(default)]
    pub assimilation: Assimilation,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub provides_identification: bool,
}

/// ファクト型DTO
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactTypeDto {
    /// 他の定義から参照するためのID
    pub id: String,

    /// 既定の読み（`{0}`, `{1}` ... が役割の担い手を指す）
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reading: String,

    pub roles: Vec<RoleDto>,

    /// 複数役割にまたがる一意性制約（役割の序数の組）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uniqueness: Vec<Vec<usize>>,
}

/// 役割DTO
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDto {
    /// 役割の担い手（概念名）
    pub player: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// この役割だけの一意性制約
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub mandatory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_adjective: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_adjective: Option<String>,

    /// 役割に対する値制約
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// 役割参照DTO（ファクト型IDと役割の序数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRefDto {
    pub fact_type: String,
    pub role: usize,
}

/// 外部一意性制約DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub roles: Vec<RoleRefDto>,
}
