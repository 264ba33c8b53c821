// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、MappingError, ValidationError, IoError を定義します。

use thiserror::Error;

/// マッピングエラー
///
/// 概念モデルからリレーショナルモデルへの変換中に発生する致命的なエラーです。
/// 発生した時点で変換全体を中断し、部分的なモデルは返しません。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// Model inconsistency (the conceptual model cannot be mapped as given)
    #[error("Model inconsistency: {message}{}", format_element_opt(.element))]
    ModelInconsistency {
        /// エラーメッセージ
        message: String,
        /// 問題のあるモデル要素（概念名、ファクト型など）
        element: Option<String>,
    },

    /// Mapping failure (a reference chain has no matching column)
    #[error("Mapping failure at reference '{reference}' (fact type '{fact_type}'): {message}")]
    MappingFailure {
        /// 参照の説明（"Order -> Customer" 形式）
        reference: String,
        /// 参照の由来となったファクト型
        fact_type: String,
        /// エラーメッセージ
        message: String,
    },

    /// Table decisions did not converge
    #[error("Table decisions did not converge after {passes} passes ({undecided} concept(s) undecided)")]
    NonConvergence {
        /// 実行したパス数
        passes: usize,
        /// 未決定のまま残った概念数
        undecided: usize,
    },
}

impl MappingError {
    /// 要素名付きのモデル不整合エラーを作成
    pub fn inconsistency(message: impl Into<String>, element: impl Into<String>) -> Self {
        MappingError::ModelInconsistency {
            message: message.into(),
            element: Some(element.into()),
        }
    }

    /// モデル不整合エラーかどうか
    pub fn is_model_inconsistency(&self) -> bool {
        matches!(self, MappingError::ModelInconsistency { .. })
    }

    /// マッピング失敗エラーかどうか
    pub fn is_mapping_failure(&self) -> bool {
        matches!(self, MappingError::MappingFailure { .. })
    }

    /// 収束失敗エラーかどうか
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, MappingError::NonConvergence { .. })
    }
}

fn format_element_opt(element: &Option<String>) -> String {
    element
        .as_ref()
        .map_or(String::new(), |e| format!(" (element: {})", e))
}

/// バリデーションエラー
///
/// 語彙（概念モデル）の事前検証で発生するエラーを表現します。
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// Reference error (unknown or dangling model element)
    #[error("Reference error: {message}{}", format_location_opt(.location))]
    Reference {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },

    /// Constraint error (malformed constraint or identification)
    #[error("Constraint error: {message}{}", format_location_opt(.location))]
    Constraint {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },

    /// Structure error (malformed fact type, cycles, duplicates)
    #[error("Structure error: {message}{}", format_location_opt(.location))]
    Structure {
        /// エラーメッセージ
        message: String,
        /// エラー発生位置
        location: Option<ErrorLocation>,
        /// 修正提案
        suggestion: Option<String>,
    },
}

impl ValidationError {
    /// 参照エラーかどうか
    pub fn is_reference(&self) -> bool {
        matches!(self, ValidationError::Reference { .. })
    }

    /// 制約エラーかどうか
    pub fn is_constraint(&self) -> bool {
        matches!(self, ValidationError::Constraint { .. })
    }

    /// 構造エラーかどうか
    pub fn is_structure(&self) -> bool {
        matches!(self, ValidationError::Structure { .. })
    }

    /// エラー発生位置を取得
    pub fn location(&self) -> Option<&ErrorLocation> {
        match self {
            ValidationError::Reference { location, .. }
            | ValidationError::Constraint { location, .. }
            | ValidationError::Structure { location, .. } => location.as_ref(),
        }
    }

    /// 修正提案を取得
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ValidationError::Reference { suggestion, .. }
            | ValidationError::Constraint { suggestion, .. }
            | ValidationError::Structure { suggestion, .. } => suggestion.as_deref(),
        }
    }
}

/// バリデーション警告
///
/// エラーではないが、利用者に注意を促すべき事項を表します。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// 警告メッセージ
    pub message: String,
    /// 警告発生位置
    pub location: Option<ErrorLocation>,
    /// 警告の種類
    pub kind: WarningKind,
}

/// 警告の種類
#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// 列にマッピングされないファクト型（結合表候補）
    Unmapped,
    /// 名前の導出に使う読みが欠けている
    MissingReading,
    /// 吸収先が曖昧で既定の判断に頼る可能性
    Ambiguous,
}

impl ValidationWarning {
    /// 新しい警告を作成
    pub fn new(message: String, location: Option<ErrorLocation>, kind: WarningKind) -> Self {
        Self {
            message,
            location,
            kind,
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let location_str = self
            .location
            .as_ref()
            .map_or(String::new(), |loc| loc.format());
        format!("Warning: {}{}", self.message, location_str)
    }
}

/// エラー発生位置
///
/// 語彙内のエラー発生位置（概念、ファクト型、役割）を表現します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLocation {
    /// 概念名
    pub concept: Option<String>,
    /// ファクト型（読み、または識別用の名前）
    pub fact_type: Option<String>,
    /// 役割の序数
    pub role: Option<usize>,
}

impl ErrorLocation {
    /// 新しいエラー位置を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 概念名を指定してエラー位置を作成
    pub fn with_concept(concept: impl Into<String>) -> Self {
        Self {
            concept: Some(concept.into()),
            ..Self::default()
        }
    }

    /// ファクト型を指定してエラー位置を作成
    pub fn with_fact_type(fact_type: impl Into<String>) -> Self {
        Self {
            fact_type: Some(fact_type.into()),
            ..Self::default()
        }
    }

    /// 位置情報をフォーマット
    pub fn format(&self) -> String {
        let mut parts = Vec::new();

        if let Some(concept) = &self.concept {
            parts.push(format!("concept: {}", concept));
        }
        if let Some(fact_type) = &self.fact_type {
            parts.push(format!("fact type: {}", fact_type));
        }
        if let Some(role) = self.role {
            parts.push(format!("role: {}", role));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        }
    }
}

/// 位置情報をフォーマットするヘルパー関数
fn format_location_opt(location: &Option<ErrorLocation>) -> String {
    location.as_ref().map_or(String::new(), |loc| loc.format())
}

/// バリデーション結果
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// エラーのリスト
    pub errors: Vec<ValidationError>,
    /// 警告のリスト
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// 新しいバリデーション結果を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 警告を追加
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 検証が成功したかどうか（エラーがない場合は成功）
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// エラーの数を取得
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告の数を取得
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 他のバリデーション結果をマージ
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// 複数のバリデーション結果をまとめてマージ
    pub fn merge_all(&mut self, others: impl IntoIterator<Item = ValidationResult>) {
        for other in others {
            self.merge(other);
        }
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }
}
