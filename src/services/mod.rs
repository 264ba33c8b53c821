// Services Layer
// ドメインロジックを実行するサービス層

pub mod column_deriver;
pub mod composition;
pub mod config_loader;
pub mod dependency_orderer;
pub mod index_deriver;
pub mod reference_builder;
pub mod role_classifier;
pub mod table_decision;
pub mod vocabulary_io;
pub mod vocabulary_validator;
