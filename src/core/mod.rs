// Core Domain
// 概念モデル、リレーショナルモデル、エラー型、設定といった純粋なドメイン型

pub mod conceptual;
pub mod config;
pub mod error;
pub mod naming;
pub mod relational;
