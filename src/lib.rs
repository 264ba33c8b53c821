// factmapライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン型（概念モデル、リレーショナルモデル、エラー、設定）
// - services: マッピング処理（役割分類、参照構築、テーブル決定、列導出、依存順序付け）と入出力

pub mod cli;
pub mod core;
pub mod services;
