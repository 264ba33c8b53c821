// 語彙の入出力
//
// YAMLで書かれた語彙を読み込み、内部モデルに変換します。

pub mod dto;
pub mod dto_converter;
pub mod vocabulary_parser;
