/// 語彙ファイル読み込みのテスト
///
/// YAMLの語彙ファイルを読み込み、検証と変換まで通して動作することを確認します。

#[cfg(test)]
mod vocabulary_loader_tests {
    use factmap::core::config::MappingConfig;
    use factmap::core::error::{IoError, ValidationError};
    use factmap::services::composition::RelationalComposer;
    use factmap::services::vocabulary_io::vocabulary_parser::VocabularyParserService;
    use factmap::services::vocabulary_validator::VocabularyValidatorService;
    use std::fs;
    use tempfile::TempDir;

    const LIBRARY: &str = r#"
name: Library
value_types:
  - name: AutoCounter
  - name: BookId
    supertype: AutoCounter
  - name: Title
    length: 120
  - name: MemberNr
  - name: Format
    values: [Hardcover, Paperback]
entity_types:
  - name: Book
    identified_by: BookId
  - name: Member
    identified_by: MemberNr
fact_types:
  - id: book_title
    reading: "{0} has {1}"
    roles:
      - player: Book
        unique: true
        mandatory: true
      - player: Title
  - id: book_format
    reading: "{0} is published as {1}"
    roles:
      - player: Book
        unique: true
      - player: Format
  - id: borrowing
    reading: "{0} is borrowed by {1}"
    roles:
      - player: Book
        unique: true
      - player: Member
        name: Borrower
"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// 語彙ファイルを読み込んでテーブルまで変換できる
    #[test]
    fn test_load_validate_and_map() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "library.yaml", LIBRARY);

        let vocabulary = VocabularyParserService::new().parse_file(&path).unwrap();
        assert_eq!(vocabulary.name, "Library");
        assert_eq!(vocabulary.concepts.len(), 7);
        assert_eq!(vocabulary.fact_types.len(), 5);

        let result = VocabularyValidatorService::new().validate(&vocabulary);
        assert!(result.is_valid(), "{:?}", result.errors);

        let model = RelationalComposer::new(MappingConfig::default())
            .unwrap()
            .compose(&vocabulary)
            .unwrap();
        // 型宣言だけの AutoCounter は暫定テーブルとして残る
        assert_eq!(model.tables().len(), 2);
        let auto_counter = vocabulary.find_concept("AutoCounter").unwrap();
        assert!(model.is_tentative(auto_counter));
        let book = model.table("Book").unwrap();
        assert!(!model.is_tentative(book.concept));
        assert_eq!(
            book.column_names(""),
            vec!["BookId", "Title", "Format", "BorrowerMemberNr"]
        );
        assert!(book.columns[0].is_auto_assigned);
        assert!(book.columns[1].is_mandatory);
        assert_eq!(book.columns[1].data_type.length, Some(120));
        assert!(!book.columns[2].is_mandatory);
        assert_eq!(
            book.columns[2].data_type.value_restrictions,
            vec!["Hardcover", "Paperback"]
        );
    }

    /// name を省略するとファイル名が語彙名になる
    #[test]
    fn test_vocabulary_name_defaults_to_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "people.yaml",
            "value_types:\n  - name: Name\nentity_types:\n  - name: Person\n    identified_by: Name\n",
        );
        let vocabulary = VocabularyParserService::new().parse_file(&path).unwrap();
        assert_eq!(vocabulary.name, "people");
    }

    /// 存在しないファイルは FileNotFound になる
    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = VocabularyParserService::new()
            .parse_file(&dir.path().join("nothing.yaml"))
            .unwrap_err();
        let io = err.downcast_ref::<IoError>().unwrap();
        assert!(io.is_file_not_found());
    }

    /// 未知の役割の担い手は参照エラーになる
    #[test]
    fn test_unknown_player_is_reference_error() {
        let yaml = r#"
value_types:
  - name: Name
fact_types:
  - id: likes
    reading: "{0} likes {1}"
    roles:
      - player: Name
      - player: Ghost
"#;
        let err = VocabularyParserService::new().parse_str(yaml).unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert!(validation.is_reference());
        assert!(err.to_string().contains("Ghost"));
    }

    /// 同じ名前の概念は構造エラーになる
    #[test]
    fn test_duplicate_concept_is_structure_error() {
        let yaml = "value_types:\n  - name: Name\nentity_types:\n  - name: Name\n";
        let err = VocabularyParserService::new().parse_str(yaml).unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert!(validation.is_structure());
    }

    /// YAMLの構文エラーはファイル名を含む
    #[test]
    fn test_yaml_syntax_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.yaml", "entity_types:\n  - name: [\n");
        let err = VocabularyParserService::new().parse_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.yaml"));
    }
}
