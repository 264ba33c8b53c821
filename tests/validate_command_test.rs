// validateコマンドハンドラーのテスト

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use factmap::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use factmap::cli::OutputFormat;
use tempfile::TempDir;

const VALID_VOCABULARY: &str = r#"
name: Staff
value_types:
  - name: EmployeeNr
  - name: Name
entity_types:
  - name: Employee
    identified_by: EmployeeNr
fact_types:
  - id: employee_name
    reading: "{0} has {1}"
    roles:
      - player: Employee
        unique: true
        mandatory: true
      - player: Name
"#;

const UNIDENTIFIED_VOCABULARY: &str = r#"
name: Broken
value_types:
  - name: Name
entity_types:
  - name: Ghost
fact_types:
  - id: ghost_name
    reading: "{0} has {1}"
    roles:
      - player: Ghost
        unique: true
      - player: Name
"#;

/// テスト用のプロジェクトディレクトリを作成
fn setup_test_project() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let project_path = temp_dir.path().to_path_buf();
    fs::write(project_path.join("staff.yaml"), VALID_VOCABULARY)?;
    fs::write(project_path.join("broken.yaml"), UNIDENTIFIED_VOCABULARY)?;
    Ok((temp_dir, project_path))
}

fn command(project_path: PathBuf, file: &str, format: OutputFormat) -> ValidateCommand {
    ValidateCommand {
        project_path,
        config_path: None,
        file: PathBuf::from(file),
        format,
    }
}

#[test]
fn test_new_handler() {
    let handler = ValidateCommandHandler::new();
    assert!(format!("{:?}", handler).contains("ValidateCommandHandler"));
}

#[test]
fn test_validate_valid_vocabulary() {
    let (_temp_dir, project_path) = setup_test_project().unwrap();

    let handler = ValidateCommandHandler::new();
    let result = handler.execute(&command(project_path, "staff.yaml", OutputFormat::Text));
    assert!(result.is_ok(), "Validation failed: {:?}", result);

    let summary = result.unwrap();
    assert!(summary.contains("Validation complete"));
    assert!(summary.contains("Entity types: 1"));
    assert!(summary.contains("No errors found"));
}

#[test]
fn test_validate_unidentified_entity() {
    let (_temp_dir, project_path) = setup_test_project().unwrap();

    let handler = ValidateCommandHandler::new();
    let result = handler.execute(&command(project_path, "broken.yaml", OutputFormat::Text));
    assert!(result.is_err());

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Entity type 'Ghost' has no preferred identifier"));
    assert!(message.contains("Vocabulary validation failed with 1 error(s)"));
}

#[test]
fn test_validate_json_output() {
    let (_temp_dir, project_path) = setup_test_project().unwrap();

    let handler = ValidateCommandHandler::new();
    let output = handler
        .execute(&command(project_path, "staff.yaml", OutputFormat::Json))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["is_valid"], true);
    assert_eq!(value["vocabulary"], "Staff");
    assert_eq!(value["statistics"]["fact_types"], 2);
}

#[test]
fn test_validate_missing_file() {
    let (_temp_dir, project_path) = setup_test_project().unwrap();

    let handler = ValidateCommandHandler::new();
    let result = handler.execute(&command(project_path, "missing.yaml", OutputFormat::Text));
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("File not found"));
}

#[test]
fn test_validate_with_missing_custom_config() {
    let (_temp_dir, project_path) = setup_test_project().unwrap();

    let handler = ValidateCommandHandler::new();
    let mut command = command(project_path, "staff.yaml", OutputFormat::Text);
    command.config_path = Some(PathBuf::from("custom.yaml"));
    assert!(handler.execute(&command).is_err());
}
