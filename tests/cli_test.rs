/// CLI エントリーポイントのテスト
///
/// このテストは、CLIの構造が正しく定義され、すべてのサブコマンドとオプションが
/// 期待通りに動作することを確認します。
use clap::Parser;

#[cfg(test)]
mod cli_tests {
    use super::*;
    use factmap::cli::{Cli, Commands, OutputFormat};
    use std::path::PathBuf;

    /// ヘルプとバージョンの表示はエラーとして返ることを確認
    #[test]
    fn test_cli_can_parse() {
        let result = Cli::try_parse_from(["factmap", "--help"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["factmap", "--version"]);
        assert!(result.is_err());
    }

    /// mapサブコマンドがパース可能であることを確認
    #[test]
    fn test_map_command_parses() {
        let cli = Cli::try_parse_from(["factmap", "map", "vocabulary.yaml"]).unwrap();
        match cli.command {
            Commands::Map { file, joiner } => {
                assert_eq!(file, PathBuf::from("vocabulary.yaml"));
                assert!(joiner.is_none());
            }
            _ => panic!("Expected Map command"),
        }
    }

    /// mapサブコマンドの短縮オプションを確認
    #[test]
    fn test_map_command_with_short_joiner() {
        let cli = Cli::try_parse_from(["factmap", "map", "v.yaml", "-j", "_"]).unwrap();
        match cli.command {
            Commands::Map { joiner, .. } => assert_eq!(joiner.as_deref(), Some("_")),
            _ => panic!("Expected Map command"),
        }
    }

    /// validateサブコマンドがパース可能であることを確認
    #[test]
    fn test_validate_command_parses() {
        let cli = Cli::try_parse_from(["factmap", "validate", "v.yaml"]).unwrap();
        match cli.command {
            Commands::Validate { file } => assert_eq!(file, PathBuf::from("v.yaml")),
            _ => panic!("Expected Validate command"),
        }
    }

    /// orderサブコマンドがパース可能であることを確認
    #[test]
    fn test_order_command_parses() {
        let cli = Cli::try_parse_from(["factmap", "order", "v.yaml"]).unwrap();
        match cli.command {
            Commands::Order { concepts, .. } => assert!(!concepts),
            _ => panic!("Expected Order command"),
        }

        let cli = Cli::try_parse_from(["factmap", "order", "v.yaml", "--concepts"]).unwrap();
        assert!(matches!(cli.command, Commands::Order { concepts: true, .. }));
    }

    /// グローバルオプションがサブコマンドの前でも使えることを確認
    #[test]
    fn test_global_options_before_subcommand() {
        let cli = Cli::try_parse_from([
            "factmap",
            "--config",
            "custom.yaml",
            "--format",
            "json",
            "-v",
            "validate",
            "v.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(!cli.no_color);
    }

    /// 不明なサブコマンドや出力形式はエラーになることを確認
    #[test]
    fn test_invalid_arguments() {
        assert!(Cli::try_parse_from(["factmap", "generate"]).is_err());
        assert!(Cli::try_parse_from(["factmap", "map", "v.yaml", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["factmap"]).is_err());
    }
}
