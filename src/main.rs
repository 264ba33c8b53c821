use anyhow::Result;
use clap::Parser;
use factmap::cli::commands::map::{MapCommand, MapCommandHandler};
use factmap::cli::commands::order::{OrderCommand, OrderCommandHandler};
use factmap::cli::commands::validate::{ValidateCommand, ValidateCommandHandler};
use factmap::cli::{Cli, Commands};
use factmap::core::naming::{APP_NAME, LOG_ENV};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run_command(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する
///
/// `FACTMAP_LOG`（なければ `RUST_LOG`）のフィルタを優先し、未指定なら
/// `--verbose` で debug、通常は warn を出力します。
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", APP_NAME, default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// コマンドを実行する
fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    match cli.command {
        Commands::Map { file, joiner } => {
            let handler = MapCommandHandler::new();
            let command = MapCommand {
                project_path,
                config_path: cli.config,
                file,
                joiner,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Validate { file } => {
            let handler = ValidateCommandHandler::new();
            let command = ValidateCommand {
                project_path,
                config_path: cli.config,
                file,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Order { file, concepts } => {
            let handler = OrderCommandHandler::new();
            let command = OrderCommand {
                project_path,
                config_path: cli.config,
                file,
                concepts,
                format: cli.format,
            };
            handler.execute(&command)
        }
    }
}
