// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Factmap - Fact-based conceptual schema to relational mapper
#[derive(Parser, Debug)]
#[command(name = "factmap")]
#[command(author = "Factmap Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Map fact-based conceptual schemas to relational tables")]
#[command(long_about = "Factmap - Fact-based conceptual schema to relational mapper

Reads a vocabulary of value types, entity types and fact types, decides
which concepts become tables and which are absorbed into other tables,
and derives the resulting columns, indexes and foreign keys.")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Describe your vocabulary:      Write value_types, entity_types and fact_types in YAML
  2. Check it:                      factmap validate vocabulary.yaml
  3. Map it to tables:              factmap map vocabulary.yaml
  4. See the creation order:        factmap order vocabulary.yaml

For detailed help on each command, use: factmap <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map a vocabulary to relational tables
    ///
    /// Validates the vocabulary, decides the table partition and prints every
    /// table with its columns, indexes and foreign keys.
    ///
    /// EXAMPLES:
    ///   # Map with the configured joiner
    ///   factmap map vocabulary.yaml
    ///
    ///   # Snake-case-ish column names
    ///   factmap map vocabulary.yaml --joiner _
    ///
    ///   # Machine-readable output
    ///   factmap map vocabulary.yaml --format json
    Map {
        /// Vocabulary file (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Separator for composed column and index names
        #[arg(short, long, value_name = "JOINER")]
        joiner: Option<String>,
    },

    /// Validate a vocabulary without mapping it
    ///
    /// EXAMPLES:
    ///   factmap validate vocabulary.yaml
    Validate {
        /// Vocabulary file (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the emission order of tables or concepts
    ///
    /// Dependencies are emitted before their dependents. Cycles are broken
    /// by forcing one concept out; forced steps are marked.
    ///
    /// EXAMPLES:
    ///   # Table creation order
    ///   factmap order vocabulary.yaml
    ///
    ///   # Concept declaration order
    ///   factmap order vocabulary.yaml --concepts
    Order {
        /// Vocabulary file (YAML)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Order all concepts instead of tables
        #[arg(long)]
        concepts: bool,
    },
}
