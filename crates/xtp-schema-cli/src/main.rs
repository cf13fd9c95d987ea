use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xtp_schema::{has_imports, load_context, read_document, validate_schema};
use xtp_schema_parser::Format;

#[derive(Parser)]
#[command(name = "xtp-schema")]
#[command(about = "Validate and normalize XTP schema documents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Input format (auto, json, yaml)
    #[arg(short, long, global = true, default_value_t = Format::Auto)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a schema and print `{valid, errors, warnings, schema}`
    Validate {
        /// Schema file (YAML or JSON)
        file: PathBuf,
    },

    /// Print `1` when the schema is valid and declares imports
    HasImports {
        /// Schema file (YAML or JSON)
        file: PathBuf,
    },

    /// Print the normalized IR
    Ir {
        /// Schema file (YAML or JSON)
        file: PathBuf,
    },

    /// Load an invocation context and print it with the schema normalized
    Context {
        /// Context file (JSON)
        #[arg(long, value_name = "FILE", conflicts_with = "ctx_json")]
        ctx: Option<PathBuf>,

        /// Context as inline JSON
        #[arg(long = "ctx-json", env = "XTP_CTX", hide_env_values = true)]
        ctx_json: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // stdout is reserved for JSON output
    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { file } => {
            let (text, format) = read_document(&file, cli.format)?;
            let result = validate_schema(&text, format);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(exit_code(result.valid))
        }
        Commands::HasImports { file } => {
            let (text, format) = read_document(&file, cli.format)?;
            if has_imports(&text, format) {
                println!("1");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ir { file } => {
            let (text, format) = read_document(&file, cli.format)?;
            let result = validate_schema(&text, format);
            match result.schema {
                Some(schema) => println!("{}", serde_json::to_string_pretty(&schema)?),
                None => println!("{}", serde_json::to_string_pretty(&result.errors)?),
            }
            Ok(exit_code(result.valid))
        }
        Commands::Context { ctx, ctx_json } => {
            let text = match (ctx, ctx_json) {
                (Some(path), _) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read context file {}", path.display()))?,
                (None, Some(inline)) => inline,
                (None, None) => {
                    debug!("No context supplied, using an empty one");
                    "{}".to_string()
                }
            };
            let context = load_context(&text)?;
            println!("{}", serde_json::to_string_pretty(&context)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(valid: bool) -> ExitCode {
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
