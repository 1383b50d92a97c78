mod commands;
mod output;
mod tracing_init;

use std::process::ExitCode;

use agent_kdb::{Config, Error, ErrorKind, RetrievalMemory};
use clap::Parser;
use commands::Commands;
use output::{ErrorResponse, print_json};
use tracing::debug;

/// Exit code for a missing fragment.
const EXIT_NOT_FOUND: u8 = 3;

/// agent-kdb - retrieval-augmented knowledge store for LLM agents
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Collection to operate on (overrides config)
    #[arg(short, long, global = true)]
    collection: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_init::init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => report_error(&e, cli.json),
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    if let Commands::Version = cli.command {
        return commands::handle_version(cli.json);
    }

    let mut config = Config::load()?;
    if let Some(collection) = &cli.collection {
        config.collection = collection.clone();
        config.validate()?;
    }
    config.ensure_directories()?;
    debug!(
        store = %config.store_path.display(),
        collection = %config.collection,
        embedder = %config.embedder,
        "configuration loaded"
    );

    let embedder = config.build_embedder()?;
    let mut memory = RetrievalMemory::open(&config.store_path, embedder, config.index_options())?;

    let code = commands::execute(&cli.command, &mut memory, &config, cli.json)?;
    memory.close()?;
    Ok(code)
}

fn exit_status_for(error: &Error) -> u8 {
    match error.kind() {
        ErrorKind::NotFound => EXIT_NOT_FOUND,
        _ => 1,
    }
}

fn report_error(error: &Error, json: bool) -> ExitCode {
    if json {
        print_json(&ErrorResponse {
            error: error.to_string(),
        });
    } else {
        eprintln!("Error: {}", error);
    }
    ExitCode::from(exit_status_for(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["agent-kdb", "--verbose", "count"]);
        assert!(cli.verbose);
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Count));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "agent-kdb",
            "retrieve",
            "how much does EC2 cost?",
            "--json",
            "--collection",
            "aws",
            "-k",
            "5",
        ]);
        assert!(cli.json);
        assert_eq!(cli.collection.as_deref(), Some("aws"));
        match cli.command {
            Commands::Retrieve { query, top_k } => {
                assert_eq!(query, "how much does EC2 cost?");
                assert_eq!(top_k, 5);
            }
            _ => panic!("expected retrieve"),
        }
    }

    #[test]
    fn test_retrieve_default_top_k() {
        let cli = Cli::parse_from(["agent-kdb", "retrieve", "s3"]);
        assert!(matches!(cli.command, Commands::Retrieve { top_k: 3, .. }));
    }

    #[test]
    fn test_record_parsing() {
        let cli = Cli::parse_from([
            "agent-kdb",
            "record",
            "what is S3?",
            "S3 is object storage",
            "--source",
            "manual",
        ]);
        match cli.command {
            Commands::Record {
                query,
                response,
                source,
            } => {
                assert_eq!(query, "what is S3?");
                assert_eq!(response, "S3 is object storage");
                assert_eq!(source.as_deref(), Some("manual"));
            }
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_chat_passes_agent_args() {
        let cli = Cli::parse_from([
            "agent-kdb",
            "chat",
            "--agent-cmd",
            "claude",
            "--",
            "-p",
            "--model",
            "sonnet",
        ]);
        match cli.command {
            Commands::Chat {
                agent_cmd,
                agent_args,
            } => {
                assert_eq!(agent_cmd, "claude");
                assert_eq!(agent_args, vec!["-p", "--model", "sonnet"]);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["agent-kdb"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_status_for(&Error::NotFound("abc".to_string())), 3);
        assert_eq!(exit_status_for(&Error::Config("bad".to_string())), 1);
        assert_eq!(
            exit_status_for(&Error::IdentifierCollision("abc".to_string())),
            1
        );
    }
}
