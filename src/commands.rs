//! Command handlers for agent-kdb CLI.

use std::io::{BufRead, Write};
use std::process::ExitCode;

use agent_kdb::{
    Agent, AgentReply, Config, Error, ProcessAgent, RetrievalMemory, TurnOptions, augment_prompt,
    is_exit_command, run_turn,
};
use tracing::warn;

use crate::output::*;

const BANNER_WIDTH: usize = 100;

/// Commands supported by agent-kdb CLI.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a question/answer exchange
    Record {
        /// The question that was asked
        query: String,

        /// The answer to remember
        response: String,

        /// Origin tag stored with the exchange (default: from config)
        #[arg(short = 's', long)]
        source: Option<String>,
    },
    /// Show past answers nearest to a query
    Retrieve {
        query: String,

        /// Maximum number of results (default: 3)
        #[arg(short = 'k', long, default_value_t = agent_kdb::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Print the prompt an agent would receive for a query
    Context {
        query: String,

        /// Fragments to fold in (default: from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    Get {
        /// Fragment ID
        id: String,
    },
    List {
        /// Maximum number of results (default: 10)
        #[arg(short = 'l', long, default_value = "10")]
        limit: usize,
    },
    Delete {
        /// Fragment ID
        id: String,
    },
    /// Number of fragments in the collection
    Count,
    /// Interactive session against an external agent command
    Chat {
        /// Program that reads a prompt on stdin and answers on stdout
        #[arg(long)]
        agent_cmd: String,

        /// Arguments passed to the agent program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    Version,
}

/// Execute a CLI command.
pub fn execute(
    command: &Commands,
    memory: &mut RetrievalMemory,
    config: &Config,
    json: bool,
) -> Result<ExitCode, Error> {
    match command {
        Commands::Record {
            query,
            response,
            source,
        } => handle_record(
            memory,
            query,
            response,
            source.as_deref().unwrap_or(&config.source),
            json,
        ),
        Commands::Retrieve { query, top_k } => handle_retrieve(memory, query, *top_k, json),
        Commands::Context { query, top_k } => {
            handle_context(memory, query, top_k.unwrap_or(config.top_k), json)
        }
        Commands::Get { id } => handle_get(memory, id, json),
        Commands::List { limit } => handle_list(memory, *limit, json),
        Commands::Delete { id } => handle_delete(memory, id, json),
        Commands::Count => handle_count(memory, json),
        Commands::Chat {
            agent_cmd,
            agent_args,
        } => {
            let mut agent = ProcessAgent::new(agent_cmd.clone(), agent_args.clone());
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            chat_loop(
                memory,
                &mut agent,
                &config.turn_options(),
                stdin.lock(),
                stdout.lock(),
                json,
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => handle_version(json),
    }
}

fn handle_record(
    memory: &mut RetrievalMemory,
    query: &str,
    response: &str,
    source: &str,
    json: bool,
) -> Result<ExitCode, Error> {
    let id = memory.record(query, response, source)?;
    if json {
        print_json(&RecordResponse {
            status: "recorded".to_string(),
            id,
        });
    } else {
        println!("Recorded fragment: {}", id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_retrieve(
    memory: &mut RetrievalMemory,
    query: &str,
    top_k: usize,
    json: bool,
) -> Result<ExitCode, Error> {
    let results = memory.retrieve(query, top_k)?;
    if json {
        print_json(&RetrieveResponse {
            results: results.into_iter().map(RetrieveItem::from).collect(),
        });
    } else {
        for result in results {
            println!(
                "{} [distance: {:.4}] (source: {})\n  Q: {}\n  {}\n",
                result.id,
                result.distance,
                result.source().unwrap_or("-"),
                result.query().unwrap_or("-"),
                result.text
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_context(
    memory: &mut RetrievalMemory,
    query: &str,
    top_k: usize,
    json: bool,
) -> Result<ExitCode, Error> {
    let results = memory.retrieve(query, top_k)?;
    let prompt = augment_prompt(query, &results);
    if json {
        print_json(&ContextResponse {
            prompt,
            context_used: results.len(),
        });
    } else {
        println!("{}", prompt);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_get(memory: &RetrievalMemory, id: &str, json: bool) -> Result<ExitCode, Error> {
    let fragment = memory
        .get(id)?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    if json {
        print_json(&GetResponse::from(fragment));
    } else {
        println!("ID: {}", fragment.id);
        println!("Text: {}", fragment.text);
        for (key, value) in &fragment.metadata {
            println!("{}: {}", key, value);
        }
        println!("Created: {}", fragment.created_at);
        println!("Updated: {}", fragment.updated_at);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_list(memory: &RetrievalMemory, limit: usize, json: bool) -> Result<ExitCode, Error> {
    let fragments = memory.index().list(limit)?;
    if json {
        let items: Vec<ListItem> = fragments
            .into_iter()
            .map(|f| ListItem {
                id: f.id,
                text: f.text,
                created_at: f.created_at,
            })
            .collect();
        print_json(&ListResponse { fragments: items });
    } else {
        for fragment in fragments {
            println!("{}: {}", fragment.id, fragment.text);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_delete(memory: &RetrievalMemory, id: &str, json: bool) -> Result<ExitCode, Error> {
    if !memory.index().delete(id)? {
        return Err(Error::NotFound(id.to_string()));
    }
    if json {
        print_json(&DeleteResponse {
            status: "deleted".to_string(),
            id: id.to_string(),
        });
    } else {
        println!("Deleted fragment: {}", id);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_count(memory: &RetrievalMemory, json: bool) -> Result<ExitCode, Error> {
    let count = memory.index().count()?;
    if json {
        print_json(&CountResponse {
            collection: memory.index().collection().name.clone(),
            count,
        });
    } else {
        println!("{}", count);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_version(json: bool) -> Result<ExitCode, Error> {
    if json {
        print_json(&serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "name": env!("CARGO_PKG_NAME")
        }));
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }
    Ok(ExitCode::SUCCESS)
}

/// Read queries line by line until EOF or an exit word, running one turn each.
///
/// Blank lines are skipped. A failed turn is reported and the loop keeps
/// going; only I/O errors on `input`/`out` end the session early.
fn chat_loop<A, R, W>(
    memory: &mut RetrievalMemory,
    agent: &mut A,
    options: &TurnOptions,
    mut input: R,
    mut out: W,
    json: bool,
) -> Result<(), Error>
where
    A: Agent + ?Sized,
    R: BufRead,
    W: Write,
{
    let rule = "=".repeat(BANNER_WIDTH);
    let mut line = String::new();

    loop {
        if !json {
            write!(out, "\nEnter your query [or type 'exit']: ")?;
            out.flush()?;
        }

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            if !json {
                writeln!(out, "\nGoodbye!\n")?;
            }
            break;
        }

        let outcome = match run_turn(memory, agent, query, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "turn failed");
                if json {
                    let body = ErrorResponse {
                        error: e.to_string(),
                    };
                    writeln!(out, "{}", serde_json::to_string(&body)?)?;
                } else {
                    writeln!(out, "\nError: {}", e)?;
                }
                continue;
            }
        };

        let reply = match outcome.reply {
            AgentReply::Text(text) => Some(text),
            AgentReply::NonText { .. } => None,
        };

        if json {
            let turn = TurnResponse {
                reply,
                context_used: outcome.context_used,
                recorded_id: outcome.recorded_id,
            };
            writeln!(out, "{}", serde_json::to_string(&turn)?)?;
        } else {
            writeln!(out, "\n{rule}")?;
            writeln!(out, "{:^width$}", ">>> Agent's Response <<<", width = BANNER_WIDTH)?;
            writeln!(out, "{rule}")?;
            if let Some(text) = reply {
                writeln!(out, "{}", text)?;
            }
            writeln!(out, "\n{rule}")?;
        }
    }

    Ok(())
}
