//! One retrieve → respond → record turn against an external agent.
//!
//! The agent runtime itself (model client, tool invocation) lives outside
//! this crate behind the [`Agent`] trait.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::errors::Error;
use crate::memory::{RetrievalMemory, augment_prompt};

/// Context fragments folded into each turn's prompt by default.
pub const DEFAULT_TURN_TOP_K: usize = 2;

/// Source tag recorded when none is configured.
pub const DEFAULT_SOURCE: &str = "Claude+MCP";

/// Reply produced by an agent for one prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// Plain text; recorded into memory.
    Text(String),
    /// Anything not representable as plain text (structured output, tool
    /// results, images). Not recorded.
    NonText { kind: String },
}

/// The conversational agent collaborator.
pub trait Agent {
    /// Produce a reply to `prompt`.
    fn respond(&mut self, prompt: &str) -> Result<AgentReply, Error>;
}

impl<F> Agent for F
where
    F: FnMut(&str) -> Result<AgentReply, Error>,
{
    fn respond(&mut self, prompt: &str) -> Result<AgentReply, Error> {
        self(prompt)
    }
}

/// Per-turn settings.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    pub top_k: usize,
    pub source: String,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TURN_TOP_K,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// What happened during one turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Prompt actually sent to the agent.
    pub prompt: String,
    /// Number of fragments folded into the prompt.
    pub context_used: usize,
    pub reply: AgentReply,
    /// Fragment id, when the reply was text and recording succeeded.
    pub recorded_id: Option<String>,
    /// Recording failure, logged and otherwise ignored.
    pub record_error: Option<Error>,
}

/// Run one turn: retrieve context, prompt the agent, record a text reply.
///
/// Retrieval and agent errors propagate. A failed `record` does not: it is
/// logged and returned in [`TurnOutcome::record_error`] so the caller's loop
/// can move on to the next query.
pub fn run_turn<A: Agent + ?Sized>(
    memory: &mut RetrievalMemory,
    agent: &mut A,
    query: &str,
    options: &TurnOptions,
) -> Result<TurnOutcome, Error> {
    let context = memory.retrieve(query, options.top_k)?;
    let prompt = augment_prompt(query, &context);
    debug!(context = context.len(), prompt_bytes = prompt.len(), "prompting agent");

    let reply = agent.respond(&prompt)?;

    let (recorded_id, record_error) = match &reply {
        AgentReply::Text(response) => match memory.record(query, response, &options.source) {
            Ok(id) => (Some(id), None),
            Err(e) => {
                warn!(error = %e, "failed to record exchange; continuing");
                (None, Some(e))
            }
        },
        AgentReply::NonText { kind } => {
            info!(kind = %kind, "agent reply is not plain text; not recorded");
            (None, None)
        }
    };

    Ok(TurnOutcome {
        prompt,
        context_used: context.len(),
        reply,
        recorded_id,
        record_error,
    })
}

/// Whether a line typed at the prompt ends the session.
pub fn is_exit_command(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "exit" | "quit" | "q"
    )
}

/// An [`Agent`] backed by an external command.
///
/// Each prompt is written to the command's stdin; its stdout (trimmed) is the
/// text reply. A non-zero exit status or non-UTF-8 output is an error. A
/// command that succeeds without reading its whole stdin still counts as a
/// reply.
#[derive(Debug, Clone)]
pub struct ProcessAgent {
    program: String,
    args: Vec<String>,
}

impl ProcessAgent {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Agent for ProcessAgent {
    fn respond(&mut self, prompt: &str) -> Result<AgentReply, Error> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Agent(format!("failed to start '{}': {e}", self.program)))?;

        // Feed stdin from another thread so a large prompt cannot deadlock
        // against a child blocked on a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Agent("child stdin unavailable".to_string()))?;
        let prompt_bytes = prompt.as_bytes().to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&prompt_bytes));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| Error::Agent("stdin writer thread panicked".to_string()))?;

        if !output.status.success() {
            return Err(Error::Agent(format!(
                "'{}' exited with {}",
                self.program, output.status
            )));
        }
        match written {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!(
                    program = %self.program,
                    "agent exited before reading the whole prompt"
                );
            }
            result => result?,
        }

        let text = String::from_utf8(output.stdout).map_err(|_| {
            Error::Agent(format!("'{}' produced non-UTF-8 output", self.program))
        })?;
        Ok(AgentReply::Text(text.trim().to_string()))
    }
}
