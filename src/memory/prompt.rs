//! Folding retrieved fragments into the outgoing prompt.

use crate::fragment::RetrievalResult;

/// Build the prompt sent to the agent.
///
/// With no results the prompt is `query` unchanged. Otherwise the fragments
/// are numbered from 1, separated by blank lines, and followed by the
/// original question:
///
/// ```text
/// Use the following context if relevant:
/// [1] <text>
///
/// [2] <text>
///
/// User Question: <query>
/// ```
pub fn augment_prompt(query: &str, results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return query.to_string();
    }

    let context = results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("[{}] {}", i + 1, result.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("Use the following context if relevant:\n{context}\n\nUser Question: {query}")
}
