//! Operator merge loop: read `old` / `new` name pairs, apply each merge and
//! persist it before asking for the next one.
//!
//! An empty answer at either prompt ends the session. A pair that cannot be
//! merged (unknown name, self-merge) is reported with suggestions and the
//! session continues; I/O failures end it.

use anyhow::Result;
use colored::Colorize;
use conceptgraph_core::{suggest_merge_targets, Graph, GraphError, SuggestOptions};
use conceptgraph_storage::{merge_and_persist, MergeLog};
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub merged: usize,
    pub rejected: usize,
}

pub struct MergeSession<'a> {
    pub graph: &'a mut Graph,
    pub graph_path: &'a Path,
    pub log: &'a MergeLog,
    pub suggest: SuggestOptions,
}

impl MergeSession<'_> {
    /// Apply one merge and report the outcome to `out`.
    ///
    /// Returns `Ok(false)` when the pair was rejected by the graph.
    pub fn apply<W: Write>(&mut self, old_name: &str, new_name: &str, out: &mut W) -> Result<bool> {
        match merge_and_persist(self.graph, old_name, new_name, self.graph_path, self.log) {
            Ok(outcome) => {
                writeln!(
                    out,
                    "{} {} {} {}",
                    "merged".green().bold(),
                    old_name,
                    "→".cyan(),
                    new_name
                )?;
                writeln!(
                    out,
                    "  nodes: {}  edges: {}  repointed: {}  duplicates dropped: {}",
                    outcome.node_count,
                    outcome.edge_count,
                    outcome.edges_repointed,
                    outcome.duplicate_edges_removed
                )?;
                Ok(true)
            }
            Err(err) => match err.downcast_ref::<GraphError>() {
                Some(graph_err) => {
                    writeln!(out, "{} {}", "error:".red().bold(), graph_err)?;
                    if let GraphError::NotFound { name } = graph_err {
                        self.print_suggestions(name, out)?;
                    }
                    Ok(false)
                }
                None => Err(err),
            },
        }
    }

    fn print_suggestions<W: Write>(&self, name: &str, out: &mut W) -> Result<()> {
        let suggestions = suggest_merge_targets(&*self.graph, name, &self.suggest);
        if suggestions.is_empty() {
            return Ok(());
        }
        writeln!(out, "  did you mean:")?;
        for s in suggestions {
            writeln!(out, "    {} ({:.2})", s.name.yellow(), s.score)?;
        }
        Ok(())
    }

    /// Prompt for pairs on `input` until an empty answer or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        loop {
            let Some(old_name) = prompt(input, out, "Old node name (empty to finish): ")? else {
                break;
            };
            let Some(new_name) = prompt(input, out, "Merge into: ")? else {
                break;
            };
            if self.apply(&old_name, &new_name, out)? {
                summary.merged += 1;
            } else {
                summary.rejected += 1;
            }
        }
        writeln!(
            out,
            "{} {} merged, {} rejected",
            "session finished:".cyan(),
            summary.merged,
            summary.rejected
        )?;
        Ok(summary)
    }
}

/// `None` on end of input or an empty (whitespace-only) answer.
///
/// Node names are matched exactly, so only the line terminator is stripped.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim_end_matches(['\n', '\r']);
    if answer.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}
