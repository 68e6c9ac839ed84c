use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::dot;
use crate::error::Result;
use crate::graph::cycles::simple_cycles;
use crate::graph::DiGraph;
use crate::util::output;

#[derive(Parser, Debug)]
#[command(name = "dotcycles")]
#[command(about = "List every simple cycle in a DOT graph", long_about = None)]
pub struct Cli {
    /// Path to the graph description in DOT format.
    pub input: PathBuf,
    /// Print each cycle as a JSON array of node labels.
    #[arg(long)]
    pub json: bool,
    /// Print only the number of cycles.
    #[arg(long, conflicts_with = "json")]
    pub count: bool,
    #[arg(long)]
    pub no_color: bool,
}

/// Ingests the input file and streams every simple cycle to stdout.
///
/// The single exit boundary for the binary: any error propagates to `main`,
/// which maps it to a nonzero exit code. Nothing is written to stdout
/// unless ingestion succeeded.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.no_color {
        output::set_color(false);
    }
    let graph = dot::ingest_file(&cli.input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_cycles(cli, &graph, &mut out)
}

fn write_cycles(cli: &Cli, graph: &DiGraph, out: &mut impl Write) -> Result<()> {
    let cycles = simple_cycles(graph)?;
    if cli.count {
        writeln!(out, "{}", cycles.count())?;
        return Ok(());
    }
    for cycle in cycles {
        let labels: Vec<&str> = cycle.iter().map(|&node| graph.label(node)).collect();
        if cli.json {
            let line = serde_json::to_string(&labels).map_err(anyhow::Error::from)?;
            writeln!(out, "{line}")?;
        } else {
            writeln!(out, "{}", format_cycle(&labels))?;
        }
    }
    Ok(())
}

/// Renders a cycle as `a -> b -> c`, quoting labels that are not plain
/// identifiers so the sequence stays lossless.
fn format_cycle(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| format_label(label))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_label(label: &str) -> String {
    let plain = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        label.to_string()
    } else {
        format!(
            "\"{}\"",
            label.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{format_cycle, format_label, write_cycles, Cli};
    use crate::dot;

    fn cli_for(json: bool, count: bool) -> Cli {
        Cli {
            input: PathBuf::new(),
            json,
            count,
            no_color: true,
        }
    }

    fn render(source: &str, json: bool, count: bool) -> String {
        let graph = dot::parse(source).expect("parse");
        let mut buffer = Vec::new();
        write_cycles(&cli_for(json, count), &graph, &mut buffer).expect("write");
        String::from_utf8(buffer).expect("utf8 output")
    }

    #[test]
    fn plain_output_is_one_cycle_per_line() {
        let out = render("digraph { a -> b; b -> a; c -> c }", false, false);
        assert_eq!(out, "a -> b\nc\n");
    }

    #[test]
    fn json_output_is_one_array_per_line() {
        let out = render("digraph { a -> b; b -> a }", true, false);
        assert_eq!(out, "[\"a\",\"b\"]\n");
    }

    #[test]
    fn count_output_is_a_single_number() {
        let out = render("digraph { a -> b -> c -> a; b -> a }", false, true);
        assert_eq!(out, "2\n");
    }

    #[test]
    fn acyclic_input_prints_nothing() {
        let out = render("digraph { a -> b -> c }", false, false);
        assert!(out.is_empty());
    }

    #[test]
    fn labels_with_spaces_are_quoted() {
        assert_eq!(format_label("plain_1"), "plain_1");
        assert_eq!(format_label("two words"), "\"two words\"");
        assert_eq!(format_label("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(
            format_cycle(&["a", "b c"]),
            "a -> \"b c\""
        );
    }
}
