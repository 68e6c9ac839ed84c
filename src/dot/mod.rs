//! DOT-format ingestion.
//!
//! Covers the subset of the DOT grammar needed to recover a node/edge
//! list: `strict`, `graph`/`digraph` headers, node and edge statements
//! (including chains), attribute lists (consumed and dropped), quoted
//! identifiers, numerals, comments, and inline `subgraph` blocks. Ports,
//! HTML strings, and subgraphs as edge endpoints are out of the subset.
//!
//! An undirected edge `a -- b` ingests as both directed edges, matching
//! the directed-graph conversion of an undirected parse.

use std::fs;
use std::path::Path;

use crate::error::IngestError;
use crate::graph::DiGraph;

/// Reads `path` and parses it into a directed graph.
///
/// The file handle is scoped to the read; it is released on every exit
/// path, including parse failure. No partial graph escapes on error.
pub fn ingest_file(path: &Path) -> Result<DiGraph, IngestError> {
    let source = fs::read_to_string(path).map_err(|source| IngestError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source)
}

/// Parses DOT text into a directed graph.
pub fn parse(source: &str) -> Result<DiGraph, IngestError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Id { text: String, quoted: bool },
    Arrow,
    Undirected,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Equals,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Id { text, .. } => format!("'{text}'"),
            Token::Arrow => "'->'".to_string(),
            Token::Undirected => "'--'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Semi => "';'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Equals => "'='".to_string(),
        }
    }

    /// Unquoted identifier equal to `keyword`, ignoring case.
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Id { text, quoted: false } if text.eq_ignore_ascii_case(keyword))
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> IngestError {
    IngestError::Parse {
        line,
        message: message.into(),
    }
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, IngestError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            _ if c.is_whitespace() => {}
            '#' => {
                // Preprocessor-style line marker; skip to end of line.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' => match chars.next() {
                Some('/') => {
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            line += 1;
                            break;
                        }
                    }
                }
                Some('*') => {
                    let opened = line;
                    let mut closed = false;
                    let mut prev = '\0';
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            line += 1;
                        }
                        if prev == '*' && skipped == '/' {
                            closed = true;
                            break;
                        }
                        prev = skipped;
                    }
                    if !closed {
                        return Err(parse_error(opened, "unterminated block comment"));
                    }
                }
                _ => return Err(parse_error(line, "unexpected character '/'")),
            },
            '{' => tokens.push((Token::LBrace, line)),
            '}' => tokens.push((Token::RBrace, line)),
            '[' => tokens.push((Token::LBracket, line)),
            ']' => tokens.push((Token::RBracket, line)),
            ';' => tokens.push((Token::Semi, line)),
            ',' => tokens.push((Token::Comma, line)),
            '=' => tokens.push((Token::Equals, line)),
            '-' => match chars.peek() {
                Some('>') => {
                    chars.next();
                    tokens.push((Token::Arrow, line));
                }
                Some('-') => {
                    chars.next();
                    tokens.push((Token::Undirected, line));
                }
                Some(&digit) if digit.is_ascii_digit() || digit == '.' => {
                    let mut text = String::from('-');
                    while let Some(&next) = chars.peek() {
                        if !is_id_char(next) {
                            break;
                        }
                        text.push(next);
                        chars.next();
                    }
                    tokens.push((
                        Token::Id {
                            text,
                            quoted: false,
                        },
                        line,
                    ));
                }
                _ => return Err(parse_error(line, "unexpected character '-'")),
            },
            '"' => {
                let opened = line;
                let mut text = String::new();
                let mut closed = false;
                while let Some(next) = chars.next() {
                    match next {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('"') => text.push('"'),
                            Some('\\') => text.push('\\'),
                            Some('\n') => line += 1,
                            Some(other) => {
                                // Unknown escapes pass through verbatim.
                                text.push('\\');
                                text.push(other);
                                if other == '\n' {
                                    line += 1;
                                }
                            }
                            None => break,
                        },
                        '\n' => {
                            line += 1;
                            text.push('\n');
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(parse_error(opened, "unterminated quoted identifier"));
                }
                tokens.push((Token::Id { text, quoted: true }, line));
            }
            _ if is_id_char(c) => {
                let mut text = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !is_id_char(next) {
                        break;
                    }
                    text.push(next);
                    chars.next();
                }
                tokens.push((
                    Token::Id {
                        text,
                        quoted: false,
                    },
                    line,
                ));
            }
            other => {
                return Err(parse_error(line, format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    graph: DiGraph,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self {
            tokens,
            pos: 0,
            graph: DiGraph::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn parse(mut self) -> Result<DiGraph, IngestError> {
        if self.peek().is_some_and(|token| token.is_keyword("strict")) {
            self.next();
        }
        match self.next() {
            Some((token, _)) if token.is_keyword("digraph") || token.is_keyword("graph") => {}
            Some((token, line)) => {
                return Err(parse_error(
                    line,
                    format!("expected 'digraph' or 'graph', found {}", token.describe()),
                ));
            }
            None => return Err(parse_error(1, "empty graph description")),
        }
        if matches!(self.peek(), Some(Token::Id { .. })) {
            self.next();
        }
        self.expect_brace()?;
        self.statements()?;
        if let Some((token, line)) = self.next() {
            return Err(parse_error(
                line,
                format!("trailing input after graph body: {}", token.describe()),
            ));
        }
        Ok(self.graph)
    }

    fn expect_brace(&mut self) -> Result<(), IngestError> {
        match self.next() {
            Some((Token::LBrace, _)) => Ok(()),
            Some((token, line)) => Err(parse_error(
                line,
                format!("expected '{{', found {}", token.describe()),
            )),
            None => Err(parse_error(
                self.current_line(),
                "expected '{', found end of input",
            )),
        }
    }

    /// Parses statements up to and including the closing brace.
    fn statements(&mut self) -> Result<(), IngestError> {
        loop {
            match self.next() {
                None => {
                    return Err(parse_error(self.current_line(), "unclosed graph body"));
                }
                Some((Token::RBrace, _)) => return Ok(()),
                Some((Token::Semi, _)) => {}
                Some((Token::LBrace, _)) => {
                    // Anonymous subgraph: its statements land in the same
                    // graph.
                    self.statements()?;
                    self.reject_edge_from_subgraph()?;
                }
                Some((token, line)) if token.is_keyword("subgraph") => {
                    if matches!(self.peek(), Some(Token::Id { .. })) {
                        self.next();
                    }
                    match self.next() {
                        Some((Token::LBrace, _)) => {}
                        Some((token, line)) => {
                            return Err(parse_error(
                                line,
                                format!("expected '{{' after subgraph, found {}", token.describe()),
                            ));
                        }
                        None => {
                            return Err(parse_error(line, "expected '{' after subgraph"));
                        }
                    }
                    self.statements()?;
                    self.reject_edge_from_subgraph()?;
                }
                Some((token, _))
                    if token.is_keyword("node")
                        || token.is_keyword("edge")
                        || token.is_keyword("graph") =>
                {
                    // Attribute defaults; consumed and dropped.
                    self.attr_lists()?;
                }
                Some((Token::Id { text, .. }, line)) => {
                    self.statement_from(&text, line)?;
                }
                Some((token, line)) => {
                    return Err(parse_error(
                        line,
                        format!("unexpected {} in graph body", token.describe()),
                    ));
                }
            }
        }
    }

    /// Node, edge-chain, or assignment statement starting at identifier
    /// `first`.
    fn statement_from(&mut self, first: &str, line: usize) -> Result<(), IngestError> {
        if matches!(self.peek(), Some(Token::Equals)) {
            self.next();
            match self.next() {
                Some((Token::Id { .. }, _)) => return Ok(()),
                Some((token, line)) => {
                    return Err(parse_error(
                        line,
                        format!("expected value after '=', found {}", token.describe()),
                    ));
                }
                None => return Err(parse_error(line, "expected value after '='")),
            }
        }

        let mut current = first.to_string();
        let mut is_edge = false;
        while let Some(op) = self.peek().cloned() {
            let directed = match op {
                Token::Arrow => true,
                Token::Undirected => false,
                _ => break,
            };
            self.next();
            let target = match self.next() {
                Some((token, line))
                    if matches!(token, Token::LBrace) || token.is_keyword("subgraph") =>
                {
                    return Err(parse_error(
                        line,
                        "subgraph as edge endpoint is not supported",
                    ));
                }
                Some((Token::Id { text, .. }, _)) => text,
                Some((token, line)) => {
                    return Err(parse_error(
                        line,
                        format!(
                            "expected node after edge operator, found {}",
                            token.describe()
                        ),
                    ));
                }
                None => {
                    return Err(parse_error(
                        self.current_line(),
                        "expected node after edge operator",
                    ));
                }
            };
            is_edge = true;
            self.graph.add_edge(&current, &target);
            if !directed {
                self.graph.add_edge(&target, &current);
            }
            current = target;
        }

        if !is_edge {
            self.graph.add_node(&current);
        }
        self.attr_lists()?;
        Ok(())
    }

    /// Consumes zero or more `[...]` attribute groups.
    fn attr_lists(&mut self) -> Result<(), IngestError> {
        while matches!(self.peek(), Some(Token::LBracket)) {
            self.next();
            loop {
                match self.next() {
                    Some((Token::RBracket, _)) => break,
                    Some((Token::Id { .. }, _))
                    | Some((Token::Equals, _))
                    | Some((Token::Comma, _))
                    | Some((Token::Semi, _)) => {}
                    Some((token, line)) => {
                        return Err(parse_error(
                            line,
                            format!("unexpected {} in attribute list", token.describe()),
                        ));
                    }
                    None => {
                        return Err(parse_error(self.current_line(), "unclosed attribute list"));
                    }
                }
            }
        }
        Ok(())
    }

    /// A closed subgraph block cannot serve as an edge endpoint.
    fn reject_edge_from_subgraph(&mut self) -> Result<(), IngestError> {
        if matches!(self.peek(), Some(Token::Arrow) | Some(Token::Undirected)) {
            return Err(parse_error(
                self.current_line(),
                "subgraph as edge endpoint is not supported",
            ));
        }
        self.attr_lists()
    }
}

#[cfg(test)]
mod tests {
    use super::{ingest_file, parse};
    use crate::error::IngestError;

    #[test]
    fn parses_directed_edges() {
        let graph = parse("digraph { a -> b; b -> c; }").expect("parse");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let a = graph.node_id("a").unwrap();
        let b = graph.node_id("b").unwrap();
        assert!(graph.has_edge(a, b));
        assert!(!graph.has_edge(b, a));
    }

    #[test]
    fn edge_chains_expand_pairwise() {
        let graph = parse("digraph { a -> b -> c -> a }").expect("parse");
        assert_eq!(graph.edge_count(), 3);
        let c = graph.node_id("c").unwrap();
        let a = graph.node_id("a").unwrap();
        assert!(graph.has_edge(c, a));
    }

    #[test]
    fn undirected_edges_go_both_ways() {
        let graph = parse("graph { a -- b }").expect("parse");
        let a = graph.node_id("a").unwrap();
        let b = graph.node_id("b").unwrap();
        assert!(graph.has_edge(a, b));
        assert!(graph.has_edge(b, a));
    }

    #[test]
    fn repeated_declarations_collapse() {
        let graph = parse("digraph { a; a; a -> b; a -> b; }").expect("parse");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loops_survive() {
        let graph = parse("digraph { a -> a }").expect("parse");
        let a = graph.node_id("a").unwrap();
        assert!(graph.has_edge(a, a));
    }

    #[test]
    fn quoted_labels_keep_spaces_and_escapes() {
        let graph = parse(r#"digraph { "node one" -> "say \"hi\"" }"#).expect("parse");
        assert!(graph.node_id("node one").is_some());
        assert!(graph.node_id("say \"hi\"").is_some());
    }

    #[test]
    fn attributes_are_dropped() {
        let source = r#"
            digraph deps {
                node [shape=box];
                edge [color=red, style=dashed];
                a [label="alpha"];
                a -> b [weight=2] [penwidth=1.5];
            }
        "#;
        let graph = parse(source).expect("parse");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn comments_are_ignored() {
        let source = "digraph { // line\n a -> b /* block\n spanning */ -> c\n # hash\n }";
        let graph = parse(source).expect("parse");
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn subgraph_statements_join_the_graph() {
        let source = "digraph { subgraph cluster_a { a -> b } b -> c }";
        let graph = parse(source).expect("parse");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn numerals_are_valid_identifiers() {
        let graph = parse("digraph { 1 -> 2; 2 -> -1.5 }").expect("parse");
        assert!(graph.node_id("-1.5").is_some());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn strict_header_is_accepted() {
        let graph = parse("strict digraph deps { a -> b }").expect("parse");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn empty_body_is_an_empty_graph() {
        let graph = parse("digraph {}").expect("parse");
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn missing_header_is_a_parse_error() {
        let err = parse("{ a -> b }").expect_err("must fail");
        assert!(matches!(err, IngestError::Parse { line: 1, .. }));
    }

    #[test]
    fn unclosed_body_reports_a_line() {
        let err = parse("digraph {\n a -> b\n").expect_err("must fail");
        match err {
            IngestError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("unclosed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn subgraph_endpoint_is_rejected() {
        let err = parse("digraph { subgraph { a } -> b }").expect_err("must fail");
        match err {
            IngestError::Parse { message, .. } => {
                assert!(message.contains("subgraph as edge endpoint"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unterminated_string_is_a_parse_error() {
        let err = parse("digraph { \"open -> b }").expect_err("must fail");
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let path = std::env::temp_dir().join("dotcycles-no-such-file.dot");
        let err = ingest_file(&path).expect_err("must fail");
        assert!(matches!(err, IngestError::Unreadable { .. }));
    }
}
