//! Graph model: topics and prerequisite edges parsed from a DOT-like text.
//!
//! The definition format is the informal node/edge grammar Graphviz users
//! write by hand:
//!
//! ```text
//! digraph DeepLearning {
//!     node [shape=box];
//!     LinearAlgebra [label="Linear Algebra"];
//!     LinearAlgebra -> MLBasics;
//! }
//! ```
//!
//! Identifiers are pulled out with a handful of patterns rather than a real
//! DOT parser. Everything else in the crate talks to [`Graph`] and never sees
//! the text.
//!
//! The graph is backed by petgraph's `DiGraph` with a `HashMap` index from
//! topic id to node index, so lookups by id stay O(1).

use crate::error::GraphParseError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, VisitMap, Visitable};
use petgraph::Direction;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Grammar keywords that look like identifiers but never name a topic.
const RESERVED: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

fn identifier_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+$").expect("static identifier pattern"))
}

fn declaration_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)^(?:"(\w+)"|(\w+))\s*(?:\[(.*)\])?$"#).expect("static declaration pattern")
    })
}

/// `key=value` with a quoted or bare value; anchored variant for statements.
const ATTRIBUTE_PAIR: &str = r#"(\w+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^,;\s\]"]+))"#;

fn attribute_pair_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ATTRIBUTE_PAIR).expect("static attribute pair pattern"))
}

fn assignment_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", ATTRIBUTE_PAIR)).expect("static assignment pattern")
    })
}

fn attribute_list_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[(?:[^\]"]|"(?:[^"\\]|\\.)*")*\]"#).expect("static attribute pattern"))
}

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\blabel\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^,;\s\]]+))"#)
            .expect("static label pattern")
    })
}

/// Whether a token is a grammar keyword rather than a topic id.
pub fn is_reserved(token: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(token))
}

/// A unit of learning content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    /// Stable identifier; doubles as DOM id and progress key.
    pub id: String,
    /// Display text. Falls back to the id when no label is declared.
    pub label: String,
}

impl Topic {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
        }
    }
}

/// A parsed prerequisite graph. Immutable once built.
#[derive(Debug)]
pub struct Graph {
    graph: DiGraph<Topic, ()>,
    index: HashMap<String, NodeIndex>,
    /// Graph-level attributes in definition order (`rankdir=LR`, `graph [...]`).
    settings: Vec<(String, String)>,
    /// Transitive predecessors per node, filled on first use.
    ancestors: OnceLock<Vec<Vec<NodeIndex>>>,
}

impl Graph {
    /// Parse a graph definition.
    ///
    /// Nodes come from explicit declarations (`Id [label="..."]`) and from
    /// edge endpoints (`A -> B`, including chains). Ids may be quoted
    /// (`"3DVision"`). Graph assignments (`rankdir=LR`) and `graph [...]`
    /// attributes are kept as [`Graph::settings`]; `node [...]` and
    /// `edge [...]` defaults are skipped.
    pub fn parse(text: &str) -> Result<Self, GraphParseError> {
        let mut builder = Builder::default();

        for statement in split_statements(text) {
            let bare = attribute_list_pattern().replace_all(&statement, "");
            if bare.contains("->") {
                builder.edge_statement(&statement, &bare);
            } else if let Some(caps) = assignment_pattern().captures(&statement) {
                builder.settings.push(attribute_pair(&caps));
            } else if let Some(caps) = declaration_pattern().captures(&statement) {
                let Some(id) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                    continue;
                };
                let attrs = caps.get(3).map_or("", |m| m.as_str());
                if id.eq_ignore_ascii_case("graph") {
                    builder.settings.extend(
                        attribute_pair_pattern()
                            .captures_iter(attrs)
                            .map(|c| attribute_pair(&c)),
                    );
                    continue;
                }
                if is_reserved(id) {
                    continue;
                }
                builder.declare(id, extract_label(attrs));
            } else {
                debug!(statement = %statement, "skipping non-topic statement");
            }
        }

        let graph = builder.finish()?;
        if petgraph::algo::is_cyclic_directed(&graph.graph) {
            warn!(
                nodes = graph.node_count(),
                "prerequisite graph contains a cycle; topics on it can never become ready"
            );
        }
        Ok(graph)
    }

    /// Graph-level attributes from the definition, in order.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Topic ids in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(|t| t.id.as_str())
    }

    /// All topics in first-appearance order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> + '_ {
        self.graph.node_weights()
    }

    /// Topic ids as a set.
    pub fn node_set(&self) -> BTreeSet<&str> {
        self.nodes().collect()
    }

    /// Prerequisite edges as `(from, to)` pairs. Duplicates are collapsed.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.as_str(),
                    self.graph[e.target()].id.as_str(),
                )
            })
            .collect()
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Topics that list `id` as a direct prerequisite. Empty for unknown ids.
    pub fn direct_successors(&self, id: &str) -> BTreeSet<&str> {
        let Some(&idx) = self.index.get(id) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].id.as_str())
            .collect()
    }

    /// Every transitive prerequisite of `id`. Empty for unknown ids.
    ///
    /// A node on a cycle is its own ancestor.
    pub fn all_ancestors(&self, id: &str) -> BTreeSet<&str> {
        let Some(&idx) = self.index.get(id) else {
            return BTreeSet::new();
        };
        self.ancestor_indices(idx)
            .iter()
            .map(|n| self.graph[*n].id.as_str())
            .collect()
    }

    /// Whether any graph cycle exists.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    pub(crate) fn ancestor_indices(&self, idx: NodeIndex) -> &[NodeIndex] {
        let table = self.ancestors.get_or_init(|| {
            self.graph
                .node_indices()
                .map(|n| self.walk_ancestors(n))
                .collect()
        });
        &table[idx.index()]
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub(crate) fn topic_at(&self, idx: NodeIndex) -> &Topic {
        &self.graph[idx]
    }

    /// Iterative closure over reversed edges; the visited map bounds the walk.
    fn walk_ancestors(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut visited = self.graph.visit_map();
        let mut stack: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(start, Direction::Incoming)
            .collect();
        let mut found = Vec::new();

        while let Some(node) = stack.pop() {
            if visited.visit(node) {
                found.push(node);
                stack.extend(self.graph.neighbors_directed(node, Direction::Incoming));
            }
        }
        found
    }
}

#[derive(Default)]
struct Builder {
    graph: DiGraph<Topic, ()>,
    index: HashMap<String, NodeIndex>,
    settings: Vec<(String, String)>,
}

impl Builder {
    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(Topic::new(id));
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn declare(&mut self, id: &str, label: Option<String>) {
        let idx = self.node(id);
        if let Some(label) = label {
            self.graph[idx].label = label;
        }
    }

    fn edge_statement(&mut self, statement: &str, bare: &str) {
        let endpoints: Vec<&str> = bare.split("->").map(|e| unquote_id(e.trim())).collect();

        if endpoints
            .iter()
            .any(|e| !identifier_pattern().is_match(e) || is_reserved(e))
        {
            debug!(statement = %statement, "skipping edge statement with non-topic endpoint");
            return;
        }

        for pair in endpoints.windows(2) {
            let from = self.node(pair[0]);
            let to = self.node(pair[1]);
            self.graph.update_edge(from, to, ());
        }
    }

    fn finish(self) -> Result<Graph, GraphParseError> {
        if self.graph.node_count() == 0 {
            return Err(GraphParseError::Empty);
        }
        Ok(Graph {
            graph: self.graph,
            index: self.index,
            settings: self.settings,
            ancestors: OnceLock::new(),
        })
    }
}

/// Strip one pair of surrounding double quotes.
fn unquote_id(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}

fn extract_label(attrs: &str) -> Option<String> {
    let caps = label_pattern().captures(attrs)?;
    if let Some(quoted) = caps.get(1) {
        Some(unescape(quoted.as_str()))
    } else {
        caps.get(2).map(|m| m.as_str().to_string())
    }
}

fn attribute_pair(caps: &regex::Captures<'_>) -> (String, String) {
    let value = match caps.get(2) {
        Some(quoted) => unescape(quoted.as_str()),
        None => caps.get(3).map_or_else(String::new, |m| m.as_str().to_string()),
    };
    (caps[1].to_string(), value)
}

/// Decode the escapes of a quoted DOT string.
///
/// `\n`, `\l` and `\r` are all line breaks; justification is not kept.
/// Unknown escapes keep their backslash.
pub fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n' | 'l' | 'r') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split a definition into trimmed statements.
///
/// Separators are `;`, newlines, `{` and `}` outside of quotes and attribute
/// brackets. Comments are dropped.
fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut in_quotes = false;
    let mut bracket_depth = 0usize;
    let mut line_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                if bracket_depth == 0 {
                    flush(&mut current, &mut statements);
                }
                line_start = true;
                continue;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                current.push(' ');
            }
            '#' if line_start => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                line_start = true;
                continue;
            }
            '[' => {
                bracket_depth += 1;
                current.push(c);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(c);
            }
            ';' | '{' | '}' if bracket_depth == 0 => flush(&mut current, &mut statements),
            '\n' if bracket_depth == 0 => flush(&mut current, &mut statements),
            _ => current.push(c),
        }

        line_start = c == '\n' || (line_start && c.is_whitespace());
    }
    flush(&mut current, &mut statements);
    statements
}

fn flush(current: &mut String, statements: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}
