//! Render adapter: per-topic styling for the external layout tool.
//!
//! [`style`] turns a classification into [`RenderHints`], reusing the graph's
//! topic ids verbatim so a click in the browser maps straight back to a
//! progress key. [`to_dot`] writes those hints out as a DOT document that
//! Graphviz can lay out into an image plus a `cmapx` click map.
//!
//! Graphviz drops unknown attributes from `cmapx`, so the toggle hook is not
//! part of the DOT output: the page binds it to each `<area>` by element id.

use crate::graph::Graph;
use crate::readiness::{Classification, Readiness};
use serde::Serialize;
use std::fmt::Write;

/// Fill color category of a rendered topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillColor {
    Green,
    Yellow,
    Grey,
}

impl FillColor {
    pub fn for_state(state: Readiness) -> Self {
        match state {
            Readiness::Done => FillColor::Green,
            Readiness::Ready => FillColor::Yellow,
            Readiness::Blocked => FillColor::Grey,
        }
    }

    /// Graphviz color name.
    pub fn as_dot(self) -> &'static str {
        match self {
            FillColor::Green => "lightgreen",
            FillColor::Yellow => "yellow",
            FillColor::Grey => "lightgrey",
        }
    }
}

/// Everything the layout tool and the page need to draw one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderHints {
    pub id: String,
    pub label: String,
    pub state: Readiness,
    pub fill: FillColor,
    /// DOM element id; always equal to `id`.
    pub element_id: String,
    pub href: String,
    /// Toggle hook, parameterized by the topic id. Bound by the page, not
    /// carried in the DOT document.
    pub onclick: String,
    /// Node width in inches.
    pub width: f64,
}

impl RenderHints {
    fn new(id: &str, label: &str, state: Readiness) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            state,
            fill: FillColor::for_state(state),
            element_id: id.to_string(),
            href: "javascript:void(0);".to_string(),
            onclick: format!("updateTopic(\"{}\");", id),
            width: estimated_width(label),
        }
    }
}

/// Minimum node width in inches.
const MIN_WIDTH: f64 = 2.0;
/// Rough width of one label character in inches.
const CHAR_WIDTH: f64 = 0.1;

fn estimated_width(label: &str) -> f64 {
    (label.chars().count() as f64 * CHAR_WIDTH).max(MIN_WIDTH)
}

/// Hints for every topic, in graph order.
///
/// Topics missing from `states` are drawn as blocked.
pub fn style(graph: &Graph, states: &Classification) -> Vec<RenderHints> {
    graph
        .topics()
        .map(|topic| {
            let state = states.get(&topic.id).unwrap_or(Readiness::Blocked);
            RenderHints::new(&topic.id, &topic.label, state)
        })
        .collect()
}

/// Graph-wide styling for the emitted DOT document.
#[derive(Debug, Clone, PartialEq)]
pub struct DotStyle {
    pub name: String,
    pub rankdir: String,
    pub splines: String,
    pub fontname: String,
    pub fontsize: u32,
    pub node_height: f64,
}

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            name: "Progress".to_string(),
            rankdir: "TB".to_string(),
            splines: "polyline".to_string(),
            fontname: "Helvetica".to_string(),
            fontsize: 10,
            node_height: 0.5,
        }
    }
}

/// Quote a string as a DOT id or attribute value.
///
/// Newlines become `\n` line breaks.
pub fn dot_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Emit a complete DOT document for the layout tool.
///
/// Graph-level settings from the definition follow the style defaults and
/// override them. Node and edge ids are always quoted; ids may start with a
/// digit.
pub fn to_dot(graph: &Graph, hints: &[RenderHints], style: &DotStyle) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "digraph {} {{", dot_quote(&style.name));
    let _ = writeln!(
        out,
        "    graph [rankdir={}, splines={}, overlap=false, pack=true, packmode=clust];",
        style.rankdir, style.splines
    );
    let _ = writeln!(
        out,
        "    node [shape=box, style=\"rounded,filled\", fontname={}, fontsize={}, height={}, width={}];",
        dot_quote(&style.fontname),
        style.fontsize,
        style.node_height,
        MIN_WIDTH
    );
    let _ = writeln!(out, "    edge [color=gray, arrowhead=open];");
    for (key, value) in graph.settings() {
        let _ = writeln!(out, "    {}={};", key, dot_quote(value));
    }

    for hint in hints {
        let _ = writeln!(
            out,
            "    {} [label={}, fillcolor={}, id={}, href={}, width={:.1}];",
            dot_quote(&hint.id),
            dot_quote(&hint.label),
            hint.fill.as_dot(),
            dot_quote(&hint.element_id),
            dot_quote(&hint.href),
            hint.width
        );
    }
    for (from, to) in graph.edges() {
        let _ = writeln!(out, "    {} -> {};", dot_quote(from), dot_quote(to));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CompletionSet;
    use crate::readiness::classify;

    fn rendered(text: &str, done: &[&str]) -> (Graph, Vec<RenderHints>) {
        let graph = Graph::parse(text).unwrap();
        let mut completion = CompletionSet::for_graph(&graph);
        for id in done {
            completion.toggle(id, true).unwrap();
        }
        let hints = style(&graph, &classify(&graph, &completion));
        (graph, hints)
    }

    #[test]
    fn hints_reuse_topic_ids() {
        let (graph, hints) = rendered(r#"Algebra [label="Linear Algebra"]; Algebra -> ML;"#, &[]);
        let ids: Vec<&str> = hints.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, graph.nodes().collect::<Vec<_>>());

        let algebra = &hints[0];
        assert_eq!(algebra.element_id, "Algebra");
        assert_eq!(algebra.onclick, "updateTopic(\"Algebra\");");
        assert_eq!(algebra.href, "javascript:void(0);");
        assert_eq!(algebra.label, "Linear Algebra");
    }

    #[test]
    fn fill_follows_state() {
        let (_, hints) = rendered("A -> B; B -> C;", &["A"]);
        let fills: Vec<&str> = hints.iter().map(|h| h.fill.as_dot()).collect();
        assert_eq!(fills, vec!["lightgreen", "yellow", "lightgrey"]);
    }

    #[test]
    fn width_grows_with_label() {
        assert_eq!(estimated_width("ML"), 2.0);
        let long = "Generative Adversarial Networks (GANs)";
        assert!((estimated_width(long) - 3.8).abs() < 1e-9);
    }

    #[test]
    fn dot_document_contains_nodes_and_edges() {
        let (graph, hints) = rendered(r#"A [label="Say \"hi\""]; A -> B;"#, &["A"]);
        let dot = to_dot(&graph, &hints, &DotStyle::default());

        assert!(dot.starts_with("digraph \"Progress\" {"));
        assert!(dot.contains("rankdir=TB"));
        assert!(dot.contains(r#""A" [label="Say \"hi\"", fillcolor=lightgreen, id="A""#));
        assert!(dot.contains(r#""B" [label="B", fillcolor=yellow, id="B", href="javascript:void(0);""#));
        assert!(!dot.contains("onclick"));
        assert!(dot.contains(r#"    "A" -> "B";"#));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn digit_leading_ids_are_quoted() {
        let (graph, hints) = rendered("3DVision -> SLAM; SLAM -> 4DMapping;", &[]);
        let dot = to_dot(&graph, &hints, &DotStyle::default());

        assert!(dot.contains(r#"    "3DVision" [label="3DVision""#));
        assert!(dot.contains(r#"    "3DVision" -> "SLAM";"#));
        assert!(dot.contains(r#"    "SLAM" -> "4DMapping";"#));

        let reparsed = Graph::parse(&dot).unwrap();
        assert_eq!(reparsed.node_set(), graph.node_set());
        assert_eq!(reparsed.edges(), graph.edges());
    }

    #[test]
    fn label_line_breaks_survive() {
        let (graph, hints) = rendered(r#"A [label="Line\nTwo"];"#, &[]);
        assert_eq!(hints[0].label, "Line\nTwo");

        let dot = to_dot(&graph, &hints, &DotStyle::default());
        assert!(dot.contains(r#"[label="Line\nTwo""#));
        assert!(!dot.contains(r#"Line\\nTwo"#));
        assert_eq!(Graph::parse(&dot).unwrap().topic("A").unwrap().label, "Line\nTwo");
    }

    #[test]
    fn definition_settings_override_defaults() {
        let (graph, hints) = rendered("rankdir=LR; A -> B;", &[]);
        let dot = to_dot(&graph, &hints, &DotStyle::default());

        let defaults = dot.find("rankdir=TB").unwrap();
        let from_definition = dot.find(r#"    rankdir="LR";"#).unwrap();
        assert!(from_definition > defaults);
    }

    #[test]
    fn emitted_dot_parses_back_to_the_same_graph() {
        let (graph, hints) = rendered("A -> B; A -> C; B -> D; C -> D;", &[]);
        let dot = to_dot(&graph, &hints, &DotStyle::default());
        let reparsed = Graph::parse(&dot).unwrap();
        assert_eq!(reparsed.node_set(), graph.node_set());
        assert_eq!(reparsed.edges(), graph.edges());
    }
}
