//! HTML page for one subject.

use crate::state::Rendered;
use pathwise_core::prelude::Snapshot;

const TEMPLATE: &str = include_str!("../templates/index.html");

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to embed in a `<script>` block.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

fn subject_options(subjects: &[String], selected: &str) -> String {
    subjects
        .iter()
        .map(|s| {
            let marker = if s == selected { " selected" } else { "" };
            format!(
                "        <option value=\"{0}\"{1}>{0}</option>",
                escape_html(s),
                marker
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the page template.
pub fn render_page(
    subjects: &[String],
    snapshot: &Snapshot,
    rendered: &Rendered,
    map_name: &str,
) -> String {
    let warning = snapshot.warning.as_deref().unwrap_or("");
    TEMPLATE
        .replace("__TITLE__", &escape_html(&snapshot.subject))
        .replace("__SUBJECT_OPTIONS__", &subject_options(subjects, &snapshot.subject))
        .replace("__PERCENT__", &snapshot.percent.to_string())
        .replace("__WARNING__", &escape_html(warning))
        .replace("__GRAPH_FILE__", &escape_html(&rendered.graph_file))
        .replace("__MAP_NAME__", &escape_html(map_name))
        .replace("__SUBJECT_JSON__", &script_json(&snapshot.subject))
        .replace("__PROGRESS_JSON__", &script_json(&snapshot.progress))
        .replace("__IMAGE_MAP__", &rendered.image_map)
}
