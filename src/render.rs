use std::collections::HashMap;

use crate::fragment::Fragment;
use crate::manifest::Manifest;
use crate::version::Version;

/// Hidden marker line prefixed to preview bodies so CI can find and update
/// an existing preview comment instead of posting a new one.
pub const PREVIEW_MARKER: &str = "<!-- papertrail-preview -->";

/// Render the dated release section and the undated release-notes body.
///
/// Both share one sort/group pass and carry identical bullet content; only
/// the heading line differs (`## <version> (<date>)` vs `## <version>`).
///
/// This function is pure: identical inputs produce byte-identical output,
/// regardless of the order fragments were discovered on disk.
pub fn render_release_section(
    version: &Version,
    date: &str,
    fragments: &[Fragment],
    manifest: &Manifest,
) -> (String, String) {
    let body = render_body(fragments, manifest, "###");
    let section = format!("## {} ({})\n\n{}", version, date, body);
    let notes = format!("## {}\n\n{}", version, body);
    (section, notes)
}

/// Render a changelog preview body for PR comments.
///
/// Starts with [`PREVIEW_MARKER`], then a `### Changelog preview` heading,
/// then the same component groups and bullets as the release renderer one
/// heading level down.
pub fn render_preview(fragments: &[Fragment], manifest: &Manifest) -> String {
    let body = render_body(fragments, manifest, "####");
    format!("{}\n### Changelog preview\n\n{}", PREVIEW_MARKER, body)
}

/// Sort key position of a component in the configured order.
///
/// Components absent from the table sort after every known one.
fn component_index(component: &str, manifest: &Manifest) -> usize {
    manifest
        .component_order
        .iter()
        .position(|c| c == component)
        .unwrap_or(manifest.component_order.len() + 1)
}

/// Sort key position of a canonical type in the configured order.
fn type_index(fragment_type: &str, manifest: &Manifest) -> usize {
    manifest
        .type_order
        .iter()
        .position(|t| t == fragment_type)
        .unwrap_or(manifest.type_order.len() + 1)
}

/// Lower-cased display form of a canonical type.
fn display_type(fragment_type: &str) -> String {
    fragment_type.trim().to_lowercase()
}

/// Append a terminal '.' unless the summary already ends in '.', '!' or '?'.
fn ensure_terminal_punctuation(summary: &str) -> String {
    let summary = summary.trim();
    if summary.is_empty() {
        return summary.to_string();
    }
    if summary.ends_with('.') || summary.ends_with('!') || summary.ends_with('?') {
        summary.to_string()
    } else {
        format!("{}.", summary)
    }
}

/// Component heading emission order: every known component from the
/// configured order that is present in the batch, in table order, then
/// every component present in the batch but absent from the table, in
/// lexicographic order.
fn ordered_components(fragments: &[Fragment], manifest: &Manifest) -> Vec<String> {
    let present: Vec<&str> = fragments.iter().map(|f| f.component.as_str()).collect();

    let mut out: Vec<String> = manifest
        .component_order
        .iter()
        .filter(|c| present.contains(&c.as_str()))
        .cloned()
        .collect();

    let mut unknown: Vec<String> = Vec::new();
    for component in present {
        if !manifest.component_order.iter().any(|c| c == component)
            && !unknown.iter().any(|c| c == component)
        {
            unknown.push(component.to_string());
        }
    }
    unknown.sort();
    out.extend(unknown);
    out
}

/// Shared sort/group/format pass behind all rendered outputs.
///
/// Fragments are totally ordered by `(component_index, type_index,
/// source_id)`; the file-name tie-break makes the order strict even among
/// otherwise-equal fragments. Grouping uses a lookup map, but headings are
/// emitted strictly in [`ordered_components`] order, never in map iteration
/// order.
fn render_body(fragments: &[Fragment], manifest: &Manifest, heading_prefix: &str) -> String {
    let mut rows: Vec<&Fragment> = fragments.iter().collect();
    rows.sort_by(|a, b| {
        let key_a = (
            component_index(&a.component, manifest),
            type_index(&a.r#type, manifest),
            a.source_id.as_str(),
        );
        let key_b = (
            component_index(&b.component, manifest),
            type_index(&b.r#type, manifest),
            b.source_id.as_str(),
        );
        key_a.cmp(&key_b)
    });

    let mut by_component: HashMap<&str, Vec<&Fragment>> = HashMap::new();
    for fragment in &rows {
        by_component
            .entry(fragment.component.as_str())
            .or_default()
            .push(fragment);
    }

    let mut out = String::new();
    for component in ordered_components(fragments, manifest) {
        let Some(group) = by_component.get(component.as_str()) else {
            continue;
        };
        out.push_str(heading_prefix);
        out.push(' ');
        out.push_str(&component);
        out.push_str("\n\n");
        for fragment in group {
            out.push_str(&format!(
                "- **{}**: {}\n",
                display_type(&fragment.r#type),
                ensure_terminal_punctuation(&fragment.summary)
            ));
        }
        out.push('\n');
    }
    out
}
