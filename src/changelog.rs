use crate::error::{PapertrailError, Result};
use crate::version::Version;

/// Merge a freshly rendered dated section for `version` into an existing
/// changelog document.
///
/// Fails without producing output if the document already carries a section
/// for this version. Otherwise the new section lands immediately before the
/// earliest prior release heading (`\n## v...` or a year-prefixed dated
/// `\n## 20...`), or at the end of the document when no such heading
/// exists. Text before and after the insertion point is left untouched,
/// except that exactly one blank line is guaranteed between the preceding
/// text and the inserted section.
pub fn insert_release_section(changelog: &str, version: &Version, section: &str) -> Result<String> {
    let duplicate_guard = format!("\n## {} (", version);
    if changelog.contains(&duplicate_guard) {
        return Err(PapertrailError::changelog(format!(
            "changelog already contains a section for {}",
            version
        )));
    }

    let idx = insertion_index(changelog);
    let head = &changelog[..idx];
    let tail = &changelog[idx..];

    let mut out = String::with_capacity(changelog.len() + section.len() + 2);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with("\n\n") {
        if head.ends_with('\n') {
            out.push('\n');
        } else {
            out.push_str("\n\n");
        }
    }
    out.push_str(section);
    out.push_str(tail);
    Ok(out)
}

/// Find the byte offset of the earliest prior release heading, or the end
/// of the document when none exists.
fn insertion_index(changelog: &str) -> usize {
    let candidates = [changelog.find("\n## 20"), changelog.find("\n## v")];
    candidates
        .iter()
        .flatten()
        .min()
        // Insert after the newline that introduced the heading line.
        .map(|idx| idx + 1)
        .unwrap_or(changelog.len())
}
