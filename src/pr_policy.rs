use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{PapertrailError, Result};
use crate::manifest::PrPolicy;

/// Subset of the GitHub pull-request event payload the driver reads.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: PullRequest,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequest {
    #[serde(default)]
    title: String,

    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Default, Deserialize)]
struct Label {
    #[serde(default)]
    name: String,
}

/// Read the PR title and labels from a CI event payload file.
///
/// Labels are trimmed, sorted, and deduplicated; an empty title is an
/// error because every caller needs one.
pub fn read_pr_event(path: &Path) -> Result<(String, Vec<String>)> {
    let contents = fs::read_to_string(path)?;
    let event: EventPayload = serde_json::from_str(&contents)?;

    let title = event.pull_request.title.trim().to_string();
    if title.is_empty() {
        return Err(PapertrailError::pr_policy(format!(
            "could not read PR title from {}",
            path.display()
        )));
    }

    let mut labels: Vec<String> = event
        .pull_request
        .labels
        .iter()
        .map(|label| label.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    labels.sort();
    labels.dedup();

    Ok((title, labels))
}

/// Validate a PR title against the policy; a no-op when the policy is
/// disabled.
pub fn validate_title(policy: &PrPolicy, title: &str) -> Result<()> {
    if !policy.title_enabled {
        return Ok(());
    }
    parse_title_type(policy, title).map(|_| ())
}

/// Parse the conventional type out of a PR title.
///
/// Accepts `<type>(<scope>): <title>` with the scope optional. The head is
/// lower-cased and resolved through the policy aliases; the resolved type
/// must be in the allowed set, and the text after ':' must be non-empty.
pub fn parse_title_type(policy: &PrPolicy, title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PapertrailError::pr_policy("PR title is empty"));
    }

    if let Ok(re) = Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*)\s*(?:\(([^)]*)\))?\s*:\s*(.*)$") {
        if let Some(captures) = re.captures(title) {
            if let (Some(type_match), Some(rest_match)) = (captures.get(1), captures.get(3)) {
                let mut pr_type = type_match.as_str().to_lowercase();
                if let Some(alias) = policy.type_aliases.get(&pr_type) {
                    pr_type = alias.trim().to_lowercase();
                }
                if !policy.allowed_types.contains(&pr_type) {
                    return Err(PapertrailError::pr_policy(format!(
                        "invalid PR type {:?}; allowed types: {}",
                        pr_type,
                        policy.allowed_types.join(", ")
                    )));
                }
                if rest_match.as_str().trim().is_empty() {
                    return Err(PapertrailError::pr_policy(
                        "PR title must include a non-empty title after ':'",
                    ));
                }
                return Ok(pr_type);
            }
        }
    }

    Err(PapertrailError::pr_policy(
        "PR title must match: <type>(<scope>): <title> (scope optional)",
    ))
}

/// Require at least one fragment file in the PR diff.
///
/// Skipped entirely when the PR carries the opt-out label. On failure the
/// message names the opt-out label so authors of truly non-user-visible
/// changes know the escape hatch.
pub fn require_fragment_change(
    policy: &PrPolicy,
    labels: &[String],
    changed_files: &[String],
    fragments_dir: &str,
) -> Result<()> {
    if !policy.opt_out_label.is_empty() && labels.iter().any(|l| l == &policy.opt_out_label) {
        return Ok(());
    }

    let prefix = format!("{}/", fragments_dir.trim_end_matches('/'));
    let has_fragment = changed_files.iter().any(|file| {
        file.starts_with(&prefix) && (file.ends_with(".yml") || file.ends_with(".yaml"))
    });
    if has_fragment {
        return Ok(());
    }

    let mut msg = format!(
        "non-doc changes detected, but no changelog fragment found under {}",
        prefix
    );
    if !policy.opt_out_label.is_empty() {
        msg.push_str(&format!(
            " (if truly non-user-visible, add label: {})",
            policy.opt_out_label
        ));
    }
    Err(PapertrailError::pr_policy(msg))
}
