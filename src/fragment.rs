use serde::Deserialize;

use crate::error::{PapertrailError, Result};
use crate::manifest::Manifest;

/// Raw fragment record as parsed from a YAML file, before validation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawFragment {
    #[serde(default)]
    pub component: String,

    #[serde(default)]
    pub r#type: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub refs: Vec<String>,
}

/// One validated, canonical change record contributing to a release.
///
/// Constructed only by [`validate`]; never mutated afterwards. The type is
/// upper-cased and alias-resolved, component and summary are trimmed, and
/// `source_id` carries the originating file name as the final deterministic
/// sort tie-break.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub component: String,
    pub r#type: String,
    pub summary: String,
    pub refs: Vec<String>,
    pub source_id: String,
}

/// Validate and canonicalize a raw fragment record.
///
/// Steps, in order, each capable of failing:
/// 1. Trim component, trim+upper-case type, trim summary, trim each ref
/// 2. Reject missing component/type/summary, naming the field
/// 3. Under strict components, the component must be in the configured order
/// 4. Resolve the type through the alias table
/// 5. The resolved type must be in the resolved type order
///
/// The same function serves both call modes: fail-fast callers wrap the
/// error with the originating file path, the batch checker collects and
/// sorts the rendered messages.
pub fn validate(raw: RawFragment, source_id: &str, manifest: &Manifest) -> Result<Fragment> {
    let component = raw.component.trim().to_string();
    let type_normalized = raw.r#type.trim().to_uppercase();
    let summary = raw.summary.trim().to_string();
    let refs: Vec<String> = raw.refs.iter().map(|r| r.trim().to_string()).collect();

    if component.is_empty() {
        return Err(PapertrailError::fragment(
            "missing required field: component",
        ));
    }
    if type_normalized.is_empty() {
        return Err(PapertrailError::fragment("missing required field: type"));
    }
    if summary.is_empty() {
        return Err(PapertrailError::fragment("missing required field: summary"));
    }

    if manifest.strict_components && !manifest.component_order.contains(&component) {
        return Err(PapertrailError::fragment(format!(
            "unknown component {:?} (expected one of {})",
            component,
            manifest.component_order.join(", ")
        )));
    }

    let canonical_type = manifest.canonical_type(&type_normalized);
    if !manifest.type_order.contains(&canonical_type) {
        return Err(PapertrailError::fragment(format!(
            "unknown type {:?} (expected one of {})",
            canonical_type,
            manifest.type_order.join(", ")
        )));
    }

    Ok(Fragment {
        component,
        r#type: canonical_type,
        summary,
        refs,
        source_id: source_id.to_string(),
    })
}
