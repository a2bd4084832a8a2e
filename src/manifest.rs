use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{PapertrailError, Result};
use crate::version::BumpLevel;

/// Raw manifest document as it appears on disk.
///
/// Every section is optional; resolution fills in built-in defaults and
/// normalizes the tables. Field names mirror the YAML contract
/// (`versioning.rules`, `changelog.components`, `types.order`, ...).
#[derive(Debug, Default, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub versioning: RawVersioning,

    #[serde(default)]
    pub changelog: RawChangelog,

    #[serde(default)]
    pub types: RawTypes,

    #[serde(default)]
    pub pr_policy: RawPrPolicy,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVersioning {
    /// Maps a fragment type (or the wildcard "*") to major|minor|patch.
    #[serde(default)]
    pub rules: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawChangelog {
    /// Preferred order for component headings. Unknown components are
    /// appended deterministically at render time.
    #[serde(default)]
    pub components: Vec<String>,

    /// Legacy alias for `components` (kept for backward compatibility).
    /// Honored only when `components` is empty.
    #[serde(default)]
    pub components_order: Vec<String>,

    #[serde(default)]
    pub strict_components: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTypes {
    /// Allowed fragment types and their preferred output order.
    /// Entries are case-insensitive and normalized during resolution.
    #[serde(default)]
    pub order: Vec<String>,

    /// Maps alternate type spellings to canonical types.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPrPolicy {
    #[serde(default)]
    pub title_validation: RawTitleValidation,

    #[serde(default)]
    pub fragment_requirement: RawFragmentRequirement,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTitleValidation {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allowed_types: Vec<String>,

    #[serde(default)]
    pub type_aliases: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFragmentRequirement {
    #[serde(default)]
    pub opt_out_label: String,
}

/// Returns the default component heading order.
fn default_component_order() -> Vec<String> {
    vec!["CLI".to_string(), "GitHub Actions".to_string()]
}

/// Returns the default fragment type order.
fn default_type_order() -> Vec<String> {
    vec![
        "BREAKING CHANGE".to_string(),
        "NEW FEATURE".to_string(),
        "BUGFIX".to_string(),
        "PATCH".to_string(),
        "REFACTOR".to_string(),
        "DOCS UPDATE".to_string(),
    ]
}

/// Returns the default allowed PR title types.
fn default_pr_allowed_types() -> Vec<String> {
    vec![
        "feat".to_string(),
        "fix".to_string(),
        "docs".to_string(),
        "chore".to_string(),
        "refactor".to_string(),
        "test".to_string(),
    ]
}

/// Returns the default PR title type aliases.
fn default_pr_type_aliases() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("feature".to_string(), "feat".to_string());
    map.insert("bugfix".to_string(), "fix".to_string());
    map
}

/// Resolved pull-request policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PrPolicy {
    pub title_enabled: bool,
    pub allowed_types: Vec<String>,
    pub type_aliases: HashMap<String, String>,
    pub opt_out_label: String,
}

impl Default for PrPolicy {
    fn default() -> Self {
        PrPolicy {
            title_enabled: false,
            allowed_types: default_pr_allowed_types(),
            type_aliases: default_pr_type_aliases(),
            opt_out_label: "no-changelog".to_string(),
        }
    }
}

/// Fully resolved configuration, immutable for the rest of the run.
///
/// The alias and bump-rule maps are lookup structures only; every ordered
/// output in the crate derives from `type_order` / `component_order`.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub type_aliases: HashMap<String, String>,
    pub type_order: Vec<String>,
    pub component_order: Vec<String>,
    pub strict_components: bool,
    pub bump_rules: HashMap<String, BumpLevel>,
    pub pr_policy: PrPolicy,
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            type_aliases: HashMap::new(),
            type_order: default_type_order(),
            component_order: default_component_order(),
            strict_components: false,
            bump_rules: HashMap::new(),
            pr_policy: PrPolicy::default(),
        }
    }
}

impl Manifest {
    /// Resolve a raw manifest document into normalized tables.
    ///
    /// # Returns
    /// * `Ok(Manifest)` - Every table normalized and internally consistent
    /// * `Err` - A bump rule carries a value outside major|minor|patch
    pub fn resolve(raw: RawManifest) -> Result<Self> {
        let type_aliases = normalize_type_aliases(&raw.types.aliases);
        let type_order = normalize_type_order(&raw.types.order, &type_aliases);
        let component_order =
            resolve_component_order(&raw.changelog.components, &raw.changelog.components_order);
        let bump_rules = resolve_bump_rules(&raw.versioning.rules, &type_aliases)?;

        Ok(Manifest {
            type_aliases,
            type_order,
            component_order,
            strict_components: raw.changelog.strict_components,
            bump_rules,
            pr_policy: resolve_pr_policy(raw.pr_policy),
        })
    }

    /// Load the manifest from an explicit path, a well-known working-directory
    /// file, or built-in defaults.
    ///
    /// Discovery order:
    /// 1. Explicit `path` argument
    /// 2. `.papertrail.config.yml` in the current directory
    /// 3. `papertrail.config.yml` in the current directory
    /// 4. Built-in defaults if no file found
    ///
    /// # Returns
    /// * `Ok(Manifest)` - Loaded or default configuration
    /// * `Err` - If a file exists but cannot be read, parsed, or resolved
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let manifest_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => [".papertrail.config.yml", "papertrail.config.yml"]
                .iter()
                .map(|c| Path::new(c).to_path_buf())
                .find(|c| c.exists()),
        };

        let Some(manifest_path) = manifest_path else {
            return Ok(Manifest::default());
        };

        let contents = fs::read_to_string(&manifest_path)?;
        let raw: RawManifest = serde_yaml::from_str(&contents)
            .map_err(|e| PapertrailError::config(format!("invalid manifest YAML: {}", e)))?;
        Manifest::resolve(raw)
    }

    /// Resolve a type through the alias table after trimming and upper-casing.
    ///
    /// Only the first hop of an alias is honored; the table is closed under
    /// single application.
    pub fn canonical_type(&self, raw_type: &str) -> String {
        let normalized = raw_type.trim().to_uppercase();
        if normalized.is_empty() {
            return normalized;
        }
        match self.type_aliases.get(&normalized) {
            Some(canonical) => canonical.clone(),
            None => normalized,
        }
    }
}

/// Trim and upper-case alias keys and values, discarding empty results.
///
/// Later duplicate keys overwrite earlier ones; declaration order is
/// irrelevant by contract.
fn normalize_type_aliases(raw: &HashMap<String, String>) -> HashMap<String, String> {
    let mut out = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let key = key.trim().to_uppercase();
        let value = value.trim().to_uppercase();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        out.insert(key, value);
    }
    out
}

/// Normalize the configured type order: trim/upper-case, resolve aliases,
/// drop empties, deduplicate preserving first occurrence. An empty result
/// falls back to the built-in default order.
fn normalize_type_order(raw: &[String], aliases: &HashMap<String, String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in raw {
        let mut entry = entry.trim().to_uppercase();
        if entry.is_empty() {
            continue;
        }
        if let Some(canonical) = aliases.get(&entry) {
            entry = canonical.clone();
        }
        if seen.insert(entry.clone()) {
            out.push(entry);
        }
    }
    if out.is_empty() {
        default_type_order()
    } else {
        out
    }
}

/// Resolve the component heading order: primary field if non-empty, else the
/// legacy field, else the built-in default. Entries are trimmed and
/// deduplicated preserving first occurrence; components have no aliases.
fn resolve_component_order(primary: &[String], legacy: &[String]) -> Vec<String> {
    let configured = if primary.is_empty() { legacy } else { primary };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for entry in configured {
        let entry = entry.trim().to_string();
        if entry.is_empty() {
            continue;
        }
        if seen.insert(entry.clone()) {
            out.push(entry);
        }
    }
    if out.is_empty() {
        default_component_order()
    } else {
        out
    }
}

/// Validate and normalize the bump rules.
///
/// Keys are trimmed, upper-cased, and alias-resolved (the literal wildcard
/// "*" is kept as-is); empty keys are dropped. Values must be one of
/// major|minor|patch (case-insensitive) - anything else is a configuration
/// error caught here, before any fragment is processed.
fn resolve_bump_rules(
    raw: &HashMap<String, String>,
    aliases: &HashMap<String, String>,
) -> Result<HashMap<String, BumpLevel>> {
    let mut out = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let mut key = key.trim().to_string();
        if key.is_empty() {
            continue;
        }
        if key != "*" {
            key = key.to_uppercase();
            if let Some(canonical) = aliases.get(&key) {
                key = canonical.clone();
            }
        }
        let level = match value.trim().to_lowercase().as_str() {
            "major" => BumpLevel::Major,
            "minor" => BumpLevel::Minor,
            "patch" => BumpLevel::Patch,
            _ => {
                return Err(PapertrailError::config(format!(
                    "invalid versioning.rules[{:?}]={:?} (expected major|minor|patch)",
                    key, value
                )))
            }
        };
        out.insert(key, level);
    }
    Ok(out)
}

/// Resolve the PR policy, merging field-wise defaults for anything unset.
fn resolve_pr_policy(raw: RawPrPolicy) -> PrPolicy {
    let allowed_types = if raw.title_validation.allowed_types.is_empty() {
        default_pr_allowed_types()
    } else {
        raw.title_validation.allowed_types
    };
    let type_aliases = raw
        .title_validation
        .type_aliases
        .unwrap_or_else(default_pr_type_aliases);
    let opt_out_label = {
        let label = raw.fragment_requirement.opt_out_label.trim().to_string();
        if label.is_empty() {
            "no-changelog".to_string()
        } else {
            label
        }
    };

    PrPolicy {
        title_enabled: raw.title_validation.enabled,
        allowed_types,
        type_aliases,
        opt_out_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_yaml(yaml: &str) -> Result<Manifest> {
        let raw: RawManifest = serde_yaml::from_str(yaml).unwrap();
        Manifest::resolve(raw)
    }

    #[test]
    fn test_default_manifest() {
        let manifest = Manifest::default();
        assert_eq!(manifest.type_order[0], "BREAKING CHANGE");
        assert_eq!(
            manifest.component_order,
            vec!["CLI".to_string(), "GitHub Actions".to_string()]
        );
        assert!(manifest.bump_rules.is_empty());
        assert!(!manifest.strict_components);
    }

    #[test]
    fn test_alias_normalization() {
        let manifest = resolve_yaml(
            r#"
types:
  aliases:
    "  feature ": " new feature "
    "": "dropped"
"#,
        )
        .unwrap();
        assert_eq!(
            manifest.type_aliases.get("FEATURE"),
            Some(&"NEW FEATURE".to_string())
        );
        assert_eq!(manifest.type_aliases.len(), 1);
    }

    #[test]
    fn test_type_order_dedup_and_alias_resolution() {
        let manifest = resolve_yaml(
            r#"
types:
  order: ["breaking change", "Feature", "BREAKING CHANGE", " ", "patch"]
  aliases:
    FEATURE: NEW FEATURE
"#,
        )
        .unwrap();
        assert_eq!(
            manifest.type_order,
            vec![
                "BREAKING CHANGE".to_string(),
                "NEW FEATURE".to_string(),
                "PATCH".to_string()
            ]
        );
    }

    #[test]
    fn test_empty_type_order_falls_back_to_default() {
        let manifest = resolve_yaml("types:\n  order: [\" \", \"\"]\n").unwrap();
        assert_eq!(manifest.type_order, default_type_order());
    }

    #[test]
    fn test_component_order_prefers_primary_over_legacy() {
        let manifest = resolve_yaml(
            r#"
changelog:
  components: ["Core", "Docs"]
  components_order: ["Legacy"]
"#,
        )
        .unwrap();
        assert_eq!(
            manifest.component_order,
            vec!["Core".to_string(), "Docs".to_string()]
        );
    }

    #[test]
    fn test_component_order_legacy_fallback() {
        let manifest = resolve_yaml("changelog:\n  components_order: [\"Legacy\"]\n").unwrap();
        assert_eq!(manifest.component_order, vec!["Legacy".to_string()]);
    }

    #[test]
    fn test_bump_rule_value_validation() {
        let err = resolve_yaml("versioning:\n  rules:\n    PATCH: gigantic\n").unwrap_err();
        assert!(err.to_string().contains("expected major|minor|patch"));
    }

    #[test]
    fn test_bump_rule_keys_are_alias_resolved() {
        let manifest = resolve_yaml(
            r#"
versioning:
  rules:
    feature: minor
    "*": patch
types:
  aliases:
    FEATURE: NEW FEATURE
"#,
        )
        .unwrap();
        assert_eq!(
            manifest.bump_rules.get("NEW FEATURE"),
            Some(&BumpLevel::Minor)
        );
        assert_eq!(manifest.bump_rules.get("*"), Some(&BumpLevel::Patch));
    }

    #[test]
    fn test_bump_rule_values_case_insensitive() {
        let manifest = resolve_yaml("versioning:\n  rules:\n    PATCH: \" Major \"\n").unwrap();
        assert_eq!(manifest.bump_rules.get("PATCH"), Some(&BumpLevel::Major));
    }

    #[test]
    fn test_canonical_type() {
        let manifest = resolve_yaml(
            r#"
types:
  aliases:
    CI: PATCH
"#,
        )
        .unwrap();
        assert_eq!(manifest.canonical_type("ci"), "PATCH");
        assert_eq!(manifest.canonical_type(" bugfix "), "BUGFIX");
    }

    #[test]
    fn test_pr_policy_defaults() {
        let manifest = resolve_yaml("{}").unwrap();
        let policy = &manifest.pr_policy;
        assert!(!policy.title_enabled);
        assert!(policy.allowed_types.contains(&"feat".to_string()));
        assert_eq!(
            policy.type_aliases.get("feature"),
            Some(&"feat".to_string())
        );
        assert_eq!(policy.opt_out_label, "no-changelog");
    }

    #[test]
    fn test_pr_policy_configured() {
        let manifest = resolve_yaml(
            r#"
pr_policy:
  title_validation:
    enabled: true
    allowed_types: ["feat", "fix"]
    type_aliases: {}
  fragment_requirement:
    opt_out_label: " skip-changelog "
"#,
        )
        .unwrap();
        let policy = &manifest.pr_policy;
        assert!(policy.title_enabled);
        assert_eq!(policy.allowed_types, vec!["feat", "fix"]);
        assert!(policy.type_aliases.is_empty());
        assert_eq!(policy.opt_out_label, "skip-changelog");
    }
}
