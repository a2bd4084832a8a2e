use crate::fragment::Fragment;
use crate::manifest::Manifest;
use crate::version::BumpLevel;

/// Determine the bump level for a single fragment type.
///
/// Lookup priority:
/// 1. An explicit rule for this exact canonical type
/// 2. The wildcard "*" rule
/// 3. With no rules configured at all, a fixed legacy heuristic
///    (BREAKING CHANGE => major, NEW FEATURE => minor, else patch)
/// 4. Otherwise patch - an unmatched type under a partially-configured
///    rule set is intentional "default to patch" policy, not an error
pub fn level_for_type(manifest: &Manifest, fragment_type: &str) -> BumpLevel {
    let fragment_type = fragment_type.trim().to_uppercase();

    if manifest.bump_rules.is_empty() {
        return match fragment_type.as_str() {
            "BREAKING CHANGE" => BumpLevel::Major,
            "NEW FEATURE" => BumpLevel::Minor,
            _ => BumpLevel::Patch,
        };
    }

    if let Some(&level) = manifest.bump_rules.get(&fragment_type) {
        return level;
    }
    if let Some(&level) = manifest.bump_rules.get("*") {
        return level;
    }
    BumpLevel::Patch
}

/// Aggregate the bump level over a fragment batch by maximum.
pub fn aggregate_level(manifest: &Manifest, fragments: &[Fragment]) -> BumpLevel {
    let mut level = BumpLevel::Patch;
    for fragment in fragments {
        level = level.max(level_for_type(manifest, &fragment.r#type));
        if level == BumpLevel::Major {
            // Nothing outranks major.
            break;
        }
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{validate, RawFragment};
    use crate::manifest::RawManifest;
    use crate::version::Version;

    fn manifest_from_yaml(yaml: &str) -> Manifest {
        let raw: RawManifest = serde_yaml::from_str(yaml).unwrap();
        Manifest::resolve(raw).unwrap()
    }

    fn fragment(r#type: &str, manifest: &Manifest) -> Fragment {
        validate(
            RawFragment {
                component: "CLI".to_string(),
                r#type: r#type.to_string(),
                summary: "something changed".to_string(),
                refs: Vec::new(),
            },
            "f.yml",
            manifest,
        )
        .unwrap()
    }

    #[test]
    fn test_zero_config_legacy_heuristic() {
        let manifest = Manifest::default();
        assert_eq!(
            level_for_type(&manifest, "BREAKING CHANGE"),
            BumpLevel::Major
        );
        assert_eq!(level_for_type(&manifest, "NEW FEATURE"), BumpLevel::Minor);
        assert_eq!(level_for_type(&manifest, "BUGFIX"), BumpLevel::Patch);
    }

    #[test]
    fn test_zero_config_legacy_bump() {
        let manifest = Manifest::default();
        let fragments = vec![
            fragment("BREAKING CHANGE", &manifest),
            fragment("PATCH", &manifest),
        ];
        let level = aggregate_level(&manifest, &fragments);
        let next = Version::parse("v1.2.3").unwrap().bump(level);
        assert_eq!(next.to_string(), "v2.0.0");
    }

    #[test]
    fn test_exact_rule_beats_wildcard() {
        let manifest = manifest_from_yaml(
            r#"
versioning:
  rules:
    BUGFIX: minor
    "*": major
"#,
        );
        assert_eq!(level_for_type(&manifest, "BUGFIX"), BumpLevel::Minor);
        assert_eq!(level_for_type(&manifest, "REFACTOR"), BumpLevel::Major);
    }

    #[test]
    fn test_configured_but_unmatched_defaults_to_patch() {
        // Rules exist but none match: the legacy heuristic must NOT kick in.
        let manifest = manifest_from_yaml(
            r#"
versioning:
  rules:
    BREAKING CHANGE: major
"#,
        );
        assert_eq!(level_for_type(&manifest, "NEW FEATURE"), BumpLevel::Patch);

        let fragments = vec![fragment("REFACTOR", &manifest)];
        let level = aggregate_level(&manifest, &fragments);
        let next = Version::parse("v1.2.3").unwrap().bump(level);
        assert_eq!(next.to_string(), "v1.2.4");
    }

    #[test]
    fn test_aggregate_takes_maximum() {
        let manifest = Manifest::default();
        let fragments = vec![
            fragment("PATCH", &manifest),
            fragment("NEW FEATURE", &manifest),
            fragment("DOCS UPDATE", &manifest),
        ];
        assert_eq!(aggregate_level(&manifest, &fragments), BumpLevel::Minor);
    }

    #[test]
    fn test_aggregate_is_monotonic() {
        let manifest = Manifest::default();
        let mut fragments = vec![fragment("PATCH", &manifest)];
        let before = aggregate_level(&manifest, &fragments);

        fragments.push(fragment("BREAKING CHANGE", &manifest));
        let after = aggregate_level(&manifest, &fragments);
        assert!(after >= before);
        assert_eq!(after, BumpLevel::Major);
    }

    #[test]
    fn test_aggregate_empty_batch_is_patch() {
        let manifest = Manifest::default();
        assert_eq!(aggregate_level(&manifest, &[]), BumpLevel::Patch);
    }
}
