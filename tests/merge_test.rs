// tests/merge_test.rs
//
// Drives the full release-assembly flow through the library API the way the
// merge subcommand does: scan, validate, bump, render, insert, archive.

use std::fs;
use std::path::Path;

use papertrail::manifest::Manifest;
use papertrail::version::Version;
use papertrail::{bump, changelog, discover, render};

fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_full_release_flow() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "changelog.d/20250101_fix.yml",
        "component: CLI\ntype: bugfix\nsummary: fix crash on empty input\nrefs:\n  - \"#42\"\n",
    );
    write_file(
        dir.path(),
        "changelog.d/20250102_feature.yml",
        "component: GitHub Actions\ntype: new feature\nsummary: add caching!\n",
    );
    write_file(
        dir.path(),
        "CHANGELOG.md",
        "# Changelog\n\n## v0.1.0 (2025-01-01)\n\n- old entry\n",
    );

    let manifest = Manifest::default();
    let fragments_dir = dir.path().join("changelog.d");
    let changelog_path = dir.path().join("CHANGELOG.md");

    let files = discover::list_fragment_files(&fragments_dir).unwrap();
    assert_eq!(files.len(), 2);

    let fragments = discover::load_fragments(&files, &manifest).unwrap();

    // One NEW FEATURE fragment: the batch bumps minor under the legacy
    // zero-config heuristic.
    let level = bump::aggregate_level(&manifest, &fragments);
    let version = Version::parse("v0.1.0").unwrap().bump(level);
    assert_eq!(version.to_string(), "v0.2.0");

    let (section, notes) =
        render::render_release_section(&version, "2025-06-01", &fragments, &manifest);

    let existing = fs::read_to_string(&changelog_path).unwrap();
    let updated = changelog::insert_release_section(&existing, &version, &section).unwrap();
    fs::write(&changelog_path, &updated).unwrap();

    let archive_dir = fragments_dir.join("archived");
    discover::archive_fragments(&files, &archive_dir, &version).unwrap();

    // New section sits above the previous release, preamble intact.
    let merged = fs::read_to_string(&changelog_path).unwrap();
    assert!(merged.starts_with("# Changelog\n\n## v0.2.0 (2025-06-01)\n"));
    let new_idx = merged.find("## v0.2.0").unwrap();
    let old_idx = merged.find("## v0.1.0").unwrap();
    assert!(new_idx < old_idx);
    assert!(merged.ends_with("- old entry\n"));

    // CLI group precedes GitHub Actions per the default component order;
    // the '!' summary keeps its own punctuation.
    let cli_idx = merged.find("### CLI").unwrap();
    let gha_idx = merged.find("### GitHub Actions").unwrap();
    assert!(cli_idx < gha_idx);
    assert!(merged.contains("- **bugfix**: fix crash on empty input.\n"));
    assert!(merged.contains("- **new feature**: add caching!\n"));

    // Release notes share the body but carry the undated heading.
    assert!(notes.starts_with("## v0.2.0\n\n"));
    assert!(notes.contains("- **new feature**: add caching!\n"));

    // Fragments moved under the version directory.
    assert!(archive_dir.join("v0.2.0").join("20250101_fix.yml").exists());
    assert!(archive_dir
        .join("v0.2.0")
        .join("20250102_feature.yml")
        .exists());
    assert!(discover::list_fragment_files(&fragments_dir)
        .unwrap()
        .is_empty());

    // A second merge of the same version must fail and change nothing.
    let err = changelog::insert_release_section(&merged, &version, &section).unwrap_err();
    assert!(err.to_string().contains("already contains"));
    assert_eq!(fs::read_to_string(&changelog_path).unwrap(), merged);
}

#[test]
fn test_check_reports_all_invalid_fragments_sorted() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "changelog.d/b_unknown_type.yml",
        "component: CLI\ntype: MYSTERY\nsummary: x\n",
    );
    write_file(
        dir.path(),
        "changelog.d/a_missing_summary.yml",
        "component: CLI\ntype: bugfix\n",
    );
    write_file(
        dir.path(),
        "changelog.d/ok.yml",
        "component: CLI\ntype: bugfix\nsummary: fine\n",
    );

    let manifest = Manifest::default();
    let files = discover::list_fragment_files(&dir.path().join("changelog.d")).unwrap();
    let err = discover::check_fragments(&files, &manifest).unwrap_err();
    let msg = err.to_string();

    let idx_a = msg.find("a_missing_summary.yml").unwrap();
    let idx_b = msg.find("b_unknown_type.yml").unwrap();
    assert!(idx_a < idx_b);
    assert!(msg.contains("missing required field: summary"));
    assert!(msg.contains("unknown type"));
    assert!(!msg.contains("ok.yml"));
}

#[test]
fn test_strict_components_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "config.yml",
        "changelog:\n  components: [\"Core\"]\n  strict_components: true\n",
    );
    write_file(
        dir.path(),
        "changelog.d/oops.yml",
        "component: Elsewhere\ntype: bugfix\nsummary: x\n",
    );

    let manifest = Manifest::load(Some(&dir.path().join("config.yml"))).unwrap();
    let files = discover::list_fragment_files(&dir.path().join("changelog.d")).unwrap();
    let err = discover::load_fragments(&files, &manifest).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("oops.yml"));
    assert!(msg.contains("unknown component"));
}
