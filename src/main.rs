use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use papertrail::git_ops::GitRepo;
use papertrail::manifest::Manifest;
use papertrail::version::Version;
use papertrail::{bump, changelog, discover, pr_policy, render, ui};

#[derive(Parser)]
#[command(
    name = "papertrail",
    about = "Manage changelog fragments and releases"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every fragment in the fragments directory
    Check {
        #[arg(long, default_value = "changelog.d", help = "Fragments directory")]
        fragments: PathBuf,

        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,
    },

    /// Compute the next version from the fragment batch
    Bump {
        #[arg(long, help = "Base version like v1.2.3")]
        base: String,

        #[arg(long, default_value = "changelog.d", help = "Fragments directory")]
        fragments: PathBuf,

        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,
    },

    /// Render a changelog preview for the given fragment files
    Preview {
        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,

        #[arg(required = true, help = "Fragment files to preview")]
        files: Vec<PathBuf>,
    },

    /// Validate the PR title from the CI event payload (reads GITHUB_EVENT_PATH)
    PrTitle {
        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,
    },

    /// Require a changelog fragment in the PR diff (reads GITHUB_EVENT_PATH)
    PrFragment {
        #[arg(long, help = "Base ref to diff against, e.g. origin/main")]
        base_ref: String,

        #[arg(long, default_value = "changelog.d", help = "Fragments directory")]
        fragments: PathBuf,

        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,
    },

    /// Merge the fragment batch into the changelog as one release
    Merge {
        #[arg(long, help = "Release version like v1.2.3")]
        version: String,

        #[arg(long, help = "Release date YYYY-MM-DD (default: today UTC)")]
        date: Option<String>,

        #[arg(long, default_value = "changelog.d", help = "Fragments directory")]
        fragments: PathBuf,

        #[arg(long, default_value = "CHANGELOG.md", help = "Changelog path")]
        changelog: PathBuf,

        #[arg(
            long,
            default_value = "changelog.d/archived",
            help = "Archive directory"
        )]
        archive: PathBuf,

        #[arg(long, help = "Write release notes body to this path")]
        release_notes_out: Option<PathBuf>,

        #[arg(long, help = "Optional release config YAML path")]
        manifest: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check {
            fragments,
            manifest,
        } => cmd_check(&fragments, manifest.as_deref()),
        Command::Bump {
            base,
            fragments,
            manifest,
        } => cmd_bump(&base, &fragments, manifest.as_deref()),
        Command::Preview { manifest, files } => cmd_preview(&files, manifest.as_deref()),
        Command::PrTitle { manifest } => cmd_pr_title(manifest.as_deref()),
        Command::PrFragment {
            base_ref,
            fragments,
            manifest,
        } => cmd_pr_fragment(&base_ref, &fragments, manifest.as_deref()),
        Command::Merge {
            version,
            date,
            fragments,
            changelog,
            archive,
            release_notes_out,
            manifest,
        } => cmd_merge(
            &version,
            date.as_deref(),
            &fragments,
            &changelog,
            &archive,
            release_notes_out.as_deref(),
            manifest.as_deref(),
        ),
    };

    if let Err(err) = result {
        ui::display_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn cmd_check(fragments_dir: &Path, manifest_path: Option<&Path>) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let files = list_non_empty(fragments_dir)?;
    discover::check_fragments(&files, &manifest)?;
    Ok(())
}

fn cmd_bump(base: &str, fragments_dir: &Path, manifest_path: Option<&Path>) -> Result<()> {
    let base = Version::parse(base).context("invalid --base")?;
    let manifest = Manifest::load(manifest_path)?;
    let files = list_non_empty(fragments_dir)?;
    let fragments = discover::load_fragments(&files, &manifest)?;

    let level = bump::aggregate_level(&manifest, &fragments);
    println!("{}", base.bump(level));
    Ok(())
}

fn cmd_preview(files: &[PathBuf], manifest_path: Option<&Path>) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let fragments = discover::load_fragments(files, &manifest)?;
    print!("{}", render::render_preview(&fragments, &manifest));
    Ok(())
}

fn cmd_pr_title(manifest_path: Option<&Path>) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let policy = &manifest.pr_policy;
    if !policy.title_enabled {
        return Ok(());
    }

    let event_path = github_event_path()?;
    let (title, _) = pr_policy::read_pr_event(&event_path)?;
    pr_policy::validate_title(policy, &title)?;
    Ok(())
}

fn cmd_pr_fragment(
    base_ref: &str,
    fragments_dir: &Path,
    manifest_path: Option<&Path>,
) -> Result<()> {
    if base_ref.trim().is_empty() {
        bail!("--base-ref is required");
    }

    let manifest = Manifest::load(manifest_path)?;
    let policy = &manifest.pr_policy;

    let event_path = github_event_path()?;
    let (_, labels) = pr_policy::read_pr_event(&event_path)?;

    let repo = GitRepo::discover()?;
    let changed = repo.changed_files(base_ref)?;

    let dir = fragments_dir.to_string_lossy();
    pr_policy::require_fragment_change(policy, &labels, &changed, &dir)?;

    // Validate all fragments in the repo to catch schema drift deterministically.
    let files = list_non_empty(fragments_dir)?;
    discover::check_fragments(&files, &manifest)?;
    Ok(())
}

fn cmd_merge(
    version: &str,
    date: Option<&str>,
    fragments_dir: &Path,
    changelog_path: &Path,
    archive_dir: &Path,
    release_notes_out: Option<&Path>,
    manifest_path: Option<&Path>,
) -> Result<()> {
    let version = Version::parse(version).context("invalid --version")?;
    let release_date = resolve_release_date(date)?;

    let manifest = Manifest::load(manifest_path)?;
    let files = list_non_empty(fragments_dir)?;
    let fragments = discover::load_fragments(&files, &manifest)?;

    let (section, notes) =
        render::render_release_section(&version, &release_date, &fragments, &manifest);

    let existing = fs::read_to_string(changelog_path)
        .with_context(|| format!("failed to read {}", changelog_path.display()))?;
    let updated = changelog::insert_release_section(&existing, &version, &section)?;
    fs::write(changelog_path, updated)
        .with_context(|| format!("failed to write {}", changelog_path.display()))?;

    if let Some(notes_path) = release_notes_out {
        fs::write(notes_path, &notes)
            .with_context(|| format!("failed to write {}", notes_path.display()))?;
    }

    discover::archive_fragments(&files, archive_dir, &version)?;

    ui::display_success(&format!(
        "Merged {} ({} fragments) into {}",
        version,
        fragments.len(),
        changelog_path.display()
    ));
    Ok(())
}

fn list_non_empty(fragments_dir: &Path) -> Result<Vec<PathBuf>> {
    let files = discover::list_fragment_files(fragments_dir)?;
    if files.is_empty() {
        bail!("no fragments found under {:?}", fragments_dir);
    }
    Ok(files)
}

fn github_event_path() -> Result<PathBuf> {
    let path = env::var("GITHUB_EVENT_PATH").unwrap_or_default();
    let path = path.trim();
    if path.is_empty() {
        bail!("GITHUB_EVENT_PATH is required");
    }
    Ok(PathBuf::from(path))
}

fn resolve_release_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(date) => {
            let valid =
                date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
            if !valid {
                bail!("invalid --date {:?} (expected YYYY-MM-DD)", date);
            }
            Ok(date.to_string())
        }
        None => Ok(Utc::now().format("%Y-%m-%d").to_string()),
    }
}
