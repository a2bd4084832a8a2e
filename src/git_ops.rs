use git2::Repository;

use crate::error::Result;

/// Wrapper around git2 Repository for the diff queries papertrail needs.
pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Discover the repository in the current directory or its parents.
    pub fn discover() -> Result<Self> {
        let repo = Repository::discover(".")?;
        Ok(GitRepo { repo })
    }

    /// Changed file paths between `merge-base(base_ref, HEAD)` and `HEAD`,
    /// sorted and deduplicated.
    ///
    /// Diffing against the merge base rather than the base ref tip keeps
    /// unrelated commits that landed on the base branch out of the result,
    /// matching `git diff <base>...HEAD` semantics.
    pub fn changed_files(&self, base_ref: &str) -> Result<Vec<String>> {
        let base = self.repo.revparse_single(base_ref)?.peel_to_commit()?;
        let head = self.repo.head()?.peel_to_commit()?;

        let merge_base = self.repo.merge_base(base.id(), head.id())?;
        let base_tree = self.repo.find_commit(merge_base)?.tree()?;
        let head_tree = head.tree()?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path {
                files.push(path.to_string_lossy().into_owned());
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}
