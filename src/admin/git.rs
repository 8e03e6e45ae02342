//! Thin wrapper around the `git` command line

use crate::error::GitoliteError;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Runs git commands inside one working copy
#[derive(Debug, Clone)]
pub struct GitCli {
    work_tree: PathBuf,
    ssh_command: Option<String>,
}

impl GitCli {
    #[must_use]
    pub fn new(work_tree: impl Into<PathBuf>, ssh_command: Option<String>) -> Self {
        Self {
            work_tree: work_tree.into(),
            ssh_command,
        }
    }

    #[must_use]
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Clone `url` into the working copy path
    ///
    /// # Errors
    ///
    /// Returns a git error if the clone fails
    pub fn clone_from(&self, url: &str, branch: &str) -> Result<()> {
        let target = self
            .work_tree
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Failed to convert working copy path to string"))?;

        let mut command = Command::new("git");
        command.args(["clone", "--branch", branch, url, target]);
        let output = self.spawn(command, "clone")?;
        check(&output, &format!("Failed to clone '{url}'"))
    }

    /// Whether the working copy is inside a git work tree
    #[must_use]
    pub fn is_work_tree(&self) -> bool {
        self.output(&["rev-parse", "--is-inside-work-tree"])
            .is_ok_and(|output| {
                output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true"
            })
    }

    /// Whether `HEAD` points at a commit
    #[must_use]
    pub fn has_commits(&self) -> bool {
        self.output(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .is_ok_and(|output| output.status.success())
    }

    /// Stage `paths`, including deletions
    ///
    /// # Errors
    ///
    /// Returns a git error if staging fails
    pub fn add_all(&self, paths: &[&Path]) -> Result<()> {
        let mut args = vec!["add".to_owned(), "--all".to_owned(), "--".to_owned()];
        args.extend(paths.iter().map(|path| path.to_string_lossy().into_owned()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args, "Failed to stage changes")
    }

    /// Whether the index differs from `HEAD`
    ///
    /// # Errors
    ///
    /// Returns a git error if git cannot compare the index
    pub fn has_staged_changes(&self) -> Result<bool> {
        let output = self.output(&["diff", "--cached", "--quiet"])?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_error(&output, "Failed to inspect the index")),
        }
    }

    /// Commit the index with an explicit author and committer
    ///
    /// # Errors
    ///
    /// Returns a git error if the commit fails
    pub fn commit(&self, message: &str, author_name: &str, author_email: &str) -> Result<()> {
        let name = format!("user.name={author_name}");
        let email = format!("user.email={author_email}");
        self.run(
            &["-c", &name, "-c", &email, "commit", "--quiet", "-m", message],
            "Failed to commit",
        )
    }

    /// Push `branch` to `origin`
    ///
    /// # Errors
    ///
    /// Returns a git error if the push is rejected or fails
    pub fn push(&self, branch: &str) -> Result<()> {
        self.run(&["push", "--quiet", "origin", branch], "Failed to push")
    }

    /// Fetch from `origin`
    ///
    /// # Errors
    ///
    /// Returns a git error if the fetch fails
    pub fn fetch(&self) -> Result<()> {
        self.run(&["fetch", "--quiet", "origin"], "Failed to fetch")
    }

    /// Merge `origin/<branch>` into the current branch
    ///
    /// # Errors
    ///
    /// Returns a git error if the merge fails
    pub fn merge_remote(&self, branch: &str) -> Result<()> {
        let target = format!("origin/{branch}");
        self.run(
            &["merge", "--quiet", "--ff", "--no-edit", &target],
            "Failed to merge",
        )
    }

    /// Hard reset to `origin/<branch>`
    ///
    /// # Errors
    ///
    /// Returns a git error if the reset fails
    pub fn reset_hard(&self, branch: &str) -> Result<()> {
        let target = format!("origin/{branch}");
        self.run(&["reset", "--quiet", "--hard", &target], "Failed to reset")
    }

    fn run(&self, args: &[&str], failure: &str) -> Result<()> {
        let output = self.output(args)?;
        check(&output, failure)
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let mut command = Command::new("git");
        command.args(args).current_dir(&self.work_tree);
        self.spawn(command, args.first().copied().unwrap_or("git"))
    }

    fn spawn(&self, mut command: Command, name: &str) -> Result<Output> {
        if let Some(ssh) = &self.ssh_command {
            command.env("GIT_SSH_COMMAND", ssh);
        }
        debug!("Running git {name} in {}", self.work_tree.display());
        command
            .output()
            .with_context(|| format!("Failed to execute git {name}"))
    }
}

fn check(output: &Output, failure: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(git_error(output, failure))
}

fn git_error(output: &Output, failure: &str) -> anyhow::Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    GitoliteError::git(format!("{failure}: {}", stderr.trim())).into()
}
