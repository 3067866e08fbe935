//! Subprocess wrapper around the `git` binary.
//!
//! Every mutation the journal makes is described as a [`CommitRequest`]:
//! which paths changed under which working directory, and the message to
//! commit them with. [`commit`] turns one request into `git add` calls plus
//! a single `git commit`. Nothing here retries; a failed git invocation is
//! an unrecoverable local-environment problem and surfaces its stderr.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] io::Error),

    #[error("`git {command}` failed: {detail}")]
    Command { command: String, detail: String },

    #[error("directory is dirty")]
    Dirty,
}

pub type Result<T> = core::result::Result<T, GitError>;

/// One unit of commit-worthy work.
///
/// A plain data value rather than a behavioral interface: the store, the
/// entry fixer, and the fix pipeline all describe their changes this way and
/// leave the actual committing to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRequest {
    /// The git working directory the paths are relative to.
    pub dir: PathBuf,

    /// Every file this change touched.
    pub paths: Vec<PathBuf>,

    /// The commit message.
    pub message: String,
}

impl CommitRequest {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Records a changed path, relative to the working directory.
    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }
}

fn run<S: AsRef<OsStr>>(dir: &Path, args: &[S]) -> Result<Output> {
    let output = Command::new("git")
        .args(args.iter().map(AsRef::as_ref))
        .current_dir(dir)
        .output()?;

    if !output.status.success() {
        let command = args
            .iter()
            .map(|arg| arg.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        return Err(GitError::Command {
            command,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// `git init` in `dir`. The directory must already exist.
pub fn init(dir: &Path) -> Result<()> {
    run(dir, &["init"]).map(|_| ())
}

/// True when `dir` is inside a git work tree.
pub fn is_repository(dir: &Path) -> bool {
    dir.is_dir() && run(dir, &["rev-parse", "--git-dir"]).is_ok()
}

/// `git status -s`: any output means the work tree is dirty.
pub fn is_clean(dir: &Path) -> Result<()> {
    let output = run(dir, &["status", "-s"])?;
    if output.stdout.is_empty() {
        Ok(())
    } else {
        Err(GitError::Dirty)
    }
}

/// `git add --all {path}`, staging additions, modifications, and deletions.
pub fn add_path(dir: &Path, path: &Path) -> Result<()> {
    run(
        dir,
        &[OsStr::new("add"), OsStr::new("--all"), path.as_os_str()],
    )
    .map(|_| ())
}

pub fn commit_with_message(dir: &Path, message: &str) -> Result<()> {
    run(dir, &["commit", "-m", message]).map(|_| ())
}

pub fn commit_empty(dir: &Path, message: &str) -> Result<()> {
    run(dir, &["commit", "--allow-empty", "-m", message]).map(|_| ())
}

/// The commit id of `HEAD`.
pub fn rev_parse_head(dir: &Path) -> Result<String> {
    let output = run(dir, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `git show {args}`, for inspecting committed state.
pub fn show(dir: &Path, args: &[&str]) -> Result<Vec<u8>> {
    let mut full = vec!["show"];
    full.extend_from_slice(args);
    run(dir, &full).map(|output| output.stdout)
}

/// `git add` each changed path, then one commit with the request's message.
pub fn commit(request: &CommitRequest) -> Result<()> {
    for path in &request.paths {
        add_path(&request.dir, path)?;
    }
    commit_with_message(&request.dir, &request.message)
}

/// A fresh repository with an identity configured, so test commits succeed
/// regardless of the machine's global git config.
#[cfg(test)]
pub(crate) fn init_test_repo(dir: &Path) {
    init(dir).unwrap();
    run(dir, &["config", "user.name", "journal-test"]).unwrap();
    run(dir, &["config", "user.email", "journal-test@localhost"]).unwrap();
}
