//! The journal fix pipeline.
//!
//! Upgrades a journal directory from the legacy flat layout (entry files
//! loose at the top level, ideas embedded inside them) to the current
//! `entry/` + `idea/` layout. Every step ends in exactly one git commit, and
//! [`fix`] returns the ordered reference log of commit ids — one per step —
//! for audit. There is no rollback: each commit is a durable checkpoint, so
//! an aborted run leaves a directory that can be inspected and resumed by a
//! human via the log.

pub mod entry;
pub mod rules;

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::{fmt, fs};

pub use entry::Entry;

use crate::git::{self, CommitRequest, GitError};
use crate::idea::HeaderFormatError;
use crate::idea::scanner::IdeaScanner;
use crate::idea::store::{DirectoryStore, StoreError};
use crate::stamp::{Stamp, StampError};

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error("opening line isn't a timestamp: {0:?}")]
    BadOpeningStamp(String),

    #[error("no closing timestamp found while stripping ideas")]
    MissingClosingStamp,

    #[error("no legacy entries to migrate; use `journal init` for a fresh directory")]
    NoEntries,

    #[error("failed to move {path} into entry/: {source}")]
    Move {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error(transparent)]
    Header(#[from] HeaderFormatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A fix run that aborted partway.
///
/// Carries the commits that landed before the failure so a caller can show
/// exactly how far the migration progressed.
#[derive(Debug, thiserror::Error)]
pub struct FixFailure {
    pub ref_log: Vec<String>,
    #[source]
    pub error: FixError,
}

impl fmt::Display for FixFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fix aborted after {} commit(s): {}",
            self.ref_log.len(),
            self.error
        )
    }
}

/// True when the directory still carries the legacy layout: candidate entry
/// files loose at the top level, or no `entry/` directory at all.
///
/// Idempotent and error-free on an already-fixed journal.
pub fn needs_fixed(dir: &Path) -> Result<bool, FixError> {
    Ok(!candidate_entries(dir)?.is_empty() || !dir.join("entry").is_dir())
}

/// Runs the full migration, committing each step, and returns the ordered
/// reference log of commit ids.
///
/// A journal that doesn't need fixing is a no-op with an empty log. Any
/// step failure aborts immediately with the partial log; the on-disk state
/// and commit history up to that point remain as committed.
pub fn fix(dir: &Path) -> Result<Vec<String>, FixFailure> {
    let mut ref_log = Vec::new();
    match run(dir, &mut ref_log) {
        Ok(()) => Ok(ref_log),
        Err(error) => Err(FixFailure { ref_log, error }),
    }
}

fn run(dir: &Path, ref_log: &mut Vec<String>) -> Result<(), FixError> {
    if !needs_fixed(dir)? {
        return Ok(());
    }

    // Nothing to migrate means there is nothing for the move step to
    // commit; bail before the begin marker rather than leave it dangling.
    let entries = candidate_entries(dir)?;
    if entries.is_empty() {
        return Err(FixError::NoEntries);
    }

    commit_empty_step(dir, "fix - begin", ref_log)?;

    // Relocate everything into entry/.
    let moved = move_entries(dir, &entries)?;
    let mut request = CommitRequest::in_dir(dir);
    for (src, dst) in entries.iter().zip(&moved) {
        // Staging both sides of the rename lets git record it as one.
        request.add(src);
        request.add(dst);
    }
    request.message = "moved all entries to entry/".to_string();
    commit_step(&request, dir, ref_log)?;

    // Stand up the idea store under idea/.
    create_dir_if_missing(&dir.join("idea"))?;
    let (store, request) = DirectoryStore::init(dir.join("idea"))?;
    commit_step(&request, dir, ref_log)?;

    // Migrate embedded ideas into the store, reconciling identity by name:
    // the same idea carried across several historical entries must end up
    // as one record, created once and updated thereafter.
    for entry_path in &moved {
        let text = fs::read_to_string(dir.join(entry_path))?;
        for idea in IdeaScanner::new(&text) {
            let mut idea = idea?;
            if let Some(existing) = store.ideas()?.into_iter().find(|i| i.name == idea.name) {
                idea.id = existing.id;
            }

            let mut request = match store.save_idea(&mut idea) {
                Ok(request) => request,
                // The same idea can reappear unchanged in a later entry.
                Err(StoreError::NotModified) => continue,
                Err(err) => return Err(err.into()),
            };
            request.message = format!("{} - src:{entry_path}", request.message);
            commit_step(&request, dir, ref_log)?;
        }
    }

    // Rewrite each entry into the current format.
    for entry_path in &moved {
        let path = dir.join(entry_path);
        let entry = Entry::from_file(&path)?;
        if !entry.needs_fixed() {
            continue;
        }

        let (fixed, mut request) = entry.fixed()?;
        fs::write(&path, fixed.text())?;

        request.dir = dir.to_path_buf();
        request.add(entry_path);
        request.message = format!("{} - {entry_path}", request.message);
        commit_step(&request, dir, ref_log)?;
    }

    commit_empty_step(dir, "fix - completed", ref_log)?;
    Ok(())
}

/// Top-level files whose names parse as filename stamps, sorted ascending so
/// the migration replays oldest first. Everything else — including version
/// control metadata, which is a directory — is ignored.
fn candidate_entries(dir: &Path) -> Result<Vec<String>, FixError> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if let Ok(stamp) = Stamp::parse_filename(&name) {
            entries.push((stamp.datetime(), name));
        }
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries.into_iter().map(|(_, name)| name).collect())
}

fn move_entries(dir: &Path, entries: &[String]) -> Result<Vec<String>, FixError> {
    create_dir_if_missing(&dir.join("entry"))?;

    let mut moved = Vec::with_capacity(entries.len());
    for name in entries {
        let destination = format!("entry/{name}");
        fs::rename(dir.join(name), dir.join(&destination)).map_err(|source| FixError::Move {
            path: dir.join(name),
            source,
        })?;
        moved.push(destination);
    }
    Ok(moved)
}

fn create_dir_if_missing(path: &Path) -> Result<(), FixError> {
    if let Err(err) = fs::create_dir(path) {
        if err.kind() != ErrorKind::AlreadyExists {
            return Err(err.into());
        }
    }
    Ok(())
}

fn commit_step(request: &CommitRequest, dir: &Path, ref_log: &mut Vec<String>) -> Result<(), FixError> {
    git::commit(request)?;
    ref_log.push(git::rev_parse_head(dir)?);
    Ok(())
}

fn commit_empty_step(dir: &Path, message: &str, ref_log: &mut Vec<String>) -> Result<(), FixError> {
    git::commit_empty(dir, message)?;
    ref_log.push(git::rev_parse_head(dir)?);
    Ok(())
}
