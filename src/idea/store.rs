//! Filesystem-backed idea storage.
//!
//! A directory store is a small on-disk table:
//!
//! ```text
//! <root>/
//!   nextid    # "<uint>\n" — the next id to assign, monotonic, never reused
//!   active    # newline-separated ids of active ideas, set semantics
//!   <id>      # one file per idea, in the idea text format
//! ```
//!
//! Every mutation is described by the [`CommitRequest`] it returns instead
//! of being committed here; the caller owns the commit sequence.
//!
//! Single-process, single-writer. All file operations are full overwrites
//! with no locking, so a crash between writing an idea file and rewriting
//! `active` can leave the two inconsistent. That window is accepted, not
//! mitigated: journals have one writer, and the enclosing git history is the
//! recovery mechanism.

use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::{fs, num};

use crate::git::CommitRequest;
use crate::idea::scanner::IdeaScanner;
use crate::idea::{HeaderFormatError, Idea, Status};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The directory does not hold a valid store: `nextid` is missing or
    /// unparsable. Callers may treat this as "not yet initialized".
    #[error("invalid directory store: {0}")]
    InvalidStore(String),

    /// `init` was called on a directory that already holds a store.
    #[error("init on existing directory store")]
    AlreadyInitialized,

    /// An update matched the stored idea byte for byte. Control flow, not a
    /// failure: nothing was written and there is nothing to commit.
    #[error("idea was not modified")]
    NotModified,

    /// A new-idea save was handed an idea that already carries an id.
    #[error("cannot save a new idea that already has an id")]
    IdeaExists,

    #[error("no idea found in {0}")]
    EmptyIdeaFile(PathBuf),

    #[error(transparent)]
    Header(#[from] HeaderFormatError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

pub struct DirectoryStore {
    root: PathBuf,
}

/// Reads and validates the `nextid` counter under `root`.
fn read_next_id(root: &Path) -> Result<u32> {
    let path = root.join("nextid");
    let invalid = |detail: &dyn std::fmt::Display| {
        StoreError::InvalidStore(format!("{}: {detail}", path.display()))
    };

    let data = fs::read_to_string(&path).map_err(|e| invalid(&e))?;
    data.trim()
        .parse()
        .map_err(|e: num::ParseIntError| invalid(&e))
}

impl DirectoryStore {
    /// Opens an existing store, validating its structure.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        read_next_id(&root)?;
        Ok(Self { root })
    }

    /// Initializes an empty store in `root` (which must exist).
    ///
    /// Writes `nextid = 1` and an empty `active` index, and returns the
    /// store plus the commit request describing both files.
    pub fn init(root: impl Into<PathBuf>) -> Result<(Self, CommitRequest)> {
        let root = root.into();
        if read_next_id(&root).is_ok() {
            return Err(StoreError::AlreadyInitialized);
        }

        fs::write(root.join("nextid"), "1\n")?;
        fs::write(root.join("active"), "")?;

        let mut request = CommitRequest::in_dir(&root);
        request.add("nextid");
        request.add("active");
        request.message = "idea directory store initialized".to_string();

        Ok((Self { root }, request))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves `idea`, dispatching on its identity: an unassigned idea
    /// (`id == 0`) is created, anything else is an update.
    pub fn save_idea(&self, idea: &mut Idea) -> Result<CommitRequest> {
        if idea.id == 0 {
            self.save_new_idea(idea)
        } else {
            self.update_idea(idea)
        }
    }

    /// Assigns the next id to `idea` and persists it.
    ///
    /// The commit request lists only the files actually touched: `nextid`,
    /// the idea file, and `active` only when the idea is active.
    pub fn save_new_idea(&self, idea: &mut Idea) -> Result<CommitRequest> {
        if idea.id != 0 {
            return Err(StoreError::IdeaExists);
        }

        let next_id = read_next_id(&self.root)?;
        idea.id = next_id;

        let mut request = CommitRequest::in_dir(&self.root);

        fs::write(self.root.join("nextid"), format!("{}\n", next_id + 1))?;
        request.add("nextid");

        fs::write(self.root.join(idea.id.to_string()), idea.render())?;
        request.add(idea.id.to_string());

        if idea.status == Status::Active {
            self.append_to_active_index(idea.id)?;
            request.add("active");
        }

        request.message = format!("idea - created - {}", idea.id);
        Ok(request)
    }

    /// Overwrites the stored idea with `idea`, maintaining the active index
    /// across status transitions.
    ///
    /// An update whose rendering is byte-identical to the stored file
    /// returns [`StoreError::NotModified`] and writes nothing. The guard is
    /// byte-level on purpose: a hand-edited idea file that parses to the
    /// same value is still rewritten into the canonical rendering.
    pub fn update_idea(&self, idea: &Idea) -> Result<CommitRequest> {
        let path = self.root.join(idea.id.to_string());
        let stored = fs::read_to_string(&path)?;
        if idea.render() == stored {
            return Err(StoreError::NotModified);
        }

        let on_disk = match IdeaScanner::new(&stored).next() {
            Some(Ok(idea)) => idea,
            Some(Err(err)) => return Err(err.into()),
            None => return Err(StoreError::EmptyIdeaFile(path)),
        };

        let mut request = CommitRequest::in_dir(&self.root);

        fs::write(self.root.join(idea.id.to_string()), idea.render())?;
        request.add(idea.id.to_string());

        if idea.status != on_disk.status {
            if idea.status == Status::Active {
                self.append_to_active_index(idea.id)?;
                request.add("active");
            } else if on_disk.status == Status::Active {
                self.remove_from_active_index(idea.id)?;
                request.add("active");
            }
        }

        request.message = format!("idea - updated - {}", idea.id);
        Ok(request)
    }

    /// Loads every idea listed in the active index, in index order.
    pub fn active_ideas(&self) -> Result<Vec<Idea>> {
        let index = fs::read_to_string(self.root.join("active"))?;

        let mut ideas = Vec::new();
        for line in index.lines() {
            let id = line.trim().parse().map_err(|e| {
                StoreError::InvalidStore(format!("active index entry {line:?}: {e}"))
            })?;
            ideas.push(self.idea_by_id(id)?);
        }
        Ok(ideas)
    }

    /// Loads the idea stored under `id`.
    pub fn idea_by_id(&self, id: u32) -> Result<Idea> {
        let path = self.root.join(id.to_string());
        let text = fs::read_to_string(&path)?;

        match IdeaScanner::new(&text).next() {
            Some(Ok(idea)) => Ok(idea),
            Some(Err(err)) => Err(err.into()),
            None => Err(StoreError::EmptyIdeaFile(path)),
        }
    }

    /// Loads every stored idea, skipping the `nextid` and `active` index
    /// files, ordered by id.
    pub fn ideas(&self) -> Result<Vec<Idea>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Idea files are named by their decimal id; anything else in
            // the directory is not an idea.
            if let Ok(id) = entry.file_name().to_string_lossy().parse::<u32>() {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        ids.into_iter().map(|id| self.idea_by_id(id)).collect()
    }

    fn append_to_active_index(&self, id: u32) -> Result<()> {
        let mut index = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join("active"))?;
        writeln!(index, "{id}")?;
        Ok(())
    }

    /// Rewrites the active index with `id` filtered out, preserving the
    /// order of the remainder.
    fn remove_from_active_index(&self, id: u32) -> Result<()> {
        let index = fs::read_to_string(self.root.join("active"))?;
        let remainder: String = index
            .lines()
            .filter(|line| line.trim() != id.to_string())
            .map(|line| format!("{line}\n"))
            .collect();
        fs::write(self.root.join("active"), remainder)?;
        Ok(())
    }
}
