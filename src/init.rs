//! First-time setup of a journal directory.
//!
//! Initialization mirrors the fix pipeline's checkpoint style: a begin
//! commit, one commit per structural step, and a completion commit, so the
//! history of even a brand-new journal starts with an auditable trail.

use std::io;
use std::path::{Path, PathBuf};
use std::{ffi::OsStr, fs};

use crate::git::{self, GitError};
use crate::idea::store::{DirectoryStore, StoreError};

pub type Result<T> = std::result::Result<T, InitError>;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("{0} already contains files")]
    NotEmpty(PathBuf),

    #[error("directory is already an initialized journal")]
    AlreadyInitialized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// True when the directory is absent or empty. A `.git` directory doesn't
/// count as content; initializing inside a fresh repository is fine.
pub fn can_be_initialized(dir: &Path) -> Result<bool> {
    if !dir.exists() {
        return Ok(true);
    }

    for entry in fs::read_dir(dir)? {
        if entry?.file_name() != OsStr::new(".git") {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when the directory already carries the full journal layout: a git
/// repository with an `entry/` directory and an openable idea store.
pub fn has_been_initialized(dir: &Path) -> bool {
    git::is_repository(dir)
        && dir.join("entry").is_dir()
        && DirectoryStore::open(dir.join("idea")).is_ok()
}

/// Sets up a journal in `dir`, creating the directory and the git
/// repository if needed, and returns the ordered commit ids.
pub fn init(dir: &Path) -> Result<Vec<String>> {
    if has_been_initialized(dir) {
        return Err(InitError::AlreadyInitialized);
    }
    if !can_be_initialized(dir)? {
        return Err(InitError::NotEmpty(dir.to_path_buf()));
    }

    fs::create_dir_all(dir)?;
    if !git::is_repository(dir) {
        git::init(dir)?;
    }

    let mut ref_log = Vec::new();

    git::commit_empty(dir, "init - begin")?;
    ref_log.push(git::rev_parse_head(dir)?);

    fs::create_dir(dir.join("entry"))?;
    fs::create_dir(dir.join("idea"))?;
    let (_, mut request) = DirectoryStore::init(dir.join("idea"))?;
    request.message = format!("init - {}", request.message);
    git::commit(&request)?;
    ref_log.push(git::rev_parse_head(dir)?);

    git::commit_empty(dir, "init - completed")?;
    ref_log.push(git::rev_parse_head(dir)?);

    Ok(ref_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_or_empty_directories_can_be_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(can_be_initialized(&dir.path().join("absent")).unwrap());
        assert!(can_be_initialized(dir.path()).unwrap());

        crate::git::init_test_repo(dir.path());
        assert!(can_be_initialized(dir.path()).unwrap());

        fs::write(dir.path().join("stray"), "x\n").unwrap();
        assert!(!can_be_initialized(dir.path()).unwrap());
    }

    #[test]
    fn init_builds_the_journal_layout() {
        let dir = TempDir::new().unwrap();
        crate::git::init_test_repo(dir.path());

        let ref_log = init(dir.path()).unwrap();
        assert_eq!(ref_log.len(), 3);

        assert!(dir.path().join("entry").is_dir());
        assert_eq!(
            fs::read_to_string(dir.path().join("idea").join("nextid")).unwrap(),
            "1\n"
        );
        assert!(has_been_initialized(dir.path()));

        let subject = |commit: &str| {
            let raw = git::show(dir.path(), &["-s", "--format=%s", commit]).unwrap();
            String::from_utf8_lossy(&raw).trim().to_string()
        };
        assert_eq!(subject(&ref_log[0]), "init - begin");
        assert_eq!(
            subject(&ref_log[1]),
            "init - idea directory store initialized"
        );
        assert_eq!(subject(&ref_log[2]), "init - completed");
    }

    #[test]
    fn init_refuses_a_second_run() {
        let dir = TempDir::new().unwrap();
        crate::git::init_test_repo(dir.path());
        init(dir.path()).unwrap();

        assert!(matches!(
            init(dir.path()),
            Err(InitError::AlreadyInitialized)
        ));
    }

    #[test]
    fn init_refuses_a_directory_with_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("existing"), "x\n").unwrap();

        assert!(matches!(init(dir.path()), Err(InitError::NotEmpty(_))));
    }
}
