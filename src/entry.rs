//! Opening, editing, and closing journal entries.
//!
//! An entry lives at `entry/{filename}` under the journal root and spans one
//! sitting: [`open`] writes a template carrying the active ideas, the user
//! edits it, and [`OpenEntry::close`] strips the idea blocks back out (the
//! store is their durable home), appends the closing timestamp, and returns
//! the [`CommitRequest`] that records the session.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{fmt, fs};

use crate::git::CommitRequest;
use crate::idea::{HEADER_MARKER, Idea};
use crate::idea::scanner;
use crate::stamp::Stamp;

pub type Result<T> = std::result::Result<T, EntryError>;

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("editor exited unsuccessfully: {0}")]
    Editor(String),

    #[error(transparent)]
    Header(#[from] crate::idea::HeaderFormatError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Anything that can drop the user into an editor for a file and block until
/// they are done. [`Command`] is the real implementation; tests script one.
pub trait EditorProcess {
    fn edit(&mut self, path: &Path) -> Result<()>;
}

impl EditorProcess for Command {
    fn edit(&mut self, path: &Path) -> Result<()> {
        let status = self.arg(path).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(EntryError::Editor(status.to_string()))
        }
    }
}

const TITLE_PLACEHOLDER: &str = "Title(will be used as commit message)";

/// Writes the entry template for a new sitting and returns its handle.
///
/// The carried-over ideas are rendered into the template so the user can
/// revise them in place; whatever they look like when the entry closes is
/// what gets saved back to the store.
pub fn open(root: impl Into<PathBuf>, opened_at: Stamp, ideas: &[Idea]) -> Result<OpenEntry> {
    let entry = OpenEntry {
        root: root.into(),
        opened_at,
    };

    let mut text = format!("{}\n\n# {TITLE_PLACEHOLDER}\n", entry.opened_at);
    for idea in ideas {
        text.push('\n');
        text.push_str(&idea.render());
    }
    fs::write(entry.path(), text)?;

    Ok(entry)
}

/// A journal entry that has been opened but not yet closed.
#[derive(Debug)]
pub struct OpenEntry {
    root: PathBuf,
    opened_at: Stamp,
}

impl OpenEntry {
    pub fn filename(&self) -> String {
        self.opened_at.filename()
    }

    pub fn path(&self) -> PathBuf {
        self.root.join("entry").join(self.filename())
    }

    pub fn edit(&self, editor: &mut impl EditorProcess) -> Result<()> {
        editor.edit(&self.path())
    }

    /// The ideas currently embedded in the entry text, post-edit versions
    /// included.
    pub fn ideas(&self) -> Result<Vec<Idea>> {
        let text = fs::read_to_string(self.path())?;
        Ok(scanner::ideas_in(&text)?)
    }

    /// Finalizes the entry: removes the idea blocks, appends the closing
    /// timestamp, and describes the commit that records the session.
    ///
    /// The commit message comes from the first `# ` heading; an entry the
    /// user never titled — no heading at all, or the template placeholder
    /// left unedited — falls back to the filename.
    pub fn close(self, closed_at: &Stamp) -> Result<CommitRequest> {
        let text = fs::read_to_string(self.path())?;

        let kept = match text.find(HEADER_MARKER) {
            Some(at) => &text[..at],
            None => &text,
        };
        let closed = format!("{}\n\n{closed_at}\n", kept.trim_end());
        fs::write(self.path(), &closed)?;

        let title = closed
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .filter(|title| *title != TITLE_PLACEHOLDER)
            .map_or_else(|| self.filename(), str::to_string);

        let mut request = CommitRequest::in_dir(&self.root);
        request.add(format!("entry/{}", self.filename()));
        request.message = format!("entry - {title}");
        Ok(request)
    }
}

impl fmt::Display for OpenEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::idea::Status;

    fn opening_stamp() -> Stamp {
        Stamp::parse_line("Mon Jan 15 15:04:05 UTC 2024").unwrap()
    }

    fn closing_stamp() -> Stamp {
        Stamp::parse_line("Mon Jan 15 16:30:00 UTC 2024").unwrap()
    }

    fn journal_root() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("entry")).unwrap();
        dir
    }

    /// An editor stand-in that overwrites the file with a fixed text.
    struct ScriptedEditor(&'static str);

    impl EditorProcess for ScriptedEditor {
        fn edit(&mut self, path: &Path) -> Result<()> {
            fs::write(path, self.0)?;
            Ok(())
        }
    }

    #[test]
    fn template_carries_the_active_ideas() {
        let root = journal_root();
        let ideas = vec![
            Idea {
                status: Status::Active,
                id: 2,
                name: "Carried Over".to_string(),
                body: "still relevant\n".to_string(),
            },
        ];

        let entry = open(root.path(), opening_stamp(), &ideas).unwrap();

        assert_eq!(entry.filename(), "2024-01-15-1504-UTC");
        let text = fs::read_to_string(entry.path()).unwrap();
        assert_eq!(
            text,
            "Mon Jan 15 15:04:05 UTC 2024\n\n\
             # Title(will be used as commit message)\n\n\
             ## [active] [2] Carried Over\nstill relevant\n"
        );
    }

    #[test]
    fn edited_ideas_are_read_back() {
        let root = journal_root();
        let entry = open(root.path(), opening_stamp(), &[]).unwrap();

        entry
            .edit(&mut ScriptedEditor(
                "Mon Jan 15 15:04:05 UTC 2024\n\n# A day\nprose\n\n\
                 ## [completed] [2] Carried Over\ndone now\n",
            ))
            .unwrap();

        let ideas = entry.ideas().unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].id, 2);
        assert_eq!(ideas[0].status, Status::Completed);
    }

    #[test]
    fn close_strips_ideas_and_appends_the_closing_stamp() {
        let root = journal_root();
        let entry = open(root.path(), opening_stamp(), &[]).unwrap();
        let path = entry.path();

        entry
            .edit(&mut ScriptedEditor(
                "Mon Jan 15 15:04:05 UTC 2024\n\n# A good day\nprose\n\n\
                 ## [active] [1] An Idea\nbody\n",
            ))
            .unwrap();

        let request = entry.close(&closing_stamp()).unwrap();

        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "Mon Jan 15 15:04:05 UTC 2024\n\n# A good day\nprose\n\n\
             Mon Jan 15 16:30:00 UTC 2024\n"
        );
        assert_eq!(request.dir, root.path());
        assert_eq!(
            request.paths,
            vec![PathBuf::from("entry/2024-01-15-1504-UTC")]
        );
        assert_eq!(request.message, "entry - A good day");
    }

    #[test]
    fn unedited_placeholder_title_commits_under_the_filename() {
        let root = journal_root();
        let entry = open(root.path(), opening_stamp(), &[]).unwrap();

        // The user saved the template as-is without writing a title.
        let request = entry.close(&closing_stamp()).unwrap();
        assert_eq!(request.message, "entry - 2024-01-15-1504-UTC");
    }

    #[test]
    fn untitled_entry_commits_under_its_filename() {
        let root = journal_root();
        let entry = open(root.path(), opening_stamp(), &[]).unwrap();

        entry
            .edit(&mut ScriptedEditor(
                "Mon Jan 15 15:04:05 UTC 2024\n\njust prose\n",
            ))
            .unwrap();

        let request = entry.close(&closing_stamp()).unwrap();
        assert_eq!(request.message, "entry - 2024-01-15-1504-UTC");
    }
}
