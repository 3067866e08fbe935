//! CLI interface for the journal.
//!
//! Three verbs, all operating on a journal directory:
//!
//! - `journal init [directory]` — set up a new journal.
//! - `journal new [directory]` — open today's entry in `$EDITOR` and commit
//!   it on close.
//! - `journal fix [directory]` — upgrade a journal from the legacy flat
//!   layout, one audited commit per step.
//!
//! The directory is resolved in order: the positional argument, the
//! configured directory, then the current working directory.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command as EditorCommand;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::idea::store::{DirectoryStore, StoreError};
use crate::stamp::Stamp;
use crate::{entry, fix, git, init};

/// Journal — a git-backed daily journal with an idea tracker.
#[derive(Debug, Parser)]
#[command(name = "journal", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Config file path. Defaults to `~/.journal-config.json`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: a day with the journal
  1. journal init ~/journal
  2. journal new ~/journal
     → opens the entry template in $EDITOR; active ideas are carried in
  3. edit the entry, revise idea statuses in place, save, quit
     → ideas are saved back to the store and the entry is committed

Upgrading an old journal:
  journal fix ~/old-journal
     → moves entries into entry/, extracts ideas into the store, and
       prints one commit id per migration step"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a journal directory.
    Init {
        /// Directory to initialize. Falls back to the configured directory,
        /// then the working directory.
        directory: Option<PathBuf>,
    },

    /// Open a new entry, edit it, and commit it on close.
    New {
        /// The journal directory.
        directory: Option<PathBuf>,
    },

    /// Upgrade a journal from the legacy flat layout.
    Fix {
        /// The journal directory.
        directory: Option<PathBuf>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let resolve = |directory: Option<PathBuf>| resolve_directory(directory, cli.config.as_deref());
    match cli.command {
        Command::Init { directory } => cmd_init(&resolve(directory)?),
        Command::New { directory } => cmd_new(&resolve(directory)?),
        Command::Fix { directory } => cmd_fix(&resolve(directory)?),
    }
}

/// The positional directory wins; then the config file; then the working
/// directory. An explicitly passed `--config` must load, but the default
/// config path is only consulted when a file exists there.
fn resolve_directory(
    explicit: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<PathBuf, String> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    if let Some(path) = config_path {
        return Config::load(path).map(|config| config.directory());
    }
    if let Some(path) = Config::path()
        && path.exists()
    {
        return Config::load(&path).map(|config| config.directory());
    }

    env::current_dir().map_err(|e| format!("could not determine working directory: {e}"))
}

fn cmd_init(dir: &Path) -> Result<(), String> {
    let ref_log =
        init::init(dir).map_err(|e| format!("failed to initialize {}: {e}", dir.display()))?;

    eprintln!("Initialized journal at {}", dir.display());
    print_ref_log(dir, &ref_log);
    Ok(())
}

fn cmd_new(dir: &Path) -> Result<(), String> {
    if !init::has_been_initialized(dir) {
        return Err(format!(
            "{} is not an initialized journal — run `journal init` first",
            dir.display()
        ));
    }
    git::is_clean(dir).map_err(|e| format!("cannot open an entry: {e}"))?;

    let store = DirectoryStore::open(dir.join("idea"))
        .map_err(|e| format!("failed to open the idea store: {e}"))?;
    let active = store
        .active_ideas()
        .map_err(|e| format!("failed to list active ideas: {e}"))?;

    let opened = entry::open(dir, Stamp::now(), &active)
        .map_err(|e| format!("failed to open a new entry: {e}"))?;
    opened
        .edit(&mut editor_command())
        .map_err(|e| format!("editing failed: {e}"))?;

    for mut idea in opened
        .ideas()
        .map_err(|e| format!("failed to read ideas back from the entry: {e}"))?
    {
        let request = match store.save_idea(&mut idea) {
            Ok(request) => request,
            Err(StoreError::NotModified) => continue,
            Err(e) => return Err(format!("failed to save idea {:?}: {e}", idea.name)),
        };
        git::commit(&request).map_err(|e| format!("failed to commit idea changes: {e}"))?;
    }

    let request = opened
        .close(&Stamp::now())
        .map_err(|e| format!("failed to close the entry: {e}"))?;
    git::commit(&request).map_err(|e| format!("failed to commit the entry: {e}"))?;

    eprintln!("Committed: {}", request.message);
    Ok(())
}

fn cmd_fix(dir: &Path) -> Result<(), String> {
    let needs_fixed =
        fix::needs_fixed(dir).map_err(|e| format!("failed to inspect {}: {e}", dir.display()))?;
    if !needs_fixed {
        eprintln!("Journal is already in the current format");
        return Ok(());
    }

    if !git::is_repository(dir) {
        return Err(format!("{} is not a git repository", dir.display()));
    }
    git::is_clean(dir).map_err(|e| format!("cannot fix the journal: {e}"))?;

    match fix::fix(dir) {
        Ok(ref_log) => {
            eprintln!("Fixed journal at {}", dir.display());
            print_ref_log(dir, &ref_log);
            Ok(())
        }
        Err(failure) => {
            if !failure.ref_log.is_empty() {
                eprintln!("Commits made before the failure:");
                print_ref_log(dir, &failure.ref_log);
            }
            Err(failure.to_string())
        }
    }
}

/// One line per commit: abbreviated id and subject, falling back to the raw
/// id when git can't describe it.
fn print_ref_log(dir: &Path, ref_log: &[String]) {
    for commit in ref_log {
        match git::show(dir, &["-s", "--format=%h %s", commit]) {
            Ok(raw) => println!("{}", String::from_utf8_lossy(&raw).trim_end()),
            Err(_) => println!("{commit}"),
        }
    }
}

/// `$EDITOR`, defaulting to vim with spellchecking on.
fn editor_command() -> EditorCommand {
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    let mut command = EditorCommand::new(&editor);
    if editor == "vim" {
        command.arg("+set spell");
    }
    command
}
