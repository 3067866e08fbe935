//! Journal configuration.
//!
//! Loaded from `~/.journal-config.json`. The file is optional: without it
//! the journal directory comes from the command line or the working
//! directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Journal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The journal directory. May contain `~` and `$VAR` references,
    /// expanded at load time.
    pub directory: String,
}

impl Config {
    /// Load config from `path`.
    /// Returns an error if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!(
                "no config file found at {}\n\
                 Create one with at minimum:\n\n\
                 {{\"directory\": \"~/journal\"}}",
                path.display()
            ));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.directory.is_empty() {
            return Err(format!(
                "directory is empty in {}\n\
                 Set it to your journal's path.",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The default config file path: `~/.journal-config.json`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".journal-config.json"))
    }

    /// The configured directory with `~` and `$VAR` references expanded.
    /// Unset variables expand to nothing, matching shell behavior.
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(expand(&self.directory))
    }
}

fn expand(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        match c {
            '~' if at == 0 => {
                if let Some(home) = dirs::home_dir() {
                    out.push_str(&home.to_string_lossy());
                }
            }
            '$' => {
                let mut name = String::new();
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    out.push('$');
                } else if let Ok(value) = env::var(&name) {
                    out.push_str(&value);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
