//! the repository config file: a flat ini subset.
//!
//! only the `core` section matters to this crate:
//! `repositoryformatversion` (required integer, only 0 is supported),
//! plus the `filemode` and `bare` booleans.

use crate::storage::error::{StoreError, StoreResult};

/// parsed `core` section of a repository config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repositoryformatversion: i64,
    pub filemode: bool,
    pub bare: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositoryformatversion: 0,
            filemode: false,
            bare: false,
        }
    }
}

impl Config {
    /// parse the ini text of a config file.
    pub fn parse(text: &str) -> StoreResult<Config> {
        let mut section = String::new();
        let mut version: Option<i64> = None;
        let mut filemode = false;
        let mut bare = false;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(StoreError::Config(format!("malformed config line: {line}")));
            };
            let (key, value) = (key.trim(), value.trim());

            if section == "core" {
                match key {
                    "repositoryformatversion" => {
                        let parsed = value.parse::<i64>().map_err(|_| {
                            StoreError::Config(format!(
                                "repositoryformatversion is not an integer: {value}"
                            ))
                        })?;
                        version = Some(parsed);
                    }
                    "filemode" => filemode = parse_bool(value)?,
                    "bare" => bare = parse_bool(value)?,
                    _ => {}
                }
            }
        }

        let version = version
            .ok_or_else(|| StoreError::Config("missing core.repositoryformatversion".to_string()))?;
        if version != 0 {
            return Err(StoreError::Config(format!(
                "unsupported repositoryformatversion {version}"
            )));
        }

        Ok(Config {
            repositoryformatversion: version,
            filemode,
            bare,
        })
    }

    /// render back to ini text.
    pub fn render(&self) -> String {
        format!(
            "[core]\nrepositoryformatversion = {}\nfilemode = {}\nbare = {}\n",
            self.repositoryformatversion, self.filemode, self.bare
        )
    }
}

fn parse_bool(value: &str) -> StoreResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(StoreError::Config(format!("not a boolean: {other}"))),
    }
}
