//! `KEY=value` settings files.
//!
//! The admin panel edits store settings (WhatsApp number, SMTP details, ...)
//! in a dotenv-style file that both servers re-read on every request.
//! Editing a file through [`EnvFile`] keeps comments, blank lines and the
//! formatting of untouched entries intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Keys the admin settings page exposes.
pub const KNOWN_KEYS: &[&str] = &[
    "WHATSAPP_NUMBER",
    "STORE_NAME",
    "STORE_EMAIL",
    "CONTACT_EMAIL_TO",
    "SMTP_HOST",
    "SMTP_PORT",
    "SMTP_USERNAME",
    "SMTP_FROM",
    "RESEND_FROM",
];

#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    #[error("invalid settings key {0:?}")]
    InvalidKey(String),

    #[error("settings file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        /// Original text, `None` once the entry has been changed.
        raw: Option<String>,
    },
    /// Comments, blank lines and anything unparseable.
    Verbatim(String),
}

/// A parsed settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

impl EnvFile {
    /// Parse file contents. Never fails: lines that are not `KEY=value`
    /// pairs are kept as-is.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                parse_entry(line).map_or_else(
                    || Line::Verbatim(line.to_owned()),
                    |(key, value)| Line::Entry {
                        key,
                        value,
                        raw: Some(line.to_owned()),
                    },
                )
            })
            .collect();
        Self { lines }
    }

    /// Read and parse `path`. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn read(path: &Path) -> Result<Self, EnvFileError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the rendered file to `path`, creating parent directories.
    ///
    /// The contents go to a temporary sibling first and are renamed over
    /// `path`, so readers never see a half-written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), EnvFileError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, self.render())?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Value of `key`; the last definition wins.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key`, updating its last definition in place or appending.
    ///
    /// # Errors
    ///
    /// Returns [`EnvFileError::InvalidKey`] unless the key is a shell-style
    /// identifier.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EnvFileError> {
        if !is_valid_key(key) {
            return Err(EnvFileError::InvalidKey(key.to_owned()));
        }

        let existing = self.lines.iter_mut().rev().find_map(|line| match line {
            Line::Entry {
                key: k,
                value: v,
                raw,
            } if k.as_str() == key => Some((v, raw)),
            _ => None,
        });

        match existing {
            Some((v, raw)) => {
                if v.as_str() != value {
                    value.clone_into(v);
                    *raw = None;
                }
            }
            None => self.lines.push(Line::Entry {
                key: key.to_owned(),
                value: value.to_owned(),
                raw: None,
            }),
        }
        Ok(())
    }

    /// Remove every definition of `key`. Returns whether any existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(line, Line::Entry { key: k, .. } if k == key));
        self.lines.len() != before
    }

    /// Entries in file order, later duplicates included.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            Line::Verbatim(_) => None,
        })
    }

    /// File contents. Untouched lines come back exactly as parsed.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Verbatim(text)
                | Line::Entry {
                    raw: Some(text), ..
                } => out.push_str(text),
                Line::Entry {
                    key,
                    value,
                    raw: None,
                } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&quote(value));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Values for `keys`, taken from the file first and the process
    /// environment second. Keys found in neither are left out.
    #[must_use]
    pub fn merged_over_env(&self, keys: &[&str]) -> BTreeMap<String, String> {
        self.merged_over(keys, |k| std::env::var(k).ok())
    }

    /// [`merged_over_env`](Self::merged_over_env) with an explicit fallback.
    #[must_use]
    pub fn merged_over(
        &self,
        keys: &[&str],
        fallback: impl Fn(&str) -> Option<String>,
    ) -> BTreeMap<String, String> {
        keys.iter()
            .filter_map(|&key| {
                self.get(key)
                    .map(str::to_owned)
                    .or_else(|| fallback(key))
                    .map(|value| (key.to_owned(), value))
            })
            .collect()
    }
}

/// Whether `key` looks like `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_entry(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if !is_valid_key(key) {
        return None;
    }
    Some((key.to_owned(), unquote(value.trim())))
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 {
        if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            return inner
                .replace("\\n", "\n")
                .replace("\\\"", "\"")
                .replace("\\\\", "\\");
        }
        if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return inner.to_owned();
        }
    }
    // Unquoted values end at an inline comment.
    value
        .split_once(" #")
        .map_or(value, |(v, _)| v.trim_end())
        .to_owned()
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\'));
    if !needs_quotes {
        return value.to_owned();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Store settings
WHATSAPP_NUMBER=5491155551234
export STORE_NAME=\"Frenos Sur\"
SMTP_FROM='ventas@frenos.test'
not a setting

SMTP_PORT=587 # submission
";

    #[test]
    fn parses_quotes_export_and_comments() {
        let file = EnvFile::parse(SAMPLE);
        assert_eq!(file.get("WHATSAPP_NUMBER"), Some("5491155551234"));
        assert_eq!(file.get("STORE_NAME"), Some("Frenos Sur"));
        assert_eq!(file.get("SMTP_FROM"), Some("ventas@frenos.test"));
        assert_eq!(file.get("SMTP_PORT"), Some("587"));
        assert_eq!(file.entries().count(), 4);
    }

    #[test]
    fn untouched_file_renders_identically() {
        assert_eq!(EnvFile::parse(SAMPLE).render(), SAMPLE);
    }

    #[test]
    fn set_updates_in_place_and_appends() {
        let mut file = EnvFile::parse(SAMPLE);
        file.set("STORE_NAME", "Frenos Norte").unwrap();
        file.set("STORE_EMAIL", "hola@frenos.test").unwrap();

        let rendered = file.render();
        assert!(rendered.contains("STORE_NAME=\"Frenos Norte\"\nSMTP_FROM="));
        assert!(rendered.ends_with("STORE_EMAIL=hola@frenos.test\n"));
        assert!(rendered.starts_with("# Store settings\n"));

        let reparsed = EnvFile::parse(&rendered);
        assert_eq!(reparsed.get("STORE_NAME"), Some("Frenos Norte"));
    }

    #[test]
    fn quoting_survives_a_reparse() {
        let mut file = EnvFile::default();
        file.set("STORE_NAME", "say \"hi\" # now").unwrap();
        let reparsed = EnvFile::parse(&file.render());
        assert_eq!(reparsed.get("STORE_NAME"), Some("say \"hi\" # now"));
    }

    #[test]
    fn rejects_invalid_keys() {
        let mut file = EnvFile::default();
        assert!(matches!(
            file.set("1BAD", "x"),
            Err(EnvFileError::InvalidKey(_))
        ));
        assert!(file.set("BAD KEY", "x").is_err());
    }

    #[test]
    fn remove_drops_every_definition() {
        let mut file = EnvFile::parse("A=1\nB=2\nA=3\n");
        assert_eq!(file.get("A"), Some("3"));
        assert!(file.remove("A"));
        assert!(!file.remove("A"));
        assert_eq!(file.render(), "B=2\n");
    }

    #[test]
    fn file_values_win_over_fallback() {
        let file = EnvFile::parse("WHATSAPP_NUMBER=111\n");
        let merged = file.merged_over(&["WHATSAPP_NUMBER", "STORE_NAME", "SMTP_HOST"], |k| {
            match k {
                "WHATSAPP_NUMBER" => Some("999".to_owned()),
                "STORE_NAME" => Some("Env Store".to_owned()),
                _ => None,
            }
        });
        assert_eq!(merged.get("WHATSAPP_NUMBER").map(String::as_str), Some("111"));
        assert_eq!(merged.get("STORE_NAME").map(String::as_str), Some("Env Store"));
        assert!(!merged.contains_key("SMTP_HOST"));
    }

    #[test]
    fn read_and_write_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".env.local");
        assert_eq!(EnvFile::read(&path).unwrap(), EnvFile::default());

        let mut file = EnvFile::default();
        file.set("SMTP_HOST", "smtp.frenos.test").unwrap();
        file.write(&path).unwrap();

        let back = EnvFile::read(&path).unwrap();
        assert_eq!(back.get("SMTP_HOST"), Some("smtp.frenos.test"));
        assert!(!dir.path().join("nested").join(".env.local.tmp").exists());
    }
}
