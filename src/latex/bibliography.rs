use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::BibAdsError;
use crate::latex::BIBTEX_KEY_REGEX;

/// Raw BibTeX entries keyed by citation key.
///
/// Entries are never parsed beyond their key: the text between the first `{`
/// and the next `,` of each `@`-delimited chunk. Whatever else the chunk
/// holds is carried through byte for byte.
#[derive(Default, Clone)]
pub struct Bibliography {
    entries: HashMap<String, String>,
}

impl fmt::Debug for Bibliography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bibliography")
            .field("entries_count", &self.entries.len())
            .field("keys", &self.entries.keys())
            .finish()
    }
}

impl Bibliography {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<String>) {
        self.entries.insert(key.into(), entry.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse the text of a `.bib` file. Chunks without a `{` or without a
    /// `,` after it are skipped; a repeated key keeps the later entry.
    ///
    /// Trailing whitespace is dropped so that the separators of a previous
    /// run do not pile up when an entry is written back.
    pub fn parse_bib(content: &str) -> Self {
        let mut bibliography = Self::new();

        for chunk in content.split('@').skip(1) {
            let entry = format!("@{}", chunk.trim_end());
            match entry_key(&entry) {
                Some(key) => {
                    let key = key.to_string();
                    bibliography.insert(key, entry);
                }
                None => debug!("Skipping malformed bibliography chunk: {:.40}", entry),
            }
        }

        bibliography
    }

    /// Read an existing bibliography to serve as cache.
    ///
    /// A missing file is simply an empty cache; any other failure is returned
    /// as [`BibAdsError::CacheUnavailable`] so the caller can log it.
    pub fn read_cache(path: &Path) -> Result<Self, BibAdsError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let bibliography = Self::parse_bib(&content);
                info!("Loaded {} cached entries from {:?}", bibliography.len(), path);
                Ok(bibliography)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No existing bibliography at {:?}", path);
                Ok(Self::new())
            }
            Err(source) => Err(BibAdsError::CacheUnavailable {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Like [`Bibliography::read_cache`], but any failure means an empty cache.
    pub fn load_cache(path: &Path) -> Self {
        Self::read_cache(path).unwrap_or_else(|e| {
            log::warn!("{}; continuing without cache", e);
            Self::new()
        })
    }
}

/// The citation key of a raw entry: text between the first `{` and the next `,`.
pub fn entry_key(entry: &str) -> Option<&str> {
    BIBTEX_KEY_REGEX
        .captures(entry)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Replace the first `{bibcode` with `{alias`, leaving everything else alone.
pub fn rewrite_entry_key(entry: &str, bibcode: &str, alias: &str) -> String {
    let from = format!("{{{}", bibcode);
    let to = format!("{{{}", alias);
    entry.replacen(&from, &to, 1)
}

/// Concatenate entries, each preceded by a blank line.
pub fn render_entries<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output = String::new();
    for entry in entries {
        output.push_str("\n\n");
        output.push_str(entry.as_ref());
    }
    output
}
