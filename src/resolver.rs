use log::warn;
use std::fmt;

use crate::ads::BibFetcher;
use crate::error::BibAdsError;
use crate::latex::{rewrite_entry_key, AliasMap, Bibliography};

/// How a single citation key was resolved.
#[derive(Debug)]
pub enum Outcome {
    Cached,
    Fetched,
    Failed(BibAdsError),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Cached => write!(f, "OK (cached)"),
            Outcome::Fetched => write!(f, "OK"),
            Outcome::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Result of resolving one citation key. `entry` is empty when resolution failed.
#[derive(Debug)]
pub struct Resolution {
    pub key: String,
    pub bibcode: String,
    pub alias: Option<String>,
    pub entry: String,
    pub outcome: Outcome,
}

impl Resolution {
    pub fn is_ok(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed(_))
    }

    /// `<bibcode>   <alias>   ...   <outcome>` with fixed-width columns.
    pub fn progress_line(&self) -> String {
        format!(
            "{:<19}   {:<15}   ...   {}",
            self.bibcode,
            self.alias.as_deref().unwrap_or(""),
            self.outcome
        )
    }

    /// A resolution that never reached the fetcher, e.g. a task that died.
    pub fn failed(key: &str, aliases: &AliasMap, error: BibAdsError) -> Self {
        let (bibcode, alias) = split_alias(key, aliases);
        Self {
            key: key.to_string(),
            bibcode,
            alias,
            entry: String::new(),
            outcome: Outcome::Failed(error),
        }
    }
}

fn split_alias(key: &str, aliases: &AliasMap) -> (String, Option<String>) {
    match aliases.get(key) {
        Some(bibcode) => (bibcode.clone(), Some(key.to_string())),
        None => (key.to_string(), None),
    }
}

/// Resolve one citation key into BibTeX text.
///
/// The cache is looked up under the citation key as written in the source,
/// so an aliased entry is found under its alias. Fetched entries of aliased
/// keys get their key rewritten to the alias. Cached entries are returned
/// untouched: their key is already the alias, and a rewrite would land on
/// the next `{BIBCODE` in the body instead.
pub async fn resolve_key(
    key: &str,
    aliases: &AliasMap,
    cache: &Bibliography,
    fetcher: &dyn BibFetcher,
) -> Resolution {
    let (bibcode, alias) = split_alias(key, aliases);

    if let Some(entry) = cache.get(key) {
        return Resolution {
            key: key.to_string(),
            bibcode,
            alias,
            entry: entry.to_string(),
            outcome: Outcome::Cached,
        };
    }

    match fetcher.fetch(&bibcode).await {
        Ok(entry) => {
            let entry = match &alias {
                Some(alias) => rewrite_entry_key(&entry, &bibcode, alias),
                None => entry,
            };
            Resolution {
                key: key.to_string(),
                bibcode,
                alias,
                entry,
                outcome: Outcome::Fetched,
            }
        }
        Err(e) => {
            warn!("Could not resolve {}: {}", key, e);
            Resolution {
                key: key.to_string(),
                bibcode,
                alias,
                entry: String::new(),
                outcome: Outcome::Failed(e),
            }
        }
    }
}
