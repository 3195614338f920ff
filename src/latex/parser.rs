use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::BibAdsError;
use crate::latex::{AliasMap, SourceScan, BIBLIOGRAPHY_REGEX, CITE_REGEX};

/// Read a LaTeX file and scan it.
pub fn read_source(path: &Path) -> Result<SourceScan, BibAdsError> {
    let content = fs::read_to_string(path).map_err(|source| BibAdsError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    scan_source(&content)
        .ok_or_else(|| BibAdsError::MissingBibliographyDirective(path.to_path_buf()))
}

/// Scan LaTeX text held in memory. `None` when there is no `\bibliography{`.
pub fn scan_source(content: &str) -> Option<SourceScan> {
    Some(SourceScan {
        bib_file_name: extract_bibliography_name(content)?,
        citation_keys: extract_citation_keys(content),
        aliases: extract_aliases(content),
    })
}

/// Text between the first `\bibliography{` and the following `}`.
pub fn extract_bibliography_name(content: &str) -> Option<String> {
    BIBLIOGRAPHY_REGEX
        .captures(content)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// All keys named by `\cite{...}` and `\citep{...}`.
pub fn extract_citation_keys(content: &str) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for cap in CITE_REGEX.captures_iter(content) {
        let Some(list) = cap.get(1) else { continue };
        for key in list.as_str().split(',').map(str::trim) {
            if !key.is_empty() {
                keys.insert(key.to_string());
            }
        }
    }
    debug!("Found {} distinct citation keys", keys.len());
    keys
}

/// Collect `% bibalias ALIAS BIBCODE` and `%bibalias ALIAS BIBCODE` lines.
/// Later definitions replace earlier ones.
pub fn extract_aliases(content: &str) -> AliasMap {
    let mut aliases = AliasMap::new();
    for line in content.lines() {
        if let Some((alias, bibcode)) = parse_alias_line(line) {
            debug!("Alias {} -> {}", alias, bibcode);
            aliases.insert(alias.to_string(), bibcode.to_string());
        }
    }
    aliases
}

fn parse_alias_line(line: &str) -> Option<(&str, &str)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["%", "bibalias", alias, bibcode, ..] | ["%bibalias", alias, bibcode, ..] => {
            Some((*alias, *bibcode))
        }
        _ => None,
    }
}
