pub mod bibliography;
pub mod parser;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

pub use bibliography::{rewrite_entry_key, Bibliography};
pub use parser::{read_source, scan_source};

// Commonly used regex patterns compiled once
//
// A macro whose closing brace is missing swallows the rest of the source.
static CITE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\citep?\{([^}]*)").expect("Invalid citation regex pattern")
});
static BIBLIOGRAPHY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\bibliography\{([^}]*)").expect("Invalid bibliography regex pattern")
});
static BIBTEX_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@[^{]*\{([^,]*),").expect("Invalid BibTeX key regex pattern")
});

/// Alias → Bibcode, as declared by `bibalias` comment lines.
pub type AliasMap = HashMap<String, String>;

/// Everything the pipeline needs to know about a LaTeX source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceScan {
    /// Name given to `\bibliography{...}`, used verbatim as the output path.
    pub bib_file_name: String,
    /// Distinct citation keys. Sorted only so that logs are stable.
    pub citation_keys: BTreeSet<String>,
    pub aliases: AliasMap,
}
