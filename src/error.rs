use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building a bibliography.
///
/// Only some of these abort a run; see [`BibAdsError::is_fatal`]. The rest
/// are logged against the citation key that caused them and the run goes on.
#[derive(Debug, Error)]
pub enum BibAdsError {
    #[error("cannot read LaTeX source {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No bib file name found in {0:?}")]
    MissingBibliographyDirective(PathBuf),

    #[error("cannot use existing bibliography {path:?} as cache: {source}")]
    CacheUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("no BibTeX entry in ADS response for {0}")]
    MalformedResponse(String),

    #[error("cannot write bibliography {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("resolution task failed: {0}")]
    Task(String),
}

impl BibAdsError {
    /// Whether this error terminates the run instead of dropping one entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BibAdsError::SourceRead { .. }
                | BibAdsError::MissingBibliographyDirective(_)
                | BibAdsError::OutputWrite { .. }
        )
    }

    /// Server errors and transport failures are worth another attempt;
    /// a 4xx or an empty answer will not improve.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            BibAdsError::Network(_) => true,
            BibAdsError::HttpStatus(status) => status.is_server_error(),
            _ => false,
        }
    }
}
