//! Build the BibTeX file a LaTeX document asks for by looking up every
//! cited Bibcode in the NASA Astrophysics Data System.

pub mod ads;
pub mod error;
pub mod internal;
pub mod latex;
pub mod resolver;

pub use ads::{AdsClient, BibFetcher};
pub use error::BibAdsError;
pub use internal::{generate_bibliography, generate_with_fetcher, RunConfig, RunSummary};
