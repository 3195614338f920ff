use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

use crate::ads::{AdsClient, BibFetcher, DEFAULT_ADS_URL};
use crate::error::BibAdsError;
use crate::latex::bibliography::render_entries;
use crate::latex::{read_source, AliasMap, Bibliography};
use crate::resolver::{resolve_key, Outcome, Resolution};

pub const DEFAULT_JOBS: usize = 8;

/// Settings for one run over a LaTeX file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tex_file: PathBuf,
    /// Reuse entries already present in the output file.
    pub use_cache: bool,
    /// Maximum number of fetches in flight.
    pub jobs: usize,
    pub timeout: Option<Duration>,
    /// Retry transient fetch failures for at most this long.
    pub retry_for: Option<Duration>,
    pub ads_url: String,
}

impl RunConfig {
    pub fn new(tex_file: impl Into<PathBuf>) -> Self {
        Self {
            tex_file: tex_file.into(),
            use_cache: true,
            jobs: DEFAULT_JOBS,
            timeout: None,
            retry_for: None,
            ads_url: DEFAULT_ADS_URL.to_string(),
        }
    }

    /// Build the ADS client these settings describe.
    pub fn ads_client(&self) -> Result<AdsClient, BibAdsError> {
        let mut client = AdsClient::new(self.ads_url.clone());
        if let Some(timeout) = self.timeout {
            client = client.with_timeout(timeout)?;
        }
        if let Some(retry_for) = self.retry_for {
            client = client.with_retry(retry_for);
        }
        Ok(client)
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub cached: usize,
    pub fetched: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn written(&self) -> usize {
        self.cached + self.fetched
    }
}

/// Scan the LaTeX file, resolve every citation against ADS and write the
/// bibliography it asks for.
pub async fn generate_bibliography(config: &RunConfig) -> Result<RunSummary, BibAdsError> {
    let fetcher = Arc::new(config.ads_client()?);
    generate_with_fetcher(config, fetcher).await
}

/// [`generate_bibliography`] with a caller-provided fetcher.
pub async fn generate_with_fetcher(
    config: &RunConfig,
    fetcher: Arc<dyn BibFetcher>,
) -> Result<RunSummary, BibAdsError> {
    let scan = read_source(&config.tex_file)?;
    info!("bib file name: {}", scan.bib_file_name);
    let output = PathBuf::from(&scan.bib_file_name);

    let cache = if config.use_cache {
        Bibliography::load_cache(&output)
    } else {
        debug!("Cache disabled, every key will be fetched");
        Bibliography::new()
    };

    let resolutions = resolve_all(
        &scan.citation_keys,
        Arc::new(scan.aliases),
        Arc::new(cache),
        fetcher,
        config.jobs,
    )
    .await;

    let mut summary = RunSummary {
        output: output.clone(),
        ..Default::default()
    };
    for resolution in &resolutions {
        if !resolution.is_ok() {
            summary.failed += 1;
        } else if matches!(resolution.outcome, Outcome::Cached) {
            summary.cached += 1;
        } else {
            summary.fetched += 1;
        }
    }

    let text = render_entries(resolutions.iter().map(|r| r.entry.as_str()));
    write_bibliography(&output, &text)?;
    info!(
        "Wrote {} entries to {:?} ({} cached, {} fetched, {} failed)",
        summary.written(),
        output,
        summary.cached,
        summary.fetched,
        summary.failed
    );

    Ok(summary)
}

/// Resolve all keys concurrently, at most `jobs` fetches at a time.
/// `jobs` is clamped to what a semaphore can hold, with a minimum of one.
///
/// Results come back in completion order, one per key. Each is printed as a
/// progress line the moment it arrives.
pub async fn resolve_all(
    keys: &BTreeSet<String>,
    aliases: Arc<AliasMap>,
    cache: Arc<Bibliography>,
    fetcher: Arc<dyn BibFetcher>,
    jobs: usize,
) -> Vec<Resolution> {
    let semaphore = Arc::new(Semaphore::new(jobs.clamp(1, Semaphore::MAX_PERMITS)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    for key in keys {
        let key = key.clone();
        let tx = tx.clone();
        let aliases = Arc::clone(&aliases);
        let cache = Arc::clone(&cache);
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);

        tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            let resolution = resolve_key(&key, &aliases, &cache, fetcher.as_ref()).await;
            // The receiver outlives every task.
            let _ = tx.send(resolution);
        });
    }
    drop(tx);

    let mut pending: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
    let mut resolutions = Vec::with_capacity(keys.len());
    while let Some(resolution) = rx.recv().await {
        println!("{}", resolution.progress_line());
        pending.remove(resolution.key.as_str());
        resolutions.push(resolution);
    }

    // Only a panicking task leaves its key without a result.
    for key in pending {
        let error = BibAdsError::Task(format!("no result for {}", key));
        warn!("Could not resolve {}: {}", key, error);
        let resolution = Resolution::failed(key, &aliases, error);
        println!("{}", resolution.progress_line());
        resolutions.push(resolution);
    }

    resolutions
}

/// Replace `path` with `text` in a single write.
pub fn write_bibliography(path: &Path, text: &str) -> Result<(), BibAdsError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    options
        .open(path)
        .and_then(|mut file| file.write_all(text.as_bytes()))
        .map_err(|source| BibAdsError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
}
