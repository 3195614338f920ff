use anyhow::{Context, Result};
use bibads::internal::DEFAULT_JOBS;
use bibads::{generate_bibliography, RunConfig};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// Generate the bib file a LaTeX document needs from NASA ADS
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// LaTeX source; its \bibliography{...} names the file to write
    tex_file: PathBuf,
    /// Ignore entries already present in the bib file and fetch everything
    #[arg(long)]
    nocache: bool,
    /// Maximum number of simultaneous ADS requests
    #[arg(short, long, default_value_t = DEFAULT_JOBS)]
    jobs: usize,
    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Retry failed requests with backoff for up to this many seconds
    #[arg(long, value_name = "SECS")]
    retry_secs: Option<u64>,
    /// Base URL of the ADS service
    #[arg(long, default_value = bibads::ads::DEFAULT_ADS_URL)]
    ads_url: String,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configure logging
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = RunConfig {
        tex_file: args.tex_file,
        use_cache: !args.nocache,
        jobs: args.jobs,
        timeout: args.timeout.map(Duration::from_secs),
        retry_for: args.retry_secs.map(Duration::from_secs),
        ads_url: args.ads_url,
    };

    let summary = match generate_bibliography(&config).await {
        Ok(summary) => summary,
        Err(e) if e.is_fatal() => {
            return Err(e)
                .with_context(|| format!("Failed to build bibliography for {:?}", config.tex_file))
        }
        Err(e) => return Err(e).context("Failed to prepare the ADS client"),
    };
    if summary.failed > 0 {
        info!("{} citation(s) could not be resolved", summary.failed);
    }

    Ok(())
}
