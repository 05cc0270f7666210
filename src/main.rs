//! Main entry point for embedgrab CLI

use anyhow::{anyhow, Context};
use clap::Parser;
use embedgrab::cli::output::{create_progress_callback, OutputFormatter};
use embedgrab::cli::{init_logging, Args};
use embedgrab::core::{ConfigStore, Downloader};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Grace period for a cancelled download to clean up before it is aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(args.verbosity_level(), args.log_dir());
    debug!("Starting embedgrab with args: {:?}", args);

    let formatter = Arc::new(
        OutputFormatter::new(args.verbosity_level()).with_progress(!args.no_progress),
    );

    match run(args, formatter.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.abandon_progress();
            formatter.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, formatter: Arc<OutputFormatter>) -> anyhow::Result<()> {
    let mut store = ConfigStore::open(&args.config)
        .with_context(|| format!("Failed to open configuration {}", args.config.display()))?;
    let quality = args.quality()?;

    if args.save {
        save_overrides(&mut store, &args, quality)?;
        formatter.success(&format!("Saved settings to {}", store.path().display()));
    }

    let mut downloader = Downloader::from_config(store.config())?;
    if let Some(quality) = quality {
        downloader = downloader.with_quality(quality);
    }
    if let Some(output) = &args.output {
        downloader = downloader.with_output_path(output);
    }
    if let Some(timeout) = args.timeout_duration() {
        downloader = downloader.with_timeout(timeout);
    }
    if let Some(retries) = args.retries {
        downloader = downloader.with_max_retries(retries);
    }
    if let Some(user_agent) = &args.user_agent {
        downloader = downloader.with_user_agent(user_agent);
    }
    if let Some(proxy) = &args.proxy {
        downloader = downloader.with_proxy(proxy);
    }
    if let Some(rate_limit) = args.rate_limit {
        downloader = downloader.with_rate_limit(rate_limit);
    }

    if args.print_url {
        debug!("Print URL mode enabled");
        let locator = downloader.resolve(&args.url).await?;
        println!("{}", locator.url());
        return Ok(());
    }

    let callback = create_progress_callback(formatter.clone());
    let cancel = CancellationToken::new();
    let downloader = downloader
        .with_progress(move |completed, total| callback(completed, total))
        .with_cancellation(cancel.clone());

    formatter.print_download_start(&args.url, &downloader.options().output_dir);
    info!("Starting download for URL: {}", args.url);
    let start_time = Instant::now();

    let url = args.url.clone();
    let mut handle = tokio::spawn(async move { downloader.download(&url).await });

    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = tokio::signal::ctrl_c() => {
            formatter.warning("Interrupted, cleaning up...");
            cancel.cancel();
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Download did not stop within {:?}, aborting", SHUTDOWN_GRACE);
                    handle.abort();
                    return Err(anyhow!("Download cancelled"));
                }
            }
        }
    };

    let outcome = match joined {
        Ok(result) => result?,
        Err(e) if e.is_panic() => return Err(anyhow!("Download task panicked")),
        Err(e) => return Err(anyhow!("Download task failed: {}", e)),
    };

    formatter.finish_progress("done");
    formatter.print_locator(&outcome.locator);
    formatter.print_download_complete(&outcome, start_time.elapsed());
    info!("Download completed successfully");
    Ok(())
}

/// Persist the settings given on the command line
fn save_overrides(
    store: &mut ConfigStore,
    args: &Args,
    quality: Option<embedgrab::Quality>,
) -> anyhow::Result<()> {
    if let Some(output) = &args.output {
        store.set_download_dir(output)?;
    }
    if let Some(quality) = quality {
        store.set_default_quality(quality)?;
    }
    if let Some(timeout) = args.timeout_duration() {
        store.set_timeout(timeout)?;
    }
    if let Some(retries) = args.retries {
        store.set_max_retries(retries)?;
    }
    if let Some(user_agent) = &args.user_agent {
        store.set_user_agent(Some(user_agent.clone()))?;
    }
    Ok(())
}
