//! CLI entry point for the urlmirror tool.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use urlmirror_core::input::{read_stdin, read_url_file};
use urlmirror_core::user_agent::BROWSER_USER_AGENT;
use urlmirror_core::{
    ClientOptions, FetchEngine, HttpClient, PolicyConfig, UrlPathMap, parse_url_list,
};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout is reserved for the JSON map
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let urls = collect_urls(&args)?;
    if urls.is_empty() {
        error!("no URLs given; pass URLs as arguments, with -I FILE, or on stdin");
        return Ok(ExitCode::FAILURE);
    }

    let mut policy = PolicyConfig::new(&args.save_dir)
        .with_suffix(args.suffix_policy())
        .with_flatten(args.flatten_mode())
        .with_preserve_query(args.preserve_query_params)
        .with_skip_existing(args.skip_existing)
        .with_fallback(args.fallback_style());
    if let Some(prefix) = &args.strip_url_prefix {
        policy = policy
            .with_strip_prefix(prefix)
            .context("invalid --strip-url-prefix")?;
    }

    info!(
        urls = urls.len(),
        save_dir = %policy.base_dir().display(),
        strip_prefix = policy.strip_prefix().map(url::Url::as_str),
        layout = %policy.flatten(),
        suffix = %policy.suffix(),
        skip_existing = policy.skip_existing(),
        preserve_query = policy.preserve_query(),
        fallback = ?policy.fallback(),
        mode = ?args.execution_mode(),
        "urlmirror starting"
    );

    let client = HttpClient::with_options(&ClientOptions {
        user_agent: args
            .user_agent
            .clone()
            .unwrap_or_else(|| BROWSER_USER_AGENT.to_string()),
        timeout: Duration::from_secs(args.timeout),
        max_idle_per_host: usize::from(args.per_host),
    })?;

    let engine = FetchEngine::new(
        policy,
        client,
        usize::from(args.concurrency),
        usize::from(args.per_host),
    )?
    .with_mode(args.execution_mode());

    let report = tokio::select! {
        report = engine.run(&urls) => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; aborting run");
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(target) = &args.save_url_to_path_map_json {
        write_map(&report.map, target)?;
    }

    info!(
        succeeded = report.summary.succeeded,
        skipped = report.summary.skipped,
        failed = report.summary.failed,
        total = report.summary.total(),
        "urlmirror finished"
    );

    if report.summary.is_failure() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Gathers URLs from `-I` files, then positional arguments, and (when
/// neither is given) stdin.
fn collect_urls(args: &Args) -> Result<Vec<String>> {
    let mut urls = Vec::new();

    for path in &args.files {
        match read_url_file(path) {
            Ok(found) => urls.extend(found),
            Err(e) => warn!(error = %e, "skipping URL list"),
        }
    }

    urls.extend(args.urls.iter().cloned());

    if args.urls.is_empty() && args.files.is_empty() && !io::stdin().is_terminal() {
        let text = read_stdin().context("failed to read URLs from stdin")?;
        urls.extend(parse_url_list(&text));
    }

    Ok(urls)
}

fn write_map(map: &UrlPathMap, target: &Path) -> Result<()> {
    if target.as_os_str() == "-" {
        map.write_json(io::stdout().lock())
            .context("failed to write URL map to stdout")?;
    } else {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = std::fs::File::create(target)
            .with_context(|| format!("failed to create {}", target.display()))?;
        map.write_json(io::BufWriter::new(file))
            .with_context(|| format!("failed to write {}", target.display()))?;
        info!(path = %target.display(), entries = map.len(), "wrote URL map");
    }
    Ok(())
}
