//! cachet command-line entry point.
//!
//! Performs one cached fetch and prints the outcome as JSON on stdout.
//! Logging goes to stderr so the output stays machine-readable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use cachet_client::headers::to_header_object;
use cachet_client::{CacheConfig, CacheItem, CachedFetcher, FetchConfig, HttpTransport, PolicyOptions, RequestOptions};
use cachet_core::{AppConfig, CacheOptions, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "cachet")]
#[command(about = "Fetch a URL through a persistent HTTP cache", long_about = None)]
struct Args {
    /// URL to fetch
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header as `name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short = 'd', long)]
    data: Option<String>,

    /// Cache key (defaults to the canonical URL)
    #[arg(long)]
    key: Option<String>,

    /// TTL override in seconds
    #[arg(long)]
    ttl: Option<u64>,

    /// Skip the cache lookup (the response may still be stored)
    #[arg(long)]
    skip_cache: bool,

    /// SQLite store path (overrides CACHET_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw.split_once(':').with_context(|| format!("header must be `name: value`, got {raw:?}"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).with_context(|| format!("invalid header name in {raw:?}"))?;
    let value = HeaderValue::from_str(value.trim()).with_context(|| format!("invalid header value in {raw:?}"))?;
    Ok((name, value))
}

fn build_request(args: &Args) -> Result<RequestOptions> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {:?}", args.method))?;

    let mut request = RequestOptions::new(method);
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = &args.data {
        request = request.with_body(data.clone());
    }
    request.skip_cache = args.skip_cache;
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = AppConfig::load()?;
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }

    let request = build_request(&args)?;

    let store = SqliteStore::<CacheItem>::open(&config.db_path)
        .await
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;
    let transport = HttpTransport::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let fetcher: CachedFetcher =
        CachedFetcher::new(Arc::new(transport), Arc::new(store)).with_key_prefix(config.key_prefix.clone());

    let cache_config = CacheConfig {
        cache_key: args.key.clone(),
        cache_options: args.ttl.or(config.default_ttl).map(|ttl| CacheOptions::with_ttl(ttl).into()),
        policy: PolicyOptions { shared: config.shared_cache, ..Default::default() },
    };

    tracing::info!(url = %args.url, method = %request.method, "fetching");

    let mut result = fetcher.fetch(&args.url, &request, &cache_config).await?;

    let stored = match result.cache_write.take() {
        Some(write) => match write.wait().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "response not cached");
                false
            }
        },
        None => false,
    };

    let output = json!({
        "url": result.response.url.as_str(),
        "status": result.response.status.as_u16(),
        "from_cache": result.from_cache,
        "stored": stored,
        "headers": to_header_object(&result.response.headers),
        "body": result.body,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
