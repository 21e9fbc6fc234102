//! wqcodes - Look up Water Quality Portal code tables
//!
//! Fetches country, state, and county code tables through an in-memory content
//! cache and prints the raw XML (or a JSON envelope with `--json`).

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use clap::Parser;

use wqcodes::cache::{Content, ContentCache};
use wqcodes::cli::{render_json, Cli, LookupPlan};
use wqcodes::codes::{codes_url, CodesClient};
use wqcodes::config::LookupConfig;
use wqcodes::fetch::HttpFetcher;
use wqcodes::logging::init_logging;

/// Exit status when a lookup has nothing to show
const EXIT_UNAVAILABLE: i32 = 2;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let plan = match LookupPlan::from_cli(&cli) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let config = LookupConfig::load()?;
    init_logging(&config.logging);

    let duration = plan.duration.unwrap_or(config.cache.default_duration());
    let fetcher = HttpFetcher::new(config.cache.fetch_timeout())?;
    let cache = Arc::new(ContentCache::new(fetcher, duration));
    let host = plan.host.clone().unwrap_or(config.url_host);
    let client = CodesClient::new(cache, host);

    // All tables are independent, so fetch them concurrently
    let lookups = plan
        .requests
        .iter()
        .map(|r| client.codes(r.code_type, r.filter.as_deref()));
    let results: Vec<Content> = futures::future::join_all(lookups).await;

    let mut stdout = io::stdout().lock();
    let mut unavailable = false;
    for (request, content) in plan.requests.iter().zip(&results) {
        let url = codes_url(client.host(), request.code_type, request.filter.as_deref());
        if !content.is_available() {
            eprintln!("error: no {} codes available from {}", request.code_type, url);
            unavailable = true;
        }

        if plan.json {
            let expires_at = client.cache().expires_at(&url);
            let value = render_json(request.code_type, &url, content, expires_at);
            writeln!(stdout, "{}", value)?;
        } else if content.is_available() {
            stdout.write_all(content.bytes())?;
            writeln!(stdout)?;
        }
    }
    stdout.flush()?;

    if unavailable {
        process::exit(EXIT_UNAVAILABLE);
    }
    Ok(())
}
