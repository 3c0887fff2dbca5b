//! Standalone scrape pipeline.
//!
//! Usage:
//!   listing-scout-dump "cleaning services singapore"
//!   listing-scout-dump "maid agency singapore" --headless [--out-dir DIR]
//!
//! On success the dump path is printed to stdout as the sole
//! machine-readable result (the HTTP boundary picks it up from there); all
//! logging goes to stderr. Failure is a non-zero exit with the error on
//! stderr.

use std::path::PathBuf;

use anyhow::bail;

use listing_scout::artifact;
use listing_scout::scraping::{scrape_listings, ScrapeOptions};

struct CliArgs {
    query: String,
    headless: bool,
    out_dir: PathBuf,
}

fn usage() -> &'static str {
    "usage: listing-scout-dump <query> [--headless] [--out-dir <dir>]"
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut query: Option<String> = None;
    let mut headless = false;
    let mut out_dir: Option<PathBuf> = None;

    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--headless" {
            headless = true;
        } else if a == "--out-dir" {
            match args.next() {
                Some(v) => out_dir = Some(PathBuf::from(v)),
                None => bail!("--out-dir requires a value\n{}", usage()),
            }
        } else if let Some(rest) = a.strip_prefix("--out-dir=") {
            out_dir = Some(PathBuf::from(rest));
        } else if a.starts_with("--") {
            bail!("unknown flag: {}\n{}", a, usage());
        } else if query.is_none() {
            query = Some(a);
        } else {
            bail!("unexpected extra argument: {:?} (quote the query)\n{}", a, usage());
        }
    }

    let Some(query) = query else {
        bail!("missing query\n{}", usage());
    };

    Ok(CliArgs {
        query,
        headless,
        out_dir: out_dir.unwrap_or_else(|| PathBuf::from(".")),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout must carry only the dump path; route logs to stderr.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let opts = ScrapeOptions::from_env().headless(args.headless);
    let text = scrape_listings(&args.query, &opts).await?;

    tokio::fs::create_dir_all(&args.out_dir).await?;
    let path = artifact::write_dump(&args.out_dir, &args.query, &text).await?;

    println!("{}", path.display());
    Ok(())
}
