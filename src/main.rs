//  ┌─┐┌─┐  ┌─┐┬┌┐┌┌┬┐┌─┐┬─┐
//  │ │├─┤  ├┤ ││││ ││├┤ ├┬┘
//  └─┘┴ ┴  └  ┴┘└┘─┴┘└─┘┴└─

// Looks for legal, freely readable copies of an article across public archives and indexes.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

mod aggregator;
mod config;
mod sources;
mod target;
mod web;

use aggregator::{Aggregator, Outcome};
use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use target::Target;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// CL arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Find open access copies of an article", long_about = None)]
struct Args {
    /// Article URL to check (scheme optional)
    #[arg(required_unless_present_any = ["web", "init_config"])]
    url: Option<String>,

    /// Print the outcome as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Start the browser interface instead of checking a single URL
    #[arg(long, default_value_t = false)]
    web: bool,

    #[arg(long)]
    web_port: Option<u16>,

    /// Config file, defaults to .oafinder.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a default .oafinder.toml and exit
    #[arg(long, default_value_t = false)]
    init_config: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    if let Some(port) = args.web_port {
        config.web.port = port;
    }
    Ok(config)
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists. Remove it first or edit it manually.", path.display());
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    println!("{}", "=".repeat(64));
    println!("   Open access lookup");
    println!("{}", "=".repeat(64));
    println!("URL: {}", outcome.target.url);
    match &outcome.target.doi {
        Some(doi) => println!("DOI: {}", doi),
        None => println!("DOI: Not found"),
    }
    if !outcome.target.title_hint.is_empty() {
        println!("Title hint: {}", outcome.target.title_hint);
    }

    for result in &outcome.results {
        println!("\n[{}] {}", result.status.label(), result.title);
        println!("   {}", result.summary);
        for link in &result.links {
            println!("   - {}: {}", link.label, link.href);
        }
    }

    println!("\n{}", "=".repeat(64));
    println!("Working: {}", outcome.counts.working);
    println!("Not worked: {}", outcome.counts.not_working);
    println!("Unknown: {}", outcome.counts.unknown);
    println!("{}\n", "=".repeat(64));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        return init_config(Path::new(DEFAULT_CONFIG_FILE));
    }

    init_logging(args.verbose);
    debug!("Arguments: {:?}", args);

    let config = load_config(&args)?;
    let aggregator = Aggregator::from_config(&config)?;

    if args.web {
        let ip: IpAddr = config
            .web
            .host
            .parse()
            .with_context(|| format!("Invalid web host: {}", config.web.host))?;
        web::start_web_server(aggregator, SocketAddr::new(ip, config.web.port)).await;
        return Ok(());
    }

    // Validation happens before any request goes out
    let raw = args.url.as_deref().unwrap_or_default();
    let target = match Target::from_input(raw) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = aggregator.run(&target).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_config_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        init_config(&path).unwrap();
        let written = Config::load(&path).unwrap();
        assert_eq!(written.web.port, 6601);
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[web]\nport = 9000\n").unwrap();

        let err = init_config(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[web]\nport = 9000\n");
    }
}
