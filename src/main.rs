use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pget::cli::{self, Options};
use pget::commands;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single URL to download (takes precedence over --text)
    #[arg(short, long)]
    url: Option<String>,

    /// Text containing URLs to download
    #[arg(short = 's', long)]
    text: Option<String>,

    /// Output directory (a file path is reduced to its directory)
    #[arg(short, long, default_value = "./")]
    output: String,

    /// Global worker budget shared by all downloads (defaults to logical CPUs)
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,

    /// Reuse partial files left behind by an earlier run
    #[arg(short, long, action = clap::ArgAction::Set, default_value_t = true)]
    resume: bool,

    /// Suppress progress bars
    #[arg(long)]
    silence: bool,

    /// Only download https:// URLs
    #[arg(long)]
    https_only: bool,
}

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries the rewritten text.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let content = match (args.url, args.text) {
        (Some(url), _) => url,
        (None, Some(text)) => text,
        (None, None) => return Ok(()),
    };

    let options = Options {
        output: cli::normalize_output_dir(&args.output),
        concurrency: args.concurrency.unwrap_or_else(num_cpus::get).max(1),
        resume: args.resume,
        silent: args.silence,
        https_only: args.https_only,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let rewritten = rt.block_on(commands::run_downloads(content, &options))?;
    println!("{rewritten}");
    Ok(())
}
