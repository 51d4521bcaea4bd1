pub mod fetch;
pub mod locate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

#[derive(Clone, Debug, Parser)]
#[command(name = "segstream", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    #[arg(long, global = true, help = "Config file (default: segstream.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Captured segment URL of the stream")]
    pub url: Option<String>,

    #[arg(long, global = true, help = "Output file name, without the .ts extension")]
    pub name: Option<String>,

    #[arg(short, long, global = true, help = "Number of concurrent workers")]
    pub workers: Option<usize>,

    #[arg(long, global = true, help = "Upper bound of the random sleep between requests (ms)")]
    pub interval_ms: Option<u64>,

    #[arg(long, global = true, help = "Per-request timeout (seconds)")]
    pub timeout_secs: Option<u64>,

    #[arg(long, global = true, help = "Index of the first segment")]
    pub start_index: Option<u64>,

    #[arg(long, global = true, help = "Directory for the output file")]
    pub output_dir: Option<PathBuf>,
}

impl App {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            stream_url: self.url.clone(),
            file_name: self.name.clone(),
            workers: self.workers,
            interval_ms: self.interval_ms,
            timeout_secs: self.timeout_secs,
            start_index: self.start_index,
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "f", name = "fetch", about = "Download the stream into one file")]
    Fetch(fetch::FetchArg),
    #[command(alias = "l", name = "locate", about = "Show the parsed stream and a resolved segment URL")]
    Locate(locate::LocateArg),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Fetch(fetch::FetchArg::default())
    }
}
