use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rssingle::config::OutputFormat;
use rssingle::Destination;

#[derive(Parser, Debug)]
#[command(
    name = "rssingle",
    version,
    about = "Aggregate many RSS/Atom feeds into a single feed"
)]
struct Args {
    /// Configuration file. A relative `output` path in it is resolved against
    /// the directory containing this file, not the working directory
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    /// Output format, overriding the config file
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the feed to stdout instead of writing the output file
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    rssingle::logging::init();

    let args = Args::parse();
    let destination = if args.stdout {
        Destination::Stdout
    } else {
        Destination::File
    };

    rssingle::run(&args.config, args.format, destination).await?;
    Ok(())
}
