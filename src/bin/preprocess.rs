//! Corpus preprocessing CLI
//!
//! Reads a JSON configuration and an LJSpeech-style corpus directory,
//! assembles (token sequence, mel spectrogram) pairs, and writes the
//! serialized training cache.
//!
//! Usage:
//!     cargo run --features cli --bin preprocess -- \
//!         --config config.json --corpus data/LJSpeech-1.1

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use tacotron_prep::{Config, DatasetAssembler};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Corpus directory containing metadata.csv and wavs/
    #[arg(short = 'd', long)]
    corpus: PathBuf,

    /// Override the configured cache output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Eagerly preprocess even when the config leaves `prep` unset
    #[arg(long, default_value_t = false)]
    prep: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)?;
    if args.prep {
        config.prep = true;
    }
    if let Some(output) = args.output {
        config.pth = Some(output);
    }

    tracing::info!(
        "Preprocessing corpus at {} (prep = {})",
        args.corpus.display(),
        config.prep
    );

    let assembler = DatasetAssembler::new(config)?;
    let entries = assembler.assemble(&args.corpus)?;

    tracing::info!("Finished: {} entries", entries.len());
    Ok(())
}
