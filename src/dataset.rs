//! Corpus assembly: manifest reading and preprocessed-pair serialization.
//!
//! Reads an LJSpeech-style `metadata.csv` (`id|transcript` records, pipe
//! delimited) and either passes raw (transcript, audio path) pairs through
//! or eagerly computes (token sequence, mel spectrogram) pairs when the
//! `prep` flag is set. When an output path is configured the full entry
//! list, raw or prepared, is serialized there. Per-record problems skip the
//! record with a log line; only failures of the final cache write abort the
//! run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::audio::{load_for_training, SpectrogramEngine};
use crate::config::Config;
use crate::text::TextTokenizer;

/// One corpus record, raw or preprocessed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CorpusEntry {
    /// Transcript and audio path, passed through unprocessed
    Raw { text: String, wav_path: PathBuf },
    /// Eagerly computed token sequence and mel spectrogram
    Prepared {
        tokens: Vec<u32>,
        /// Frame-major normalized log-mel spectrogram
        mel: Vec<Vec<f32>>,
        wav_path: PathBuf,
    },
}

/// Walks a corpus manifest and produces training entries
pub struct DatasetAssembler {
    config: Config,
    engine: SpectrogramEngine,
    tokenizer: TextTokenizer,
}

impl DatasetAssembler {
    /// Create an assembler; validates the config through the engine
    pub fn new(config: Config) -> Result<Self> {
        let tokenizer = TextTokenizer::new(&config.text_cleaners)?;
        let engine = SpectrogramEngine::new(config.clone())?;
        Ok(Self {
            config,
            engine,
            tokenizer,
        })
    }

    /// The assembler's spectrogram engine
    pub fn engine(&self) -> &SpectrogramEngine {
        &self.engine
    }

    /// Read `metadata.csv` from `corpus_dir`, assemble entries, and write
    /// the serialized cache (raw or prepared) when an output path is
    /// configured.
    pub fn assemble<P: AsRef<Path>>(&self, corpus_dir: P) -> Result<Vec<CorpusEntry>> {
        let dir = corpus_dir.as_ref();
        let manifest = dir.join("metadata.csv");
        let file = File::open(&manifest)
            .with_context(|| format!("Failed to open manifest: {}", manifest.display()))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read manifest: {}", manifest.display()))?;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.splitn(3, '|');
            let (id, text) = match (parts.next(), parts.next()) {
                (Some(id), Some(text)) if !id.is_empty() && !text.is_empty() => (id, text),
                _ => {
                    tracing::warn!("Skipping malformed manifest line {}", lineno + 1);
                    continue;
                }
            };

            let wav_path = dir.join("wavs").join(format!("{id}.wav"));
            if self.config.prep {
                match self.prepare_entry(text, &wav_path) {
                    Ok(Some(entry)) => entries.push(entry),
                    // Sample-rate mismatch; the loader already logged it
                    Ok(None) => {}
                    Err(err) => {
                        tracing::error!(
                            "Skipping {}: {err:#}",
                            wav_path.display()
                        );
                    }
                }
            } else {
                entries.push(CorpusEntry::Raw {
                    text: text.to_string(),
                    wav_path,
                });
            }
        }

        tracing::info!("Assembled {} corpus entries", entries.len());

        if let Some(pth) = &self.config.pth {
            self.write_cache(pth, &entries)?;
        }

        Ok(entries)
    }

    fn prepare_entry(&self, text: &str, wav_path: &Path) -> Result<Option<CorpusEntry>> {
        let Some(audio) = load_for_training(wav_path, self.config.sample_rate)? else {
            return Ok(None);
        };

        let tokens = self.tokenizer.text_to_sequence(text);
        let mel = self.engine.melspectrogram(&audio.samples);

        Ok(Some(CorpusEntry::Prepared {
            tokens,
            mel,
            wav_path: wav_path.to_path_buf(),
        }))
    }

    /// Serialize the full entry list; failure here aborts the run since the
    /// cache is the whole output
    fn write_cache(&self, path: &Path, entries: &[CorpusEntry]) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create corpus cache: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, entries)
            .with_context(|| format!("Failed to serialize corpus cache: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write corpus cache: {}", path.display()))?;
        tracing::info!("Wrote corpus cache: {}", path.display());
        Ok(())
    }
}

/// Load a previously serialized corpus cache
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusEntry>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open corpus cache: {}", path.display()))?;
    let entries = bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize corpus cache: {}", path.display()))?;
    Ok(entries)
}
