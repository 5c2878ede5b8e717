//! Character-level text tokenizer.
//!
//! Thin collaborator for the dataset assembler: cleans a transcript with a
//! configured list of cleaners and maps it onto a fixed Tacotron-style
//! symbol table. Characters outside the table are dropped.

use anyhow::{bail, Result};

/// Symbol table: pad, eos, punctuation, space, ASCII letters.
/// A character's position is its token ID.
const SYMBOLS: &str = "_~-!'(),.:;? abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Token ID of the padding symbol `_`
pub const PAD_ID: u32 = 0;
/// Token ID of the end-of-sequence symbol `~`
pub const EOS_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cleaner {
    Lowercase,
    CollapseWhitespace,
    /// Lowercase + collapse whitespace
    Basic,
}

impl Cleaner {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "lowercase" => Ok(Self::Lowercase),
            "collapse_whitespace" => Ok(Self::CollapseWhitespace),
            "basic_cleaners" => Ok(Self::Basic),
            other => bail!("Unknown text cleaner: '{other}'"),
        }
    }

    fn apply(self, text: &str) -> String {
        match self {
            Self::Lowercase => text.to_lowercase(),
            Self::CollapseWhitespace => collapse_whitespace(text),
            Self::Basic => collapse_whitespace(&text.to_lowercase()),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.trim().to_string()
}

/// Transcript-to-token-sequence converter
#[derive(Debug)]
pub struct TextTokenizer {
    cleaners: Vec<Cleaner>,
}

impl TextTokenizer {
    /// Create a tokenizer from cleaner names; unknown names are an error
    pub fn new(cleaner_names: &[String]) -> Result<Self> {
        let cleaners = cleaner_names
            .iter()
            .map(|name| Cleaner::parse(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { cleaners })
    }

    /// Clean `text` and convert it to token IDs, terminated by EOS
    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        let mut cleaned = text.to_string();
        for cleaner in &self.cleaners {
            cleaned = cleaner.apply(&cleaned);
        }

        let mut sequence: Vec<u32> = cleaned.chars().filter_map(symbol_id).collect();
        sequence.push(EOS_ID);
        sequence
    }

    /// Size of the symbol table
    pub fn vocab_size(&self) -> usize {
        SYMBOLS.chars().count()
    }
}

fn symbol_id(c: char) -> Option<u32> {
    SYMBOLS.chars().position(|s| s == c).map(|i| i as u32)
}
