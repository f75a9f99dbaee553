//! Unicode-aware tokenization and fixed-size segmentation.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use regex::Regex;

use crate::error::{Error, Result};

// Numbers with inner punctuation, currency-like amounts, words with inner
// apostrophes or hyphens. Alternation order matters: leftmost alternative wins.
const NUMBER: &str = r"\p{N}[\p{N}\p{P}]*\p{N}";
const AMOUNT: &str = r"\p{S}?\p{N}[\p{P}\p{N}]{3}\p{S}?";
const WORD: &str = r"\p{L}[\p{L}\p{P}]*\p{L}";
const LETTER: &str = r"\p{L}{1}";
const ORDINAL: &str = r"\p{N}\p{L}+";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    English,
    French,
    #[default]
    German,
    Spanish,
    Portuguese,
}

impl Language {
    fn pattern(self) -> String {
        let parts: &[&str] = match self {
            Language::English => &[NUMBER, AMOUNT, WORD, LETTER, ORDINAL],
            Language::French | Language::German => &[WORD, NUMBER, AMOUNT],
            Language::Spanish | Language::Portuguese => &[NUMBER, AMOUNT, WORD, LETTER],
        };
        parts.join("|")
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "fr" => Ok(Language::French),
            "german" | "de" => Ok(Language::German),
            "spanish" | "es" => Ok(Language::Spanish),
            "portuguese" | "pt" => Ok(Language::Portuguese),
            other => Err(Error::invalid_argument(format!("unsupported language '{other}'"))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
            Language::Spanish => "spanish",
            Language::Portuguese => "portuguese",
        };
        f.write_str(name)
    }
}

/// Lower-cases text and extracts tokens with a language specific pattern.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    language: Language,
    pattern: Regex,
}

impl Tokenizer {
    pub fn new(language: Language) -> Result<Self> {
        let pattern = Regex::new(&language.pattern())?;
        Ok(Tokenizer { language, pattern })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// How documents are turned into terms for profiling and matrix building.
#[derive(Debug, Clone)]
pub enum Splitter {
    /// Split on whitespace, no normalization.
    Whitespace,
    Pattern(Tokenizer),
}

impl Splitter {
    pub fn split(&self, text: &str) -> Vec<String> {
        match self {
            Splitter::Whitespace => text.split_whitespace().map(str::to_string).collect(),
            Splitter::Pattern(tokenizer) => tokenizer.tokenize(text),
        }
    }
}

/// Cut a token stream into consecutive segments of `length` tokens; the last
/// segment holds the remainder.
pub fn segmenter(tokens: &[String], length: usize) -> Result<Vec<Vec<String>>> {
    if length == 0 {
        return Err(Error::invalid_argument("segment length must be positive"));
    }
    info!("Segmenting document ...");
    let segments: Vec<Vec<String>> = tokens.chunks(length).map(<[String]>::to_vec).collect();
    debug!("{} segments of up to {} tokens.", segments.len(), length);
    Ok(segments)
}
