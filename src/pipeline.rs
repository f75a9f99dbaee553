//! The preprocessing pipeline: from a folder of documents to the corpus,
//! dictionary and label artifacts a topic modeling routine consumes.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::annotation::{self, DEFAULT_POS_TAGS};
use crate::corpus::MmCorpus;
use crate::dictionary::Dictionary;
use crate::documents::{self, write_labels};
use crate::error::{Error, Result};
use crate::frequency::TermFrequency;
use crate::matrix::TermDocumentMatrix;
use crate::models::LabeledDocument;
use crate::tokenize::{segmenter, Language, Splitter, Tokenizer};

pub const CORPUS_FILENAME: &str = "corpus.mm";
pub const DICTIONARY_FILENAME: &str = "corpus.dict";
pub const LABELS_FILENAME: &str = "corpus_doclabels.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Plain UTF-8 text files.
    Text,
    /// Tab-separated annotation tables; only lemmas with selected POS tags
    /// are used.
    Annotated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    Whitespace,
    /// The language specific tokenizer.
    Pattern,
}

/// One feature removal step. Each step is computed from the frequencies
/// left by the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFilter {
    /// Remove the `n` most frequent terms.
    Stopwords(usize),
    Hapax,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub format: InputFormat,
    /// File extension looked up in the input folder.
    pub extension: String,
    pub language: Language,
    pub split: SplitMode,
    pub pos_tags: Vec<String>,
    pub filters: Vec<FeatureFilter>,
    /// Cut each document into segments of this many tokens.
    pub segment_length: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            format: InputFormat::Text,
            extension: "txt".to_string(),
            language: Language::German,
            split: SplitMode::Whitespace,
            pos_tags: DEFAULT_POS_TAGS.iter().map(|tag| tag.to_string()).collect(),
            filters: vec![FeatureFilter::Hapax],
            segment_length: None,
        }
    }
}

/// What a pipeline run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub labels: Vec<String>,
    pub frequencies: TermFrequency,
    pub matrix: TermDocumentMatrix,
    /// Number of terms removed by each filter, in order.
    pub removed: Vec<(FeatureFilter, usize)>,
}

impl PipelineOutput {
    pub fn corpus(&self) -> MmCorpus {
        MmCorpus::from_matrix(&self.matrix)
    }

    pub fn dictionary(&self) -> Dictionary {
        Dictionary::from_matrix(&self.matrix)
    }

    /// Write `corpus.mm`, `corpus.dict` and `corpus_doclabels.txt` to `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.corpus().save(&dir.join(CORPUS_FILENAME))?;
        self.dictionary().save(&dir.join(DICTIONARY_FILENAME))?;
        write_labels(&dir.join(LABELS_FILENAME), &self.labels)?;
        info!("Artifacts written to {}.", dir.display());
        Ok(())
    }
}

pub struct Preprocessor {
    config: PipelineConfig,
    splitter: Splitter,
}

impl Preprocessor {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let splitter = match config.split {
            SplitMode::Whitespace => Splitter::Whitespace,
            SplitMode::Pattern => Splitter::Pattern(Tokenizer::new(config.language)?),
        };
        if config.segment_length == Some(0) {
            return Err(Error::invalid_argument("segment length must be positive"));
        }
        Ok(Preprocessor { config, splitter })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every matching document in `dir`.
    pub fn read_dir(&self, dir: &Path) -> Result<Vec<LabeledDocument>> {
        let doclist: Vec<PathBuf> = documents::create_document_list(dir, &self.config.extension)?;
        let labels = documents::document_labels(&doclist);

        let texts: Vec<String> = match self.config.format {
            InputFormat::Text => documents::read_from_txt(&doclist).collect::<Result<_>>()?,
            InputFormat::Annotated => annotation::read_from_csv(&doclist)
                .map(|rows| rows.map(|rows| annotation::filter_pos_tags(&rows, &self.config.pos_tags).join(" ")))
                .collect::<Result<_>>()?,
        };

        Ok(labels
            .into_iter()
            .zip(texts)
            .map(|(label, text)| LabeledDocument::new(label, text))
            .collect())
    }

    /// Split (and segment) documents into labelled token streams.
    pub fn tokenize(&self, docs: &[LabeledDocument]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut labels = Vec::new();
        let mut streams = Vec::new();
        for doc in docs {
            let tokens = self.splitter.split(&doc.text);
            match self.config.segment_length {
                Some(length) => {
                    for (i, segment) in segmenter(&tokens, length)?.into_iter().enumerate() {
                        labels.push(format!("{}_{}", doc.label, i));
                        streams.push(segment);
                    }
                }
                None => {
                    labels.push(doc.label.clone());
                    streams.push(tokens);
                }
            }
        }
        debug!("{} token streams from {} documents.", streams.len(), docs.len());
        Ok((labels, streams))
    }

    /// Profile, filter and vectorize already-read documents.
    pub fn process(&self, docs: &[LabeledDocument]) -> Result<PipelineOutput> {
        let (labels, streams) = self.tokenize(docs)?;

        let mut frequencies =
            TermFrequency::from_token_streams(streams.iter().map(|stream| stream.iter().cloned()));
        let mut removed = Vec::with_capacity(self.config.filters.len());
        for &filter in &self.config.filters {
            let features = match filter {
                FeatureFilter::Stopwords(mfw) => frequencies.find_stopwords(mfw),
                FeatureFilter::Hapax => frequencies.find_hapax(),
            };
            let count = frequencies.remove_by_frequency_list(&features);
            removed.push((filter, count));
        }

        let matrix = TermDocumentMatrix::from_token_streams(frequencies.vocabulary(), &streams);
        info!(
            "{} documents, {} terms, {} tokens in the matrix.",
            matrix.n_documents(),
            matrix.n_terms(),
            matrix.total()
        );

        Ok(PipelineOutput {
            labels,
            frequencies,
            matrix,
            removed,
        })
    }

    pub fn run(&self, input_dir: &Path) -> Result<PipelineOutput> {
        let docs = self.read_dir(input_dir)?;
        self.process(&docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn docs() -> Vec<LabeledDocument> {
        vec![
            LabeledDocument::new("a", "the cat sat"),
            LabeledDocument::new("b", "the dog sat"),
        ]
    }

    #[test]
    fn test_default_config_removes_hapax() {
        let output = Preprocessor::new(PipelineConfig::default())
            .unwrap()
            .process(&docs())
            .unwrap();

        assert_eq!(output.labels, vec!["a", "b"]);
        assert_eq!(output.matrix.vocabulary(), &["sat".to_string(), "the".to_string()]);
        assert_eq!(output.matrix.term_document(), array![[1usize, 1], [1, 1]]);
        assert_eq!(output.removed, vec![(FeatureFilter::Hapax, 2)]);
    }

    #[test]
    fn test_filters_apply_in_order() {
        let docs = vec![LabeledDocument::new("x", "a a a b b c d")];

        let config = PipelineConfig {
            filters: vec![FeatureFilter::Stopwords(1), FeatureFilter::Hapax],
            ..PipelineConfig::default()
        };
        let output = Preprocessor::new(config).unwrap().process(&docs).unwrap();
        assert_eq!(output.frequencies.vocabulary(), vec!["b"]);

        let config = PipelineConfig {
            filters: vec![FeatureFilter::Hapax, FeatureFilter::Stopwords(1)],
            ..PipelineConfig::default()
        };
        let output = Preprocessor::new(config).unwrap().process(&docs).unwrap();
        assert_eq!(output.frequencies.vocabulary(), vec!["b"]);
        assert_eq!(
            output.removed,
            vec![(FeatureFilter::Hapax, 2), (FeatureFilter::Stopwords(1), 1)]
        );
    }

    #[test]
    fn test_pattern_split_and_segmentation() {
        let config = PipelineConfig {
            language: Language::English,
            split: SplitMode::Pattern,
            filters: Vec::new(),
            segment_length: Some(2),
            ..PipelineConfig::default()
        };
        let docs = vec![LabeledDocument::new("doc", "The Cat, the dog.")];
        let output = Preprocessor::new(config).unwrap().process(&docs).unwrap();

        assert_eq!(output.labels, vec!["doc_0", "doc_1"]);
        assert_eq!(output.frequencies.get("the"), Some(2));
        assert_eq!(output.matrix.n_documents(), 2);
        assert_eq!(output.matrix.total(), 4);
    }

    #[test]
    fn test_zero_segment_length_rejected() {
        let config = PipelineConfig {
            segment_length: Some(0),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Preprocessor::new(config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
