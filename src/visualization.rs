//! Loading a fitted model with its corpus and rendering it either as a
//! heatmap or as an interactive exploration bundle.

use std::path::{Path, PathBuf};

use log::{debug, error, info};
use ndarray::Array2;

use crate::corpus::MmCorpus;
use crate::dictionary::Dictionary;
use crate::documents::read_labels;
use crate::error::{Error, Result};
use crate::heatmap::HeatmapFigure;
use crate::interactive::{self, PreparedData};
use crate::model::TopicModel;

pub const INTERACTIVE_FILENAME: &str = "corpus_interactive";
/// Number of top terms used as a topic's column label.
const TOPIC_LABEL_TERMS: usize = 3;

/// What the session is loaded for; decides whether document labels or the
/// dictionary are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Heatmap,
    Interactive,
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub corpus: PathBuf,
    /// Plain-text label file, one label per document (heatmap mode).
    pub doc_labels: Option<PathBuf>,
    /// Dictionary artifact (interactive mode).
    pub dictionary: Option<PathBuf>,
}

impl ArtifactPaths {
    /// The conventional layout of a preprocessing output folder.
    pub fn in_dir(dir: &Path) -> Self {
        ArtifactPaths {
            model: dir.join("corpus.lda"),
            corpus: dir.join("corpus.mm"),
            doc_labels: Some(dir.join("corpus_doclabels.txt")),
            dictionary: Some(dir.join("corpus.dict")),
        }
    }
}

#[derive(Debug)]
enum Companion {
    Labels(Vec<String>),
    Dictionary(Dictionary),
}

#[derive(Debug)]
pub struct Visualization {
    model: TopicModel,
    corpus: MmCorpus,
    companion: Companion,
    heatmap: Option<HeatmapFigure>,
    interactive: Option<PreparedData>,
}

impl Visualization {
    /// Load the artifacts `mode` needs. Failures are logged and returned.
    pub fn load(paths: &ArtifactPaths, mode: Mode) -> Result<Self> {
        Self::load_inner(paths, mode).map_err(|err| {
            match &err {
                Error::NotFound { path } => error!("OS error: {} not found", path.display()),
                Error::Mismatch(message) => error!("Value error: {message}"),
                other => error!("Loading failed: {other}"),
            }
            err
        })
    }

    fn load_inner(paths: &ArtifactPaths, mode: Mode) -> Result<Self> {
        let corpus = MmCorpus::load(&paths.corpus)?;
        let model = TopicModel::load(&paths.model)?;
        if corpus.num_terms() > model.num_terms() {
            return Err(Error::mismatch(format!(
                "corpus has {} terms but the model only knows {}",
                corpus.num_terms(),
                model.num_terms()
            )));
        }

        let companion = match mode {
            Mode::Heatmap => {
                info!("Accessing doc_labels ...");
                let path = paths
                    .doc_labels
                    .as_deref()
                    .ok_or_else(|| Error::invalid_argument("heatmap mode needs a document label file"))?;
                let labels = read_labels(path)?;
                if labels.len() != corpus.len() {
                    return Err(Error::mismatch(format!(
                        "{} document labels for {} corpus documents",
                        labels.len(),
                        corpus.len()
                    )));
                }
                debug!("Corpus, model and doc_labels available.");
                Companion::Labels(labels)
            }
            Mode::Interactive => {
                let path = paths
                    .dictionary
                    .as_deref()
                    .ok_or_else(|| Error::invalid_argument("interactive mode needs a dictionary"))?;
                let dictionary = Dictionary::load(path)?;
                if dictionary.len() != model.num_terms() {
                    return Err(Error::mismatch(format!(
                        "dictionary has {} terms, model has {}",
                        dictionary.len(),
                        model.num_terms()
                    )));
                }
                debug!("Corpus, model and dictionary available.");
                Companion::Dictionary(dictionary)
            }
        };

        Ok(Visualization {
            model,
            corpus,
            companion,
            heatmap: None,
            interactive: None,
        })
    }

    pub fn model(&self) -> &TopicModel {
        &self.model
    }

    pub fn corpus(&self) -> &MmCorpus {
        &self.corpus
    }

    pub fn heatmap(&self) -> Option<&HeatmapFigure> {
        self.heatmap.as_ref()
    }

    pub fn interactive(&self) -> Option<&PreparedData> {
        self.interactive.as_ref()
    }

    /// Fill the document x topic grid from the model's per-document topic
    /// distributions and label it.
    pub fn make_heatmap(&mut self) -> Result<&HeatmapFigure> {
        let Companion::Labels(doc_labels) = &self.companion else {
            return Err(Error::invalid_argument("heatmap needs a session loaded in heatmap mode"));
        };

        let num_topics = self.model.num_topics();
        let mut doc_topic = Array2::<f64>::zeros((doc_labels.len(), num_topics));

        info!("Accessing topic distribution and topic probability ...");
        for (i, bow) in self.corpus.documents().iter().enumerate() {
            for (topic, probability) in self.model.get_document_topics(bow)? {
                doc_topic[[i, topic]] = probability;
            }
        }

        info!("Accessing plot labels ...");
        let topic_labels = (0..num_topics)
            .map(|topic| self.model.topic_label(topic, TOPIC_LABEL_TERMS))
            .collect::<Result<Vec<String>>>()?;
        debug!("{} plot labels available.", topic_labels.len());

        info!("Creating heatmap figure ...");
        let figure = HeatmapFigure::new(doc_topic, doc_labels.clone(), topic_labels)?;
        Ok(self.heatmap.insert(figure))
    }

    pub fn save_heatmap(&self, dir: &Path, filename: &str, ext: &str, dpi: u32) -> Result<PathBuf> {
        info!("Saving heatmap figure...");
        let figure = self.heatmap.as_ref().ok_or_else(|| {
            error!("Run make_heatmap() before save_heatmap()");
            Error::NotGenerated("heatmap")
        })?;
        figure.save(dir, filename, ext, dpi)
    }

    pub fn make_interactive(&mut self) -> Result<&PreparedData> {
        let Companion::Dictionary(dictionary) = &self.companion else {
            return Err(Error::invalid_argument(
                "interactive visualization needs a session loaded in interactive mode",
            ));
        };
        info!("Accessing model, corpus and dictionary ...");
        let prepared = interactive::prepare(&self.model, &self.corpus, dictionary)?;
        debug!("Interactive visualization available.");
        Ok(self.interactive.insert(prepared))
    }

    /// Write `corpus_interactive.html` and `corpus_interactive.json` into
    /// `dir`. Returns both paths.
    pub fn save_interactive(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        info!("Saving interactive visualization ...");
        let prepared = self.interactive.as_ref().ok_or_else(|| {
            error!("Run make_interactive() before save_interactive()");
            Error::NotGenerated("interactive visualization")
        })?;
        let html = dir.join(format!("{INTERACTIVE_FILENAME}.html"));
        let json = dir.join(format!("{INTERACTIVE_FILENAME}.json"));
        prepared.save_html(&html)?;
        prepared.save_json(&json)?;
        debug!(
            "Interactive visualization available at {} and {}",
            html.display(),
            json.display()
        );
        Ok((html, json))
    }
}
