//! Fitted topic models, loaded from a JSON artifact produced by an external
//! modeling routine, and inference of per-document topic distributions.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::digamma;

use crate::error::{Error, Result};

pub const DEFAULT_MINIMUM_PROBABILITY: f64 = 0.01;
const MAX_INFERENCE_ITERATIONS: usize = 50;
const GAMMA_THRESHOLD: f64 = 0.001;

/// On-disk layout of a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    num_topics: usize,
    id2word: Vec<String>,
    /// Topic x term weights, one row per topic.
    topics: Vec<Vec<f64>>,
    #[serde(default)]
    alpha: Option<Vec<f64>>,
    #[serde(default = "default_minimum_probability")]
    minimum_probability: f64,
}

fn default_minimum_probability() -> f64 {
    DEFAULT_MINIMUM_PROBABILITY
}

#[derive(Debug, Clone)]
pub struct TopicModel {
    id2word: Vec<String>,
    /// Row-normalized topic x term probabilities.
    topic_term: Array2<f64>,
    alpha: Array1<f64>,
    minimum_probability: f64,
}

impl TopicModel {
    /// Build a model from topic x term weights. Rows are normalized; `alpha`
    /// defaults to the symmetric prior `1 / num_topics`.
    pub fn new(topic_term: Array2<f64>, id2word: Vec<String>, alpha: Option<Vec<f64>>) -> Result<Self> {
        let (num_topics, num_terms) = topic_term.dim();
        if num_topics == 0 {
            return Err(Error::mismatch("model has no topics"));
        }
        if num_terms != id2word.len() {
            return Err(Error::mismatch(format!(
                "model has {} term columns but {} words",
                num_terms,
                id2word.len()
            )));
        }
        if topic_term.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(Error::mismatch("topic weights must be finite and non-negative"));
        }

        let mut topic_term = topic_term;
        for mut row in topic_term.rows_mut() {
            let sum = row.sum();
            if sum <= 0.0 {
                return Err(Error::mismatch("a topic has zero total weight"));
            }
            row /= sum;
        }

        let alpha = match alpha {
            Some(alpha) if alpha.len() != num_topics => {
                return Err(Error::mismatch(format!(
                    "alpha has {} entries for {} topics",
                    alpha.len(),
                    num_topics
                )))
            }
            Some(alpha) if alpha.iter().any(|&a| !(a > 0.0)) => {
                return Err(Error::mismatch("alpha entries must be positive"))
            }
            Some(alpha) => Array1::from(alpha),
            None => Array1::from_elem(num_topics, 1.0 / num_topics as f64),
        };

        Ok(TopicModel {
            id2word,
            topic_term,
            alpha,
            minimum_probability: DEFAULT_MINIMUM_PROBABILITY,
        })
    }

    pub fn with_minimum_probability(mut self, minimum_probability: f64) -> Self {
        self.minimum_probability = minimum_probability;
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Accessing model ...");
        let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;

        if artifact.topics.len() != artifact.num_topics {
            return Err(Error::mismatch(format!(
                "model announces {} topics but stores {}",
                artifact.num_topics,
                artifact.topics.len()
            )));
        }
        let num_terms = artifact.id2word.len();
        if let Some(row) = artifact.topics.iter().find(|row| row.len() != num_terms) {
            return Err(Error::mismatch(format!(
                "topic row of length {} for {} words",
                row.len(),
                num_terms
            )));
        }
        let flat: Vec<f64> = artifact.topics.into_iter().flatten().collect();
        let topic_term = Array2::from_shape_vec((artifact.num_topics, num_terms), flat)
            .map_err(|e| Error::mismatch(e.to_string()))?;

        let model = TopicModel::new(topic_term, artifact.id2word, artifact.alpha)?
            .with_minimum_probability(artifact.minimum_probability);
        debug!(
            "Model available: {} topics over {} terms.",
            model.num_topics(),
            model.num_terms()
        );
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = ModelArtifact {
            num_topics: self.num_topics(),
            id2word: self.id2word.clone(),
            topics: self.topic_term.rows().into_iter().map(|row| row.to_vec()).collect(),
            alpha: Some(self.alpha.to_vec()),
            minimum_probability: self.minimum_probability,
        };
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &artifact)?;
        Ok(())
    }

    pub fn num_topics(&self) -> usize {
        self.topic_term.nrows()
    }

    pub fn num_terms(&self) -> usize {
        self.topic_term.ncols()
    }

    pub fn id2word(&self) -> &[String] {
        &self.id2word
    }

    /// Topic x term probabilities.
    pub fn topics(&self) -> ArrayView2<'_, f64> {
        self.topic_term.view()
    }

    pub fn minimum_probability(&self) -> f64 {
        self.minimum_probability
    }

    /// The `topn` most probable terms of `topic`.
    pub fn show_topic(&self, topic: usize, topn: usize) -> Result<Vec<(String, f64)>> {
        if topic >= self.num_topics() {
            return Err(Error::invalid_argument(format!(
                "topic {} out of range for {} topics",
                topic,
                self.num_topics()
            )));
        }
        let mut terms: Vec<(usize, f64)> = self
            .topic_term
            .row(topic)
            .iter()
            .copied()
            .enumerate()
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(terms
            .into_iter()
            .take(topn)
            .map(|(id, p)| (self.id2word[id].clone(), p))
            .collect())
    }

    /// Space-joined top terms of a topic, used as its display label.
    pub fn topic_label(&self, topic: usize, topn: usize) -> Result<String> {
        let words: Vec<String> = self
            .show_topic(topic, topn)?
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        Ok(words.join(" "))
    }

    /// Variational posterior Dirichlet parameters of a document's topic
    /// mixture.
    pub fn inference(&self, bow: &[(usize, f64)]) -> Result<Array1<f64>> {
        let num_terms = self.num_terms();
        if let Some(&(id, _)) = bow.iter().find(|&&(id, _)| id >= num_terms) {
            return Err(Error::mismatch(format!(
                "corpus term id {id} outside the model's {num_terms} terms"
            )));
        }

        if let Some(&(id, count)) = bow.iter().find(|&&(_, count)| !count.is_finite() || count < 0.0) {
            return Err(Error::mismatch(format!(
                "term id {id} has count {count}, expected a finite non-negative number"
            )));
        }

        if bow.is_empty() {
            return Ok(self.alpha.clone());
        }

        let ids: Vec<usize> = bow.iter().map(|&(id, _)| id).collect();
        let counts = Array1::from_iter(bow.iter().map(|&(_, count)| count));
        // Topic x document-term slice of the topic-term matrix.
        let beta_d = self.topic_term.select(Axis(1), &ids);

        let mut gamma = Array1::<f64>::ones(self.num_topics());

        let mut exp_elog_theta = dirichlet_expectation(&gamma).mapv(f64::exp);
        let mut phinorm = exp_elog_theta.dot(&beta_d) + 1e-100;

        for _ in 0..MAX_INFERENCE_ITERATIONS {
            let last_gamma = gamma.clone();
            let weights = &counts / &phinorm;
            gamma = &self.alpha + &(&exp_elog_theta * &beta_d.dot(&weights));
            exp_elog_theta = dirichlet_expectation(&gamma).mapv(f64::exp);
            phinorm = exp_elog_theta.dot(&beta_d) + 1e-100;

            let mean_change = (&gamma - &last_gamma).mapv(f64::abs).mean().unwrap_or(0.0);
            if mean_change < GAMMA_THRESHOLD {
                break;
            }
        }
        Ok(gamma)
    }

    /// Normalized topic distribution of a document over all topics.
    pub fn document_topic_distribution(&self, bow: &[(usize, f64)]) -> Result<Array1<f64>> {
        let gamma = self.inference(bow)?;
        let total = gamma.sum();
        Ok(gamma / total)
    }

    /// `(topic, probability)` pairs at or above the minimum probability.
    pub fn get_document_topics(&self, bow: &[(usize, f64)]) -> Result<Vec<(usize, f64)>> {
        let threshold = self.minimum_probability.max(1e-8);
        Ok(self
            .document_topic_distribution(bow)?
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, p)| p >= threshold)
            .collect())
    }
}

/// E[log theta] for theta ~ Dirichlet(alpha).
fn dirichlet_expectation(alpha: &Array1<f64>) -> Array1<f64> {
    let total = digamma(alpha.sum());
    alpha.mapv(|a| digamma(a) - total)
}
