//! Data for the interactive topic exploration page: topic positions on a
//! 2-D map, per-topic term tables and a term/topic lookup table.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

use crate::corpus::MmCorpus;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::model::TopicModel;

/// Number of terms shown per topic.
pub const R: usize = 30;
pub const LAMBDA_STEP: f64 = 0.01;

const HTML_TEMPLATE: &str = include_str!("ldavis.html");
const DATA_PLACEHOLDER: &str = "__LDAVIS_DATA__";

#[derive(Debug, Clone, Serialize)]
pub struct TopicCoordinate {
    /// 1-based display number; topics are numbered by prevalence.
    pub topic: usize,
    pub x: f64,
    pub y: f64,
    /// Share of corpus tokens, in percent.
    #[serde(rename = "Freq")]
    pub freq: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TermInfo {
    #[serde(rename = "Term")]
    pub term: String,
    /// `Default` for the salient-term list, `Topic<n>` otherwise.
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Freq")]
    pub freq: f64,
    #[serde(rename = "Total")]
    pub total: f64,
    pub logprob: f64,
    pub loglift: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenEntry {
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Topic")]
    pub topic: usize,
    /// Share of the term's corpus occurrences attributed to the topic.
    #[serde(rename = "Freq")]
    pub freq: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlotOptions {
    pub xlab: String,
    pub ylab: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreparedData {
    #[serde(rename = "mdsDat")]
    pub topic_coordinates: Vec<TopicCoordinate>,
    #[serde(rename = "tinfo")]
    pub topic_info: Vec<TermInfo>,
    #[serde(rename = "token.table")]
    pub token_table: Vec<TokenEntry>,
    #[serde(rename = "R")]
    pub r: usize,
    #[serde(rename = "lambda.step")]
    pub lambda_step: f64,
    #[serde(rename = "plot.opts")]
    pub plot_opts: PlotOptions,
    /// 0-based model topic id for each display position.
    #[serde(rename = "topic.order")]
    pub topic_order: Vec<usize>,
}

impl PreparedData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Self-contained page with the data embedded.
    pub fn to_html(&self) -> Result<String> {
        // Keep the embedded JSON from closing the script element.
        let json = self.to_json()?.replace("</", "<\\/");
        Ok(HTML_TEMPLATE.replace(DATA_PLACEHOLDER, &json))
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn save_html(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_html()?)?;
        Ok(())
    }
}

/// Compute everything the exploration page needs from a model, the corpus
/// it was fitted on and the corpus dictionary.
pub fn prepare(model: &TopicModel, corpus: &MmCorpus, dictionary: &Dictionary) -> Result<PreparedData> {
    info!("Preparing interactive visualization ...");
    let num_terms = model.num_terms();
    if dictionary.len() != num_terms {
        return Err(Error::mismatch(format!(
            "dictionary has {} terms, model has {}",
            dictionary.len(),
            num_terms
        )));
    }
    if corpus.num_terms() != num_terms {
        return Err(Error::mismatch(format!(
            "corpus has {} terms, model has {}",
            corpus.num_terms(),
            num_terms
        )));
    }

    let vocab = dictionary.tokens();
    let phi = model.topics();
    let num_topics = model.num_topics();

    let doc_lengths = Array1::from(corpus.document_lengths());
    let term_frequency = Array1::from(corpus.term_frequencies());
    let total_tokens = term_frequency.sum();
    if total_tokens <= 0.0 {
        return Err(Error::invalid_argument("corpus contains no tokens"));
    }

    let mut doc_topic = Array2::<f64>::zeros((corpus.len(), num_topics));
    for (mut row, bow) in doc_topic.rows_mut().into_iter().zip(corpus.documents()) {
        row.assign(&model.document_topic_distribution(bow)?);
    }

    let topic_freq = doc_topic.t().dot(&doc_lengths);
    let topic_proportion = &topic_freq / topic_freq.sum();

    let mut topic_order: Vec<usize> = (0..num_topics).collect();
    topic_order.sort_by(|&a, &b| topic_proportion[b].total_cmp(&topic_proportion[a]));

    // Expected term counts per topic, rescaled so each term's column sums to
    // its corpus frequency.
    let mut term_topic_freq = &phi * &topic_freq.view().insert_axis(Axis(1));
    for (w, mut column) in term_topic_freq.columns_mut().into_iter().enumerate() {
        let sum = column.sum();
        if sum > 0.0 {
            column *= term_frequency[w] / sum;
        }
    }

    let term_proportion = &term_frequency / total_tokens;
    let present: Vec<usize> = (0..num_terms).filter(|&w| term_frequency[w] > 0.0).collect();

    let saliency = saliency(&phi.to_owned(), &topic_proportion, &term_proportion);

    let mut topic_info = Vec::new();

    let mut default_terms = present.clone();
    default_terms.sort_by(|&a, &b| saliency[b].total_cmp(&saliency[a]));
    default_terms.truncate(R);
    let n_default = default_terms.len();
    for (rank, &w) in default_terms.iter().enumerate() {
        let score = (n_default - rank) as f64;
        topic_info.push(TermInfo {
            term: vocab[w].clone(),
            category: "Default".to_string(),
            freq: term_frequency[w],
            total: term_frequency[w],
            logprob: score,
            loglift: score,
        });
    }

    for (display, &k) in topic_order.iter().enumerate() {
        let candidates: Vec<usize> = present.iter().copied().filter(|&w| phi[[k, w]] > 0.0).collect();
        let logprob = |w: usize| phi[[k, w]].ln();
        let loglift = |w: usize| (phi[[k, w]] / term_proportion[w]).ln();

        let mut by_prob = candidates.clone();
        by_prob.sort_by(|&a, &b| logprob(b).total_cmp(&logprob(a)));
        let mut by_lift = candidates;
        by_lift.sort_by(|&a, &b| loglift(b).total_cmp(&loglift(a)));

        let mut selected: Vec<usize> = by_prob.iter().take(R).copied().collect();
        for &w in by_lift.iter().take(R) {
            if !selected.contains(&w) {
                selected.push(w);
            }
        }

        for w in selected {
            topic_info.push(TermInfo {
                term: vocab[w].clone(),
                category: format!("Topic{}", display + 1),
                freq: term_topic_freq[[k, w]],
                total: term_frequency[w],
                logprob: logprob(w),
                loglift: loglift(w),
            });
        }
    }

    let shown: BTreeSet<&str> = topic_info.iter().map(|info| info.term.as_str()).collect();
    let mut token_table = Vec::new();
    for term in shown {
        let Some(w) = dictionary.id(term) else { continue };
        for (display, &k) in topic_order.iter().enumerate() {
            let share = term_topic_freq[[k, w]] / term_frequency[w];
            if share >= 1e-3 {
                token_table.push(TokenEntry {
                    term: term.to_string(),
                    topic: display + 1,
                    freq: share,
                });
            }
        }
    }

    let ordered_phi = phi.select(Axis(0), &topic_order);
    let coordinates = pcoa(&js_distances(&ordered_phi));
    let topic_coordinates = topic_order
        .iter()
        .enumerate()
        .map(|(display, &k)| TopicCoordinate {
            topic: display + 1,
            x: coordinates[[display, 0]],
            y: coordinates[[display, 1]],
            freq: topic_proportion[k] * 100.0,
        })
        .collect();

    debug!(
        "Interactive visualization available: {} topic-term rows, {} token-table rows.",
        topic_info.len(),
        token_table.len()
    );

    Ok(PreparedData {
        topic_coordinates,
        topic_info,
        token_table,
        r: R,
        lambda_step: LAMBDA_STEP,
        plot_opts: PlotOptions {
            xlab: "PC1".to_string(),
            ylab: "PC2".to_string(),
        },
        topic_order,
    })
}

/// Term saliency: overall term probability weighted by how much the term's
/// topic posterior diverges from the marginal topic distribution.
fn saliency(phi: &Array2<f64>, topic_proportion: &Array1<f64>, term_proportion: &Array1<f64>) -> Array1<f64> {
    let weighted = phi * &topic_proportion.view().insert_axis(Axis(1));
    let column_sums = weighted.sum_axis(Axis(0));

    Array1::from_shape_fn(phi.ncols(), |w| {
        if column_sums[w] <= 0.0 {
            return 0.0;
        }
        let distinctiveness: f64 = (0..phi.nrows())
            .map(|k| {
                let p = weighted[[k, w]] / column_sums[w];
                if p > 0.0 {
                    p * (p / topic_proportion[k]).ln()
                } else {
                    0.0
                }
            })
            .sum();
        term_proportion[w] * distinctiveness
    })
}

fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q)
        .filter(|(&pi, _)| pi > 0.0)
        .map(|(&pi, &qi)| pi * (pi / qi).ln())
        .sum()
}

fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    let m: Vec<f64> = p.iter().zip(q).map(|(a, b)| 0.5 * (a + b)).collect();
    0.5 * kl_divergence(p, &m) + 0.5 * kl_divergence(q, &m)
}

fn js_distances(dists: &Array2<f64>) -> Array2<f64> {
    let rows: Vec<Vec<f64>> = dists.rows().into_iter().map(|row| row.to_vec()).collect();
    let n = rows.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            0.0
        } else {
            jensen_shannon(&rows[i], &rows[j])
        }
    })
}

/// Classical multidimensional scaling into two dimensions.
fn pcoa(pair_dists: &Array2<f64>) -> Array2<f64> {
    let n = pair_dists.nrows();
    let mut coordinates = Array2::<f64>::zeros((n, 2));
    if n < 2 {
        return coordinates;
    }

    let centering = Array2::<f64>::eye(n) - 1.0 / n as f64;
    let squared = pair_dists.mapv(|d| d * d);
    let mut b = -0.5 * centering.dot(&squared).dot(&centering);

    for component in 0..2 {
        let (value, vector) = dominant_eigenpair(&b);
        if value <= 0.0 {
            break;
        }
        coordinates.column_mut(component).assign(&(&vector * value.sqrt()));
        let outer = Array2::from_shape_fn((n, n), |(i, j)| vector[i] * vector[j]);
        b = b - outer * value;
    }
    coordinates
}

/// Power iteration on a symmetric matrix; the sign is fixed so the largest
/// component is positive.
fn dominant_eigenpair(m: &Array2<f64>) -> (f64, Array1<f64>) {
    let n = m.nrows();
    let mut v = Array1::from_shape_fn(n, |i| ((i + 1) as f64).sqrt());
    v /= v.dot(&v).sqrt();

    for _ in 0..1000 {
        let w = m.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm < 1e-12 {
            return (0.0, v);
        }
        let next = w / norm;
        let delta = (&next - &v).mapv(f64::abs).sum();
        v = next;
        if delta < 1e-12 {
            break;
        }
    }

    let value = v.dot(&m.dot(&v));
    let pivot = v
        .iter()
        .copied()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
    (value, v)
}
