//! Dense term x document count matrices.

use std::collections::HashMap;

use log::{debug, info};
use ndarray::{Array2, ArrayView2};

/// Term x document counts over a fixed vocabulary. Row `i` is
/// `vocabulary[i]`, column `j` is the `j`-th input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDocumentMatrix {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    counts: Array2<usize>,
}

impl TermDocumentMatrix {
    /// Count whitespace-separated tokens of each text. Tokens outside the
    /// vocabulary are ignored.
    pub fn from_texts<I, S>(vocabulary: Vec<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let docs: Vec<Vec<String>> = texts
            .into_iter()
            .map(|text| text.as_ref().split_whitespace().map(str::to_string).collect())
            .collect();
        Self::from_token_streams(vocabulary, &docs)
    }

    /// Count the tokens of documents that were already tokenized.
    pub fn from_token_streams<D: AsRef<[String]>>(vocabulary: Vec<String>, docs: &[D]) -> Self {
        info!("Creating term/document matrix ...");
        let index: HashMap<String, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        let mut counts = Array2::<usize>::zeros((vocabulary.len(), docs.len()));
        let mut dropped = 0usize;
        for (doc_index, doc) in docs.iter().enumerate() {
            for token in doc.as_ref() {
                match index.get(token) {
                    Some(&term_index) => counts[[term_index, doc_index]] += 1,
                    None => dropped += 1,
                }
            }
        }
        debug!(
            "{} x {} matrix built, {} tokens outside the vocabulary.",
            vocabulary.len(),
            docs.len(),
            dropped
        );

        TermDocumentMatrix {
            vocabulary,
            index,
            counts,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn n_terms(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_documents(&self) -> usize {
        self.counts.ncols()
    }

    /// Rows are terms, columns documents.
    pub fn term_document(&self) -> ArrayView2<'_, usize> {
        self.counts.view()
    }

    /// Rows are documents, columns terms.
    pub fn document_term(&self) -> ArrayView2<'_, usize> {
        self.counts.t()
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Non-zero `(term_index, count)` pairs for each document, in term order.
    pub fn to_bag_of_words(&self) -> Vec<Vec<(usize, usize)>> {
        self.document_term()
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, &count)| count > 0)
                    .map(|(term, &count)| (term, count))
                    .collect()
            })
            .collect()
    }

    /// Number of documents each term occurs in.
    pub fn document_frequencies(&self) -> Vec<usize> {
        self.counts
            .rows()
            .into_iter()
            .map(|row| row.iter().filter(|&&count| count > 0).count())
            .collect()
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<usize>) {
        (self.vocabulary, self.counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::TermFrequency;
    use ndarray::array;

    #[test]
    fn test_cat_dog_example() {
        let corpus = ["the cat sat", "the dog sat"];
        let mut tf = TermFrequency::from_documents(corpus);
        let hapax = tf.find_hapax();
        tf.remove_by_frequency_list(&hapax);

        let matrix = TermDocumentMatrix::from_texts(tf.vocabulary(), corpus);
        assert_eq!(matrix.vocabulary(), &["sat".to_string(), "the".to_string()]);
        assert_eq!(matrix.term_document(), array![[1usize, 1], [1, 1]]);
    }

    #[test]
    fn test_transpose_is_rearrangement() {
        let vocabulary = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let matrix = TermDocumentMatrix::from_texts(vocabulary, ["a a b", "c", "b x"]);

        assert_eq!(matrix.term_document(), array![[2usize, 0, 0], [1, 0, 1], [0, 1, 0]]);
        assert_eq!(matrix.document_term(), array![[2usize, 1, 0], [0, 0, 1], [0, 1, 0]]);
        assert_eq!(matrix.document_term().reversed_axes(), matrix.term_document());
    }

    #[test]
    fn test_sum_equals_matched_tokens() {
        let texts = ["a b z", "b b", "y"];
        let vocabulary = vec!["a".to_string(), "b".to_string()];
        let matrix = TermDocumentMatrix::from_texts(vocabulary, texts);

        let all_tokens: usize = texts.iter().map(|t| t.split_whitespace().count()).sum();
        let unmatched = 2;
        assert_eq!(matrix.total(), all_tokens - unmatched);
    }

    #[test]
    fn test_bag_of_words_and_document_frequencies() {
        let vocabulary = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let matrix = TermDocumentMatrix::from_texts(vocabulary, ["a a c", "", "c"]);

        assert_eq!(
            matrix.to_bag_of_words(),
            vec![vec![(0, 2), (2, 1)], vec![], vec![(2, 1)]]
        );
        assert_eq!(matrix.document_frequencies(), vec![1, 0, 2]);
        assert_eq!(matrix.term_index("c"), Some(2));
        assert_eq!(matrix.term_index("d"), None);
    }

    #[test]
    fn test_empty_vocabulary() {
        let matrix = TermDocumentMatrix::from_texts(Vec::new(), ["a b"]);
        assert_eq!(matrix.n_terms(), 0);
        assert_eq!(matrix.n_documents(), 1);
        assert_eq!(matrix.total(), 0);
    }
}
