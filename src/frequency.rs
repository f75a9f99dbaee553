//! Corpus-wide term frequencies and the stopword/hapax feature lists
//! derived from them.

use std::collections::BTreeMap;

use counter::Counter;
use log::{debug, info};

/// Term -> total count over a corpus, iterated in lexicographic term order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFrequency {
    counts: BTreeMap<String, usize>,
}

/// An ordered snapshot of terms (with their counts) selected for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureList {
    features: Vec<(String, usize)>,
}

impl FeatureList {
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(term, _)| term.as_str())
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.features.iter().any(|(t, _)| t == term)
    }
}

impl TermFrequency {
    /// Count whitespace-separated terms over `docs`, one document at a time.
    pub fn from_documents<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        info!("Calculating term frequency ...");
        let mut counter: Counter<String> = Counter::new();
        for doc in docs {
            counter.update(doc.as_ref().split_whitespace().map(str::to_string));
        }
        Self::from_counter(counter)
    }

    /// Count terms of documents that were already tokenized.
    pub fn from_token_streams<I, D>(docs: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: IntoIterator<Item = String>,
    {
        info!("Calculating term frequency ...");
        let mut counter: Counter<String> = Counter::new();
        for doc in docs {
            counter.update(doc);
        }
        Self::from_counter(counter)
    }

    fn from_counter(counter: Counter<String>) -> Self {
        let counts: BTreeMap<String, usize> = counter.into_iter().collect();
        debug!("Term frequency calculated for {} terms.", counts.len());
        TermFrequency { counts }
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.counts.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.counts.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Terms in key order; position is the matrix row index.
    pub fn vocabulary(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    /// The `mfw` most frequent terms. Ties keep the map's key order.
    pub fn find_stopwords(&self, mfw: usize) -> FeatureList {
        info!("Finding stopwords ...");
        let mut features: Vec<(String, usize)> = self
            .counts
            .iter()
            .map(|(term, &count)| (term.clone(), count))
            .collect();
        features.sort_by(|a, b| b.1.cmp(&a.1));
        features.truncate(mfw);
        debug!("{} stopwords found.", features.len());
        FeatureList { features }
    }

    /// Every term occurring exactly once.
    pub fn find_hapax(&self) -> FeatureList {
        info!("Find hapax legomena ...");
        let features: Vec<(String, usize)> = self
            .counts
            .iter()
            .filter(|(_, &count)| count == 1)
            .map(|(term, &count)| (term.clone(), count))
            .collect();
        debug!("{} hapax legomena found.", features.len());
        FeatureList { features }
    }

    /// Delete every term of `features`; absent terms are skipped. Returns
    /// the number of keys removed.
    pub fn remove_by_frequency_list(&mut self, features: &FeatureList) -> usize {
        info!("Removing features ...");
        let total = features
            .terms()
            .filter(|term| self.counts.remove(*term).is_some())
            .count();
        debug!("{} features removed.", total);
        total
    }

    /// Delete every whitespace-separated term of `text`; absent terms are
    /// skipped. Returns the number of keys removed.
    pub fn remove_by_token_stream(&mut self, text: &str) -> usize {
        info!("Removing features ...");
        let total = text
            .split_whitespace()
            .filter(|term| self.counts.remove(*term).is_some())
            .count();
        debug!("{} features removed.", total);
        total
    }
}

impl<'a> IntoIterator for &'a TermFrequency {
    type Item = (&'a String, &'a usize);
    type IntoIter = std::collections::btree_map::Iter<'a, String, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec!["the cat sat", "the dog sat"]
    }

    #[test]
    fn test_counts_sorted_by_term() {
        let tf = TermFrequency::from_documents(corpus());
        let entries: Vec<(&str, usize)> = tf.iter().collect();
        assert_eq!(entries, vec![("cat", 1), ("dog", 1), ("sat", 2), ("the", 2)]);
    }

    #[test]
    fn test_empty_corpus() {
        let tf = TermFrequency::from_documents(Vec::<String>::new());
        assert!(tf.is_empty());
        assert!(tf.find_hapax().is_empty());
        assert!(tf.find_stopwords(10).is_empty());
    }

    #[test]
    fn test_counts_are_additive_across_documents() {
        let docs = ["a b a", "b c", "a"];
        let tf = TermFrequency::from_documents(docs);
        for term in ["a", "b", "c"] {
            let expected: usize = docs
                .iter()
                .map(|doc| doc.split_whitespace().filter(|t| *t == term).count())
                .sum();
            assert_eq!(tf.get(term), Some(expected));
        }
        assert_eq!(tf.total(), 6);
    }

    #[test]
    fn test_no_case_folding() {
        let tf = TermFrequency::from_documents(["The the"]);
        assert_eq!(tf.get("The"), Some(1));
        assert_eq!(tf.get("the"), Some(1));
    }

    #[test]
    fn test_token_streams_match_whitespace_counts() {
        let streams = corpus()
            .into_iter()
            .map(|doc| doc.split(' ').map(String::from).collect::<Vec<_>>());
        assert_eq!(
            TermFrequency::from_token_streams(streams),
            TermFrequency::from_documents(corpus())
        );
    }

    #[test]
    fn test_stopwords_stable_on_ties() {
        let tf = TermFrequency::from_documents(["b a c a b d d"]);
        let stopwords = tf.find_stopwords(2);
        assert_eq!(stopwords.entries(), &[("a".to_string(), 2), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_stopwords_larger_than_map_returns_all() {
        let tf = TermFrequency::from_documents(corpus());
        assert_eq!(tf.find_stopwords(100).len(), tf.len());
        assert_eq!(tf.find_stopwords(0).len(), 0);
    }

    #[test]
    fn test_hapax_removal_then_rerun_is_empty() {
        let mut tf = TermFrequency::from_documents(corpus());
        let hapax = tf.find_hapax();
        assert_eq!(hapax.terms().collect::<Vec<_>>(), vec!["cat", "dog"]);

        assert_eq!(tf.remove_by_frequency_list(&hapax), 2);
        assert_eq!(tf.iter().collect::<Vec<_>>(), vec![("sat", 2), ("the", 2)]);
        assert!(tf.find_hapax().is_empty());
    }

    #[test]
    fn test_removal_is_idempotent() {
        let mut once = TermFrequency::from_documents(corpus());
        let stopwords = once.find_stopwords(1);
        once.remove_by_frequency_list(&stopwords);

        let mut twice = once.clone();
        assert_eq!(twice.remove_by_frequency_list(&stopwords), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_by_token_stream_skips_unknown_terms() {
        let mut tf = TermFrequency::from_documents(corpus());
        assert_eq!(tf.remove_by_token_stream("the\nmouse  dog"), 2);
        assert_eq!(tf.vocabulary(), vec!["cat", "sat"]);
        assert_eq!(tf.remove_by_token_stream("the dog"), 0);
    }

    #[test]
    fn test_selectors_do_not_mutate() {
        let tf = TermFrequency::from_documents(corpus());
        let before = tf.clone();
        let _ = tf.find_stopwords(2);
        let _ = tf.find_hapax();
        assert_eq!(tf, before);
    }
}
