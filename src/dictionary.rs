//! Term dictionary: dense term ids with document frequencies.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::TermDocumentMatrix;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Term for each id.
    id2token: Vec<String>,
    /// Number of documents containing each id.
    dfs: Vec<usize>,
    /// Number of documents processed.
    num_docs: usize,
    /// Number of token positions processed.
    num_pos: usize,
    #[serde(skip)]
    token2id: HashMap<String, usize>,
}

impl Dictionary {
    pub fn from_matrix(matrix: &TermDocumentMatrix) -> Self {
        let mut dictionary = Dictionary {
            id2token: matrix.vocabulary().to_vec(),
            dfs: matrix.document_frequencies(),
            num_docs: matrix.n_documents(),
            num_pos: matrix.total(),
            token2id: HashMap::new(),
        };
        dictionary.reindex();
        dictionary
    }

    fn reindex(&mut self) {
        self.token2id = self
            .id2token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id))
            .collect();
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Accessing dictionary ...");
        let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
        let mut dictionary: Dictionary = serde_json::from_reader(BufReader::new(file))?;
        if dictionary.dfs.len() != dictionary.id2token.len() {
            return Err(Error::mismatch(format!(
                "dictionary has {} terms but {} document frequencies",
                dictionary.id2token.len(),
                dictionary.dfs.len()
            )));
        }
        dictionary.reindex();
        debug!("Dictionary available with {} terms.", dictionary.len());
        Ok(dictionary)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        debug!("Dictionary written to {}.", path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id2token.get(id).map(String::as_str)
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    pub fn tokens(&self) -> &[String] {
        &self.id2token
    }

    pub fn document_frequency(&self, id: usize) -> Option<usize> {
        self.dfs.get(id).copied()
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn num_pos(&self) -> usize {
        self.num_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Dictionary {
        let vocabulary = vec!["sat".to_string(), "the".to_string()];
        let matrix = TermDocumentMatrix::from_texts(vocabulary, ["the cat sat the", "the dog"]);
        Dictionary::from_matrix(&matrix)
    }

    #[test]
    fn test_from_matrix() {
        let dictionary = dictionary();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.id("the"), Some(1));
        assert_eq!(dictionary.token(0), Some("sat"));
        assert_eq!(dictionary.document_frequency(1), Some(2));
        assert_eq!(dictionary.num_docs(), 2);
        assert_eq!(dictionary.num_pos(), 4);
    }

    #[test]
    fn test_save_and_load_rebuilds_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.dict");
        let original = dictionary();
        original.save(&path).unwrap();

        let loaded = Dictionary::load(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.id("sat"), Some(0));
    }

    #[test]
    fn test_inconsistent_dictionary_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.dict");
        std::fs::write(
            &path,
            r#"{"id2token":["a","b"],"dfs":[1],"num_docs":1,"num_pos":2}"#,
        )
        .unwrap();
        assert!(matches!(Dictionary::load(&path), Err(Error::Mismatch(_))));
    }
}
