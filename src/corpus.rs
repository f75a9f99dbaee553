//! Bag-of-words corpora stored in Matrix Market coordinate format.
//!
//! ```text
//! %%MatrixMarket matrix coordinate real general
//! <num_docs> <num_terms> <num_nnz>
//! <doc> <term> <value>      (1-based)
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::matrix::TermDocumentMatrix;

const HEADER: &str = "%%MatrixMarket matrix coordinate real general";
/// Upper bound on the document count a size line may announce.
const MAX_DOCUMENTS: usize = 1 << 24;

/// One document as `(term_id, weight)` pairs.
pub type BagOfWords = Vec<(usize, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct MmCorpus {
    num_terms: usize,
    documents: Vec<BagOfWords>,
}

impl MmCorpus {
    pub fn new(num_terms: usize, documents: Vec<BagOfWords>) -> Self {
        MmCorpus {
            num_terms,
            documents,
        }
    }

    pub fn from_matrix(matrix: &TermDocumentMatrix) -> Self {
        let documents = matrix
            .to_bag_of_words()
            .into_iter()
            .map(|doc| doc.into_iter().map(|(term, count)| (term, count as f64)).collect())
            .collect();
        MmCorpus {
            num_terms: matrix.n_terms(),
            documents,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Accessing corpus ...");
        let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
        let corpus = Self::parse(BufReader::new(file), path)?;
        debug!(
            "Corpus available: {} documents, {} terms.",
            corpus.len(),
            corpus.num_terms
        );
        Ok(corpus)
    }

    fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let first = match lines.next() {
            Some((_, line)) => line?,
            None => return Err(Error::parse(path, 1, "empty file")),
        };
        if !first.trim().to_lowercase().starts_with("%%matrixmarket matrix coordinate") {
            return Err(Error::parse(path, 1, "missing MatrixMarket coordinate header"));
        }

        let mut shape: Option<(usize, usize, usize)> = None;
        let mut documents: Vec<BagOfWords> = Vec::new();
        let mut seen = 0usize;

        for (index, line) in lines {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(Error::parse(path, line_no, "expected three fields"));
            }

            match shape {
                None => {
                    let num_docs = parse_field::<usize>(fields[0], path, line_no)?;
                    let num_terms = parse_field::<usize>(fields[1], path, line_no)?;
                    let nnz = parse_field::<usize>(fields[2], path, line_no)?;
                    if num_docs > MAX_DOCUMENTS {
                        return Err(Error::parse(
                            path,
                            line_no,
                            format!("header announces {num_docs} documents, at most {MAX_DOCUMENTS} supported"),
                        ));
                    }
                    shape = Some((num_docs, num_terms, nnz));
                }
                Some((num_docs, num_terms, _)) => {
                    let doc = parse_field::<usize>(fields[0], path, line_no)?;
                    let term = parse_field::<usize>(fields[1], path, line_no)?;
                    let value = parse_field::<f64>(fields[2], path, line_no)?;
                    if !value.is_finite() || value < 0.0 {
                        return Err(Error::parse(
                            path,
                            line_no,
                            format!("weight {value} is not a finite non-negative count"),
                        ));
                    }
                    if doc == 0 || doc > num_docs || term == 0 || term > num_terms {
                        return Err(Error::parse(
                            path,
                            line_no,
                            format!("entry ({doc}, {term}) outside {num_docs} x {num_terms}"),
                        ));
                    }
                    if documents.len() < doc {
                        documents.resize_with(doc, Vec::new);
                    }
                    documents[doc - 1].push((term - 1, value));
                    seen += 1;
                }
            }
        }

        let Some((num_docs, num_terms, nnz)) = shape else {
            return Err(Error::parse(path, 1, "missing size line"));
        };
        if seen != nnz {
            return Err(Error::parse(
                path,
                1,
                format!("header announces {nnz} entries, found {seen}"),
            ));
        }
        // Trailing documents without entries.
        documents
            .try_reserve_exact(num_docs - documents.len())
            .map_err(|e| Error::parse(path, 1, format!("cannot hold {num_docs} documents: {e}")))?;
        documents.resize_with(num_docs, Vec::new);
        for doc in &mut documents {
            doc.sort_by_key(|&(term, _)| term);
        }

        Ok(MmCorpus {
            num_terms,
            documents,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{HEADER}")?;
        writeln!(writer, "{} {} {}", self.len(), self.num_terms, self.num_nnz())?;
        for (doc_index, doc) in self.documents.iter().enumerate() {
            for &(term, value) in doc {
                writeln!(writer, "{} {} {}", doc_index + 1, term + 1, value)?;
            }
        }
        writer.flush()?;
        debug!("Corpus written to {}.", path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    pub fn num_nnz(&self) -> usize {
        self.documents.iter().map(Vec::len).sum()
    }

    pub fn documents(&self) -> &[BagOfWords] {
        &self.documents
    }

    /// Sum of weights per document.
    pub fn document_lengths(&self) -> Vec<f64> {
        self.documents
            .iter()
            .map(|doc| doc.iter().map(|&(_, value)| value).sum())
            .collect()
    }

    /// Sum of weights per term over all documents.
    pub fn term_frequencies(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.num_terms];
        for doc in &self.documents {
            for &(term, value) in doc {
                totals[term] += value;
            }
        }
        totals
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, path: &Path, line: usize) -> Result<T> {
    field
        .parse::<T>()
        .map_err(|_| Error::parse(path, line, format!("cannot parse '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_save_and_load() {
        let vocabulary = vec!["sat".to_string(), "the".to_string(), "mat".to_string()];
        let matrix = TermDocumentMatrix::from_texts(vocabulary, ["the cat sat", "", "the mat the"]);
        let corpus = MmCorpus::from_matrix(&matrix);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.mm");
        corpus.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(HEADER));
        assert_eq!(text.lines().nth(1), Some("3 3 4"));

        let loaded = MmCorpus::load(&path).unwrap();
        assert_eq!(loaded, corpus);
        assert!(loaded.documents()[1].is_empty());
        assert_eq!(loaded.document_lengths(), vec![2.0, 0.0, 3.0]);
        assert_eq!(loaded.term_frequencies(), vec![1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_parse_tolerates_comments_and_unsorted_entries() {
        let text = "%%MatrixMarket matrix coordinate real general\n% generated\n2 4 3\n1 3 1.5\n1 1 2\n2 4 1\n";
        let corpus = MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).unwrap();
        assert_eq!(corpus.num_terms(), 4);
        assert_eq!(corpus.documents()[0], vec![(0, 2.0), (2, 1.5)]);
        assert_eq!(corpus.documents()[1], vec![(3, 1.0)]);
    }

    #[test]
    fn test_parse_rejects_out_of_range_entries() {
        let text = "%%MatrixMarket matrix coordinate real general\n1 2 1\n1 3 1\n";
        let err = MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_entry_count() {
        let text = "%%MatrixMarket matrix coordinate real general\n1 2 2\n1 1 1\n";
        assert!(MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).is_err());
    }

    #[test]
    fn test_parse_rejects_negative_and_non_finite_weights() {
        for (value, text) in [
            ("-1", "%%MatrixMarket matrix coordinate real general\n1 2 2\n1 2 1\n1 1 -1\n"),
            ("-1e20", "%%MatrixMarket matrix coordinate real general\n1 2 2\n1 2 1\n1 1 -1e20\n"),
            ("inf", "%%MatrixMarket matrix coordinate real general\n1 2 1\n1 1 inf\n"),
            ("nan", "%%MatrixMarket matrix coordinate real general\n1 2 1\n1 1 nan\n"),
        ] {
            let err = MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "weight {value} accepted");
        }
    }

    #[test]
    fn test_parse_rejects_oversized_header() {
        let text = "%%MatrixMarket matrix coordinate real general\n100000000000 2 0\n";
        let err = MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_trailing_empty_documents_are_kept() {
        let text = "%%MatrixMarket matrix coordinate real general\n4 2 1\n2 1 1\n";
        let corpus = MmCorpus::parse(text.as_bytes(), Path::new("c.mm")).unwrap();
        assert_eq!(corpus.len(), 4);
        assert!(corpus.documents()[0].is_empty());
        assert_eq!(corpus.documents()[1], vec![(0, 1.0)]);
        assert!(corpus.documents()[3].is_empty());
    }

    #[test]
    fn test_missing_corpus_is_not_found() {
        let err = MmCorpus::load(Path::new("/no/such/corpus.mm")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
