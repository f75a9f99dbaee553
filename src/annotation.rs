//! Reading token-annotated tables and selecting lemmas by part of speech.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::models::TokenRow;

pub const DEFAULT_POS_TAGS: [&str; 3] = ["ADJ", "V", "NN"];

/// Read a tab-separated annotation table. Columns other than the five
/// [`TokenRow`] fields are ignored; quotes are taken literally.
pub fn read_table(path: &Path) -> Result<Vec<TokenRow>> {
    let file = File::open(path).map_err(|e| Error::from_io(e, path))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .trim(Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: TokenRow = record?;
        rows.push(row);
    }
    debug!("{} token rows read from {}.", rows.len(), path.display());
    Ok(rows)
}

/// Lazily read the annotation table of every file in `doclist`.
pub fn read_from_csv(doclist: &[PathBuf]) -> impl Iterator<Item = Result<Vec<TokenRow>>> + '_ {
    info!("Accessing CSV documents ...");
    doclist.iter().map(|path| read_table(path))
}

/// Lemmas of the rows whose coarse POS tag is in `pos_tags`, in row order.
pub fn filter_pos_tags<S: AsRef<str>>(rows: &[TokenRow], pos_tags: &[S]) -> Vec<String> {
    let allowed: HashSet<&str> = pos_tags.iter().map(|tag| tag.as_ref()).collect();
    info!("Accessing {:?} lemmas ...", allowed);

    rows.iter()
        .filter(|row| allowed.contains(row.cpos.as_str()))
        .map(|row| row.lemma.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TABLE: &str = "SectionId\tParagraphId\tTokenId\tToken\tLemma\tCPOS\tNamedEntity\n\
        0\t0\t0\tDie\tdie\tART\t_\n\
        0\t0\t1\tgroße\tgroß\tADJ\t_\n\
        0\t0\t2\tStadt\tStadt\tNN\t_\n\
        0\t1\t3\tschläft\tschlafen\tV\t_\n\
        0\t1\t4\t\"\t\"\tPUNC\t_\n\
        0\t1\t5\tBerlin\tBerlin\tNP\tLOCATION\n";

    fn write_table() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.csv");
        fs::write(&path, TABLE).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_table_selects_named_columns() {
        let (_dir, path) = write_table();
        let rows = read_table(&path).unwrap();

        assert_eq!(rows.len(), 6);
        assert_eq!(
            rows[1],
            TokenRow {
                paragraph_id: 0,
                token_id: 1,
                lemma: "groß".to_string(),
                cpos: "ADJ".to_string(),
                named_entity: "_".to_string(),
            }
        );
        assert_eq!(rows[4].lemma, "\"");
        assert_eq!(rows[5].named_entity, "LOCATION");
    }

    #[test]
    fn test_filter_pos_tags_keeps_row_order() {
        let (_dir, path) = write_table();
        let rows = read_table(&path).unwrap();

        let lemmas = filter_pos_tags(&rows, &DEFAULT_POS_TAGS);
        assert_eq!(lemmas, vec!["groß", "Stadt", "schlafen"]);

        let proper = filter_pos_tags(&rows, &["NP"]);
        assert_eq!(proper, vec!["Berlin"]);
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let err = read_table(Path::new("/no/such/table.csv")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
