//! Locating corpus files and reading plain-text documents.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};

/// List the files in `dir` whose extension is `ext` (case-insensitive),
/// sorted by path.
pub fn create_document_list(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    info!("Creating document list from {} files ...", ext.to_uppercase());

    let entries = fs::read_dir(dir).map_err(|e| Error::from_io(e, dir))?;
    let mut doclist = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches {
            doclist.push(path);
        }
    }
    doclist.sort();

    debug!("{} entries in document list.", doclist.len());
    Ok(doclist)
}

/// Basename without extension for each path.
pub fn document_labels(doclist: &[PathBuf]) -> Vec<String> {
    info!("Creating document labels ...");
    doclist
        .iter()
        .map(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Read one UTF-8 text file fully.
pub fn read_text(path: &Path) -> Result<String> {
    debug!("Accessing TXT document {} ...", path.display());
    fs::read_to_string(path).map_err(|e| Error::from_io(e, path))
}

/// Lazily read every document in `doclist`; each file is opened, read and
/// closed before the next one is touched.
pub fn read_from_txt(doclist: &[PathBuf]) -> impl Iterator<Item = Result<String>> + '_ {
    doclist.iter().map(|path| read_text(path))
}

/// Read a document-label file: one label per line, blank lines skipped.
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| Error::from_io(e, path))?;
    let labels: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    debug!("{} doc_labels available.", labels.len());
    Ok(labels)
}

pub fn write_labels(path: &Path, labels: &[String]) -> Result<()> {
    let mut text = labels.join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_strip_directory_and_extension() {
        let doclist = vec![
            PathBuf::from("/corpus/goethe_faust.txt"),
            PathBuf::from("/corpus/schiller.raeuber.txt"),
        ];
        assert_eq!(
            document_labels(&doclist),
            vec!["goethe_faust".to_string(), "schiller.raeuber".to_string()]
        );
    }

    #[test]
    fn test_document_list_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.TXT"), "a").unwrap();
        fs::write(dir.path().join("c.csv"), "c").unwrap();
        fs::create_dir(dir.path().join("d.txt")).unwrap();

        let doclist = create_document_list(dir.path(), "txt").unwrap();
        assert_eq!(document_labels(&doclist), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let err = create_document_list(Path::new("/no/such/corpus"), "txt").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_read_from_txt_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "erster text").unwrap();
        fs::write(dir.path().join("2.txt"), "zweiter text").unwrap();

        let doclist = create_document_list(dir.path(), "txt").unwrap();
        let docs: Vec<String> = read_from_txt(&doclist).collect::<Result<_>>().unwrap();
        assert_eq!(docs, vec!["erster text", "zweiter text"]);
    }

    #[test]
    fn test_labels_file_round_trip_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "alpha\n\n beta \n").unwrap();
        assert_eq!(read_labels(&path).unwrap(), vec!["alpha", "beta"]);

        write_labels(&path, &["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(read_labels(&path).unwrap(), vec!["x", "y"]);
    }
}
