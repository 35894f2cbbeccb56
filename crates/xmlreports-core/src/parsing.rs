//! Parsing stage: turn every extracted document into a record.

use crate::error::ParseError;
use crate::parser::parse_document;
use crate::pool::{first_failure, WorkerPool};
use crate::record::DocumentRecord;
use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;

/// Parse all documents on the pool, fail-fast.
///
/// Records come back in the order of `documents`.
///
/// # Errors
///
/// Returns the first [`ParseError`] in input order among the documents that
/// were parsed before dispatch stopped.
pub fn parse_all(pool: &WorkerPool, documents: &[PathBuf]) -> Result<Vec<DocumentRecord>, ParseError> {
    info!("Parsing {} documents with {} workers", documents.len(), pool.workers());

    let outcomes = pool.fan_out(documents, |path| {
        parse_document(path).inspect_err(|e| warn!("Parse failed: {e}"))
    });
    let records = first_failure(outcomes)?;

    info!("Parsed {} records", records.len());
    Ok(records)
}

/// Identifiers that occur more than once, in order of their second occurrence.
///
/// Ids are expected to be unique across a run; repeats point at bad input.
#[must_use]
pub fn duplicate_ids(records: &[DocumentRecord]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for record in records {
        if !seen.insert(record.id.as_str()) && reported.insert(record.id.as_str()) {
            duplicates.push(record.id.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &std::path::Path, name: &str, id: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!(r#"<root><var value="{id}"/><var value="1"/><objects><object name="o"/></objects></root>"#),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_parse_all_keeps_input_order() {
        let temp = TempDir::new().unwrap();
        let documents: Vec<_> = (0..40)
            .map(|i| write_doc(temp.path(), &format!("file{i}.xml"), &format!("id{i}")))
            .collect();
        let pool = WorkerPool::new(4).unwrap();

        let records = parse_all(&pool, &documents).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        let expected: Vec<_> = (0..40).map(|i| format!("id{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_parse_all_fails_on_malformed_document() {
        let temp = TempDir::new().unwrap();
        let good = write_doc(temp.path(), "good.xml", "a");
        let bad = temp.path().join("bad.xml");
        fs::write(&bad, "<root><var value=\"b\"/></root>").unwrap();
        let pool = WorkerPool::new(2).unwrap();

        let err = parse_all(&pool, &[good, bad.clone()]).unwrap_err();

        assert!(matches!(err, ParseError::MalformedDocument { .. }));
        assert_eq!(err.path(), bad.as_path());
    }

    #[test]
    fn test_duplicate_ids() {
        let records = vec![
            DocumentRecord::new("a", "1", ["x"]),
            DocumentRecord::new("b", "1", ["x"]),
            DocumentRecord::new("a", "2", ["y"]),
            DocumentRecord::new("a", "3", ["z"]),
        ];
        assert_eq!(duplicate_ids(&records), ["a"]);
        assert!(duplicate_ids(&records[..2]).is_empty());
    }
}
