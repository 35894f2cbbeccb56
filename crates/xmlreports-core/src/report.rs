//! CSV report writer.
//!
//! Both tables are written to temporary files next to their destinations and
//! renamed into place only after both are complete. A failure before the renames
//! leaves any previous reports untouched and no partial files behind. The one
//! remaining window is a failure of the second rename after the first one
//! succeeded: then `levels` is new and `objects` is the previous version (or
//! absent), and the error is returned to the caller.
//!
//! Rows have no header, use `,` as delimiter, `\n` as terminator, and quote a
//! field only when it contains a delimiter, quote or line break.

use crate::error::WriteError;
use crate::record::DocumentRecord;
use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Row counts of a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    /// Rows in the `levels` table (one per document)
    pub level_rows: usize,
    /// Rows in the `objects` table (one per object per document)
    pub object_rows: usize,
}

/// Write the `levels` and `objects` tables for `records`.
///
/// Parent directories are created if missing; existing reports are replaced.
///
/// # Errors
///
/// [`WriteError::Io`] on any filesystem failure, naming the file involved.
pub fn write_reports(
    records: &[DocumentRecord],
    levels_path: &Path,
    objects_path: &Path,
) -> Result<ReportStats, WriteError> {
    let (levels_tmp, level_rows) = write_table(
        levels_path,
        records.iter().map(|record| {
            let row = record.level_row();
            [row.id, row.level]
        }),
    )?;
    let (objects_tmp, object_rows) = write_table(
        objects_path,
        records
            .iter()
            .flat_map(DocumentRecord::object_rows)
            .map(|row| [row.id, row.object]),
    )?;

    persist(levels_tmp, levels_path)?;
    persist(objects_tmp, objects_path)?;

    info!(
        "Wrote {level_rows} rows to {} and {object_rows} rows to {}",
        levels_path.display(),
        objects_path.display()
    );
    Ok(ReportStats {
        level_rows,
        object_rows,
    })
}

/// Write `rows` to a temporary sibling of `target` and return it unpersisted.
fn write_table<'a>(
    target: &Path,
    rows: impl IntoIterator<Item = [&'a str; 2]>,
) -> Result<(NamedTempFile, usize), WriteError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| WriteError::io(dir, e))?;

    let file_name = target
        .file_name()
        .map_or_else(|| "report".into(), |name| name.to_string_lossy());
    let prefix = format!(".{file_name}.");
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| WriteError::io(dir, e))?;

    let mut count = 0usize;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut tmp);
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| WriteError::io(target, e.into()))?;
            count += 1;
        }
        writer.flush().map_err(|e| WriteError::io(target, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| WriteError::io(target, e))?;

    debug!("Staged {count} rows for {}", target.display());
    Ok((tmp, count))
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<(), WriteError> {
    tmp.persist(target)
        .map(drop)
        .map_err(|e| WriteError::io(target, e.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_known_document_rows() {
        let temp = TempDir::new().unwrap();
        let levels = temp.path().join("levels.csv");
        let objects = temp.path().join("objects.csv");
        let records = vec![DocumentRecord::new("X", "5", ["a", "b", "c"])];

        let stats = write_reports(&records, &levels, &objects).unwrap();

        assert_eq!(stats, ReportStats { level_rows: 1, object_rows: 3 });
        assert_eq!(fs::read_to_string(&levels).unwrap(), "X,5\n");
        assert_eq!(fs::read_to_string(&objects).unwrap(), "X,a\nX,b\nX,c\n");
    }

    #[test]
    fn test_minimal_quoting() {
        let temp = TempDir::new().unwrap();
        let levels = temp.path().join("levels.csv");
        let objects = temp.path().join("objects.csv");
        let records = vec![DocumentRecord::new("id", "1", ["plain", "with,comma", "say \"hi\""])];

        write_reports(&records, &levels, &objects).unwrap();

        assert_eq!(
            fs::read_to_string(&objects).unwrap(),
            "id,plain\nid,\"with,comma\"\nid,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_replaces_existing_reports_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let levels = temp.path().join("levels.csv");
        let objects = temp.path().join("objects.csv");
        fs::write(&levels, "old\n").unwrap();
        fs::write(&objects, "old\n").unwrap();

        write_reports(&[DocumentRecord::new("n", "2", ["o"])], &levels, &objects).unwrap();

        assert_eq!(fs::read_to_string(&levels).unwrap(), "n,2\n");
        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 2, "temporary files must not remain");
    }

    #[test]
    fn test_creates_missing_report_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("reports").join("nested");

        write_reports(&[], &dir.join("levels.csv"), &dir.join("objects.csv")).unwrap();

        assert_eq!(fs::read_to_string(dir.join("levels.csv")).unwrap(), "");
        assert_eq!(fs::read_to_string(dir.join("objects.csv")).unwrap(), "");
    }

    #[test]
    fn test_unwritable_destination_leaves_previous_reports() {
        let temp = TempDir::new().unwrap();
        let levels = temp.path().join("levels.csv");
        fs::write(&levels, "previous\n").unwrap();
        // A regular file where the objects directory should be
        let blocker = temp.path().join("blocked");
        fs::write(&blocker, b"").unwrap();

        let err = write_reports(
            &[DocumentRecord::new("n", "2", ["o"])],
            &levels,
            &blocker.join("objects.csv"),
        )
        .unwrap_err();

        assert!(matches!(err, WriteError::Io { .. }));
        assert_eq!(fs::read_to_string(&levels).unwrap(), "previous\n");
    }

    fn record_strategy() -> impl Strategy<Value = DocumentRecord> {
        (
            "[a-f0-9]{1,12}",
            1u32..=100,
            prop::collection::vec("[A-Za-z0-9 ,\"]{1,16}", 0..8),
        )
            .prop_map(|(id, level, objects)| DocumentRecord::new(id, level.to_string(), objects))
    }

    proptest! {
        #[test]
        fn prop_row_counts_match_records(records in prop::collection::vec(record_strategy(), 0..20)) {
            let temp = TempDir::new().unwrap();
            let levels = temp.path().join("levels.csv");
            let objects = temp.path().join("objects.csv");

            let stats = write_reports(&records, &levels, &objects).unwrap();

            let expected_objects: usize = records.iter().map(|r| r.objects.len()).sum();
            prop_assert_eq!(stats.level_rows, records.len());
            prop_assert_eq!(stats.object_rows, expected_objects);

            let level_rows = read_rows(&levels);
            let object_rows = read_rows(&objects);
            prop_assert_eq!(level_rows.len(), records.len());
            prop_assert_eq!(object_rows.len(), expected_objects);

            let flattened: Vec<Vec<String>> = records
                .iter()
                .flat_map(|r| r.objects.iter().map(|o| vec![r.id.clone(), o.clone()]))
                .collect();
            prop_assert_eq!(object_rows, flattened);
        }
    }
}
