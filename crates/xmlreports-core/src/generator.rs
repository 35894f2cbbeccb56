//! Synthetic input corpus.
//!
//! Produces `archive{i}.zip` files, each holding `file{j}.xml` documents in the
//! layout [`crate::parser`] reads. Used for demos and tests; a seeded run is
//! reproducible byte for byte.

use crate::error::GenerateError;
use crate::record::DocumentRecord;
use log::info;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Alphabet for object names
pub const LETTERS_AND_DIGITS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Highest level value produced (lowest is 1)
pub const MAX_LEVEL: u32 = 100;

/// Corpus shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of archives
    pub archives: usize,
    /// Documents in each archive
    pub documents_per_archive: usize,
    /// Upper bound of objects per document (lower bound is 1)
    pub max_objects: usize,
    /// Fixed RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            archives: 50,
            documents_per_archive: 100,
            max_objects: 10,
            seed: None,
        }
    }
}

/// Render one record as an XML document.
///
/// # Errors
///
/// [`GenerateError::Xml`] if the writer fails.
pub fn document_xml(record: &DocumentRecord) -> Result<Vec<u8>, GenerateError> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Start(BytesStart::new("root")))?;

    let mut id = BytesStart::new("var");
    id.push_attribute(("name", "id"));
    id.push_attribute(("value", record.id.as_str()));
    writer.write_event(Event::Empty(id))?;

    let mut level = BytesStart::new("var");
    level.push_attribute(("name", "level"));
    level.push_attribute(("value", record.level.as_str()));
    writer.write_event(Event::Empty(level))?;

    writer.write_event(Event::Start(BytesStart::new("objects")))?;
    for name in &record.objects {
        let mut object = BytesStart::new("object");
        object.push_attribute(("name", name.as_str()));
        writer.write_event(Event::Empty(object))?;
    }
    writer.write_event(Event::End(BytesEnd::new("objects")))?;

    writer.write_event(Event::End(BytesEnd::new("root")))?;
    Ok(writer.into_inner())
}

/// Write a ZIP archive whose members are `(name, contents)` pairs, in order.
///
/// # Errors
///
/// [`GenerateError::Io`] if the file cannot be created, [`GenerateError::Zip`]
/// if writing a member fails.
pub fn write_archive<N, C>(
    path: &Path,
    members: impl IntoIterator<Item = (N, C)>,
) -> Result<(), GenerateError>
where
    N: Into<String>,
    C: AsRef<[u8]>,
{
    let file = File::create(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, contents) in members {
        zip.start_file(name.into(), options)?;
        zip.write_all(contents.as_ref())
            .map_err(|source| GenerateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    }
    zip.finish()?;
    Ok(())
}

/// Draws random records with ids unique within one generator.
pub struct RecordGenerator {
    rng: StdRng,
    max_objects: usize,
    seen_ids: HashSet<String>,
}

impl RecordGenerator {
    /// # Errors
    ///
    /// [`GenerateError::InvalidConfig`] if `max_objects` is zero.
    pub fn new(max_objects: usize, seed: Option<u64>) -> Result<Self, GenerateError> {
        if max_objects == 0 {
            return Err(GenerateError::InvalidConfig(
                "max_objects must be at least 1".to_string(),
            ));
        }
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Ok(Self {
            rng,
            max_objects,
            seen_ids: HashSet::new(),
        })
    }

    /// Next random record
    pub fn next_record(&mut self) -> DocumentRecord {
        let id = loop {
            let candidate = format!("{:032x}", self.rng.random::<u128>());
            if self.seen_ids.insert(candidate.clone()) {
                break candidate;
            }
        };
        let level = self.rng.random_range(1..=MAX_LEVEL).to_string();
        let count = self.rng.random_range(1..=self.max_objects);
        let objects = (0..count).map(|_| self.random_name()).collect();

        DocumentRecord { id, level, objects }
    }

    /// Distinct characters sampled from [`LETTERS_AND_DIGITS`], 1 to 62 long
    fn random_name(&mut self) -> String {
        let len = self.rng.random_range(1..=LETTERS_AND_DIGITS.len());
        LETTERS_AND_DIGITS
            .choose_multiple(&mut self.rng, len)
            .map(|&b| char::from(b))
            .collect()
    }
}

/// Generate a full corpus into `output_dir` and return the archive paths.
///
/// The directory is created if missing. Existing `archive{i}.zip` files with
/// the same names are overwritten; other files are left alone.
///
/// # Errors
///
/// Any [`GenerateError`] from creating the directory, rendering documents or
/// writing archives.
pub fn generate_corpus(output_dir: &Path, config: &GeneratorConfig) -> Result<Vec<PathBuf>, GenerateError> {
    fs::create_dir_all(output_dir).map_err(|source| GenerateError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut records = RecordGenerator::new(config.max_objects, config.seed)?;
    let mut archives = Vec::with_capacity(config.archives);

    for i in 0..config.archives {
        let path = output_dir.join(format!("archive{i}.zip"));
        let members = (0..config.documents_per_archive)
            .map(|j| Ok((format!("file{j}.xml"), document_xml(&records.next_record())?)))
            .collect::<Result<Vec<_>, GenerateError>>()?;
        write_archive(&path, members)?;
        archives.push(path);
    }

    info!(
        "Generated {} archives with {} documents each in {}",
        config.archives,
        config.documents_per_archive,
        output_dir.display()
    );
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document_str;
    use tempfile::TempDir;

    #[test]
    fn test_document_xml_parses_back() {
        let record = DocumentRecord::new("X", "12", ["a", "b&c", "<d>"]);

        let xml = document_xml(&record).unwrap();
        let parsed = parse_document_str(std::str::from_utf8(&xml).unwrap(), Path::new("mem")).unwrap();

        assert_eq!(parsed, record);
    }

    #[test]
    fn test_records_respect_bounds() {
        let mut generator = RecordGenerator::new(3, Some(7)).unwrap();
        for _ in 0..200 {
            let record = generator.next_record();
            assert_eq!(record.id.len(), 32);
            let level: u32 = record.level.parse().unwrap();
            assert!((1..=MAX_LEVEL).contains(&level));
            assert!((1..=3).contains(&record.objects.len()));
            for name in &record.objects {
                assert!(!name.is_empty() && name.len() <= LETTERS_AND_DIGITS.len());
                let distinct: HashSet<char> = name.chars().collect();
                assert_eq!(distinct.len(), name.len(), "characters are sampled without replacement");
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let mut first = RecordGenerator::new(10, Some(42)).unwrap();
        let mut second = RecordGenerator::new(10, Some(42)).unwrap();
        for _ in 0..20 {
            assert_eq!(first.next_record(), second.next_record());
        }
    }

    #[test]
    fn test_zero_max_objects_rejected() {
        assert!(matches!(
            RecordGenerator::new(0, None),
            Err(GenerateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_generate_corpus_layout() {
        let temp = TempDir::new().unwrap();
        let config = GeneratorConfig {
            archives: 3,
            documents_per_archive: 4,
            max_objects: 2,
            seed: Some(1),
        };

        let archives = generate_corpus(temp.path(), &config).unwrap();

        assert_eq!(archives.len(), 3);
        for (i, archive) in archives.iter().enumerate() {
            assert_eq!(archive, &temp.path().join(format!("archive{i}.zip")));
            let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
            let names: Vec<_> = zip.file_names().map(str::to_string).collect();
            assert_eq!(names.len(), 4);
            assert!(names.contains(&"file0.xml".to_string()));
        }
    }
}
