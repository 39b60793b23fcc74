use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::DedupError::{self, *};

/// A duplicate frame, and the kept frame it was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub duplicate: String,
    pub kept: String,
}

/// Summary of one deduplication pass. Written as `dedup_report.json` by the dedup stage,
/// where it also serves as the stage's completion marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupReport {
    /// Number of input frames, including unreadable ones.
    pub total: usize,
    pub kept: usize,
    pub duplicates: usize,
    pub threshold: u32,
    /// Kept frame identifiers, in the order they were kept.
    pub kept_files: Vec<String>,
    /// Duplicates in processing order.
    pub duplicates_map: Vec<DuplicateRecord>,
    /// Frames that could not be decoded, in processing order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreadable_files: Vec<String>,
}

impl DedupReport {
    /// True when the counts agree with the lists, and every input frame is accounted for.
    pub fn is_consistent(&self) -> bool {
        self.kept == self.kept_files.len()
            && self.duplicates == self.duplicates_map.len()
            && self.total == self.kept + self.duplicates + self.unreadable_files.len()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DedupError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(DedupError::io(path))?;

        let report: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| Deserialization {
            src: format!("{e}"),
            path: path.to_path_buf(),
        })?;

        if !report.is_consistent() {
            return Err(Deserialization {
                src: "report counts do not match its contents".to_string(),
                path: path.to_path_buf(),
            });
        }

        Ok(report)
    }

    /// Write the report as pretty-printed JSON. The report is first written to a
    /// temporary file which is then renamed into place, so a reader never observes a
    /// partially written report.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DedupError> {
        let path = path.as_ref();
        let temp_path = path.with_extension("json.tmp");

        let temp_file = File::create(&temp_path).map_err(DedupError::io(&temp_path))?;
        let mut buf = BufWriter::new(temp_file);

        serde_json::to_writer_pretty(&mut buf, self).map_err(|e| Serialization {
            src: format!("{e}"),
            path: path.to_path_buf(),
        })?;
        buf.write_all(b"\n").map_err(DedupError::io(&temp_path))?;

        let temp_file = buf.into_inner().map_err(|e| Io {
            src: e.into_error(),
            path: temp_path.clone(),
        })?;
        temp_file.sync_all().map_err(DedupError::io(&temp_path))?;

        std::fs::rename(&temp_path, path).map_err(DedupError::io(path))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn example_report() -> DedupReport {
        DedupReport {
            total: 5,
            kept: 3,
            duplicates: 2,
            threshold: 8,
            kept_files: vec!["f1.jpg".into(), "f3.jpg".into(), "f5.jpg".into()],
            duplicates_map: vec![
                DuplicateRecord {
                    duplicate: "f2.jpg".into(),
                    kept: "f1.jpg".into(),
                },
                DuplicateRecord {
                    duplicate: "f4.jpg".into(),
                    kept: "f1.jpg".into(),
                },
            ],
            unreadable_files: vec![],
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(example_report()).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys = obj.keys().map(String::as_str).collect::<Vec<_>>();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["duplicates", "duplicates_map", "kept", "kept_files", "threshold", "total"]
        );

        assert_eq!(obj["duplicates_map"][1]["duplicate"], "f4.jpg");
        assert_eq!(obj["duplicates_map"][1]["kept"], "f1.jpg");
    }

    #[test]
    fn test_unreadable_files_are_serialized_when_present() {
        let mut report = example_report();
        report.total += 1;
        report.unreadable_files.push("f6.jpg".into());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["unreadable_files"][0], "f6.jpg");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup_report.json");

        example_report().save(&path).unwrap();
        assert_eq!(DedupReport::load(&path).unwrap(), example_report());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_inconsistent_report_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup_report.json");

        let mut report = example_report();
        report.kept = 7;
        report.save(&path).unwrap();

        assert!(matches!(DedupReport::load(&path), Err(DedupError::Deserialization { .. })));
    }

    #[test]
    fn test_truncated_report_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup_report.json");
        std::fs::write(&path, "{\"total\": 3, \"kept\"").unwrap();

        assert!(DedupReport::load(&path).is_err());
    }
}
