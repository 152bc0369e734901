//! Preview and result report documents.
//!
//! A report is a JSON document with `input_data` and either `preview_data` or
//! `result_data`. Preview documents are pruned of empty values before they
//! are written; result documents are written as they are.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use crate::error::{Error, Result};

/// Timestamp format used in report file names and automatic playlist names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Whether a value is dropped when pruning.
///
/// Null, numeric zero, the empty string, the empty array and the empty object
/// are empty. `false` is kept.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) => false,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Recursively remove empty values from objects and arrays.
///
/// Children are pruned first, so a container left empty by pruning is itself
/// removed from its parent. The root is never removed.
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, prune_empty(v)))
                .filter(|(_, v)| !is_empty_value(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(prune_empty)
                .filter(|v| !is_empty_value(v))
                .collect(),
        ),
        other => other,
    }
}

/// Which report is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Forecast written before confirmation.
    Preview,
    /// Record of what a commit did.
    Result,
}

impl ReportKind {
    /// File name prefix.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Result => "result",
        }
    }

    /// Key of the data section next to `input_data`.
    pub const fn data_key(self) -> &'static str {
        match self {
            Self::Preview => "preview_data",
            Self::Result => "result_data",
        }
    }

    /// Whether documents of this kind are pruned before writing.
    pub const fn prunes(self) -> bool {
        matches!(self, Self::Preview)
    }
}

/// Assemble a report document from its two sections.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if either section cannot be serialized.
pub fn document<I: Serialize, D: Serialize>(kind: ReportKind, input: &I, data: &D) -> Result<Value> {
    let mut doc = serde_json::Map::new();
    doc.insert("input_data".to_string(), serde_json::to_value(input)?);
    doc.insert(kind.data_key().to_string(), serde_json::to_value(data)?);
    let doc = Value::Object(doc);
    Ok(if kind.prunes() { prune_empty(doc) } else { doc })
}

/// Destination of report documents.
pub trait ReportSink {
    /// Persist a document, returning where it went.
    fn write(&mut self, kind: ReportKind, document: &Value) -> Result<PathBuf>;
}

/// Writes reports as `<prefix>-<timestamp>.json` files in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileReportWriter {
    directory: PathBuf,
}

impl JsonFileReportWriter {
    /// Write reports into `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory reports are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a report of `kind` stamped `timestamp` is written to.
    pub fn path_for(&self, kind: ReportKind, timestamp: &str) -> PathBuf {
        self.directory
            .join(format!("{}-{timestamp}.json", kind.prefix()))
    }
}

impl ReportSink for JsonFileReportWriter {
    fn write(&mut self, kind: ReportKind, document: &Value) -> Result<PathBuf> {
        let path = self.path_for(kind, &timestamp_now());
        let wrap = |e: std::io::Error| Error::ReportWrite {
            path: path.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.directory).map_err(wrap)?;

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;

        let mut file = fs::File::create(&path).map_err(wrap)?;
        file.write_all(&buf).map_err(wrap)?;

        debug!("Wrote {} report to {}", kind.prefix(), path.display());
        Ok(path)
    }
}

/// Keeps reports in memory.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryReportSink {
    /// Documents written so far, in order.
    pub documents: Vec<(ReportKind, Value)>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryReportSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of one kind, in write order.
    pub fn of_kind(&self, kind: ReportKind) -> Vec<&Value> {
        self.documents
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v)
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ReportSink for MemoryReportSink {
    fn write(&mut self, kind: ReportKind, document: &Value) -> Result<PathBuf> {
        self.documents.push((kind, document.clone()));
        Ok(PathBuf::from(format!(
            "memory://{}-{}",
            kind.prefix(),
            self.documents.len()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    mod prune_tests {
        use super::*;

        #[test]
        fn test_drops_empty_values() {
            let pruned = prune_empty(json!({
                "a": null,
                "b": 0,
                "c": "",
                "d": [],
                "e": {},
                "f": "kept",
                "g": 3,
                "h": false,
            }));
            assert_eq!(pruned, json!({"f": "kept", "g": 3, "h": false}));
        }

        #[test]
        fn test_zero_float_is_empty() {
            assert!(is_empty_value(&json!(0.0)));
            assert!(!is_empty_value(&json!(0.5)));
        }

        #[test]
        fn test_containers_emptied_by_pruning_are_dropped() {
            let pruned = prune_empty(json!({
                "outer": {"inner": {"x": null}},
                "list": [[], "", {"y": 0}],
                "keep": {"z": 1},
            }));
            assert_eq!(pruned, json!({"keep": {"z": 1}}));
        }

        #[test]
        fn test_array_elements_filtered() {
            let pruned = prune_empty(json!([1, 0, "x", null, {"k": "v"}]));
            assert_eq!(pruned, json!([1, "x", {"k": "v"}]));
        }

        #[test]
        fn test_root_is_kept() {
            assert_eq!(prune_empty(json!({"a": null})), json!({}));
        }
    }

    #[test]
    fn test_preview_document_is_pruned() {
        let doc = document(
            ReportKind::Preview,
            &json!({"playlist_url": "u", "unavailable_videos": {}}),
            &json!({"no_actions": false, "totals": {}}),
        )
        .unwrap();
        assert_eq!(
            doc,
            json!({"input_data": {"playlist_url": "u"}, "preview_data": {"no_actions": false}})
        );
    }

    #[test]
    fn test_result_document_is_verbatim() {
        let doc = document(ReportKind::Result, &json!({"a": ""}), &json!({"b": 0})).unwrap();
        assert_eq!(doc, json!({"input_data": {"a": ""}, "result_data": {"b": 0}}));
    }

    #[test]
    fn test_file_writer_uses_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let mut writer = JsonFileReportWriter::new(temp.path().join("reports"));

        let path = writer
            .write(ReportKind::Result, &json!({"input_data": {"k": 1}}))
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("result-"));
        assert!(name.ends_with(".json"));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n    \"input_data\": {\n        \"k\": 1"));
    }

    #[test]
    fn test_path_for() {
        let writer = JsonFileReportWriter::new("out");
        assert_eq!(
            writer.path_for(ReportKind::Preview, "2024-05-01-10-00-00"),
            PathBuf::from("out/preview-2024-05-01-10-00-00.json")
        );
    }

    #[test]
    fn test_memory_sink_keeps_documents() {
        let mut sink = MemoryReportSink::new();
        sink.write(ReportKind::Preview, &json!({"a": 1})).unwrap();
        sink.write(ReportKind::Result, &json!({"b": 2})).unwrap();
        assert_eq!(sink.of_kind(ReportKind::Preview).len(), 1);
        assert_eq!(sink.of_kind(ReportKind::Result)[0], &json!({"b": 2}));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), "2024-01-01-00-00-00".len());
        assert_eq!(ts.matches('-').count(), 5);
    }
}
