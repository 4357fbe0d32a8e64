use chrono::{DateTime, Utc};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Captured application state: an arbitrarily nested mapping from field name
/// to JSON value. `serde_json::Map` iterates in sorted key order, which keeps
/// every traversal in the engine deterministic.
pub type State = serde_json::Map<String, Value>;

/// Key marking an object as an opaque record-like value (value: type name).
///
/// Opaque records are not plain mappings: the diff engine treats them as
/// leaves instead of recursing into their fields.
pub const RECORD_MARKER: &str = "_record";

/// Key marking an un-fetched relation (value: relation name).
///
/// The capture hook emits `{"_deferred": "comments"}` for a relation that was
/// never loaded, the plain-JSON equivalent of a `NotLoaded` relation slot.
pub const DEFERRED_MARKER: &str = "_deferred";

/// Prefix of source-ecosystem metadata keys, stripped on export.
pub const META_PREFIX: &str = "__";

/// Returns `true` if the value is a plain nested mapping the diff engine may
/// recurse into: an object that does not carry the opaque-record marker.
pub fn is_plain_mapping(value: &Value) -> bool {
    matches!(value, Value::Object(map) if !map.contains_key(RECORD_MARKER))
}

/// Returns `true` if the value is a deferred-relation marker object.
pub fn is_deferred_relation(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.len() == 1 && map.contains_key(DEFERRED_MARKER))
}

/// Returns `true` if the value is an opaque record-like object.
pub fn is_opaque_record(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key(RECORD_MARKER))
}

/// One captured moment of application state plus metadata.
///
/// Snapshots are produced by the external instrumentation hook and are
/// immutable once captured; the engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Event label, e.g. `"mount"` or `"handle_event:submit"`.
    pub event: String,
    /// Full captured state at this moment.
    pub state: State,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Logical component that produced the snapshot.
    pub source: String,
}

impl Snapshot {
    pub fn new(
        event: impl Into<String>,
        state: State,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            state,
            timestamp,
            source: source.into(),
        }
    }
}

/// One old/new value pair for a changed field.
///
/// Serialized as a two-element array `[old, new]` in the timeline document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeValue {
    pub old: Value,
    pub new: Value,
}

impl ChangeValue {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }

    /// A change representing a field that appeared (old side is `null`).
    pub fn appeared(new: Value) -> Self {
        Self {
            old: Value::Null,
            new,
        }
    }
}

impl Serialize for ChangeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.old)?;
        tuple.serialize_element(&self.new)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for ChangeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (old, new) = <(Value, Value)>::deserialize(deserializer)?;
        Ok(Self { old, new })
    }
}

/// Flattened change map: dot-joined field path to old/new pair.
pub type ChangeMap = BTreeMap<String, ChangeValue>;

/// One row of the timeline.
///
/// Base fields are fixed; enrichment fields are merged in by each active
/// enricher and serialized inline next to the base fields. Enricher field
/// names must not collide by convention; a collision silently overwrites in
/// registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// 1-based, contiguous position within the timeline.
    pub sequence: usize,
    pub event: String,
    pub timestamp: DateTime<Utc>,
    /// Reduced, display-worthy view of the state.
    pub key_state: State,
    /// Changes relative to the previous entry; `None` for the first entry.
    pub changes: Option<ChangeMap>,
    /// Milliseconds since the previous entry; `None` for the first entry.
    pub duration_since_previous_ms: Option<i64>,
    /// Open set of enricher-computed fields.
    #[serde(flatten)]
    pub enrichments: State,
}

impl TimelineEntry {
    /// Look up an enrichment field by name.
    pub fn enrichment(&self, field: &str) -> Option<&Value> {
        self.enrichments.get(field)
    }

    /// Enrichment field as `u64`, when present and numeric.
    pub fn enrichment_u64(&self, field: &str) -> Option<u64> {
        self.enrichments.get(field).and_then(Value::as_u64)
    }

    /// Returns `true` when the entry has a diff and it recorded no changes.
    pub fn is_noop(&self) -> bool {
        self.changes.as_ref().is_some_and(ChangeMap::is_empty)
    }
}

/// The full ordered record of entries for one test run.
///
/// Created once by the timeline builder and read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub test: String,
    /// Last capture timestamp minus first, in milliseconds. 0 for empty or
    /// single-entry timelines.
    pub duration_ms: i64,
    #[serde(rename = "timeline")]
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How urgent a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One reported issue. Produced only by analyzers; immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Human-readable description of the issue.
    pub message: String,
    /// Sequence numbers of the timeline entries backing this finding.
    pub related_entries: Vec<usize>,
    /// Free-form facts backing the message.
    pub metadata: State,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            related_entries: Vec::new(),
            metadata: State::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, message)
    }

    pub fn related(mut self, entries: impl IntoIterator<Item = usize>) -> Self {
        self.related_entries.extend(entries);
        self
    }

    pub fn fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Findings plus summary statistics from one analyzer run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub stats: State,
}

impl AnalysisResult {
    /// Neutral result for sparse input (e.g. an empty timeline).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stat(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.stats.insert(key.into(), value.into());
        self
    }
}

/// One analyzer's name and result, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerRun {
    pub analyzer: String,
    pub result: AnalysisResult,
}

/// All analyzer results for one run, ordered by execution.
///
/// This is the shape handed to the report formatter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub results: Vec<AnalyzerRun>,
}

impl AnalysisReport {
    pub fn result_of(&self, analyzer: &str) -> Option<&AnalysisResult> {
        self.results
            .iter()
            .find(|run| run.analyzer == analyzer)
            .map(|run| &run.result)
    }

    /// Total number of findings across all analyzers.
    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|run| run.result.findings.len()).sum()
    }

    /// Highest severity present, or `None` when nothing was found.
    pub fn max_severity(&self) -> Option<Severity> {
        self.results
            .iter()
            .flat_map(|run| run.result.findings.iter())
            .map(|finding| finding.severity)
            .max()
    }
}
