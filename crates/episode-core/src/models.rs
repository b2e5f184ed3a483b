use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timed sub-interval of a recorded episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the segment in seconds.
    pub start_time: f64,
    /// End of the segment in seconds.
    pub end_time: f64,
    /// Whether the recording flagged this segment as suboptimal.
    pub has_suboptimal: bool,
    /// Index into the document's instruction list.
    #[serde(default)]
    pub instructions_index: Option<i64>,
}

impl Segment {
    /// `end_time - start_time`. Negative when the source data is inverted.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// The label of one instruction step.
///
/// Documents store each instruction as a one-element array (`["pick cup"]`);
/// a bare string is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Instruction(pub String);

impl Instruction {
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        fn label_of(value: Value) -> Option<String> {
            match value {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }

        let label = match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().next().and_then(label_of),
            other => label_of(other),
        };
        label
            .map(Instruction)
            .ok_or_else(|| de::Error::custom("instruction has no label"))
    }
}

/// A metadata value kept as the document wrote it.
///
/// Absent and `null` values become `""`. Strings display unquoted, any other
/// value displays as compact JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetaValue(Value);

impl MetaValue {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn text(&self) -> Cow<'_, str> {
        match &self.0 {
            Value::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl Default for MetaValue {
    fn default() -> Self {
        Self(Value::String(String::new()))
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self(Value::String(s))
    }
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::default(),
            other => Self(other),
        }
    }
}

impl PartialEq<&str> for MetaValue {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == Some(*other)
    }
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(MetaValue::from)
    }
}

/// A per-episode metadata document as written by the recording tool.
///
/// Metadata fields are kept verbatim, except `hsr_id`, which recorders write
/// as a number and is rendered as text. `instructions` and `segments` are
/// required; unknown keys such as `subtasks` are read from the untyped
/// document instead (see [`subtask_labels`]).
#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisodeDocument {
    #[serde(default)]
    pub bag_path: MetaValue,
    #[serde(default, deserialize_with = "hsr_id_text")]
    pub hsr_id: String,
    #[serde(default)]
    pub version: MetaValue,
    #[serde(default)]
    pub location_name: MetaValue,
    #[serde(default)]
    pub interface: MetaValue,
    #[serde(default)]
    pub git_branch: MetaValue,
    #[serde(default)]
    pub git_hash: MetaValue,
    pub instructions: Vec<Instruction>,
    pub segments: Vec<Segment>,
}

impl RawEpisodeDocument {
    /// Segment durations in source order.
    pub fn durations(&self) -> Vec<f64> {
        self.segments.iter().map(Segment::duration).collect()
    }

    /// Instruction label for `index`, if it resolves.
    pub fn instruction(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.instructions.get(i))
            .map(Instruction::label)
    }
}

fn hsr_id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    MetaValue::deserialize(deserializer).map(|value| value.text().into_owned())
}

/// Subtask type labels declared by a raw document.
///
/// `subtasks` is a list whose elements are either a label string or an
/// object carrying a string `type`. Anything else is ignored, and a document
/// without a `subtasks` list yields nothing.
pub fn subtask_labels(document: &Value) -> Vec<String> {
    let Some(items) = document.get("subtasks").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(label) => Some(label.clone()),
            Value::Object(map) => map.get("type").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Statistics derived from one episode document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// `YYYY-MM-DD` taken from the episode folder name, `None` if the folder
    /// name does not encode a date.
    pub date: Option<String>,
    /// Sum of all segment durations in seconds.
    pub total_time: f64,
    pub mean_duration: f64,
    pub max_duration: f64,
    pub min_duration: f64,
    pub total_segments: usize,
    pub suboptimal_segments: usize,
    pub bag_path: MetaValue,
    pub hsr_id: String,
    pub version: MetaValue,
    pub location_name: MetaValue,
    pub interface: MetaValue,
    pub git_branch: MetaValue,
    pub git_hash: MetaValue,
}

impl Episode {
    /// Every field name addressable through [`Episode::field`].
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "date",
        "total_time",
        "mean_duration",
        "max_duration",
        "min_duration",
        "total_segments",
        "suboptimal_segments",
        "bag_path",
        "hsr_id",
        "version",
        "location_name",
        "interface",
        "git_branch",
        "git_hash",
    ];

    /// Look a field up by name as a typed JSON value.
    ///
    /// Metadata yields the value as the document wrote it (`hsr_id` as a
    /// string), statistics yield numbers and an unresolved date yields
    /// `null`. Unknown names yield `None`.
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "date" => self.date.clone().map(Value::String).unwrap_or(Value::Null),
            "total_time" => Value::from(self.total_time),
            "mean_duration" => Value::from(self.mean_duration),
            "max_duration" => Value::from(self.max_duration),
            "min_duration" => Value::from(self.min_duration),
            "total_segments" => Value::from(self.total_segments),
            "suboptimal_segments" => Value::from(self.suboptimal_segments),
            "bag_path" => self.bag_path.as_value().clone(),
            "hsr_id" => Value::String(self.hsr_id.clone()),
            "version" => self.version.as_value().clone(),
            "location_name" => self.location_name.as_value().clone(),
            "interface" => self.interface.as_value().clone(),
            "git_branch" => self.git_branch.as_value().clone(),
            "git_hash" => self.git_hash.as_value().clone(),
            _ => return None,
        };
        Some(value)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
