use std::fmt;

use serde::{Deserialize, Serialize};

// --- Mapping type keys ---

/// The five catalog lists a mapping object can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingType {
    DataSources,
    FieldValues,
    Patterns,
    OutputShapes,
    TimeRangePresets,
}

impl MappingType {
    pub const ALL: [MappingType; 5] = [
        MappingType::DataSources,
        MappingType::FieldValues,
        MappingType::Patterns,
        MappingType::OutputShapes,
        MappingType::TimeRangePresets,
    ];

    /// Resolve a type name from a URL segment or seed file. Accepts the plural
    /// key and its singular alias; anything else is unknown.
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "dataSources" | "dataSource" => Some(MappingType::DataSources),
            "fieldValues" | "fieldValue" => Some(MappingType::FieldValues),
            "patterns" | "pattern" => Some(MappingType::Patterns),
            "outputShapes" | "outputShape" => Some(MappingType::OutputShapes),
            "timeRangePresets" | "timeRangePreset" => Some(MappingType::TimeRangePresets),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            MappingType::DataSources => "dataSources",
            MappingType::FieldValues => "fieldValues",
            MappingType::Patterns => "patterns",
            MappingType::OutputShapes => "outputShapes",
            MappingType::TimeRangePresets => "timeRangePresets",
        }
    }

    pub fn singular(&self) -> &'static str {
        let key = self.key();
        &key[..key.len() - 1]
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            MappingType::DataSources => "ds",
            MappingType::FieldValues => "fv",
            MappingType::Patterns => "pf",
            MappingType::OutputShapes => "os",
            MappingType::TimeRangePresets => "tr",
        }
    }

    /// Fresh id of the form `{prefix}_{8 hex chars}`.
    pub fn generate_id(&self) -> String {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        format!("{}_{}", self.id_prefix(), &hex[..8])
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// --- Stored mapping objects ---

/// A catalog record as stored and as exchanged over the mappings API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub friendly_name: String,
    pub spl: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_field: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_placeholder: Option<String>,
}

/// Create/update payload. Every field is optional; absent fields fall back to
/// defaults on create and to the stored value on update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDraft {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub friendly_name: Option<String>,
    pub spl: Option<String>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub requires_field: Option<bool>,
    pub field_placeholder: Option<String>,
}

/// All mapping objects grouped by type key, in the shape `GET /api/mappings`
/// returns and the seed file uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingSet {
    pub data_sources: Vec<MappingObject>,
    pub field_values: Vec<MappingObject>,
    pub patterns: Vec<MappingObject>,
    pub output_shapes: Vec<MappingObject>,
    pub time_range_presets: Vec<MappingObject>,
}

impl MappingSet {
    pub fn list(&self, kind: MappingType) -> &[MappingObject] {
        match kind {
            MappingType::DataSources => &self.data_sources,
            MappingType::FieldValues => &self.field_values,
            MappingType::Patterns => &self.patterns,
            MappingType::OutputShapes => &self.output_shapes,
            MappingType::TimeRangePresets => &self.time_range_presets,
        }
    }

    pub fn list_mut(&mut self, kind: MappingType) -> &mut Vec<MappingObject> {
        match kind {
            MappingType::DataSources => &mut self.data_sources,
            MappingType::FieldValues => &mut self.field_values,
            MappingType::Patterns => &mut self.patterns,
            MappingType::OutputShapes => &mut self.output_shapes,
            MappingType::TimeRangePresets => &mut self.time_range_presets,
        }
    }
}

// --- Composer catalog entities ---

#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub id: String,
    pub name: String,
    pub friendly_name: String,
    pub spl_fragment: String,
    pub tags: Vec<String>,
    pub description: String,
}

/// A pattern or field-value filter. Both lists share this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterObject {
    pub id: String,
    pub name: String,
    pub spl_fragment: String,
    pub tags: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputShape {
    pub id: String,
    pub name: String,
    pub spl_fragment: String,
    pub requires_field: bool,
    pub field_placeholder: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRangePreset {
    pub id: String,
    pub name: String,
    pub spl_fragment: String,
}

pub const DEFAULT_FIELD_PLACEHOLDER: &str = "{field}";

impl From<MappingObject> for DataSource {
    fn from(obj: MappingObject) -> Self {
        Self {
            id: obj.id,
            name: obj.name,
            friendly_name: obj.friendly_name,
            spl_fragment: obj.spl,
            tags: obj.tags,
            description: obj.description,
        }
    }
}

impl From<MappingObject> for FilterObject {
    fn from(obj: MappingObject) -> Self {
        Self {
            id: obj.id,
            name: obj.name,
            spl_fragment: obj.spl,
            tags: obj.tags,
            description: obj.description,
        }
    }
}

impl From<MappingObject> for OutputShape {
    fn from(obj: MappingObject) -> Self {
        let field_placeholder = obj
            .field_placeholder
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_FIELD_PLACEHOLDER.to_string());
        Self {
            id: obj.id,
            name: obj.name,
            spl_fragment: obj.spl,
            requires_field: obj.requires_field.unwrap_or(false),
            field_placeholder,
        }
    }
}

impl From<MappingObject> for TimeRangePreset {
    fn from(obj: MappingObject) -> Self {
        Self {
            id: obj.id,
            name: obj.name,
            spl_fragment: obj.spl,
        }
    }
}

/// Read-only snapshot of every search object the composer can reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub data_sources: Vec<DataSource>,
    pub field_values: Vec<FilterObject>,
    pub patterns: Vec<FilterObject>,
    pub output_shapes: Vec<OutputShape>,
    pub time_range_presets: Vec<TimeRangePreset>,
}

impl From<MappingSet> for Catalog {
    fn from(set: MappingSet) -> Self {
        Self {
            data_sources: set.data_sources.into_iter().map(Into::into).collect(),
            field_values: set.field_values.into_iter().map(Into::into).collect(),
            patterns: set.patterns.into_iter().map(Into::into).collect(),
            output_shapes: set.output_shapes.into_iter().map(Into::into).collect(),
            time_range_presets: set.time_range_presets.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_plural_and_singular() {
        assert_eq!(MappingType::resolve("patterns"), Some(MappingType::Patterns));
        assert_eq!(MappingType::resolve("pattern"), Some(MappingType::Patterns));
        assert_eq!(
            MappingType::resolve("timeRangePreset"),
            Some(MappingType::TimeRangePresets)
        );
        assert_eq!(MappingType::resolve("widgets"), None);
    }

    #[test]
    fn singular_drops_trailing_s() {
        assert_eq!(MappingType::DataSources.singular(), "dataSource");
        assert_eq!(MappingType::OutputShapes.singular(), "outputShape");
    }

    #[test]
    fn generated_id_has_prefix_and_eight_hex_chars() {
        let id = MappingType::FieldValues.generate_id();
        let (prefix, suffix) = id.split_once('_').unwrap();
        assert_eq!(prefix, "fv");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn output_shape_defaults_placeholder() {
        let obj = MappingObject {
            id: "os_1".into(),
            kind: "outputShape".into(),
            name: "Count by field".into(),
            friendly_name: "COUNT BY FIELD".into(),
            spl: "| stats count by {field}".into(),
            tags: vec![],
            description: String::new(),
            requires_field: Some(true),
            field_placeholder: Some(String::new()),
        };
        let shape = OutputShape::from(obj);
        assert!(shape.requires_field);
        assert_eq!(shape.field_placeholder, "{field}");
    }

    #[test]
    fn mapping_set_deserializes_partial_seed() {
        let set: MappingSet = serde_json::from_str(
            r#"{"dataSources": [{"id": "ds_fw", "type": "dataSource", "name": "Firewall",
                "friendlyName": "FIREWALL", "spl": "index=firewall"}]}"#,
        )
        .unwrap();
        assert_eq!(set.data_sources.len(), 1);
        assert!(set.patterns.is_empty());
        assert_eq!(set.data_sources[0].tags, Vec::<String>::new());
    }
}
