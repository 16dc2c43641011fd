use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category used when a module has none.
pub const DEFAULT_CATEGORY: &str = "general";

/// Training module metadata. `body` is set for lessons and `content` for the
/// other module types, and only when the full item is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingModule {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub bucket: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl TrainingModule {
    pub fn is_lesson(&self) -> bool {
        self.kind == "lesson"
    }
}

/// How module content is stored on disk and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Json,
    Html,
    Markdown,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Json => "json",
            ContentFormat::Html => "html",
            ContentFormat::Markdown => "markdown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(ContentFormat::Json),
            "html" => Some(ContentFormat::Html),
            "markdown" => Some(ContentFormat::Markdown),
            _ => None,
        }
    }
}

/// A module ready to be written: metadata plus its raw stored content.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    pub module: TrainingModule,
    pub content_format: ContentFormat,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub source: String,
    pub source_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    pub link: Option<String>,
}

/// An ordered learning path through training modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    pub track: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub steps: Vec<PipelineStep>,
}

/// Metadata-only view of all training content, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingIndex {
    pub lessons: BTreeMap<String, Vec<TrainingModule>>,
    pub training: BTreeMap<String, Vec<TrainingModule>>,
    pub pipelines: Vec<Pipeline>,
}

impl TrainingIndex {
    /// Group modules (already in display order) into lessons and other training.
    pub fn from_modules(modules: Vec<TrainingModule>, pipelines: Vec<Pipeline>) -> Self {
        let mut index = TrainingIndex {
            pipelines,
            ..Default::default()
        };
        for module in modules {
            let category = module
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            let group = if module.is_lesson() {
                &mut index.lessons
            } else {
                &mut index.training
            };
            group.entry(category).or_default().push(module);
        }
        index
    }
}
