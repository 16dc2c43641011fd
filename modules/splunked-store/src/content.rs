//! Loading training content from files: markdown lessons with a JSON front
//! matter block, JSON modules, and the pipeline definition file.

use std::fs;
use std::path::{Path, PathBuf};

use pulldown_cmark::{html, Options, Parser};
use serde_json::{Map, Value};
use thiserror::Error;

use splunked_common::{ContentFormat, ModuleRecord, Pipeline, TrainingModule};

const FRONT_MATTER_FENCE: &str = "---";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing front matter block in {path}")]
    MissingFrontMatter { path: PathBuf },

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("markdown content only supports lessons (got {kind}) in {path}")]
    UnsupportedMarkdownType { path: PathBuf, kind: String },

    #[error("unknown content format {format:?} in {path}")]
    UnknownFormat { path: PathBuf, format: String },

    #[error("missing content for module {id}")]
    MissingContent { id: String },
}

/// Split `---\n{json}\n---\nbody` into the front matter object and the body.
pub fn parse_front_matter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix(FRONT_MATTER_FENCE)?;
    let (meta, body) = rest.split_once(FRONT_MATTER_FENCE)?;
    Some((meta.trim(), body.trim_start_matches(['\r', '\n'])))
}

fn read(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ContentError> {
    serde_json::from_str(raw).map_err(|source| ContentError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

fn module_from_map(path: &Path, map: Map<String, Value>) -> Result<TrainingModule, ContentError> {
    serde_json::from_value(Value::Object(map)).map_err(|source| ContentError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Render lesson markdown to HTML, with tables and footnotes enabled.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// A markdown lesson. The body is rendered and stored as HTML.
pub fn load_markdown_module(path: &Path) -> Result<ModuleRecord, ContentError> {
    let raw = read(path)?;
    let (meta, body) = parse_front_matter(&raw).ok_or_else(|| ContentError::MissingFrontMatter {
        path: path.to_path_buf(),
    })?;

    let module: TrainingModule = parse_json(path, meta)?;
    if !module.is_lesson() {
        return Err(ContentError::UnsupportedMarkdownType {
            path: path.to_path_buf(),
            kind: module.kind,
        });
    }

    Ok(ModuleRecord {
        module,
        content_format: ContentFormat::Html,
        content: render_markdown(body),
    })
}

/// A JSON module. Lessons carry their text in `body` (or `content`) and
/// default to HTML; every other type needs `content` and defaults to JSON.
pub fn load_json_module(path: &Path) -> Result<ModuleRecord, ContentError> {
    let raw = read(path)?;
    let mut payload: Map<String, Value> = parse_json(path, &raw)?;

    let declared_format = payload
        .remove("content_format")
        .and_then(|v| v.as_str().map(String::from));
    let mut content = payload.remove("content");
    let body = payload.remove("body");

    let module = module_from_map(path, payload)?;

    let default_format = if module.is_lesson() {
        content = body.or(content);
        ContentFormat::Html
    } else {
        ContentFormat::Json
    };

    let content_format = match declared_format {
        Some(format) => ContentFormat::parse(&format).ok_or_else(|| ContentError::UnknownFormat {
            path: path.to_path_buf(),
            format,
        })?,
        None => default_format,
    };

    if !module.is_lesson() && content.is_none() {
        return Err(ContentError::MissingContent { id: module.id });
    }

    let content = match (content_format, content) {
        (ContentFormat::Json, Some(value)) => value.to_string(),
        (_, Some(Value::String(text))) => text,
        (_, Some(value)) => value.to_string(),
        (_, None) => String::new(),
    };

    Ok(ModuleRecord {
        module,
        content_format,
        content,
    })
}

/// Every `.md` and `.json` file under `dir`, recursively, in sorted path order.
pub fn module_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|source| ContentError::Io {
            path: current.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| ContentError::Io {
                    path: current.clone(),
                    source,
                })?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("json")
            ) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Load every module under `dir`. Stops at the first malformed file.
pub fn load_modules(dir: &Path) -> Result<Vec<ModuleRecord>, ContentError> {
    module_files(dir)?
        .iter()
        .map(|path| match path.extension().and_then(|e| e.to_str()) {
            Some("md") => load_markdown_module(path),
            _ => load_json_module(path),
        })
        .collect()
}

/// Pipeline definitions from a JSON array. A missing file yields no pipelines.
pub fn load_pipelines(path: &Path) -> Result<Vec<Pipeline>, ContentError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = read(path)?;
    parse_json(path, &raw)
}
