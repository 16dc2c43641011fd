//! Training modules and learning pipelines.
//!
//! The index carries metadata only; module content is fetched on demand.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

use splunked_common::{
    ContentFormat, ModuleRecord, Pipeline, PipelineStep, TrainingIndex, TrainingModule,
};

use crate::content::load_pipelines;
use crate::db::{json_load, now};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ModuleRow {
    id: String,
    #[sqlx(rename = "type")]
    kind: String,
    title: String,
    description: Option<String>,
    category: Option<String>,
    bucket: Option<String>,
    difficulty: Option<String>,
    duration: Option<String>,
    tags_json: Option<String>,
    objectives_json: Option<String>,
    keywords_json: Option<String>,
    sort_order: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    content_format: Option<String>,
    content: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: String,
    title: String,
    description: Option<String>,
    level: Option<String>,
    duration: Option<String>,
    icon: Option<String>,
    objectives_json: Option<String>,
    track: Option<String>,
    sort_order: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct StepRow {
    id: String,
    pipeline_id: String,
    title: Option<String>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    source: Option<String>,
    source_id: Option<String>,
    description: Option<String>,
    duration: Option<String>,
    link: Option<String>,
}

const MODULE_COLUMNS: &str = "id, type, title, description, category, bucket, difficulty, \
     duration, tags_json, objectives_json, keywords_json, sort_order";

fn row_to_module(row: ModuleRow) -> TrainingModule {
    TrainingModule {
        id: row.id,
        kind: row.kind,
        title: row.title,
        description: row.description.unwrap_or_default(),
        category: row.category,
        bucket: row.bucket,
        difficulty: row.difficulty,
        duration: row.duration,
        tags: json_load(row.tags_json.as_deref()),
        objectives: json_load(row.objectives_json.as_deref()),
        keywords: json_load(row.keywords_json.as_deref()),
        sort_order: row.sort_order.unwrap_or(0),
        body: None,
        content: None,
    }
}

/// Lessons expose their stored text as `body`; other modules expose `content`,
/// parsed when stored as JSON.
fn attach_content(module: &mut TrainingModule, row: ContentRow) {
    let raw = row.content.unwrap_or_default();
    if module.is_lesson() {
        module.body = Some(raw);
        return;
    }

    let format = row
        .content_format
        .as_deref()
        .and_then(ContentFormat::parse)
        .unwrap_or(ContentFormat::Json);
    module.content = Some(match format {
        ContentFormat::Json => serde_json::from_str(&raw)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default())),
        ContentFormat::Html | ContentFormat::Markdown => serde_json::Value::String(raw),
    });
}

fn row_to_step(row: StepRow) -> PipelineStep {
    PipelineStep {
        id: Some(row.id),
        title: row.title.unwrap_or_default(),
        kind: row.kind.unwrap_or_default(),
        source: row.source.unwrap_or_default(),
        source_id: row.source_id,
        description: row.description.unwrap_or_default(),
        duration: row.duration.unwrap_or_default(),
        link: row.link,
    }
}

fn row_to_pipeline(row: PipelineRow, steps: Vec<PipelineStep>) -> Pipeline {
    Pipeline {
        id: row.id,
        title: row.title,
        description: row.description.unwrap_or_default(),
        level: row.level,
        duration: row.duration,
        icon: row.icon.unwrap_or_default(),
        objectives: json_load(row.objectives_json.as_deref()),
        track: row.track,
        sort_order: row.sort_order.unwrap_or(0),
        steps,
    }
}

/// Stored step id: `{pipeline}-{step id or step-N}`, N counting from 1.
pub fn step_id(pipeline_id: &str, index: usize, step: &PipelineStep) -> String {
    let raw = step
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("step-{}", index + 1));
    format!("{pipeline_id}-{raw}")
}

// ---------------------------------------------------------------------------
// TrainingStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TrainingStore {
    pool: SqlitePool,
}

impl TrainingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load pipelines from `seed_path` when no pipeline exists yet.
    pub async fn seed_pipelines_if_empty(&self, seed_path: &Path) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM training_pipelines")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        let pipelines = match load_pipelines(seed_path) {
            Ok(pipelines) => pipelines,
            Err(e) => {
                warn!(path = %seed_path.display(), error = %e, "Ignoring unreadable pipelines seed");
                return Ok(0);
            }
        };

        let mut seeded = 0;
        for pipeline in &pipelines {
            if self.upsert_pipeline(pipeline).await?.is_some() {
                seeded += 1;
            }
        }
        if seeded > 0 {
            info!(seeded, "Seeded training pipelines");
        }
        Ok(seeded)
    }

    /// Metadata for every module, grouped by category, plus all pipelines.
    pub async fn index(&self) -> Result<TrainingIndex> {
        let rows = sqlx::query_as::<_, ModuleRow>(&format!(
            "SELECT {MODULE_COLUMNS} FROM training_modules ORDER BY sort_order ASC, title ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let modules = rows.into_iter().map(row_to_module).collect();
        Ok(TrainingIndex::from_modules(modules, self.pipelines().await?))
    }

    /// A single module with its content.
    pub async fn item(&self, id: &str) -> Result<Option<TrainingModule>> {
        let row = sqlx::query_as::<_, ModuleRow>(&format!(
            "SELECT {MODULE_COLUMNS} FROM training_modules WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let content = sqlx::query_as::<_, ContentRow>(
            "SELECT content_format, content FROM training_modules WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let mut module = row_to_module(row);
        attach_content(&mut module, content);
        Ok(Some(module))
    }

    /// All pipelines with their steps in order.
    pub async fn pipelines(&self) -> Result<Vec<Pipeline>> {
        let pipeline_rows = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, title, description, level, duration, icon, objectives_json, track, sort_order
            FROM training_pipelines
            ORDER BY sort_order ASC, title ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let step_rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, pipeline_id, title, type, source, source_id, description, duration, link
            FROM training_pipeline_steps
            ORDER BY pipeline_id, step_index ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut steps_by_pipeline: HashMap<String, Vec<PipelineStep>> = HashMap::new();
        for row in step_rows {
            steps_by_pipeline
                .entry(row.pipeline_id.clone())
                .or_default()
                .push(row_to_step(row));
        }

        Ok(pipeline_rows
            .into_iter()
            .map(|row| {
                let steps = steps_by_pipeline.remove(&row.id).unwrap_or_default();
                row_to_pipeline(row, steps)
            })
            .collect())
    }

    /// Delete all modules, pipelines, and steps.
    pub async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM training_pipeline_steps")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM training_pipelines")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM training_modules")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Insert or replace a module by id. Modules without an id are skipped.
    pub async fn upsert_module(&self, record: &ModuleRecord) -> Result<Option<String>> {
        let module = &record.module;
        if module.id.is_empty() {
            return Ok(None);
        }

        let timestamp = now();
        sqlx::query(
            r#"
            INSERT INTO training_modules (
                id, type, title, description, category, bucket, difficulty, duration,
                tags_json, objectives_json, keywords_json, content_format, content,
                sort_order, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                bucket = excluded.bucket,
                difficulty = excluded.difficulty,
                duration = excluded.duration,
                tags_json = excluded.tags_json,
                objectives_json = excluded.objectives_json,
                keywords_json = excluded.keywords_json,
                content_format = excluded.content_format,
                content = excluded.content,
                sort_order = excluded.sort_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&module.id)
        .bind(&module.kind)
        .bind(&module.title)
        .bind(&module.description)
        .bind(&module.category)
        .bind(&module.bucket)
        .bind(&module.difficulty)
        .bind(&module.duration)
        .bind(serde_json::to_string(&module.tags)?)
        .bind(serde_json::to_string(&module.objectives)?)
        .bind(serde_json::to_string(&module.keywords)?)
        .bind(record.content_format.as_str())
        .bind(&record.content)
        .bind(module.sort_order)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await?;

        Ok(Some(module.id.clone()))
    }

    /// Insert or replace a pipeline and all of its steps.
    pub async fn upsert_pipeline(&self, pipeline: &Pipeline) -> Result<Option<String>> {
        if pipeline.id.is_empty() {
            return Ok(None);
        }

        let timestamp = now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO training_pipelines (
                id, title, description, level, duration, icon,
                objectives_json, track, sort_order, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                level = excluded.level,
                duration = excluded.duration,
                icon = excluded.icon,
                objectives_json = excluded.objectives_json,
                track = excluded.track,
                sort_order = excluded.sort_order,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&pipeline.id)
        .bind(&pipeline.title)
        .bind(&pipeline.description)
        .bind(&pipeline.level)
        .bind(&pipeline.duration)
        .bind(&pipeline.icon)
        .bind(serde_json::to_string(&pipeline.objectives)?)
        .bind(&pipeline.track)
        .bind(pipeline.sort_order)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM training_pipeline_steps WHERE pipeline_id = ?")
            .bind(&pipeline.id)
            .execute(&mut *tx)
            .await?;

        for (index, step) in pipeline.steps.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO training_pipeline_steps (
                    id, pipeline_id, step_index, title, type, source, source_id,
                    description, duration, link
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(step_id(&pipeline.id, index, step))
            .bind(&pipeline.id)
            .bind(index as i64)
            .bind(&step.title)
            .bind(&step.kind)
            .bind(&step.source)
            .bind(&step.source_id)
            .bind(&step.description)
            .bind(&step.duration)
            .bind(&step.link)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(pipeline.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: Option<&str>) -> PipelineStep {
        PipelineStep {
            id: id.map(String::from),
            title: "Step".into(),
            kind: "lesson".into(),
            source: "training".into(),
            source_id: None,
            description: String::new(),
            duration: String::new(),
            link: None,
        }
    }

    #[test]
    fn step_id_prefers_explicit_id() {
        assert_eq!(step_id("intro", 0, &step(Some("basics"))), "intro-basics");
    }

    #[test]
    fn step_id_falls_back_to_one_based_position() {
        assert_eq!(step_id("intro", 2, &step(None)), "intro-step-3");
        assert_eq!(step_id("intro", 0, &step(Some(""))), "intro-step-1");
    }
}
