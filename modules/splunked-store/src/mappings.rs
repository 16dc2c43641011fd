//! Prompt-builder mapping catalog backed by the `mappings` table.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{info, warn};

use splunked_common::{MappingDraft, MappingObject, MappingSet, MappingType, SplunkedError};

use crate::db::{json_load, now};
use crate::CatalogSource;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct MappingRow {
    id: String,
    type_key: String,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    friendly_name: Option<String>,
    spl: Option<String>,
    tags: Option<String>,
    description: Option<String>,
    requires_field: Option<i64>,
    field_placeholder: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, type_key, type, name, friendly_name, spl, tags, \
     description, requires_field, field_placeholder FROM mappings";

fn row_to_object(row: MappingRow) -> MappingObject {
    let name = row.name.unwrap_or_default();
    let kind = row.kind.filter(|k| !k.is_empty()).unwrap_or_else(|| {
        MappingType::resolve(&row.type_key)
            .map(|t| t.singular().to_string())
            .unwrap_or_else(|| row.type_key.clone())
    });

    MappingObject {
        id: row.id,
        kind,
        friendly_name: row
            .friendly_name
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| name.to_uppercase()),
        name,
        spl: row.spl.unwrap_or_default(),
        tags: json_load(row.tags.as_deref()),
        description: row.description.unwrap_or_default(),
        requires_field: row.requires_field.map(|v| v != 0),
        field_placeholder: row.field_placeholder.filter(|p| !p.is_empty()),
    }
}

// ---------------------------------------------------------------------------
// MappingStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MappingStore {
    pool: SqlitePool,
}

impl MappingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed the catalog from `seed_path` if the table is empty. Returns how
    /// many objects were inserted.
    pub async fn seed_if_empty(&self, seed_path: &Path) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mappings")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(0);
        }

        let seed = match tokio::fs::read_to_string(seed_path).await {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Vec<MappingDraft>>>(&raw) {
                Ok(seed) => seed,
                Err(e) => {
                    warn!(path = %seed_path.display(), error = %e, "Ignoring unparseable mappings seed");
                    return Ok(0);
                }
            },
            Err(_) => {
                info!(path = %seed_path.display(), "No mappings seed file; starting empty");
                return Ok(0);
            }
        };

        let mut inserted = 0;
        for (type_key, drafts) in seed {
            let Some(kind) = MappingType::resolve(&type_key) else {
                warn!(type_key = %type_key, "Skipping unknown mapping type in seed");
                continue;
            };
            for draft in drafts {
                if self.insert(kind, draft, true).await?.is_some() {
                    inserted += 1;
                }
            }
        }

        info!(inserted, "Seeded mappings catalog");
        Ok(inserted)
    }

    /// Every mapping object, grouped by type and ordered by name.
    pub async fn get_all(&self) -> Result<MappingSet> {
        let rows = sqlx::query_as::<_, MappingRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY type_key, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut set = MappingSet::default();
        for row in rows {
            if let Some(kind) = MappingType::resolve(&row.type_key) {
                set.list_mut(kind).push(row_to_object(row));
            }
        }
        Ok(set)
    }

    pub async fn list(&self, kind: MappingType) -> Result<Vec<MappingObject>> {
        let rows = sqlx::query_as::<_, MappingRow>(&format!(
            "{SELECT_COLUMNS} WHERE type_key = ? ORDER BY name"
        ))
        .bind(kind.key())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_object).collect())
    }

    pub async fn get(&self, kind: MappingType, id: &str) -> Result<Option<MappingObject>> {
        let row = sqlx::query_as::<_, MappingRow>(&format!(
            "{SELECT_COLUMNS} WHERE type_key = ? AND id = ?"
        ))
        .bind(kind.key())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_object))
    }

    /// Create a new object. An id already used by any mapping is a
    /// validation error.
    pub async fn create(&self, kind: MappingType, draft: MappingDraft) -> Result<MappingObject> {
        let id = self
            .insert(kind, draft, false)
            .await?
            .context("Mapping insert returned no id")?;

        self.get(kind, &id)
            .await?
            .ok_or_else(|| SplunkedError::NotFound { kind: kind.singular().to_string(), id }.into())
    }

    /// Apply a partial update. Returns `None` when the object does not exist.
    pub async fn update(
        &self,
        kind: MappingType,
        id: &str,
        patch: MappingDraft,
    ) -> Result<Option<MappingObject>> {
        let Some(existing) = self.get(kind, id).await? else {
            return Ok(None);
        };

        let name = patch.name.unwrap_or(existing.name);
        let friendly_name = patch
            .friendly_name
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| name.to_uppercase());
        let tags = patch.tags.unwrap_or(existing.tags);
        let requires_field = patch.requires_field.or(existing.requires_field);
        let field_placeholder = patch
            .field_placeholder
            .or(existing.field_placeholder)
            .unwrap_or_default();

        sqlx::query(
            r#"
            UPDATE mappings
            SET name = ?, friendly_name = ?, spl = ?, tags = ?, description = ?,
                requires_field = ?, field_placeholder = ?, updated_at = ?
            WHERE type_key = ? AND id = ?
            "#,
        )
        .bind(&name)
        .bind(&friendly_name)
        .bind(patch.spl.unwrap_or(existing.spl))
        .bind(serde_json::to_string(&tags)?)
        .bind(patch.description.unwrap_or(existing.description))
        .bind(requires_field.map(i64::from))
        .bind(field_placeholder)
        .bind(now())
        .bind(kind.key())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(kind, id).await
    }

    /// Delete and return the object, or `None` when it does not exist.
    pub async fn delete(&self, kind: MappingType, id: &str) -> Result<Option<MappingObject>> {
        let Some(existing) = self.get(kind, id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM mappings WHERE type_key = ? AND id = ?")
            .bind(kind.key())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(existing))
    }

    /// Insert one object. With `allow_existing` an id that is already taken is
    /// left untouched and `None` is returned.
    async fn insert(
        &self,
        kind: MappingType,
        draft: MappingDraft,
        allow_existing: bool,
    ) -> Result<Option<String>> {
        let id = draft
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| kind.generate_id());

        let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM mappings WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            if allow_existing {
                return Ok(None);
            }
            return Err(SplunkedError::Validation(format!("mapping id already exists: {id}")).into());
        }

        let name = draft.name.unwrap_or_default();
        let friendly_name = draft
            .friendly_name
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| name.to_uppercase());
        let timestamp = now();

        sqlx::query(
            r#"
            INSERT INTO mappings (
                id, type_key, type, name, friendly_name, spl,
                tags, description, requires_field, field_placeholder,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(kind.key())
        .bind(
            draft
                .kind
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| kind.singular().to_string()),
        )
        .bind(&name)
        .bind(&friendly_name)
        .bind(draft.spl.unwrap_or_default())
        .bind(serde_json::to_string(&draft.tags.unwrap_or_default())?)
        .bind(draft.description.unwrap_or_default())
        .bind(draft.requires_field.map(i64::from))
        .bind(draft.field_placeholder.unwrap_or_default())
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert {} {id}", kind.singular()))?;

        Ok(Some(id))
    }
}

#[async_trait]
impl CatalogSource for MappingStore {
    async fn get_all_mappings(&self) -> Result<MappingSet> {
        self.get_all().await
    }
}
