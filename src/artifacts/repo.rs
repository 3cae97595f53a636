use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::artifacts::dto::{ArtifactFilter, CreateArtifactRequest, UpdateArtifactRequest};
use crate::pagination::Pagination;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: i64,
    pub name: String,
    pub artifact_type: String,
    pub source_dialect_id: Option<i64>,
    pub target_dialect_id: Option<i64>,
    pub original_sql: Option<String>,
    pub translated_sql: Option<String>,
    pub translation_summary: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, artifact_type, source_dialect_id, target_dialect_id, \
                       original_sql, translated_sql, translation_summary, status, created_at";
const SORTABLE: &[&str] = &["id", "name", "artifact_type", "status", "created_at"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ArtifactFilter) {
    if let Some(artifact_type) = &filter.artifact_type {
        qb.push(" AND artifact_type = ");
        qb.push_bind(artifact_type.clone());
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ");
        qb.push_bind(status.clone());
    }
    if let Some(source_dialect_id) = filter.source_dialect_id {
        qb.push(" AND source_dialect_id = ");
        qb.push_bind(source_dialect_id);
    }
    if let Some(target_dialect_id) = filter.target_dialect_id {
        qb.push(" AND target_dialect_id = ");
        qb.push_bind(target_dialect_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR translation_summary ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

impl Artifact {
    pub async fn list(
        db: &PgPool,
        filter: &ArtifactFilter,
        page: &Pagination,
    ) -> Result<(Vec<Artifact>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM artifacts WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM artifacts WHERE 1=1"));
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY {} {}",
            page.sort_column(SORTABLE, "id"),
            page.sort_order.as_sql()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb.build_query_as::<Artifact>().fetch_all(db).await?;
        Ok((rows, total))
    }

    pub async fn get(db: &PgPool, id: i64) -> Result<Option<Artifact>, sqlx::Error> {
        sqlx::query_as::<_, Artifact>(&format!("SELECT {COLUMNS} FROM artifacts WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, req: &CreateArtifactRequest) -> Result<Artifact, sqlx::Error> {
        sqlx::query_as::<_, Artifact>(&format!(
            "INSERT INTO artifacts
                 (name, artifact_type, source_dialect_id, target_dialect_id,
                  original_sql, translated_sql, translation_summary, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.artifact_type)
        .bind(req.source_dialect_id)
        .bind(req.target_dialect_id)
        .bind(&req.original_sql)
        .bind(&req.translated_sql)
        .bind(&req.translation_summary)
        .bind(&req.status)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        req: &UpdateArtifactRequest,
    ) -> Result<Option<Artifact>, sqlx::Error> {
        sqlx::query_as::<_, Artifact>(&format!(
            "UPDATE artifacts SET
                 name = COALESCE($1, name),
                 artifact_type = COALESCE($2, artifact_type),
                 source_dialect_id = COALESCE($3, source_dialect_id),
                 target_dialect_id = COALESCE($4, target_dialect_id),
                 original_sql = COALESCE($5, original_sql),
                 translated_sql = COALESCE($6, translated_sql),
                 translation_summary = COALESCE($7, translation_summary),
                 status = COALESCE($8, status)
             WHERE id = $9
             RETURNING {COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.artifact_type)
        .bind(req.source_dialect_id)
        .bind(req.target_dialect_id)
        .bind(&req.original_sql)
        .bind(&req.translated_sql)
        .bind(&req.translation_summary)
        .bind(&req.status)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Artifacts have no soft-delete flag; delete removes the row.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM artifacts WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
