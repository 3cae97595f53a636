use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::pagination::Pagination;
use crate::translations::dto::{
    CreateTranslationRequest, TranslationFilter, UpdateTranslationRequest,
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: i64,
    pub term_id: i64,
    pub dialect_id: i64,
    pub translated_term: String,
    pub syntax_pattern: Option<String>,
    pub examples: Option<String>,
    pub notes: Option<String>,
    pub confidence_level: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, term_id, dialect_id, translated_term, syntax_pattern, examples, notes, \
                       confidence_level, is_active, created_at";
const SORTABLE: &[&str] = &["id", "confidence_level", "created_at"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TranslationFilter) {
    if let Some(term_id) = filter.term_id {
        qb.push(" AND term_id = ");
        qb.push_bind(term_id);
    }
    if let Some(dialect_id) = filter.dialect_id {
        qb.push(" AND dialect_id = ");
        qb.push_bind(dialect_id);
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(active);
    }
    if let Some(min_confidence) = filter.min_confidence {
        qb.push(" AND confidence_level >= ");
        qb.push_bind(min_confidence);
    }
}

impl Translation {
    pub async fn list(
        db: &PgPool,
        filter: &TranslationFilter,
        page: &Pagination,
    ) -> Result<(Vec<Translation>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM translations WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM translations WHERE 1=1"));
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

        let rows = qb.build_query_as::<Translation>().fetch_all(db).await?;
        Ok((rows, total))
    }

    pub async fn list_for_term(db: &PgPool, term_id: i64) -> Result<Vec<Translation>, sqlx::Error> {
        sqlx::query_as::<_, Translation>(&format!(
            "SELECT {COLUMNS} FROM translations WHERE term_id = $1 ORDER BY dialect_id ASC"
        ))
        .bind(term_id)
        .fetch_all(db)
        .await
    }

    pub async fn get(db: &PgPool, id: i64) -> Result<Option<Translation>, sqlx::Error> {
        sqlx::query_as::<_, Translation>(&format!(
            "SELECT {COLUMNS} FROM translations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        req: &CreateTranslationRequest,
    ) -> Result<Translation, sqlx::Error> {
        sqlx::query_as::<_, Translation>(&format!(
            "INSERT INTO translations
                 (term_id, dialect_id, translated_term, syntax_pattern, examples, notes,
                  confidence_level, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(req.term_id)
        .bind(req.dialect_id)
        .bind(&req.translated_term)
        .bind(&req.syntax_pattern)
        .bind(&req.examples)
        .bind(&req.notes)
        .bind(req.confidence_level)
        .bind(req.is_active)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        req: &UpdateTranslationRequest,
    ) -> Result<Option<Translation>, sqlx::Error> {
        sqlx::query_as::<_, Translation>(&format!(
            "UPDATE translations SET
                 translated_term = COALESCE($1, translated_term),
                 syntax_pattern = COALESCE($2, syntax_pattern),
                 examples = COALESCE($3, examples),
                 notes = COALESCE($4, notes),
                 confidence_level = COALESCE($5, confidence_level),
                 is_active = COALESCE($6, is_active)
             WHERE id = $7
             RETURNING {COLUMNS}"
        ))
        .bind(&req.translated_term)
        .bind(&req.syntax_pattern)
        .bind(&req.examples)
        .bind(&req.notes)
        .bind(req.confidence_level)
        .bind(req.is_active)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn deactivate(db: &PgPool, id: i64) -> Result<Option<Translation>, sqlx::Error> {
        sqlx::query_as::<_, Translation>(&format!(
            "UPDATE translations SET is_active = FALSE WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
