use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::pagination::Pagination;
use crate::terms::dto::{
    CreateEquivalentRequest, CreateTermRequest, TermFilter, UpdateEquivalentRequest,
    UpdateTermRequest,
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: i64,
    pub canonical_term: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub usage_context: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TermEquivalent {
    pub id: i64,
    pub term_id: i64,
    pub platform: String,
    pub equivalent_term: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const TERM_COLUMNS: &str =
    "id, canonical_term, category, subcategory, description, usage_context, is_active, created_at";
const TERM_SORTABLE: &[&str] = &["id", "canonical_term", "category", "created_at"];

const EQUIVALENT_COLUMNS: &str = "id, term_id, platform, equivalent_term, notes, created_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TermFilter) {
    if let Some(category) = &filter.category {
        qb.push(" AND category = ");
        qb.push_bind(category.clone());
    }
    if let Some(subcategory) = &filter.subcategory {
        qb.push(" AND subcategory = ");
        qb.push_bind(subcategory.clone());
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(active);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (canonical_term ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

impl Term {
    pub async fn list(
        db: &PgPool,
        filter: &TermFilter,
        page: &Pagination,
    ) -> Result<(Vec<Term>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM terms WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {TERM_COLUMNS} FROM terms WHERE 1=1"));
        push_filters(&mut qb, filter);
        qb.push(format!(
            " ORDER BY {} {}",
            page.sort_column(TERM_SORTABLE, "id"),
            page.sort_order.as_sql()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb.build_query_as::<Term>().fetch_all(db).await?;
        Ok((rows, total))
    }

    pub async fn get(db: &PgPool, id: i64) -> Result<Option<Term>, sqlx::Error> {
        sqlx::query_as::<_, Term>(&format!("SELECT {TERM_COLUMNS} FROM terms WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, req: &CreateTermRequest) -> Result<Term, sqlx::Error> {
        sqlx::query_as::<_, Term>(&format!(
            "INSERT INTO terms
                 (canonical_term, category, subcategory, description, usage_context, is_active)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TERM_COLUMNS}"
        ))
        .bind(&req.canonical_term)
        .bind(&req.category)
        .bind(&req.subcategory)
        .bind(&req.description)
        .bind(&req.usage_context)
        .bind(req.is_active)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        req: &UpdateTermRequest,
    ) -> Result<Option<Term>, sqlx::Error> {
        sqlx::query_as::<_, Term>(&format!(
            "UPDATE terms SET
                 canonical_term = COALESCE($1, canonical_term),
                 category = COALESCE($2, category),
                 subcategory = COALESCE($3, subcategory),
                 description = COALESCE($4, description),
                 usage_context = COALESCE($5, usage_context),
                 is_active = COALESCE($6, is_active)
             WHERE id = $7
             RETURNING {TERM_COLUMNS}"
        ))
        .bind(&req.canonical_term)
        .bind(&req.category)
        .bind(&req.subcategory)
        .bind(&req.description)
        .bind(&req.usage_context)
        .bind(req.is_active)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn deactivate(db: &PgPool, id: i64) -> Result<Option<Term>, sqlx::Error> {
        sqlx::query_as::<_, Term>(&format!(
            "UPDATE terms SET is_active = FALSE WHERE id = $1 RETURNING {TERM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }
}

impl TermEquivalent {
    pub async fn list_for_term(db: &PgPool, term_id: i64) -> Result<Vec<TermEquivalent>, sqlx::Error> {
        sqlx::query_as::<_, TermEquivalent>(&format!(
            "SELECT {EQUIVALENT_COLUMNS} FROM term_equivalents
             WHERE term_id = $1 ORDER BY platform ASC"
        ))
        .bind(term_id)
        .fetch_all(db)
        .await
    }

    pub async fn find(
        db: &PgPool,
        term_id: i64,
        id: i64,
    ) -> Result<Option<TermEquivalent>, sqlx::Error> {
        sqlx::query_as::<_, TermEquivalent>(&format!(
            "SELECT {EQUIVALENT_COLUMNS} FROM term_equivalents WHERE id = $1 AND term_id = $2"
        ))
        .bind(id)
        .bind(term_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        term_id: i64,
        req: &CreateEquivalentRequest,
    ) -> Result<TermEquivalent, sqlx::Error> {
        sqlx::query_as::<_, TermEquivalent>(&format!(
            "INSERT INTO term_equivalents (term_id, platform, equivalent_term, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING {EQUIVALENT_COLUMNS}"
        ))
        .bind(term_id)
        .bind(&req.platform)
        .bind(&req.equivalent_term)
        .bind(&req.notes)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        req: &UpdateEquivalentRequest,
    ) -> Result<Option<TermEquivalent>, sqlx::Error> {
        sqlx::query_as::<_, TermEquivalent>(&format!(
            "UPDATE term_equivalents SET
                 platform = COALESCE($1, platform),
                 equivalent_term = COALESCE($2, equivalent_term),
                 notes = COALESCE($3, notes)
             WHERE id = $4
             RETURNING {EQUIVALENT_COLUMNS}"
        ))
        .bind(&req.platform)
        .bind(&req.equivalent_term)
        .bind(&req.notes)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM term_equivalents WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
