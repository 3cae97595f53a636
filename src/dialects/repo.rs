use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::dialects::dto::{CreateDialectRequest, DialectFilter, UpdateDialectRequest};
use crate::pagination::Pagination;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, display_name, version, description, is_active, created_at";
const SORTABLE: &[&str] = &["id", "name", "display_name", "created_at"];

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &DialectFilter) {
    if let Some(name) = &filter.name {
        qb.push(" AND name LIKE ");
        qb.push_bind(format!("%{name}%"));
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ");
        qb.push_bind(active);
    }
}

impl Dialect {
    pub async fn list(
        db: &PgPool,
        filter: &DialectFilter,
        page: &Pagination,
    ) -> Result<(Vec<Dialect>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM dialects WHERE 1=1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM dialects WHERE 1=1"));
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

        let rows = qb.build_query_as::<Dialect>().fetch_all(db).await?;
        Ok((rows, total))
    }

    pub async fn get(db: &PgPool, id: i64) -> Result<Option<Dialect>, sqlx::Error> {
        sqlx::query_as::<_, Dialect>(&format!("SELECT {COLUMNS} FROM dialects WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, req: &CreateDialectRequest) -> Result<Dialect, sqlx::Error> {
        sqlx::query_as::<_, Dialect>(&format!(
            "INSERT INTO dialects (name, display_name, version, description, is_active)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.display_name)
        .bind(&req.version)
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_one(db)
        .await
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        req: &UpdateDialectRequest,
    ) -> Result<Option<Dialect>, sqlx::Error> {
        sqlx::query_as::<_, Dialect>(&format!(
            "UPDATE dialects SET
                 name = COALESCE($1, name),
                 display_name = COALESCE($2, display_name),
                 version = COALESCE($3, version),
                 description = COALESCE($4, description),
                 is_active = COALESCE($5, is_active)
             WHERE id = $6
             RETURNING {COLUMNS}"
        ))
        .bind(&req.name)
        .bind(&req.display_name)
        .bind(&req.version)
        .bind(&req.description)
        .bind(req.is_active)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Soft delete: rows stay, other entities keep their references.
    pub async fn deactivate(db: &PgPool, id: i64) -> Result<Option<Dialect>, sqlx::Error> {
        sqlx::query_as::<_, Dialect>(&format!(
            "UPDATE dialects SET is_active = FALSE WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
