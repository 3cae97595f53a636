use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Common list-endpoint query parameters: `?page=&limit=&sortBy=&sortOrder=`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Sort column, restricted to the caller's whitelist; anything else
    /// falls back to the provided default column.
    pub fn sort_column<'a>(&self, allowed: &[&'a str], default: &'a str) -> &'a str {
        match self.sort_by.as_deref() {
            Some(requested) => allowed
                .iter()
                .copied()
                .find(|col| *col == requested)
                .unwrap_or(default),
            None => default,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            sort_by: None,
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Standard list envelope: `{data, pagination}`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: &Pagination, total: i64) -> Self {
        let limit = params.limit();
        Self {
            data,
            pagination: PageInfo {
                page: params.page.max(1),
                limit,
                total,
                total_pages: (total + limit - 1) / limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let p = Pagination {
            limit: 200,
            ..Default::default()
        };
        assert_eq!(p.limit(), MAX_PAGE_SIZE);

        let p = Pagination {
            limit: 0,
            ..Default::default()
        };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn offset_from_page() {
        let p = Pagination {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(p.offset(), 20);

        let p = Pagination {
            page: 0,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn sort_column_rejects_unknown_names() {
        let p = Pagination {
            sort_by: Some("password_hash; DROP TABLE users".into()),
            ..Default::default()
        };
        assert_eq!(p.sort_column(&["name", "created_at"], "id"), "id");

        let p = Pagination {
            sort_by: Some("name".into()),
            ..Default::default()
        };
        assert_eq!(p.sort_column(&["name", "created_at"], "id"), "name");
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination {
            limit: 2,
            ..Default::default()
        };
        let page: Paginated<i64> = Paginated::new(vec![1, 2], &p, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total, 5);
    }
}
