use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone, Default, PartialEq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
}

impl Meta {
    /// Pagination block for a page of `results` items out of `total`.
    pub fn paged(results: usize, total: i64, page: i64, limit: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            results: Some(results as i64),
            total: Some(total),
            page: Some(page),
            pages: Some(pages),
        }
    }

    /// Unpaginated list: only the item count.
    pub fn results(results: usize) -> Self {
        Self {
            results: Some(results as i64),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
    #[serde(flatten)]
    pub meta: Meta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, meta: Meta) -> Self {
        Self {
            status: "success".to_string(),
            data,
            meta,
        }
    }

    pub fn data(data: T) -> Self {
        Self::success(data, Meta::empty())
    }
}
