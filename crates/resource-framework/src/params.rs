//! List parameters shared by every list endpoint.

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Pagination, search, sort and free-form filters for a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: Map<String, Value>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            sort_by: None,
            sort_order: None,
            filters: Map::new(),
        }
    }
}

impl ListParams {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Request body, with the page size under `page_size_key` (`limit` or `per_page`).
    ///
    /// Blank searches are dropped; filters never override the pagination keys.
    pub fn to_request(&self, page_size_key: &str) -> Value {
        let mut body = Map::new();
        for (k, v) in &self.filters {
            body.insert(k.clone(), v.clone());
        }
        body.insert("page".into(), Value::from(self.page.max(1)));
        body.insert(page_size_key.into(), Value::from(self.limit.max(1)));
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            body.insert("search".into(), Value::from(search));
        }
        if let Some(sort_by) = &self.sort_by {
            body.insert("sort_by".into(), Value::from(sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            let order = match order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            body.insert("sort_order".into(), Value::from(order));
        }
        Value::Object(body)
    }
}
