//! Shared pagination for every list endpoint.
//!
//! A [`Pageable`] source knows how to produce one window of its results
//! and, when it can, how many results there are in total. Filtered finds
//! and in-memory slices are countable; group-count aggregations are not,
//! in which case `total` reports the length of the returned window.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::query::{Filter, Query, Window};
use crate::repo::{Bucket, Collection, Document, RepoResult};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[async_trait]
pub trait Pageable: Sync {
    type Item: Send;

    /// Total number of results, `None` when the source cannot count cheaply.
    async fn count(&self) -> RepoResult<Option<u64>>;
    async fn page(&self, skip: u64, limit: u64) -> RepoResult<Vec<Self::Item>>;
}

/// Filtered, sorted find over a collection.
pub struct Find<'a, T: Document> {
    pub collection: &'a dyn Collection<T>,
    pub query: Query,
}

impl<'a, T: Document> Find<'a, T> {
    pub fn new(collection: &'a dyn Collection<T>, query: Query) -> Self {
        Self { collection, query }
    }
}

#[async_trait]
impl<T: Document> Pageable for Find<'_, T> {
    type Item = T;

    async fn count(&self) -> RepoResult<Option<u64>> {
        Ok(Some(self.collection.count(self.query.predicate()).await?))
    }

    async fn page(&self, skip: u64, limit: u64) -> RepoResult<Vec<T>> {
        self.collection.find(&self.query, Window::new(skip, limit)).await
    }
}

/// Group-count aggregation; not countable.
pub struct GroupCount<'a, T: Document> {
    pub collection: &'a dyn Collection<T>,
    pub filter: Filter,
    pub field: &'a str,
}

#[async_trait]
impl<T: Document> Pageable for GroupCount<'_, T> {
    type Item = Bucket;

    async fn count(&self) -> RepoResult<Option<u64>> {
        Ok(None)
    }

    async fn page(&self, skip: u64, limit: u64) -> RepoResult<Vec<Bucket>> {
        self.collection.group_count(&self.filter, self.field, Window::new(skip, limit)).await
    }
}

/// Results already held in memory, e.g. reviews embedded in a movie.
pub struct Slice<T>(pub Vec<T>);

#[async_trait]
impl<T: Clone + Send + Sync> Pageable for Slice<T> {
    type Item = T;

    async fn count(&self) -> RepoResult<Option<u64>> {
        Ok(Some(self.0.len() as u64))
    }

    async fn page(&self, skip: u64, limit: u64) -> RepoResult<Vec<T>> {
        Ok(Window::new(skip, limit).apply(self.0.clone()))
    }
}

/// `page` / `limit` query parameters. Non-numeric values are rejected by
/// the query extractor before a handler runs.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// page size (default 10, at most 100)
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PageParams {
    pub fn resolve(&self, default_limit: u64) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub page: u64,
    /// Number of items in `data`.
    pub page_size: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

pub async fn paginate<P: Pageable + ?Sized>(source: &P, req: PageRequest) -> RepoResult<Page<P::Item>> {
    let data = source.page(req.skip(), req.limit).await?;
    let window = data.len() as u64;
    let total = source.count().await?.unwrap_or(window);
    Ok(Page { total, page: req.page, page_size: window, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: Option<u64>, limit: Option<u64>) -> PageRequest {
        PageParams { page, limit }.resolve(DEFAULT_LIMIT)
    }

    #[test]
    fn params_are_normalised() {
        assert_eq!(req(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(req(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(req(Some(3), Some(1_000)), PageRequest { page: 3, limit: 100 });
        assert_eq!(PageParams::default().resolve(3).limit, 3);
        assert_eq!(req(Some(3), Some(10)).skip(), 20);
    }

    #[actix_rt::test]
    async fn slice_windows_and_totals() {
        let source = Slice((1..=25).collect::<Vec<u32>>());
        let page = paginate(&source, req(Some(3), Some(10))).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 5);
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);

        let past_end = paginate(&source, req(Some(9), Some(10))).await.unwrap();
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.total, 25);
    }

    struct Uncounted(Vec<u32>);

    #[async_trait]
    impl Pageable for Uncounted {
        type Item = u32;
        async fn count(&self) -> RepoResult<Option<u64>> {
            Ok(None)
        }
        async fn page(&self, skip: u64, limit: u64) -> RepoResult<Vec<u32>> {
            Ok(Window::new(skip, limit).apply(self.0.clone()))
        }
    }

    #[actix_rt::test]
    async fn uncountable_sources_report_window_length() {
        let page = paginate(&Uncounted((0..7).collect()), req(Some(2), Some(5))).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.page_size, 2);
    }
}
