//! Persistence seam: one typed [`Collection`] per entity behind the
//! object-safe [`Repo`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::models::{Crew, Discussion, Movie, MovieList, News, Reply, SearchLog, Subscription, User};
use crate::query::{Filter, Query, Window};

#[cfg(feature = "inmem-store")]
pub mod inmem;
#[cfg(feature = "mongo-store")]
pub mod mongo;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    /// Unique constraint violated on the named field.
    #[error("duplicate value for {0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A storable entity.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    /// Fields whose values must be unique across the collection.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];
    /// Fields searched by `Filter::Phrase`.
    const TEXT_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &str;

    /// Runs before every insert and replace.
    fn before_save(&mut self) {}
}

/// One group of a group-count aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(rename = "_id")]
    pub key: serde_json::Value,
    pub count: u64,
}

#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    async fn insert(&self, doc: T) -> RepoResult<T>;
    async fn get(&self, id: &str) -> RepoResult<Option<T>>;
    async fn find_one(&self, filter: &Filter) -> RepoResult<Option<T>>;
    async fn find(&self, query: &Query, window: Window) -> RepoResult<Vec<T>>;
    async fn count(&self, filter: &Filter) -> RepoResult<u64>;
    /// Replace the stored document with the same id.
    async fn replace(&self, doc: T) -> RepoResult<T>;
    async fn delete(&self, id: &str) -> RepoResult<Option<T>>;
    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64>;
    /// Count matching documents grouped by the values of `field` (array
    /// fields contribute one group per element), largest groups first.
    async fn group_count(&self, filter: &Filter, field: &str, window: Window) -> RepoResult<Vec<Bucket>>;

    async fn require(&self, id: &str) -> RepoResult<T> {
        self.get(id).await?.ok_or(RepoError::NotFound)
    }
}

pub trait Repo: Send + Sync {
    fn users(&self) -> &dyn Collection<User>;
    fn movies(&self) -> &dyn Collection<Movie>;
    fn crew(&self) -> &dyn Collection<Crew>;
    fn lists(&self) -> &dyn Collection<MovieList>;
    fn discussions(&self) -> &dyn Collection<Discussion>;
    fn replies(&self) -> &dyn Collection<Reply>;
    fn news(&self) -> &dyn Collection<News>;
    fn subscriptions(&self) -> &dyn Collection<Subscription>;
    fn search_logs(&self) -> &dyn Collection<SearchLog>;
}

/// Pick the backend from the compiled features and the configuration:
/// MongoDB when a connection string is set, the in-memory store otherwise.
pub async fn open(config: &Config) -> RepoResult<Arc<dyn Repo>> {
    #[cfg(feature = "mongo-store")]
    {
        if let Some(uri) = &config.database.uri {
            let repo = mongo::MongoRepo::connect(uri, &config.database.name).await?;
            return Ok(Arc::new(repo));
        }
    }
    fallback(config)
}

#[cfg(feature = "inmem-store")]
fn fallback(config: &Config) -> RepoResult<Arc<dyn Repo>> {
    let repo = match &config.data_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using in-memory repository with snapshots");
            inmem::InMemRepo::open(dir)?
        }
        None => {
            tracing::info!("using volatile in-memory repository");
            inmem::InMemRepo::new()
        }
    };
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "inmem-store"))]
fn fallback(_config: &Config) -> RepoResult<Arc<dyn Repo>> {
    Err(RepoError::Internal("no storage backend: set MONGODB_URI or build with inmem-store".into()))
}
