use async_trait::async_trait;
use futures_util::TryStreamExt as _;
use mongodb::bson::{self, doc, Bson, Document as BsonDoc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use serde_json::Value;

use super::*;
use crate::query::{Direction, Sort};

const DUPLICATE_KEY: i32 = 11000;

fn internal(e: impl std::fmt::Display) -> RepoError {
    RepoError::Internal(e.to_string())
}

fn to_bson(v: &Value) -> RepoResult<Bson> {
    bson::to_bson(v).map_err(internal)
}

fn to_bson_array(values: &[Value]) -> RepoResult<Bson> {
    Ok(Bson::Array(values.iter().map(to_bson).collect::<RepoResult<Vec<_>>>()?))
}

/// Translate a [`Filter`] into a MongoDB filter document.
pub fn filter_doc(filter: &Filter) -> RepoResult<BsonDoc> {
    let mut d = BsonDoc::new();
    match filter {
        Filter::All => {}
        Filter::Eq(field, v) => {
            d.insert(field, to_bson(v)?);
        }
        Filter::Ne(field, v) => {
            d.insert(field, doc! { "$ne": to_bson(v)? });
        }
        Filter::In(field, vs) => {
            d.insert(field, doc! { "$in": to_bson_array(vs)? });
        }
        Filter::NotIn(field, vs) => {
            d.insert(field, doc! { "$nin": to_bson_array(vs)? });
        }
        Filter::Range { field, min, max } => {
            let mut bounds = BsonDoc::new();
            if let Some(min) = min {
                bounds.insert("$gte", to_bson(min)?);
            }
            if let Some(max) = max {
                bounds.insert("$lte", to_bson(max)?);
            }
            d.insert(field, bounds);
        }
        Filter::Contains(field, needle) => {
            d.insert(field, doc! { "$regex": regex::escape(needle), "$options": "i" });
        }
        Filter::Phrase(phrase) => {
            let quoted = format!("\"{}\"", phrase.replace('"', ""));
            d.insert("$text", doc! { "$search": quoted });
        }
        Filter::And(clauses) if clauses.is_empty() => {}
        Filter::And(clauses) => {
            let docs = clauses.iter().map(filter_doc).collect::<RepoResult<Vec<_>>>()?;
            d.insert("$and", docs);
        }
        // `$or` rejects an empty array; an empty disjunction matches nothing.
        Filter::Or(clauses) if clauses.is_empty() => {
            d.insert("_id", doc! { "$in": [] });
        }
        Filter::Or(clauses) => {
            let docs = clauses.iter().map(filter_doc).collect::<RepoResult<Vec<_>>>()?;
            d.insert("$or", docs);
        }
    }
    Ok(d)
}

pub fn sort_doc(sort: &Sort) -> BsonDoc {
    let mut d = BsonDoc::new();
    for (field, dir) in &sort.0 {
        d.insert(field, match dir { Direction::Asc => 1, Direction::Desc => -1 });
    }
    d
}

fn as_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn write_error<T: Document>(e: mongodb::error::Error) -> RepoError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref we)) = *e.kind {
        if we.code == DUPLICATE_KEY {
            let field = T::UNIQUE_FIELDS
                .iter()
                .find(|f| we.message.contains(*f))
                .copied()
                .unwrap_or("_id");
            return RepoError::Conflict(field.to_string());
        }
    }
    internal(e)
}

pub struct MongoCollection<T: Document> {
    inner: mongodb::Collection<T>,
}

impl<T: Document> MongoCollection<T> {
    fn new(db: &Database) -> Self {
        Self { inner: db.collection::<T>(T::COLLECTION) }
    }

    async fn ensure_indexes(&self) -> RepoResult<()> {
        for field in T::UNIQUE_FIELDS {
            let model = IndexModel::builder()
                .keys(doc! { *field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.inner.create_index(model, None).await.map_err(internal)?;
        }
        if !T::TEXT_FIELDS.is_empty() {
            let mut keys = BsonDoc::new();
            for field in T::TEXT_FIELDS {
                keys.insert(*field, "text");
            }
            self.inner
                .create_index(IndexModel::builder().keys(keys).build(), None)
                .await
                .map_err(internal)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Document> Collection<T> for MongoCollection<T> {
    async fn insert(&self, mut doc: T) -> RepoResult<T> {
        doc.before_save();
        self.inner.insert_one(&doc, None).await.map_err(write_error::<T>)?;
        Ok(doc)
    }

    async fn get(&self, id: &str) -> RepoResult<Option<T>> {
        self.inner.find_one(doc! { "_id": id }, None).await.map_err(internal)
    }

    async fn find_one(&self, filter: &Filter) -> RepoResult<Option<T>> {
        self.inner.find_one(filter_doc(filter)?, None).await.map_err(internal)
    }

    async fn find(&self, query: &Query, window: Window) -> RepoResult<Vec<T>> {
        let sort = (!query.sort.is_empty()).then(|| sort_doc(&query.sort));
        let opts = FindOptions::builder()
            .sort(sort)
            .skip(Some(window.skip))
            .limit(window.limit.map(as_i64))
            .build();
        let cursor = self.inner.find(filter_doc(query.predicate())?, opts).await.map_err(internal)?;
        cursor.try_collect().await.map_err(internal)
    }

    async fn count(&self, filter: &Filter) -> RepoResult<u64> {
        self.inner.count_documents(filter_doc(filter)?, None).await.map_err(internal)
    }

    async fn replace(&self, mut doc: T) -> RepoResult<T> {
        doc.before_save();
        let res = self
            .inner
            .replace_one(doc! { "_id": doc.id() }, &doc, None)
            .await
            .map_err(write_error::<T>)?;
        if res.matched_count == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(doc)
    }

    async fn delete(&self, id: &str) -> RepoResult<Option<T>> {
        self.inner.find_one_and_delete(doc! { "_id": id }, None).await.map_err(internal)
    }

    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64> {
        let res = self.inner.delete_many(filter_doc(filter)?, None).await.map_err(internal)?;
        Ok(res.deleted_count)
    }

    async fn group_count(&self, filter: &Filter, field: &str, window: Window) -> RepoResult<Vec<Bucket>> {
        let path = format!("${field}");
        let mut pipeline = vec![
            doc! { "$match": filter_doc(filter)? },
            doc! { "$unwind": path.as_str() },
            doc! { "$match": { field: { "$ne": Bson::Null } } },
            doc! { "$group": { "_id": path.as_str(), "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1, "_id": 1 } },
            doc! { "$skip": as_i64(window.skip) },
        ];
        if let Some(limit) = window.limit {
            pipeline.push(doc! { "$limit": as_i64(limit) });
        }
        let cursor = self.inner.aggregate(pipeline, None).await.map_err(internal)?;
        let rows: Vec<BsonDoc> = cursor.try_collect().await.map_err(internal)?;
        rows.into_iter()
            .map(|row| bson::from_document::<Bucket>(row).map_err(internal))
            .collect()
    }
}

/// MongoDB-backed store.
pub struct MongoRepo {
    users: MongoCollection<User>,
    movies: MongoCollection<Movie>,
    crew: MongoCollection<Crew>,
    lists: MongoCollection<MovieList>,
    discussions: MongoCollection<Discussion>,
    replies: MongoCollection<Reply>,
    news: MongoCollection<News>,
    subscriptions: MongoCollection<Subscription>,
    search_logs: MongoCollection<SearchLog>,
}

impl MongoRepo {
    /// Connect and make sure the unique and text indexes exist.
    pub async fn connect(uri: &str, db_name: &str) -> RepoResult<Self> {
        let client = Client::with_uri_str(uri).await.map_err(internal)?;
        let db = client.database(db_name);
        let repo = Self {
            users: MongoCollection::new(&db),
            movies: MongoCollection::new(&db),
            crew: MongoCollection::new(&db),
            lists: MongoCollection::new(&db),
            discussions: MongoCollection::new(&db),
            replies: MongoCollection::new(&db),
            news: MongoCollection::new(&db),
            subscriptions: MongoCollection::new(&db),
            search_logs: MongoCollection::new(&db),
        };
        repo.users.ensure_indexes().await?;
        repo.movies.ensure_indexes().await?;
        tracing::info!(db = db_name, "connected to MongoDB");
        Ok(repo)
    }
}

impl Repo for MongoRepo {
    fn users(&self) -> &dyn Collection<User> { &self.users }
    fn movies(&self) -> &dyn Collection<Movie> { &self.movies }
    fn crew(&self) -> &dyn Collection<Crew> { &self.crew }
    fn lists(&self) -> &dyn Collection<MovieList> { &self.lists }
    fn discussions(&self) -> &dyn Collection<Discussion> { &self.discussions }
    fn replies(&self) -> &dyn Collection<Reply> { &self.replies }
    fn news(&self) -> &dyn Collection<News> { &self.news }
    fn subscriptions(&self) -> &dyn Collection<Subscription> { &self.subscriptions }
    fn search_logs(&self) -> &dyn Collection<SearchLog> { &self.search_logs }
}
