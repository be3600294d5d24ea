use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::*;
use crate::query::{lookup, values_at};

/// Insertion-ordered documents of one type, optionally mirrored to
/// `<dir>/<collection>.json` after every write.
pub struct InMemCollection<T> {
    docs: RwLock<Vec<T>>,
    snapshot_path: Option<PathBuf>,
}

impl<T: Document> InMemCollection<T> {
    fn volatile() -> Self {
        Self { docs: RwLock::new(Vec::new()), snapshot_path: None }
    }

    fn open(dir: Option<&Path>) -> RepoResult<Self> {
        let snapshot_path = dir.map(|d| d.join(format!("{}.json", T::COLLECTION)));
        let docs = match snapshot_path.as_deref() {
            Some(path) => Self::load(path)?,
            None => Vec::new(),
        };
        Ok(Self { docs: RwLock::new(docs), snapshot_path })
    }

    /// A missing snapshot is an empty collection; an unreadable one is an
    /// error so that the next write cannot overwrite it.
    fn load(path: &Path) -> RepoResult<Vec<T>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepoError::Internal(format!("cannot read {}: {e}", path.display()))),
        };
        let docs: Vec<T> = serde_json::from_slice(&bytes)
            .map_err(|e| RepoError::Internal(format!("corrupt snapshot {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), count = docs.len(), "loaded snapshot");
        Ok(docs)
    }

    /// Rewrite the snapshot from `docs`. Callers hold the write guard, so
    /// writers are serialized; the file is replaced atomically via rename.
    fn persist(&self, docs: &[T]) -> RepoResult<()> {
        let Some(path) = self.snapshot_path.as_ref() else { return Ok(()) };
        let bytes = serde_json::to_vec_pretty(docs).map_err(internal)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(|e| io_error("write", &tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_error("rename", &tmp, e))?;
        Ok(())
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Vec<T>>> {
        self.docs.read().map_err(|_| RepoError::Internal("collection lock poisoned".into()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Vec<T>>> {
        self.docs.write().map_err(|_| RepoError::Internal("collection lock poisoned".into()))
    }

    /// Matching documents paired with their serialized form, in insertion order.
    fn matching(&self, filter: &Filter) -> RepoResult<Vec<(Value, T)>> {
        let docs = self.read()?;
        let mut out = Vec::new();
        for doc in docs.iter() {
            let value = serde_json::to_value(doc).map_err(internal)?;
            if filter.matches(&value, T::TEXT_FIELDS) {
                out.push((value, doc.clone()));
            }
        }
        Ok(out)
    }

    fn check_unique(docs: &[T], candidate: &T) -> RepoResult<()> {
        if T::UNIQUE_FIELDS.is_empty() {
            return Ok(());
        }
        let cand = serde_json::to_value(candidate).map_err(internal)?;
        for other in docs.iter().filter(|d| d.id() != candidate.id()) {
            let other = serde_json::to_value(other).map_err(internal)?;
            for field in T::UNIQUE_FIELDS {
                if let (Some(a), Some(b)) = (lookup(&cand, field), lookup(&other, field)) {
                    if !a.is_null() && a == b {
                        return Err(RepoError::Conflict((*field).to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

fn internal(e: impl std::fmt::Display) -> RepoError {
    RepoError::Internal(e.to_string())
}

fn io_error(op: &str, path: &Path, e: std::io::Error) -> RepoError {
    tracing::error!(path = %path.display(), error = %e, "snapshot {op} failed");
    RepoError::Internal(format!("snapshot {op} failed for {}: {e}", path.display()))
}

#[async_trait]
impl<T: Document> Collection<T> for InMemCollection<T> {
    async fn insert(&self, mut doc: T) -> RepoResult<T> {
        doc.before_save();
        let mut docs = self.write()?;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(RepoError::Conflict("_id".into()));
        }
        Self::check_unique(&docs, &doc)?;
        docs.push(doc.clone());
        if let Err(e) = self.persist(&docs) {
            docs.pop();
            return Err(e);
        }
        Ok(doc)
    }

    async fn get(&self, id: &str) -> RepoResult<Option<T>> {
        Ok(self.read()?.iter().find(|d| d.id() == id).cloned())
    }

    async fn find_one(&self, filter: &Filter) -> RepoResult<Option<T>> {
        Ok(self.matching(filter)?.into_iter().next().map(|(_, d)| d))
    }

    async fn find(&self, query: &Query, window: Window) -> RepoResult<Vec<T>> {
        let mut hits = self.matching(query.predicate())?;
        if !query.sort.is_empty() {
            hits.sort_by(|(a, _), (b, _)| query.sort.compare(a, b));
        }
        Ok(window.apply(hits).into_iter().map(|(_, d)| d).collect())
    }

    async fn count(&self, filter: &Filter) -> RepoResult<u64> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn replace(&self, mut doc: T) -> RepoResult<T> {
        doc.before_save();
        let mut docs = self.write()?;
        let idx = docs.iter().position(|d| d.id() == doc.id()).ok_or(RepoError::NotFound)?;
        Self::check_unique(&docs, &doc)?;
        let previous = std::mem::replace(&mut docs[idx], doc.clone());
        if let Err(e) = self.persist(&docs) {
            docs[idx] = previous;
            return Err(e);
        }
        Ok(doc)
    }

    async fn delete(&self, id: &str) -> RepoResult<Option<T>> {
        let mut docs = self.write()?;
        let Some(idx) = docs.iter().position(|d| d.id() == id) else { return Ok(None) };
        let removed = docs.remove(idx);
        if let Err(e) = self.persist(&docs) {
            docs.insert(idx, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    async fn delete_many(&self, filter: &Filter) -> RepoResult<u64> {
        let mut docs = self.write()?;
        let doomed = docs
            .iter()
            .map(|d| Ok(filter.matches(&serde_json::to_value(d).map_err(internal)?, T::TEXT_FIELDS)))
            .collect::<RepoResult<Vec<bool>>>()?;
        let removed = doomed.iter().filter(|d| **d).count() as u64;
        if removed == 0 {
            return Ok(0);
        }
        let before = docs.clone();
        let mut flags = doomed.iter();
        docs.retain(|_| !flags.next().copied().unwrap_or(false));
        if let Err(e) = self.persist(&docs) {
            *docs = before;
            return Err(e);
        }
        Ok(removed)
    }

    async fn group_count(&self, filter: &Filter, field: &str, window: Window) -> RepoResult<Vec<Bucket>> {
        let mut buckets: Vec<Bucket> = Vec::new();
        for (value, _) in self.matching(filter)? {
            for key in values_at(&value, field).into_iter().filter(|v| !v.is_null()) {
                match buckets.iter_mut().find(|b| &b.key == key) {
                    Some(b) => b.count += 1,
                    None => buckets.push(Bucket { key: key.clone(), count: 1 }),
                }
            }
        }
        buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| key_order(&a.key, &b.key)));
        Ok(window.apply(buckets))
    }
}

fn key_order(a: &Value, b: &Value) -> Ordering {
    match (a.as_str(), b.as_str()) {
        (Some(x), Some(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Process-local store. Volatile unless opened on a directory.
pub struct InMemRepo {
    users: InMemCollection<User>,
    movies: InMemCollection<Movie>,
    crew: InMemCollection<Crew>,
    lists: InMemCollection<MovieList>,
    discussions: InMemCollection<Discussion>,
    replies: InMemCollection<Reply>,
    news: InMemCollection<News>,
    subscriptions: InMemCollection<Subscription>,
    search_logs: InMemCollection<SearchLog>,
}

impl InMemRepo {
    pub fn new() -> Self {
        Self {
            users: InMemCollection::volatile(),
            movies: InMemCollection::volatile(),
            crew: InMemCollection::volatile(),
            lists: InMemCollection::volatile(),
            discussions: InMemCollection::volatile(),
            replies: InMemCollection::volatile(),
            news: InMemCollection::volatile(),
            subscriptions: InMemCollection::volatile(),
            search_logs: InMemCollection::volatile(),
        }
    }

    /// Load `<dir>/<collection>.json` snapshots and keep them current.
    /// Fails if any existing snapshot cannot be read or parsed.
    pub fn open(dir: impl AsRef<Path>) -> RepoResult<Self> {
        let dir = Some(dir.as_ref());
        Ok(Self {
            users: InMemCollection::open(dir)?,
            movies: InMemCollection::open(dir)?,
            crew: InMemCollection::open(dir)?,
            lists: InMemCollection::open(dir)?,
            discussions: InMemCollection::open(dir)?,
            replies: InMemCollection::open(dir)?,
            news: InMemCollection::open(dir)?,
            subscriptions: InMemCollection::open(dir)?,
            search_logs: InMemCollection::open(dir)?,
        })
    }
}

impl Default for InMemRepo {
    fn default() -> Self { Self::new() }
}

impl Repo for InMemRepo {
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
