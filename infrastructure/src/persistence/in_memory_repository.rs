// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, RecordRepository};
use async_trait::async_trait;
use domain::{DomainError, Record, RecordId};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

// --- Id assignment policy ---

/// How a store picks the id of a newly inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// `max(existing ids) + 1`, or 1 when empty. Deleting the current maximum
    /// lets the next insert reissue that id.
    #[default]
    MaxPlusOne,
    /// One past the highest id the store has ever held; ids are never reissued.
    Monotonic,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown id policy '{0}', expected 'max-plus-one' or 'monotonic'")]
pub struct ParseIdPolicyError(String);

impl FromStr for IdPolicy {
    type Err = ParseIdPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max-plus-one" | "max_plus_one" => Ok(IdPolicy::MaxPlusOne),
            "monotonic" => Ok(IdPolicy::Monotonic),
            other => Err(ParseIdPolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdPolicy::MaxPlusOne => f.write_str("max-plus-one"),
            IdPolicy::Monotonic => f.write_str("monotonic"),
        }
    }
}

// --- Record Store Implementation ---

#[derive(Debug)]
struct StoreState<R> {
    // Insertion order is listing order
    records: Vec<R>,
    // Highest id ever held, including deleted records
    high_water: RecordId,
}

impl<R: Record> StoreState<R> {
    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    fn next_id(&self, policy: IdPolicy) -> RecordId {
        let current_max = self.records.iter().map(Record::id).max().unwrap_or(0);
        match policy {
            IdPolicy::MaxPlusOne => current_max + 1,
            IdPolicy::Monotonic => current_max.max(self.high_water) + 1,
        }
    }
}

/// Ordered in-memory collection of one record kind.
///
/// Every operation holds the lock for its whole duration, so at most one
/// mutation is in flight and readers only ever see fully applied changes.
/// Records leave the store as clones; callers cannot mutate stored state.
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore<R> {
    state: Arc<RwLock<StoreState<R>>>,
    policy: IdPolicy,
}

impl<R: Record> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new(IdPolicy::default())
    }
}

impl<R: Record> InMemoryRecordStore<R> {
    pub fn new(policy: IdPolicy) -> Self {
        Self::seeded(Vec::new(), policy)
    }

    /// Builds a store pre-filled with `records`. A record whose id is already
    /// present is dropped so ids stay unique.
    pub fn seeded(records: Vec<R>, policy: IdPolicy) -> Self {
        let mut kept: Vec<R> = Vec::with_capacity(records.len());
        for record in records {
            if kept.iter().any(|existing| existing.id() == record.id()) {
                warn!(kind = R::KIND, id = record.id(), "Skipping seed record with duplicate id");
                continue;
            }
            kept.push(record);
        }
        let high_water = kept.iter().map(Record::id).max().unwrap_or(0);
        Self {
            state: Arc::new(RwLock::new(StoreState {
                records: kept,
                high_water,
            })),
            policy,
        }
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }
}

#[async_trait]
impl<R: Record> RecordRepository<R> for InMemoryRecordStore<R> {
    #[instrument(skip(self), fields(kind = R::KIND))]
    async fn list_all(&self) -> Result<Vec<R>, ApplicationError> {
        debug!("Listing all records from in-memory store");
        Ok(self.state.read().await.records.clone())
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>, ApplicationError> {
        debug!("Getting record from in-memory store");
        let state = self.state.read().await;
        Ok(state.position(id).map(|index| state.records[index].clone()))
    }

    #[instrument(skip(self, predicate), fields(kind = R::KIND))]
    async fn filter(
        &self,
        predicate: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync),
    ) -> Result<Vec<R>, ApplicationError> {
        debug!("Filtering records in in-memory store");
        let state = self.state.read().await;
        Ok(state
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, draft), fields(kind = R::KIND))]
    async fn insert(&self, draft: R::Draft) -> Result<R, ApplicationError> {
        let mut state = self.state.write().await;
        let id = state.next_id(self.policy);
        let record = R::from_draft(id, draft);
        state.records.push(record.clone());
        state.high_water = state.high_water.max(id);
        debug!(id, policy = %self.policy, "Inserted record into in-memory store");
        Ok(record)
    }

    #[instrument(skip(self, patch), fields(kind = R::KIND))]
    async fn replace(&self, id: RecordId, patch: R::Patch) -> Result<R, ApplicationError> {
        let mut state = self.state.write().await;
        let index = state
            .position(id)
            .ok_or(DomainError::not_found::<R>(id))?;
        let record = &mut state.records[index];
        record.apply(patch);
        debug!("Merged patch into record in in-memory store");
        Ok(record.clone())
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    async fn remove(&self, id: RecordId) -> Result<(), ApplicationError> {
        let mut state = self.state.write().await;
        let index = state
            .position(id)
            .ok_or(DomainError::not_found::<R>(id))?;
        // `remove` rather than `swap_remove` to keep insertion order
        state.records.remove(index);
        debug!("Deleted record from in-memory store");
        Ok(())
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.state.read().await.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{seed_posts, seed_users};
    use domain::{NewPost, NewUser, Post, PostPatch, User, UserPatch};

    fn posts_store(policy: IdPolicy) -> InMemoryRecordStore<Post> {
        InMemoryRecordStore::seeded(seed_posts(), policy)
    }

    fn draft(title: &str) -> NewPost {
        NewPost {
            user_id: 1,
            title: title.to_string(),
            body: Some("B".to_string()),
        }
    }

    fn ids(records: &[Post]) -> Vec<RecordId> {
        records.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn seeded_scenario() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        assert_eq!(ids(&store.list_all().await.unwrap()), vec![1, 2, 3, 4, 5]);

        let created = store.insert(draft("T")).await.unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(created.title, "T");
        assert_eq!(created.body.as_deref(), Some("B"));

        store.remove(3).await.unwrap();
        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(ids(&listed), vec![1, 2, 4, 5, 6]);

        let original = store.find_by_id(1).await.unwrap().unwrap();
        let updated = store
            .replace(
                1,
                PostPatch {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.user_id, original.user_id);
        assert_eq!(updated.body, original.body);
    }

    #[tokio::test]
    async fn insert_into_empty_store_starts_at_one() {
        let store: InMemoryRecordStore<User> = InMemoryRecordStore::default();
        let user = store
            .insert(NewUser {
                name: "n".to_string(),
                username: "u".to_string(),
                email: "e".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(store.find_by_id(1).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn insert_id_exceeds_every_existing_id() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        store.remove(2).await.unwrap();
        let before = store.list_all().await.unwrap();
        let created = store.insert(draft("x")).await.unwrap();
        assert!(before.iter().all(|p| created.id > p.id));
    }

    #[tokio::test]
    async fn max_plus_one_reissues_deleted_max() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        store.remove(5).await.unwrap();
        let created = store.insert(draft("again")).await.unwrap();
        assert_eq!(created.id, 5);
    }

    #[tokio::test]
    async fn monotonic_never_reissues() {
        let store = posts_store(IdPolicy::Monotonic);
        store.remove(5).await.unwrap();
        store.remove(4).await.unwrap();
        let created = store.insert(draft("fresh")).await.unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(store.policy(), IdPolicy::Monotonic);
    }

    #[tokio::test]
    async fn missing_id_fails_and_leaves_store_unchanged() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        let before = store.list_all().await.unwrap();

        let err = store.replace(99, PostPatch::default()).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store.remove(99).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::DomainError(DomainError::NotFound { kind: "Post", id: 99 })
        ));
        assert_eq!(store.find_by_id(99).await.unwrap(), None);

        assert_eq!(store.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn remove_then_find_is_absent() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        let before = store.count().await.unwrap();
        store.remove(2).await.unwrap();
        assert_eq!(store.find_by_id(2).await.unwrap(), None);
        assert_eq!(store.count().await.unwrap(), before - 1);
    }

    #[tokio::test]
    async fn filter_returns_matches_in_store_order() {
        let store = posts_store(IdPolicy::MaxPlusOne);
        let by_user_two = store.filter(&|p: &Post| p.user_id == 2).await.unwrap();
        assert_eq!(ids(&by_user_two), vec![3, 4]);
        let none = store.filter(&|p: &Post| p.user_id == 77).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn listing_is_idempotent_and_copied() {
        let store = InMemoryRecordStore::seeded(seed_users(), IdPolicy::MaxPlusOne);
        let mut first = store.list_all().await.unwrap();
        let second = store.list_all().await.unwrap();
        assert_eq!(first, second);

        // Mutating the returned copy must not reach the store
        first[0].name.clear();
        assert_eq!(store.list_all().await.unwrap(), second);
    }

    #[tokio::test]
    async fn replace_with_empty_string_overwrites() {
        let store = InMemoryRecordStore::seeded(seed_users(), IdPolicy::MaxPlusOne);
        let updated = store
            .replace(
                2,
                UserPatch {
                    email: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "");
        assert_eq!(updated.username, "mehmetd");
    }

    #[tokio::test]
    async fn seeded_drops_duplicate_ids() {
        let mut posts = seed_posts();
        posts.push(posts[0].clone());
        let store = InMemoryRecordStore::seeded(posts, IdPolicy::MaxPlusOne);
        assert_eq!(store.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(posts_store(IdPolicy::MaxPlusOne));
        let mut handles = Vec::new();
        for n in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(draft(&format!("post {}", n))).await.unwrap().id
            }));
        }
        let mut assigned = Vec::new();
        for handle in handles {
            assigned.push(handle.await.unwrap());
        }
        assigned.sort_unstable();
        assert_eq!(assigned, (6..22).collect::<Vec<_>>());
    }

    #[test]
    fn id_policy_parses_and_displays() {
        assert_eq!("monotonic".parse::<IdPolicy>(), Ok(IdPolicy::Monotonic));
        assert_eq!(" Max-Plus-One ".parse::<IdPolicy>(), Ok(IdPolicy::MaxPlusOne));
        assert!("random".parse::<IdPolicy>().is_err());
        assert_eq!(IdPolicy::MaxPlusOne.to_string(), "max-plus-one");
    }
}
