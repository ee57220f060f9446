use async_trait::async_trait;
use domain::{DomainError, Post, Record, RecordId, User};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// Domain errors (a missing record) pass through with their own message.
    #[error("{0}")]
    DomainError(#[from] DomainError),
    /// Request-validation failure raised before the stores are touched.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApplicationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::DomainError(DomainError::NotFound { .. }))
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Interface for an ordered, in-process collection of records of one kind.
///
/// Implementations must apply each mutation as a single step: a reader never
/// observes a half-applied `replace`, and two writers never interleave.
#[async_trait]
pub trait RecordRepository<R: Record>: Send + Sync {
    /// Returns every record in insertion order.
    async fn list_all(&self) -> Result<Vec<R>, ApplicationError>;
    /// Looks a record up by id.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>, ApplicationError>;
    /// Stores a new record under a freshly assigned id and returns it.
    async fn insert(&self, draft: R::Draft) -> Result<R, ApplicationError>;
    /// Shallow-merges `patch` onto the record with `id`. Fails with `NotFound` if absent.
    async fn replace(&self, id: RecordId, patch: R::Patch) -> Result<R, ApplicationError>;
    /// Removes the record with `id`. Fails with `NotFound` if absent.
    async fn remove(&self, id: RecordId) -> Result<(), ApplicationError>;

    /// Returns the records matching `predicate`, in store order.
    #[instrument(skip(self, predicate))]
    async fn filter(
        &self,
        predicate: &(dyn for<'r> Fn(&'r R) -> bool + Send + Sync),
    ) -> Result<Vec<R>, ApplicationError> {
        debug!(kind = R::KIND, "Filtering via default list_all iteration");
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|record| predicate(record))
            .collect())
    }

    /// Number of records currently stored.
    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.list_all().await?.len())
    }
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// Body returned by a successful DELETE.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeleteResponse {
    pub message: String,
}

impl DeleteResponse {
    pub fn for_kind<R: Record>() -> Self {
        Self {
            message: format!("{} deleted successfully", R::KIND),
        }
    }
}

/// Query string accepted by `GET /posts`.
#[derive(Deserialize, Debug, Default)]
pub struct PostsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl PostsQuery {
    /// An absent or empty `userId` means "no filter"; anything else must be an integer.
    ///
    /// A value with trailing junk such as `2abc` is rejected instead of being
    /// read as its numeric prefix, matching how `:id` path segments are parsed.
    pub fn user_id(&self) -> Result<Option<RecordId>, ApplicationError> {
        match self.user_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<RecordId>().map(Some).map_err(|_| {
                ApplicationError::InvalidInput(format!(
                    "userId must be a non-negative integer, got '{}'",
                    raw
                ))
            }),
        }
    }
}

/// JSON body sent with every non-2xx response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}

// --- Application Services (Use Cases) ---

/// CRUD use cases over one record store.
pub struct ResourceService<R: Record> {
    repo: Arc<dyn RecordRepository<R>>,
    _kind: PhantomData<fn() -> R>,
}

pub type UsersService = ResourceService<User>;
pub type PostsService = ResourceService<Post>;

impl<R: Record> ResourceService<R> {
    pub fn new(repo: Arc<dyn RecordRepository<R>>) -> Self {
        Self {
            repo,
            _kind: PhantomData,
        }
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn find_all(&self) -> Result<Vec<R>, ApplicationError> {
        let records = self.repo.list_all().await?;
        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn find_one(&self, id: RecordId) -> Result<R, ApplicationError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| {
            warn!(id, "Record not found");
            DomainError::not_found::<R>(id).into()
        })
    }

    #[instrument(skip(self, draft), fields(kind = R::KIND))]
    pub async fn create(&self, draft: R::Draft) -> Result<R, ApplicationError> {
        let record = self.repo.insert(draft).await?;
        info!(id = record.id(), "Record created");
        Ok(record)
    }

    #[instrument(skip(self, patch), fields(kind = R::KIND))]
    pub async fn update(&self, id: RecordId, patch: R::Patch) -> Result<R, ApplicationError> {
        let record = self.repo.replace(id, patch).await.inspect_err(|e| {
            warn!(id, "Update failed: {}", e);
        })?;
        info!(id, "Record updated");
        Ok(record)
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    pub async fn remove(&self, id: RecordId) -> Result<(), ApplicationError> {
        self.repo.remove(id).await.inspect_err(|e| {
            warn!(id, "Removal failed: {}", e);
        })?;
        info!(id, "Record removed");
        Ok(())
    }
}

impl ResourceService<Post> {
    /// Posts whose `user_id` equals `user_id`, in store order. Never fails for an unknown user.
    #[instrument(skip(self))]
    pub async fn find_by_user_id(&self, user_id: RecordId) -> Result<Vec<Post>, ApplicationError> {
        let posts = self
            .repo
            .filter(&move |post: &Post| post.user_id == user_id)
            .await?;
        debug!(user_id, count = posts.len(), "Filtered posts by user");
        Ok(posts)
    }
}
