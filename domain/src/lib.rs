use serde::{Deserialize, Deserializer, Serialize}; // For record definitions & request bodies
use thiserror::Error; // For domain-specific errors

/// Identifier assigned to every stored record.
pub type RecordId = u64;

// --- Domain Errors ---
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The requested id is absent from the store holding `kind` records.
    #[error("{kind} not found")]
    NotFound { kind: &'static str, id: RecordId },
}

impl DomainError {
    pub fn not_found<R: Record>(id: RecordId) -> Self {
        DomainError::NotFound { kind: R::KIND, id }
    }
}

// --- Record abstraction ---

/// A flat value stored in a record store under an integer id.
///
/// `Draft` carries every field except the id (what a caller supplies on
/// creation); `Patch` carries only the fields a caller wants to change.
pub trait Record: Clone + Send + Sync + 'static {
    type Draft: Send + 'static;
    type Patch: Send + 'static;

    /// Human readable name of the record kind, used in error messages.
    const KIND: &'static str;

    fn id(&self) -> RecordId;

    /// Builds the stored record once the store has picked an id.
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Shallow merge: supplied fields overwrite, absent fields are kept.
    fn apply(&mut self, patch: Self::Patch);
}

// --- User ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Fields required to create a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Partial user update. `None` means "leave unchanged"; `Some("")` overwrites.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Record for User {
    type Draft = NewUser;
    type Patch = UserPatch;

    const KIND: &'static str = "User";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewUser) -> Self {
        Self {
            id,
            name: draft.name,
            username: draft.username,
            email: draft.email,
        }
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
    }
}

impl From<NewUser> for UserPatch {
    fn from(user: NewUser) -> Self {
        Self {
            name: Some(user.name),
            username: Some(user.username),
            email: Some(user.email),
        }
    }
}

// --- Post ---

/// A post. `user_id` points at a user but is never checked against the user store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")] // `userId` on the wire
pub struct Post {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `None`: key absent, keep. `Some(None)`: explicit `null`, clear. `Some(Some(_))`: overwrite.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub body: Option<Option<String>>,
}

/// Deserializes a key that is present in the input, keeping `null` as `Some(None)`.
/// Pair with `#[serde(default)]` so a missing key stays `None`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Record for Post {
    type Draft = NewPost;
    type Patch = PostPatch;

    const KIND: &'static str = "Post";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewPost) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            title: draft.title,
            body: draft.body,
        }
    }

    fn apply(&mut self, patch: PostPatch) {
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
    }
}

impl From<NewPost> for PostPatch {
    fn from(post: NewPost) -> Self {
        Self {
            user_id: Some(post.user_id),
            title: Some(post.title),
            // A full form replaces the body too, clearing it when absent
            body: Some(post.body),
        }
    }
}
