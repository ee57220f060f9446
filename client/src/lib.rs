//! Typed async client for the users/posts REST API.
//!
//! ```text
//! let client = ApiClient::with_default_base_url()?;
//! let users = client.users().get_all().await?;
//! let posts = client.posts().get_by_user_id(1).await?;
//! ```
//!
//! Every call returns the decoded response body, or `ClientError::Status`
//! when the server answers with a non-2xx status.

use std::marker::PhantomData;

use application::{DeleteResponse, ErrorResponse};
use domain::{Post, Record, RecordId, User};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

pub mod error;

pub use error::ClientError;

/// Address of a locally running API server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client for API requests.
    http: Client,
    /// Base URL, always ending in `/` so relative joins append.
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                message: format!("'{}' is not an http(s) base URL", base_url),
            });
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::default(),
            base_url,
        })
    }

    /// Creates a client for [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible to share `new`'s validation.
    pub fn with_default_base_url() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Replaces the underlying HTTP client (timeouts, proxies, ...).
    #[must_use]
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn users(&self) -> UsersApi<'_> {
        ResourceApi::new(self, "users")
    }

    pub fn posts(&self) -> PostsApi<'_> {
        ResourceApi::new(self, "posts")
    }

    /// Fetches all posts and all users concurrently; resolves once both have.
    #[instrument(skip(self))]
    pub async fn load_posts_and_users(&self) -> Result<(Vec<Post>, Vec<User>)> {
        let posts = self.posts();
        let users = self.users();
        let (posts, users) = tokio::join!(posts.get_all(), users.get_all());
        Ok((posts?, users?))
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Sends the request and decodes a 2xx JSON body into `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            debug!(status = status.as_u16(), %message, "API returned an error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Operations on one resource collection (`/users` or `/posts`).
#[derive(Debug, Clone)]
pub struct ResourceApi<'a, R> {
    client: &'a ApiClient,
    path: &'static str,
    _kind: PhantomData<fn() -> R>,
}

pub type UsersApi<'a> = ResourceApi<'a, User>;
pub type PostsApi<'a> = ResourceApi<'a, Post>;

impl<'a, R> ResourceApi<'a, R>
where
    R: Record + DeserializeOwned,
    R::Draft: Serialize + Sync,
    R::Patch: Serialize + Sync,
{
    fn new(client: &'a ApiClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            _kind: PhantomData,
        }
    }

    fn member_url(&self, id: RecordId) -> Result<Url> {
        self.client.url(&format!("{}/{}", self.path, id))
    }

    /// `GET /{resource}`
    pub async fn get_all(&self) -> Result<Vec<R>> {
        let url = self.client.url(self.path)?;
        self.client.send(self.client.request(Method::GET, url)).await
    }

    /// `GET /{resource}/{id}`
    pub async fn get(&self, id: RecordId) -> Result<R> {
        let url = self.member_url(id)?;
        self.client.send(self.client.request(Method::GET, url)).await
    }

    /// `POST /{resource}`; returns the record with its assigned id.
    pub async fn create(&self, draft: &R::Draft) -> Result<R> {
        let url = self.client.url(self.path)?;
        self.client
            .send(self.client.request(Method::POST, url).json(draft))
            .await
    }

    /// `PUT /{resource}/{id}`
    pub async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R> {
        self.modify(Method::PUT, id, patch).await
    }

    /// `PATCH /{resource}/{id}`
    pub async fn patch(&self, id: RecordId, patch: &R::Patch) -> Result<R> {
        self.modify(Method::PATCH, id, patch).await
    }

    /// `DELETE /{resource}/{id}`
    pub async fn delete(&self, id: RecordId) -> Result<DeleteResponse> {
        let url = self.member_url(id)?;
        self.client
            .send(self.client.request(Method::DELETE, url))
            .await
    }

    async fn modify(&self, method: Method, id: RecordId, patch: &R::Patch) -> Result<R> {
        let url = self.member_url(id)?;
        self.client
            .send(self.client.request(method, url).json(patch))
            .await
    }
}

impl PostsApi<'_> {
    /// `GET /posts?userId={user_id}`
    pub async fn get_by_user_id(&self, user_id: RecordId) -> Result<Vec<Post>> {
        let mut url = self.client.url(self.path)?;
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        self.client.send(self.client.request(Method::GET, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::new("http://example.com/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://example.com/api/");
        assert_eq!(
            client.url("posts/3").unwrap().as_str(),
            "http://example.com/api/posts/3"
        );
    }

    #[test]
    fn default_base_url_points_at_localhost() {
        let client = ApiClient::with_default_base_url().unwrap();
        assert_eq!(
            client.users().member_url(4).unwrap().as_str(),
            "http://localhost:3000/users/4"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::UrlParse(_))
        ));
    }
}
