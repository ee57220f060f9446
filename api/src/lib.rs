// ./api/src/lib.rs
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{MethodRouter, get},
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use application::{
    DeleteResponse, PostsQuery, PostsService, RecordRepository, ResourceService, UsersService,
};
use domain::{Post, Record, RecordId, User};
use infrastructure::{
    IdPolicy, InMemoryRecordStore,
    seed::{seed_posts, seed_users},
};

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::ApiError;

/// Application state: one service per resource.
#[derive(Clone)]
pub struct AppState {
    pub users_service: Arc<UsersService>,
    pub posts_service: Arc<PostsService>,
}

impl AppState {
    /// Wires services over freshly seeded in-memory stores.
    pub fn seeded(id_policy: IdPolicy) -> Self {
        let users_store = InMemoryRecordStore::seeded(seed_users(), id_policy);
        let posts_store = InMemoryRecordStore::seeded(seed_posts(), id_policy);
        info!(
            users_policy = %users_store.policy(),
            posts_policy = %posts_store.policy(),
            "In-memory stores seeded."
        );
        let users_repository: Arc<dyn RecordRepository<User>> = Arc::new(users_store);
        let posts_repository: Arc<dyn RecordRepository<Post>> = Arc::new(posts_store);

        Self {
            users_service: Arc::new(UsersService::new(users_repository)),
            posts_service: Arc::new(PostsService::new(posts_repository)),
        }
    }
}

/// Builds the full HTTP surface.
pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/users", get(list_handler::<User>).post(create_handler::<User>))
        .route("/users/:id", member_routes::<User>())
        .with_state(state.users_service);

    let posts = Router::new()
        .route("/posts", get(list_posts_handler).post(create_handler::<Post>))
        .route("/posts/:id", member_routes::<Post>())
        .with_state(state.posts_service);

    Router::new()
        .route("/health", get(health_check))
        .merge(users)
        .merge(posts)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// `GET`, `PATCH`, `PUT` and `DELETE` on `/{resource}/:id`. PUT merges exactly like PATCH.
fn member_routes<R>() -> MethodRouter<Arc<ResourceService<R>>>
where
    R: Record + Serialize,
    R::Patch: DeserializeOwned,
{
    get(get_handler::<R>)
        .patch(update_handler::<R>)
        .put(update_handler::<R>)
        .delete(delete_handler::<R>)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// `GET /{resource}`.
#[instrument(skip_all, fields(kind = R::KIND))]
async fn list_handler<R>(
    State(service): State<Arc<ResourceService<R>>>,
) -> Result<Json<Vec<R>>, ApiError>
where
    R: Record + Serialize,
{
    Ok(Json(service.find_all().await?))
}

/// `GET /posts`, filtered when `userId` is present.
#[instrument(skip_all)]
async fn list_posts_handler(
    State(service): State<Arc<PostsService>>,
    query: Result<Query<PostsQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let Query(query) = query?;
    let posts = match query.user_id()? {
        Some(user_id) => {
            info!(user_id, "Received request to list posts by user");
            service.find_by_user_id(user_id).await?
        }
        None => service.find_all().await?,
    };
    Ok(Json(posts))
}

#[instrument(skip_all, fields(kind = R::KIND))]
async fn get_handler<R>(
    State(service): State<Arc<ResourceService<R>>>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<R>, ApiError>
where
    R: Record + Serialize,
{
    let Path(id) = id?;
    Ok(Json(service.find_one(id).await?))
}

#[instrument(skip_all, fields(kind = R::KIND))]
async fn create_handler<R>(
    State(service): State<Arc<ResourceService<R>>>,
    payload: Result<Json<R::Draft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    R: Record + Serialize,
    R::Draft: DeserializeOwned,
{
    let Json(draft) = payload?;
    let record = service.create(draft).await?;
    info!(id = record.id(), "Record created via handler");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip_all, fields(kind = R::KIND))]
async fn update_handler<R>(
    State(service): State<Arc<ResourceService<R>>>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<R::Patch>, JsonRejection>,
) -> Result<Json<R>, ApiError>
where
    R: Record + Serialize,
    R::Patch: DeserializeOwned,
{
    let Path(id) = id?;
    let Json(patch) = payload?;
    Ok(Json(service.update(id, patch).await?))
}

#[instrument(skip_all, fields(kind = R::KIND))]
async fn delete_handler<R>(
    State(service): State<Arc<ResourceService<R>>>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError>
where
    R: Record,
{
    let Path(id) = id?;
    service.remove(id).await?;
    Ok(Json(DeleteResponse::for_kind::<R>()))
}
