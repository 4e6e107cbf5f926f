//! Users service routes

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use common::pagination::Page;
use serde_json::json;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{MakeRequestUuid, XRequestId, request_id_extension, request_id_header, trace_layer},
    models::{
        CreateUserRequest, CreateUserResponse, CreatedRange, ListUsersQuery, UpdateUserRequest,
        User, UserListResponse, UserResponse, Validate,
    },
    state::AppState,
};

/// Create the router for the users service
pub fn create_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/ping", get(ping))
        .route("/user", post(create_user).patch(update_user))
        .route("/user/:id", get(get_user).delete(delete_user))
        .route("/users", get(get_users));

    let x_request_id = request_id_header();

    Router::new()
        .nest("/v1", v1)
        .layer(middleware::from_fn(request_id_extension))
        .layer(trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Log a request binding failure and turn it into a 422
fn invalid(message: String, request_id: &str) -> ApiError {
    error!(%request_id, "Error occurred while binding request data: {}", message);
    ApiError::Validation(message)
}

/// Turn a JSON extraction result into a validated payload
fn bind<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
    request_id: &str,
) -> ApiResult<T> {
    let Json(value) = payload.map_err(|rejection| invalid(rejection.body_text(), request_id))?;

    value
        .validate()
        .map_err(|message| invalid(message, request_id))?;

    Ok(value)
}

/// Extract the `:id` path segment
fn bind_id(id: Result<Path<String>, PathRejection>, request_id: &str) -> ApiResult<String> {
    let Path(id) = id.map_err(|rejection| invalid(rejection.body_text(), request_id))?;
    Ok(id)
}

/// Liveness check performed before any store access
async fn ensure_available(state: &AppState, request_id: &str) -> ApiResult<()> {
    state.users.ping().await.map_err(|e| {
        error!(
            %request_id,
            "Error occurred while getting a DB connection from the connection pool: {}", e
        );
        ApiError::Unavailable
    })
}

/// Look up a live user, mapping absence to 404
async fn load_user(
    state: &AppState,
    id: &str,
    request_id: &str,
    context: &'static str,
) -> ApiResult<User> {
    state
        .users
        .find(id)
        .await
        .map_err(|e| {
            error!(%request_id, "{}: {}", context, e);
            ApiError::database(&e, context)
        })?
        .ok_or_else(|| {
            info!(%request_id, user_id = %id, "Record not found");
            ApiError::NotFound
        })
}

/// Liveness endpoint
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = bind(payload, &request_id)?;
    let user = User::new(request, now_ms());

    ensure_available(&state, &request_id).await?;

    let written = state.users.insert(&user).await.map_err(|e| {
        error!(%request_id, "Error occurred while creating a new user: {}", e);
        ApiError::database(&e, "Error occurred while creating a new user")
    })?;
    if written != 1 {
        error!(%request_id, "Insert of user {} wrote {} rows", user.id, written);
        return Err(ApiError::Internal("Error occurred while creating a new user"));
    }

    info!(%request_id, user_id = %user.id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully",
            id: user.id,
        }),
    ))
}

/// Update a user's first and last name
pub async fn update_user(
    State(state): State<AppState>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = bind(payload, &request_id)?;

    ensure_available(&state, &request_id).await?;

    let mut user = load_user(
        &state,
        &request.id,
        &request_id,
        "Error occurred while updating user",
    )
    .await?;
    user.apply(request, now_ms());

    let affected = state.users.save(&user).await.map_err(|e| {
        error!(%request_id, "Error occurred while updating user: {}", e);
        ApiError::database(&e, "Error occurred while updating user")
    })?;
    if affected != 1 {
        error!(%request_id, "Save of user {} affected {} rows", user.id, affected);
        return Err(ApiError::Internal("Error occurred while updating user"));
    }

    Ok(Json(UserResponse {
        message: Some("User updated successfully"),
        result: user,
    }))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = bind_id(id, &request_id)?;

    ensure_available(&state, &request_id).await?;

    let user = load_user(&state, &id, &request_id, "Error occurred while fetching user").await?;

    Ok(Json(UserResponse {
        message: None,
        result: user,
    }))
}

/// List users created within a time range, oldest first
pub async fn get_users(
    State(state): State<AppState>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(pairs) = pairs.map_err(|rejection| invalid(rejection.body_text(), &request_id))?;
    let query = ListUsersQuery::from_pairs(pairs);

    let range = CreatedRange::from_query(&query, now_ms())
        .map_err(|message| invalid(message, &request_id))?;
    let page = Page::from_query(query.page.as_deref(), query.page_size.as_deref());

    ensure_available(&state, &request_id).await?;

    let results = state.users.list(range, page).await.map_err(|e| {
        error!(%request_id, "Error occurred while fetching users: {}", e);
        ApiError::database(&e, "Error occurred while fetching users")
    })?;

    if results.is_empty() {
        info!(%request_id, "Read users returned with empty results");
    }

    Ok(Json(UserListResponse {
        earliest: range.earliest,
        latest: range.latest,
        results,
    }))
}

/// Soft-delete a user by ID
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(XRequestId(request_id)): Extension<XRequestId>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = bind_id(id, &request_id)?;

    ensure_available(&state, &request_id).await?;

    let user = load_user(&state, &id, &request_id, "Error occurred while deleting user").await?;

    let affected = state.users.soft_delete(&user.id).await.map_err(|e| {
        error!(%request_id, "Error occurred while deleting user: {}", e);
        ApiError::database(&e, "Error occurred while deleting user")
    })?;
    if affected != 1 {
        error!(%request_id, "Delete of user {} affected {} rows", user.id, affected);
        return Err(ApiError::Internal("Error occurred while deleting user"));
    }

    Ok(StatusCode::NO_CONTENT)
}
