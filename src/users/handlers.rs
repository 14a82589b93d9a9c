use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{
        ApiError, Operation, INVALID_ID_PARAM, INVALID_LIMIT_PARAM, INVALID_OFFSET_PARAM,
        USER_DELETION_SUCCESS,
    },
    state::AppState,
    users::{
        dto::{CreateUserInput, MessageResponse, UpdateUserInput},
        repo_types::{Page, User},
    },
    validation::Validate,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Raw query pairs; numbers are parsed by hand so each gets its own message.
/// A repeated key resolves to its first value.
#[derive(Debug, Default)]
pub struct ListParams(Vec<(String, String)>);

impl ListParams {
    fn first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

fn parse_query_param(
    name: &'static str,
    raw: Option<&str>,
    default: i64,
    message: &'static str,
) -> Result<i64, ApiError> {
    match raw {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<i64>().map_err(|e| {
            warn!(error = %e, param = name, value, "invalid query parameter");
            ApiError::InvalidParam(message)
        }),
    }
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<Uuid, ApiError> {
    let Path(raw) = path.map_err(|e| {
        warn!(error = %e, "invalid user id in path");
        ApiError::InvalidParam(INVALID_ID_PARAM)
    })?;
    Uuid::parse_str(&raw).map_err(|e| {
        warn!(error = %e, user_id = %raw, "invalid UUID format");
        ApiError::InvalidParam(INVALID_ID_PARAM)
    })
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>, id: Option<Uuid>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(error = %rejection, user_id = ?id, "failed to parse request body");
            Err(ApiError::BadRequest)
        }
    }
}

fn validate<T: Validate>(input: &T) -> Result<(), ApiError> {
    input.validate().map_err(|e| {
        warn!(validation_error = %e, "user validation failed");
        ApiError::ValidationFailed(e.message().to_string())
    })
}

#[instrument(skip(state, params))]
pub async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<User>>, ApiError> {
    let params = ListParams(params.map(|Query(pairs)| pairs).map_err(|e| {
        warn!(error = %e, "failed to parse query string");
        ApiError::InvalidParam(INVALID_LIMIT_PARAM)
    })?);
    let limit = parse_query_param("limit", params.first("limit"), 0, INVALID_LIMIT_PARAM)?;
    let offset = parse_query_param("offset", params.first("offset"), 0, INVALID_OFFSET_PARAM)?;

    let users = state
        .users
        .list_users(Page::new(limit, offset))
        .await
        .map_err(|e| ApiError::from_service(Operation::List, e))?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(path)?;
    let user = state
        .users
        .get_user(id)
        .await
        .map_err(|e| ApiError::from_service(Operation::Get, e))?;
    Ok(Json(user))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let input = parse_body(body, None)?;
    validate(&input)?;

    let user = state
        .users
        .create_user(input)
        .await
        .map_err(|e| ApiError::from_service(Operation::Create, e))?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateUserInput>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(path)?;
    let input = parse_body(body, Some(id))?;
    validate(&input)?;

    let user = state
        .users
        .update_user(id, input)
        .await
        .map_err(|e| ApiError::from_service(Operation::Update, e))?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(path)?;
    state
        .users
        .delete_user(id)
        .await
        .map_err(|e| ApiError::from_service(Operation::Delete, e))?;

    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: USER_DELETION_SUCCESS.to_string(),
    }))
}
