use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::service::{BoardService, CreateBoard, RegisterUser, UserService};
use crate::store::DbHandle;
use crate::types::UuidArray;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub users: UserService,
    pub boards: BoardService,
}

impl AppState {
    pub fn new(db: DbHandle) -> Self {
        Self {
            users: UserService::new(db.clone()),
            boards: BoardService::new(db),
        }
    }
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct ReorderListsRequest {
    pub list_order: UuidArray,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserNotFound { .. } | ServiceError::BoardNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            ServiceError::EmailAlreadyRegistered { .. } | ServiceError::AlreadyMember { .. } => {
                ApiError::Conflict(err.to_string())
            }
            ServiceError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ServiceError::PasswordHash(_) | ServiceError::Database(_) => {
                // Stored data that fails to decode lands here too; details stay in the log.
                tracing::error!(error = %err, "request failed");
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/users/{user_id}", delete(delete_user))
        .route("/v1/boards", post(create_board))
        .route("/v1/boards/{board_id}", get(get_board))
        .route("/v1/boards/{board_id}/members", post(add_member))
        .route("/v1/boards/{board_id}/lists", post(create_list))
        .route(
            "/v1/boards/{board_id}/list-order",
            get(get_list_order).put(reorder_lists),
        )
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_board(
    State(state): State<SharedState>,
    Json(req): Json<CreateBoard>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state.boards.create_board(req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

async fn get_board(
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.boards.board_detail(board_id).await?;
    Ok(Json(detail))
}

async fn add_member(
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.boards.add_member(board_id, req.user_id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn create_list(
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<CreateListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let list = state.boards.create_list(board_id, &req.title).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list_order(
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let position = state.boards.list_order(board_id).await?;
    Ok(Json(position))
}

async fn reorder_lists(
    State(state): State<SharedState>,
    Path(board_id): Path<Uuid>,
    Json(req): Json<ReorderListsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let position = state.boards.reorder_lists(board_id, req.list_order).await?;
    Ok(Json(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BoardDb;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let db = BoardDb::new_in_memory().unwrap();
        let state = Arc::new(AppState::new(DbHandle::new(db)));
        api_router().with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn register_user(app: &Router, email: &str) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/auth/register",
                json!({"name": "Test User", "email": email, "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response.into_body()).await
    }

    async fn create_board_for(app: &Router, owner: &Value) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/v1/boards",
                json!({"owner_id": owner["public_id"], "title": "Roadmap"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response.into_body()).await
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_register_hides_password() {
        let app = test_app();
        let user = register_user(&app, "dev@example.com").await;
        assert_eq!(user["email"], "dev@example.com");
        assert_eq!(user["role"], "user");
        assert!(user.get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let app = test_app();
        register_user(&app, "dev@example.com").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/auth/register",
                json!({"name": "Again", "email": "DEV@example.com", "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = body_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("dev@example.com"));
    }

    #[tokio::test]
    async fn test_register_short_password_is_bad_request() {
        let app = test_app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/v1/auth/register",
                json!({"name": "Short", "email": "short@example.com", "password": "abc"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let app = test_app();
        let user = register_user(&app, "gone@example.com").await;
        let uri = format!("/v1/users/{}", user["public_id"].as_str().unwrap());

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_board_flow_with_list_order() {
        let app = test_app();
        let owner = register_user(&app, "owner@example.com").await;
        let board = create_board_for(&app, &owner).await;
        let board_id = board["public_id"].as_str().unwrap().to_string();

        let mut list_ids = Vec::new();
        for title in ["Backlog", "Doing", "Done"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    &format!("/v1/boards/{}/lists", board_id),
                    json!({"title": title}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let list: Value = body_json(response.into_body()).await;
            list_ids.push(list["public_id"].as_str().unwrap().to_string());
        }

        let order_uri = format!("/v1/boards/{}/list-order", board_id);
        let response = app.clone().oneshot(get_request(&order_uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let position: Value = body_json(response.into_body()).await;
        assert_eq!(position["list_order"], json!(list_ids));

        let reversed: Vec<&String> = list_ids.iter().rev().collect();
        let response = app
            .clone()
            .oneshot(json_request("PUT", &order_uri, json!({"list_order": reversed})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_request(&format!("/v1/boards/{}", board_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let detail: Value = body_json(response.into_body()).await;
        let titles: Vec<&str> = detail["lists"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Done", "Doing", "Backlog"]);
        assert_eq!(detail["members"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_with_unknown_list_is_bad_request() {
        let app = test_app();
        let owner = register_user(&app, "owner@example.com").await;
        let board = create_board_for(&app, &owner).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/v1/boards/{}/list-order", board["public_id"].as_str().unwrap()),
                json!({"list_order": [Uuid::new_v4()]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_member_twice_conflicts() {
        let app = test_app();
        let owner = register_user(&app, "owner@example.com").await;
        let guest = register_user(&app, "guest@example.com").await;
        let board = create_board_for(&app, &owner).await;
        let uri = format!("/v1/boards/{}/members", board["public_id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(json_request("POST", &uri, json!({"user_id": guest["public_id"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(json_request("POST", &uri, json!({"user_id": guest["public_id"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_board_is_not_found() {
        let app = test_app();
        let response = app
            .oneshot(get_request(&format!("/v1/boards/{}", Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = body_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_malformed_path_id_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(get_request("/v1/boards/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupt_list_order_is_internal_error() {
        let db = DbHandle::new(BoardDb::new_in_memory().unwrap());
        let app = api_router().with_state(Arc::new(AppState::new(db.clone())));
        let owner = register_user(&app, "owner@example.com").await;
        let board = create_board_for(&app, &owner).await;

        db.lock_sync()
            .unwrap()
            .conn()
            .execute("UPDATE list_positions SET list_order = '{oops}'", [])
            .unwrap();

        let response = app
            .oneshot(get_request(&format!(
                "/v1/boards/{}/list-order",
                board["public_id"].as_str().unwrap()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = body_json(response.into_body()).await;
        assert_eq!(body["error"], "internal server error");
    }
}
