//! REST surface over the session manager.

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Request, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{info, instrument, warn};

use crate::db::GameId;
use crate::session::{
    BoardView, GameError, History, MoveOutcome, MoveRequest, Replay, SessionManager,
};

/// Body of a reset request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    /// Board size; the configured default when absent.
    #[serde(default)]
    pub size: Option<usize>,
}

/// Query string of a replay request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayQuery {
    /// Stored game to replay.
    pub game_id: GameId,
}

/// JSON body sent with every error status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Stable failure name, see [`GameError::kind`].
    pub kind: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GameError::Rejected(_) => StatusCode::BAD_REQUEST,
            GameError::GameNotFound(_) => StatusCode::NOT_FOUND,
            GameError::PersistenceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GameError::CorruptHistory { .. } | GameError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router.
#[instrument(skip(manager))]
pub fn router(manager: SessionManager) -> Router {
    Router::new()
        .route("/api/tictactoe", post(reset).put(submit_move))
        .route("/api/history", get(history).delete(clear_history))
        .route("/api/replay", get(replay))
        .layer(
            ServiceBuilder::new()
                .map_request(log_request)
                .map_response(log_response),
        )
        .with_state(manager)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

fn log_response(resp: Response<Body>) -> Response<Body> {
    if resp.status().is_success() {
        info!(status = %resp.status(), "Response sent");
    } else {
        warn!(status = %resp.status(), "Request failed");
    }
    resp
}

/// Runs blocking controller work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, GameError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GameError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| GameError::Internal(e.to_string()))?
}

#[instrument(skip(manager))]
async fn reset(
    State(manager): State<SessionManager>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<BoardView>, GameError> {
    manager.reset(request.size).map(Json)
}

#[instrument(skip(manager))]
async fn submit_move(
    State(manager): State<SessionManager>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveOutcome>, GameError> {
    blocking(move || manager.submit_move(request)).await.map(Json)
}

#[instrument(skip(manager))]
async fn history(State(manager): State<SessionManager>) -> Result<Json<History>, GameError> {
    blocking(move || manager.history()).await.map(Json)
}

#[instrument(skip(manager))]
async fn clear_history(State(manager): State<SessionManager>) -> Result<StatusCode, GameError> {
    blocking(move || manager.clear_history()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(manager))]
async fn replay(
    State(manager): State<SessionManager>,
    Query(query): Query<ReplayQuery>,
) -> Result<Json<Replay>, GameError> {
    blocking(move || manager.replay(query.game_id)).await.map(Json)
}
