use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use application::{LoginRequest, PresenceStream, RegisterRequest, UpdateProfileRequest};
use domain::{RoomId, User, UserSnapshot};

use crate::{
    auth::{CookieCarrier, CurrentUser},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    fullname: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/users/me", get(me).patch(update_profile))
        .route("/users/search", get(search_users))
        .route(
            "/rooms/{room_id}/presence",
            get(live_users).post(enter_room).delete(leave_room),
        )
        .route("/rooms/{room_id}/presence/ws", get(presence_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<User>), ApiError> {
    let mut carrier = CookieCarrier::new(jar, state.cookies);
    let user = state.auth_service.register(payload, &mut carrier).await?;
    Ok((StatusCode::CREATED, carrier.into_jar(), Json(user)))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<User>), ApiError> {
    let mut carrier = CookieCarrier::new(jar, state.cookies);
    let user = state.auth_service.login(payload, &mut carrier).await?;
    Ok((carrier.into_jar(), Json(user)))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<&'static str>), ApiError> {
    let mut carrier = CookieCarrier::new(jar, state.cookies);
    let message = state.auth_service.logout(&mut carrier).await?;
    Ok((carrier.into_jar(), Json(message)))
}

async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let mut carrier = CookieCarrier::new(jar, state.cookies);
    let access_token = state.auth_service.refresh(&mut carrier).await?;
    Ok((carrier.into_jar(), Json(RefreshResponse { access_token })))
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.me(&claim).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.update_profile(&claim, payload).await?))
}

async fn search_users(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(
        state
            .user_service
            .search_users(&claim, &query.fullname)
            .await?,
    ))
}

async fn enter_room(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    Path(room_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    let entered = state
        .presence_service
        .enter_room(RoomId::new(room_id), &claim)
        .await?;
    Ok(Json(entered))
}

async fn leave_room(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    Path(room_id): Path<i64>,
) -> Result<Json<bool>, ApiError> {
    let left = state
        .presence_service
        .leave_room(RoomId::new(room_id), &claim)
        .await?;
    Ok(Json(left))
}

async fn live_users(
    State(state): State<AppState>,
    CurrentUser(_claim): CurrentUser,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<UserSnapshot>>, ApiError> {
    Ok(Json(
        state
            .presence_service
            .live_users(RoomId::new(room_id))
            .await?,
    ))
}

/// 订阅某个房间的在线变化，每个事件以 JSON 文本帧推送
async fn presence_upgrade(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    Path(room_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> Response {
    let room_id = RoomId::new(room_id);
    tracing::info!(room_id = %room_id, user_id = %claim.sub, "订阅房间在线状态");
    // 握手完成前就订阅，客户端连上后不会漏掉事件
    let events = state.presence_service.subscribe(room_id);
    ws.on_upgrade(move |socket| presence_socket(socket, events, room_id))
}

async fn presence_socket(socket: WebSocket, mut events: PresenceStream, room_id: RoomId) {
    let (mut sender, mut incoming) = socket.split();

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to serialize presence event");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            message = incoming.next() => {
                match message {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(room_id = %room_id, "presence subscription closed");
}
