//! HTTP handlers: one per endpoint, each a thin shim over the room manager
//! or the identity resolver.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use livehall_protocol::{
    CreateRoomRequest, CreateRoomResponse, Empty, RoomEndRequest, RoomIdRequest, RoomJoinRequest,
    RoomJoinResponse, RoomListRequest, RoomListResponse, RoomResultResponse, RoomWaitResponse,
    UserCreateRequest, UserCreateResponse, UserIdentity,
};
use livehall_room::RoomStore;
use livehall_session::IdentityResolver;
use serde::Serialize;

use crate::LiveHallError;
use crate::auth::AuthenticatedUser;
use crate::server::AppState;

type AppResult<T> = Result<Json<T>, LiveHallError>;
type Shared<S, I> = State<Arc<AppState<S, I>>>;

/// Builds the router with every endpoint mounted.
pub(crate) fn router<S, I>(state: Arc<AppState<S, I>>) -> Router
where
    S: RoomStore,
    I: IdentityResolver,
{
    Router::new()
        .route("/", get(root))
        .route("/user/create", post(user_create::<S, I>))
        .route("/user/me", get(user_me))
        .route("/user/update", post(user_update::<S, I>))
        .route("/room/create", post(room_create::<S, I>))
        .route("/room/list", post(room_list::<S, I>))
        .route("/room/join", post(room_join::<S, I>))
        .route("/room/wait", post(room_wait::<S, I>))
        .route("/room/start", post(room_start::<S, I>))
        .route("/room/end", post(room_end::<S, I>))
        .route("/room/result", post(room_result::<S, I>))
        .route("/room/leave", post(room_leave::<S, I>))
        .with_state(state)
}

#[derive(Serialize)]
struct Liveness {
    message: &'static str,
}

async fn root() -> Json<Liveness> {
    Json(Liveness {
        message: "LiveHall is running",
    })
}

// -- Users --

async fn user_create<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    Json(req): Json<UserCreateRequest>,
) -> AppResult<UserCreateResponse> {
    let user_token = state
        .rooms
        .identities()
        .create(&req.user_name, req.leader_card_id)
        .await?;
    Ok(Json(UserCreateResponse { user_token }))
}

async fn user_me(user: AuthenticatedUser) -> Json<UserIdentity> {
    Json(user.identity)
}

async fn user_update<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<UserCreateRequest>,
) -> AppResult<Empty> {
    state
        .rooms
        .identities()
        .update(&user.token, &req.user_name, req.leader_card_id)
        .await?;
    Ok(Json(Empty {}))
}

// -- Rooms --

async fn room_create<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<CreateRoomRequest>,
) -> AppResult<CreateRoomResponse> {
    let room_id = state
        .rooms
        .create(user.identity.id, req.live_id, req.select_difficulty)
        .await?;
    Ok(Json(CreateRoomResponse { room_id }))
}

async fn room_list<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    Json(req): Json<RoomListRequest>,
) -> AppResult<RoomListResponse> {
    let room_info_list = state.rooms.list(req.live_id).await?;
    Ok(Json(RoomListResponse { room_info_list }))
}

async fn room_join<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<RoomJoinRequest>,
) -> AppResult<RoomJoinResponse> {
    let join_room_result = state
        .rooms
        .join(user.identity.id, req.room_id, req.select_difficulty)
        .await?;
    Ok(Json(RoomJoinResponse { join_room_result }))
}

async fn room_wait<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<RoomIdRequest>,
) -> AppResult<RoomWaitResponse> {
    let view = state.rooms.wait(user.identity.id, req.room_id).await?;
    Ok(Json(view))
}

async fn room_start<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<RoomIdRequest>,
) -> AppResult<Empty> {
    state.rooms.start(user.identity.id, req.room_id).await?;
    Ok(Json(Empty {}))
}

async fn room_end<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<RoomEndRequest>,
) -> AppResult<Empty> {
    state
        .rooms
        .end(user.identity.id, req.room_id, req.score, req.judge_count_list)
        .await?;
    Ok(Json(Empty {}))
}

async fn room_result<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    Json(req): Json<RoomIdRequest>,
) -> AppResult<RoomResultResponse> {
    let result_user_list = state.rooms.result(req.room_id).await?;
    Ok(Json(RoomResultResponse { result_user_list }))
}

async fn room_leave<S: RoomStore, I: IdentityResolver>(
    State(state): Shared<S, I>,
    user: AuthenticatedUser,
    Json(req): Json<RoomIdRequest>,
) -> AppResult<Empty> {
    state.rooms.leave(user.identity.id, req.room_id).await?;
    Ok(Json(Empty {}))
}
