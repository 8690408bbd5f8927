//! HTTP API endpoint handlers.
//!
//! Handlers only translate between DTOs and domain models; every rule lives in the use cases.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{RoomId, TaskId, TaskPatch, TimerCommand, UserId},
    infrastructure::dto::{
        conversion::{room_detail_dto, room_summary_dto},
        http::{
            ApproveMemberQuery, ChatMessageDto, CreateRoomRequest, CreateTaskRequest,
            HeatmapEntryDto, JoinRoomRequest, LogSessionRequest, MessageResponse, RoomDetailDto,
            RoomSummaryDto, RoomTaskDto, RoomsQuery, SessionCreditResponse, TimerQuery,
            TimerStateDto, UpdateTaskRequest, UserStatsDto,
        },
    },
    ui::{
        error::ApiError,
        extract::{ApiJson, ApiQuery, AuthenticatedUser},
        state::AppState,
    },
    usecase::{CreateRoomInput, LogSessionInput},
};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List live rooms, optionally filtered by name
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<RoomsQuery>,
) -> ApiResult<Vec<RoomSummaryDto>> {
    let views = state
        .get_rooms_usecase
        .execute(query.search.as_deref())
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(
        views
            .iter()
            .map(|view| room_summary_dto(&view.room, &view.active_users))
            .collect(),
    ))
}

/// Create a room owned by the caller
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(owner): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDetailDto>), ApiError> {
    let room = state
        .create_room_usecase
        .execute(
            owner,
            CreateRoomInput {
                name: request.name,
                password: request.password,
                description: request.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(room_detail_dto(&room, &[]))))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> ApiResult<RoomDetailDto> {
    let view = state
        .get_room_detail_usecase
        .execute(&RoomId::new(room_id)?)
        .await?;
    Ok(Json(room_detail_dto(&view.room, &view.active_users)))
}

/// Ask to join a room with its password
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(room_id): Path<String>,
    ApiJson(request): ApiJson<JoinRoomRequest>,
) -> ApiResult<MessageResponse> {
    let request = state
        .request_join_usecase
        .execute(&RoomId::new(room_id)?, requester, &request.password)
        .await?;
    Ok(Json(MessageResponse::with_status(
        "Join request sent",
        request.status.as_str(),
    )))
}

/// Approve a pending join request (owner only)
pub async fn approve_member(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(room_id): Path<String>,
    ApiQuery(query): ApiQuery<ApproveMemberQuery>,
) -> ApiResult<MessageResponse> {
    let member = state
        .approve_member_usecase
        .execute(
            &RoomId::new(room_id)?,
            user.user_id(),
            &UserId::new(query.member_id)?,
        )
        .await?;
    Ok(Json(MessageResponse::with_status(
        "Member approved",
        member.status.as_str(),
    )))
}

/// Get the room's chat history, oldest first
pub async fn get_room_chat(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> ApiResult<Vec<ChatMessageDto>> {
    let view = state
        .get_room_detail_usecase
        .execute(&RoomId::new(room_id)?)
        .await?;
    Ok(Json(
        view.room.chat_history.iter().map(ChatMessageDto::from).collect(),
    ))
}

/// Get the room's task list
pub async fn get_room_tasks(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(room_id): Path<String>,
) -> ApiResult<Vec<RoomTaskDto>> {
    let view = state
        .get_room_detail_usecase
        .execute(&RoomId::new(room_id)?)
        .await?;
    Ok(Json(view.room.tasks.iter().map(RoomTaskDto::from).collect()))
}

/// Add a task to the room's board
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(creator): AuthenticatedUser,
    Path(room_id): Path<String>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<RoomTaskDto> {
    let task = state
        .create_task_usecase
        .execute(&RoomId::new(room_id)?, &creator, request.title)
        .await?;
    Ok(Json(RoomTaskDto::from(&task)))
}

/// Change a task's status and/or assignee
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((room_id, task_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ApiResult<RoomTaskDto> {
    let patch = TaskPatch::try_from(request).map_err(|e| ApiError::validation(e.to_string()))?;
    let task = state
        .update_task_usecase
        .execute(
            &RoomId::new(room_id)?,
            user.user_id(),
            &TaskId::new(task_id)?,
            patch,
        )
        .await?;
    Ok(Json(RoomTaskDto::from(&task)))
}

/// Start, pause, stop or reset the room timer
pub async fn control_timer(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(room_id): Path<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<TimerStateDto> {
    let command = TimerCommand::from_action(&query.action, query.duration)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let timer = state
        .control_timer_usecase
        .execute(&RoomId::new(room_id)?, user.user_id(), command)
        .await?;
    Ok(Json(TimerStateDto::from(&timer)))
}

/// Credit every connected user with the session's minutes (owner only)
pub async fn log_session(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(room_id): Path<String>,
    ApiJson(request): ApiJson<LogSessionRequest>,
) -> ApiResult<SessionCreditResponse> {
    let report = state
        .log_session_usecase
        .execute(
            &RoomId::new(room_id)?,
            user.user_id(),
            LogSessionInput {
                duration_minutes: request.duration,
                idempotency_key: request.idempotency_key,
            },
        )
        .await?;
    Ok(Json(SessionCreditResponse {
        message: report.message,
        duration: i64::from(report.duration_minutes),
        credited_users: report
            .credited_users
            .into_iter()
            .map(UserId::into_string)
            .collect(),
        partially_credited_users: report
            .partially_credited_users
            .into_iter()
            .map(UserId::into_string)
            .collect(),
        failed_users: report
            .failed_users
            .into_iter()
            .map(UserId::into_string)
            .collect(),
    }))
}

/// The caller's focus totals and streak
pub async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<UserStatsDto> {
    let stats = state.get_user_stats_usecase.execute(user.user_id()).await?;
    Ok(Json(UserStatsDto::from(&stats)))
}

/// The caller's daily heatmap, newest day first
pub async fn get_my_heatmap(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Vec<HeatmapEntryDto>> {
    let entries = state
        .get_user_heatmap_usecase
        .execute(user.user_id())
        .await?;
    Ok(Json(entries.iter().map(HeatmapEntryDto::from).collect()))
}
