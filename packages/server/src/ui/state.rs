//! Shared application state.

use std::sync::Arc;

use focusroom_shared::time::Clock;

use crate::{
    domain::{
        ConnectionRegistry, PasswordHasher, RoomPolicy, RoomRepository, UserStatsRepository,
    },
    usecase::{
        ApproveMemberUseCase, ConnectParticipantUseCase, ControlTimerUseCase, CreateRoomUseCase,
        CreateTaskUseCase, DisconnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        GetUserHeatmapUseCase, GetUserStatsUseCase, LogSessionUseCase, PurgeExpiredRoomsUseCase,
        ReceiveMessageUseCase, RequestJoinUseCase, UpdateTaskUseCase,
    },
};

/// Collaborators every use case is built from.
#[derive(Clone)]
pub struct Dependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub stats_repository: Arc<dyn UserStatsRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub policy: RoomPolicy,
}

/// Shared application state
pub struct AppState {
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub request_join_usecase: Arc<RequestJoinUseCase>,
    pub approve_member_usecase: Arc<ApproveMemberUseCase>,
    pub create_task_usecase: Arc<CreateTaskUseCase>,
    pub update_task_usecase: Arc<UpdateTaskUseCase>,
    pub control_timer_usecase: Arc<ControlTimerUseCase>,
    pub log_session_usecase: Arc<LogSessionUseCase>,
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub receive_message_usecase: Arc<ReceiveMessageUseCase>,
    pub purge_expired_rooms_usecase: Arc<PurgeExpiredRoomsUseCase>,
    pub get_user_stats_usecase: Arc<GetUserStatsUseCase>,
    pub get_user_heatmap_usecase: Arc<GetUserHeatmapUseCase>,
}

impl AppState {
    /// Wire every use case from one set of collaborators.
    pub fn new(deps: Dependencies) -> Self {
        let Dependencies {
            room_repository,
            stats_repository,
            registry,
            password_hasher,
            clock,
            policy,
        } = deps;

        let control_timer_usecase = Arc::new(ControlTimerUseCase::new(
            room_repository.clone(),
            registry.clone(),
            clock.clone(),
            policy,
        ));

        Self {
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                room_repository.clone(),
                password_hasher.clone(),
                clock.clone(),
                policy,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(
                room_repository.clone(),
                registry.clone(),
            )),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                room_repository.clone(),
                registry.clone(),
            )),
            request_join_usecase: Arc::new(RequestJoinUseCase::new(
                room_repository.clone(),
                registry.clone(),
                password_hasher,
                clock.clone(),
            )),
            approve_member_usecase: Arc::new(ApproveMemberUseCase::new(
                room_repository.clone(),
                registry.clone(),
                clock.clone(),
            )),
            create_task_usecase: Arc::new(CreateTaskUseCase::new(
                room_repository.clone(),
                registry.clone(),
                clock.clone(),
            )),
            update_task_usecase: Arc::new(UpdateTaskUseCase::new(
                room_repository.clone(),
                registry.clone(),
            )),
            log_session_usecase: Arc::new(LogSessionUseCase::new(
                room_repository.clone(),
                stats_repository.clone(),
                registry.clone(),
                clock.clone(),
            )),
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                room_repository.clone(),
                registry.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                registry.clone(),
            )),
            receive_message_usecase: Arc::new(ReceiveMessageUseCase::new(
                room_repository.clone(),
                registry.clone(),
                control_timer_usecase.clone(),
                clock.clone(),
                policy,
            )),
            purge_expired_rooms_usecase: Arc::new(PurgeExpiredRoomsUseCase::new(
                room_repository,
                registry,
                clock,
            )),
            get_user_stats_usecase: Arc::new(GetUserStatsUseCase::new(stats_repository.clone())),
            get_user_heatmap_usecase: Arc::new(GetUserHeatmapUseCase::new(stats_repository)),
            control_timer_usecase,
        }
    }
}
