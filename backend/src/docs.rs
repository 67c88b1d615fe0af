use utoipa::OpenApi;

use crate::handlers::auth::{LoginRequest, LoginResponse};
use crate::handlers::login_attempts::{
    AttemptStatusResponse, CreateAttemptRequest, CreateAttemptResponse, RespondAttemptRequest,
    RespondAttemptResponse,
};
use crate::handlers::remote::{ContentEvent, DispatchCommandRequest, NotifyRequest};
use crate::handlers::session::{SessionCheckRequest, SessionCheckResponse};
use crate::models::channel::{SlideshowStatus, StatusRequest};
use crate::models::device::{
    ActiveImageInfo, DeviceStatus, HeartbeatRequest, HeartbeatResponse, RemoteCommand,
    VerifyDeviceResponse,
};
use crate::models::login_attempt::{AttemptDecision, AttemptStatus, LoginAttempt};
use crate::models::session::{Session, SessionPage};
use crate::models::user::{User, UserResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Signcast coordination API",
        description = "Single-active-session registry, login arbitration, and the realtime remote-command protocol for display devices."
    ),
    components(schemas(
        Session,
        SessionPage,
        LoginAttempt,
        AttemptStatus,
        AttemptDecision,
        RemoteCommand,
        ActiveImageInfo,
        DeviceStatus,
        HeartbeatRequest,
        HeartbeatResponse,
        VerifyDeviceResponse,
        SlideshowStatus,
        StatusRequest,
        User,
        UserResponse,
        LoginRequest,
        LoginResponse,
        SessionCheckRequest,
        SessionCheckResponse,
        CreateAttemptRequest,
        CreateAttemptResponse,
        AttemptStatusResponse,
        RespondAttemptRequest,
        RespondAttemptResponse,
        DispatchCommandRequest,
        NotifyRequest,
        ContentEvent,
    ))
)]
pub struct ApiDoc;
