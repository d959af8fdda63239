//! REST API for clinic-core

pub mod caller;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::queue::{EnqueueOutcome, QueueEngine, QueueEntry, QueuePartition};
use crate::services::{AppointmentService, PatientRegistrationService, RegisteredPatient};
use crate::types::{
    Appointment, CreateAppointmentRequest, Patient, PatientFilter, PatientSummary,
    RegisterPatientRequest, Staff,
};

pub use caller::{caller_from_headers, ROLE_HEADER, USER_ID_HEADER};
pub use error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<QueueEngine>,
    pub appointments: Arc<AppointmentService>,
    pub registration: Arc<PatientRegistrationService>,
}

impl ApiState {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self {
            appointments: Arc::new(AppointmentService::new(engine.clone())),
            registration: Arc::new(PatientRegistrationService::new(engine.clone())),
            engine,
        }
    }
}

/// Create the REST API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/queue", post(enqueue))
        .route("/queue/doctor/:doctor_id", get(doctor_queue))
        .route("/queue/position", get(queue_position))
        .route("/queue/clear/:doctor_id", post(clear_queue))
        .route("/queue/reset-all", post(reset_all_queues))
        .route("/queue/:entry_id", delete(remove_entry))
        .route("/patients", post(register_patient).get(search_patients))
        .route("/patients/:patient_id", get(get_patient))
        .route("/appointments", post(create_appointment))
        .route("/doctors", get(list_doctors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub queue_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub queue_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub queue_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub queue_date: NaiveDate,
    pub position: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct PatientPage {
    pub patients: Vec<PatientSummary>,
    pub total: i64,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let database = state.engine.database().health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    });
    (status, Json(body))
}

async fn enqueue(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<EnqueueRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueOutcome>)> {
    let caller = caller_from_headers(&headers)?;
    debug!("User {} enqueues patient {}", caller.user_id, request.patient_id);

    let outcome = state
        .engine
        .enqueue(request.patient_id, request.doctor_id, request.queue_date)
        .await?;
    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

async fn doctor_queue(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<QueuePartition>> {
    caller_from_headers(&headers)?;
    let partition = state.engine.partition(doctor_id, query.queue_date).await?;
    Ok(Json(partition))
}

async fn queue_position(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<PositionResponse>> {
    caller_from_headers(&headers)?;
    let (queue_date, position) = state
        .engine
        .position_of(query.patient_id, query.doctor_id, query.queue_date)
        .await?;

    Ok(Json(PositionResponse {
        patient_id: query.patient_id,
        doctor_id: query.doctor_id,
        queue_date,
        position,
    }))
}

async fn remove_entry(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(entry_id): Path<i64>,
) -> ApiResult<Json<QueueEntry>> {
    caller_from_headers(&headers)?;
    let removed = state.engine.remove_entry(entry_id).await?;
    Ok(Json(removed))
}

async fn clear_queue(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<RemovedResponse>> {
    let caller = caller_from_headers(&headers)?;
    let removed = state
        .engine
        .clear_partition(&caller, doctor_id, query.queue_date)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

async fn reset_all_queues(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<Json<RemovedResponse>> {
    let caller = caller_from_headers(&headers)?;
    let removed = state.engine.expire_old(&caller).await?;
    Ok(Json(RemovedResponse { removed }))
}

async fn register_patient(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<RegisterPatientRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredPatient>)> {
    let caller = caller_from_headers(&headers)?;
    let registered = state.registration.register_patient(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

async fn search_patients(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(filter): Query<PatientFilter>,
) -> ApiResult<Json<PatientPage>> {
    caller_from_headers(&headers)?;
    let (patients, total) = state
        .engine
        .database()
        .search_patients(&filter, state.engine.today())
        .await?;
    Ok(Json(PatientPage { patients, total }))
}

async fn get_patient(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(patient_id): Path<i64>,
) -> ApiResult<Json<Patient>> {
    caller_from_headers(&headers)?;
    let patient = state.engine.database().require_patient(patient_id).await?;
    Ok(Json(patient))
}

async fn create_appointment(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateAppointmentRequest>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let caller = caller_from_headers(&headers)?;
    let appointment = state
        .appointments
        .create_appointment(&caller, request)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn list_doctors(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Staff>>> {
    caller_from_headers(&headers)?;
    let doctors = state.engine.database().list_doctors().await?;
    Ok(Json(doctors))
}
