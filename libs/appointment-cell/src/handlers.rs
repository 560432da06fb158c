use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use availability_cell::DateRangeQuery;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::actor_from_user;

use crate::models::{BookAppointmentRequest, CalendarProjection, TransitionRequest};
use crate::state::AppointmentState;

// ==============================================================================
// BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let actor = actor_from_user(&user)?;
    let appointment = state.ledger.book(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment requested"
        })),
    ))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let appointment = state.ledger.get(&actor, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

// ==============================================================================
// TRANSITIONS
// ==============================================================================

pub async fn accept_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let appointment = state.transitions.accept(&actor, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

/// The body is optional; a bare POST rejects without a reason.
pub async fn reject_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    request: Option<Json<TransitionRequest>>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let reason = request.and_then(|Json(request)| request.reason);
    let appointment = state
        .transitions
        .reject(&actor, appointment_id, reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    request: Option<Json<TransitionRequest>>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let reason = request.and_then(|Json(request)| request.reason);
    let appointment = state
        .transitions
        .cancel(&actor, appointment_id, reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}

// ==============================================================================
// LISTINGS AND CALENDARS
// ==============================================================================

pub async fn get_provider_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<DateRangeQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let range = query.into_range()?;
    let appointments = state.ledger.list_for_provider(&actor, provider_id, range).await?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

pub async fn get_subject_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(subject_id): Path<Uuid>,
    Query(query): Query<DateRangeQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let range = query.into_range()?;
    let appointments = state.ledger.list_for_subject(&actor, subject_id, range).await?;

    Ok(Json(json!({
        "subject_id": subject_id,
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

pub async fn get_my_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let appointments = state.ledger.list_for_requester(actor.actor_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

pub async fn get_subject_calendar(
    State(state): State<Arc<AppointmentState>>,
    Path(subject_id): Path<Uuid>,
    Query(query): Query<DateRangeQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<CalendarProjection>, AppError> {
    let actor = actor_from_user(&user)?;
    let range = query.into_range()?;
    let calendar = state.calendar.subject_calendar(&actor, subject_id, range).await?;
    Ok(Json(calendar))
}

pub async fn get_provider_calendar(
    State(state): State<Arc<AppointmentState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<DateRangeQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<CalendarProjection>, AppError> {
    let actor = actor_from_user(&user)?;
    let range = query.into_range()?;
    let calendar = state.calendar.provider_calendar(&actor, provider_id, range).await?;
    Ok(Json(calendar))
}
