use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::actor_from_user;

use crate::models::{
    AvailableSlots, CreateExceptionRequest, DateRangeQuery, SetAvailabilityRequest, SlotQuery,
};
use crate::state::AvailabilityState;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_availability(
    State(state): State<Arc<AvailabilityState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let template = state.availability.get_availability(provider_id).await?;
    Ok(Json(json!(template)))
}

pub async fn list_exceptions(
    State(state): State<Arc<AvailabilityState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let range = query.into_range()?;
    let exceptions = state.availability.list_exceptions(provider_id, range).await?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "from": range.from,
        "to": range.to,
        "exceptions": exceptions,
    })))
}

pub async fn get_available_slots(
    State(state): State<Arc<AvailabilityState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<AvailableSlots>, AppError> {
    let slots = state.slots.generate_slots(provider_id, query.date).await?;

    Ok(Json(AvailableSlots {
        provider_id,
        date: query.date,
        slots,
    }))
}

// ==============================================================================
// PROVIDER HANDLERS
// ==============================================================================

pub async fn set_availability(
    State(state): State<Arc<AvailabilityState>>,
    Path(provider_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let template = state
        .availability
        .set_availability(&actor, provider_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": template,
        "message": "Availability updated"
    })))
}

pub async fn add_exception(
    State(state): State<Arc<AvailabilityState>>,
    Path(provider_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExceptionRequest>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let exception = state
        .availability
        .add_exception(&actor, provider_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "exception": exception,
    })))
}

pub async fn remove_exception(
    State(state): State<Arc<AvailabilityState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let actor = actor_from_user(&user)?;
    let removed = state
        .availability
        .remove_exception(&actor, provider_id, date)
        .await?;

    if !removed {
        return Err(AppError::NotFound(format!("No exception on {}", date)));
    }

    Ok(Json(json!({
        "success": true,
        "date": date,
    })))
}
