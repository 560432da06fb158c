use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppointmentState;

pub fn appointment_routes(state: Arc<AppointmentState>, config: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/accept", post(handlers::accept_appointment))
        .route("/{appointment_id}/reject", post(handlers::reject_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))

        // Listings
        .route("/providers/{provider_id}", get(handlers::get_provider_appointments))
        .route("/subjects/{subject_id}", get(handlers::get_subject_appointments))
        .route("/requesters/me", get(handlers::get_my_appointments))

        // Calendar markers
        .route("/calendar/subjects/{subject_id}", get(handlers::get_subject_calendar))
        .route("/calendar/providers/{provider_id}", get(handlers::get_provider_calendar))

        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
