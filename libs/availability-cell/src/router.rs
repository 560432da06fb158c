use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AvailabilityState;

pub fn availability_routes(state: Arc<AvailabilityState>, config: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/{provider_id}/availability", get(handlers::get_availability))
        .route("/{provider_id}/exceptions", get(handlers::list_exceptions))
        .route("/{provider_id}/slots", get(handlers::get_available_slots));

    // Provider-managed schedule
    let protected_routes = Router::new()
        .route("/{provider_id}/availability", put(handlers::set_availability))
        .route("/{provider_id}/exceptions", post(handlers::add_exception))
        .route("/{provider_id}/exceptions/{date}", delete(handlers::remove_exception))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
