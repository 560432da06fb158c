use std::sync::Arc;

use anyhow::bail;
use axum::{
    Router,
    routing::get,
};
use tracing::info;

use appointment_cell::router::appointment_routes;
use appointment_cell::{
    ActiveBookings, AppointmentState, AppointmentStore, InMemoryAppointmentStore,
    NotificationSink, SupabaseAppointmentStore, TracingNotificationSink, WebhookNotificationSink,
};
use availability_cell::router::availability_routes;
use availability_cell::{
    AvailabilityState, AvailabilityStore, InMemoryAvailabilityStore, SupabaseAvailabilityStore,
};
use shared_config::{AppConfig, StorageBackend};
use shared_database::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

pub fn create_router(config: Arc<AppConfig>) -> anyhow::Result<Router> {
    create_router_with_clock(config, Arc::new(SystemClock))
}

/// Wires stores, notification sink and cells for the configured backend.
pub fn create_router_with_clock(
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Router> {
    let (availability_store, appointment_store): (Arc<dyn AvailabilityStore>, Arc<dyn AppointmentStore>) =
        match config.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory scheduling store");
                (
                    Arc::new(InMemoryAvailabilityStore::new()),
                    Arc::new(InMemoryAppointmentStore::new()),
                )
            }
            StorageBackend::Supabase => {
                if !config.is_supabase_configured() {
                    bail!("SCHEDULING_STORE=supabase requires SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY");
                }
                info!("Using Supabase scheduling store at {}", config.supabase_url);
                let supabase = Arc::new(SupabaseClient::new(&config));
                (
                    Arc::new(SupabaseAvailabilityStore::new(supabase.clone())),
                    Arc::new(SupabaseAppointmentStore::new(supabase)),
                )
            }
        };

    let notifier: Arc<dyn NotificationSink> = match &config.notification_webhook_url {
        Some(url) => {
            info!("Delivering notifications to webhook {}", url);
            Arc::new(WebhookNotificationSink::new(url.clone())?)
        }
        None => Arc::new(TracingNotificationSink),
    };

    let availability_state = Arc::new(AvailabilityState::new(
        availability_store.clone(),
        Arc::new(ActiveBookings::new(appointment_store.clone())),
        clock.clone(),
    ));
    let appointment_state = Arc::new(AppointmentState::new(
        appointment_store,
        availability_store,
        notifier,
        clock,
    ));

    Ok(Router::new()
        .route("/", get(|| async { "Vet scheduling API is running!" }))
        .nest("/providers", availability_routes(availability_state, config.clone()))
        .nest("/appointments", appointment_routes(appointment_state, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use shared_utils::clock::FixedClock;
    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};
    use tower::ServiceExt;

    fn app() -> (Router, TestConfig) {
        let config = TestConfig::default();
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2025, 11, 16).unwrap().and_hms_opt(8, 0, 0).unwrap(),
        ));
        let router = create_router_with_clock(config.to_arc(), clock).unwrap();
        (router, config)
    }

    fn authorized(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn booking_requires_a_token() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/appointments")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn publish_book_and_see_slot_taken() {
        let (app, config) = app();
        let vet = TestUser::provider("vet@example.com");
        let owner = TestUser::requester("owner@example.com");
        let vet_token = JwtTestUtils::create_test_token(&vet, &config.jwt_secret, None);
        let owner_token = JwtTestUtils::create_test_token(&owner, &config.jwt_secret, None);

        let published = app
            .clone()
            .oneshot(authorized(
                "PUT",
                &format!("/providers/{}/availability", vet.id),
                &vet_token,
                json!({
                    "work_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
                    "daily_window": { "from": "09:00:00", "to": "17:00:00" },
                    "slot_granularity_minutes": 30,
                    "offered_services": ["vaccination"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(published.status(), StatusCode::OK);

        let booked = app
            .clone()
            .oneshot(authorized(
                "POST",
                "/appointments",
                &owner_token,
                json!({
                    "provider_id": vet.id,
                    "subject_id": uuid::Uuid::new_v4(),
                    "service_type": "vaccination",
                    "scheduled_at": "2025-11-17T09:00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(booked.status(), StatusCode::CREATED);

        let slots = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/providers/{}/slots?date=2025-11-17", vet.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(slots.status(), StatusCode::OK);
        let body = json_body(slots).await;
        assert_eq!(body["slots"].as_array().map(Vec::len), Some(15));
        assert_eq!(body["slots"][0], "09:30:00");

        let again = app
            .oneshot(authorized(
                "POST",
                "/appointments",
                &owner_token,
                json!({
                    "provider_id": vet.id,
                    "subject_id": uuid::Uuid::new_v4(),
                    "service_type": "vaccination",
                    "scheduled_at": "2025-11-17T09:00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn reject_accepts_a_bare_post() {
        let (app, config) = app();
        let vet = TestUser::provider("vet@example.com");
        let owner = TestUser::requester("owner@example.com");
        let vet_token = JwtTestUtils::create_test_token(&vet, &config.jwt_secret, None);
        let owner_token = JwtTestUtils::create_test_token(&owner, &config.jwt_secret, None);

        let published = app
            .clone()
            .oneshot(authorized(
                "PUT",
                &format!("/providers/{}/availability", vet.id),
                &vet_token,
                json!({
                    "work_days": ["Tue"],
                    "daily_window": { "from": "09:00:00", "to": "12:00:00" },
                    "slot_granularity_minutes": 60,
                    "offered_services": ["checkup"]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(published.status(), StatusCode::OK);

        let booked = app
            .clone()
            .oneshot(authorized(
                "POST",
                "/appointments",
                &owner_token,
                json!({
                    "provider_id": vet.id,
                    "subject_id": uuid::Uuid::new_v4(),
                    "service_type": "checkup",
                    "scheduled_at": "2025-11-18T10:00:00"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(booked.status(), StatusCode::CREATED);
        let id = json_body(booked).await["appointment"]["id"].as_str().unwrap().to_string();

        let rejected = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/appointments/{}/reject", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", vet_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status(), StatusCode::OK);
        let body = json_body(rejected).await;
        assert_eq!(body["appointment"]["base_status"], "canceled");
        assert!(body["appointment"]["cancel_reason"].is_null());
    }

    #[test]
    fn supabase_backend_without_credentials_is_refused() {
        let mut config = TestConfig::default().to_app_config();
        config.storage_backend = StorageBackend::Supabase;
        config.supabase_url = String::new();

        assert!(create_router(Arc::new(config)).is_err());
    }
}
