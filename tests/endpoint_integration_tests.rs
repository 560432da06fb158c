//! Endpoint smoke suite for a running scheduling API.
//!
//! Mints its own tokens with `SUPABASE_JWT_SECRET`, so it needs no identity
//! provider. Point it at a server with `API_BASE_URL` (default
//! `http://localhost:3000`); the server should use a fresh in-memory store.

use chrono::{Datelike, Duration, Local, Weekday};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_utils::test_utils::{JwtTestUtils, TestUser};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// HTTP client acting as one user.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiTestClient {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            auth_token,
        }
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        self.with_auth(request).send().await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Response, reqwest::Error> {
        let request = self.client.post(format!("{}{}", self.base_url, path)).json(&body);
        self.with_auth(request).send().await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Response, reqwest::Error> {
        let request = self.client.put(format!("{}{}", self.base_url, path)).json(&body);
        self.with_auth(request).send().await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, reqwest::Error> {
        let request = self.client.delete(format!("{}{}", self.base_url, path));
        self.with_auth(request).send().await
    }
}

/// Test results tracker
#[derive(Debug, Default)]
pub struct TestResults {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub failures: Vec<String>,
}

impl TestResults {
    pub fn pass(&mut self, test_name: &str) {
        self.passed += 1;
        println!("✅ {}", test_name);
    }

    pub fn fail(&mut self, test_name: &str, error: &str) {
        self.failed += 1;
        self.failures.push(format!("{}: {}", test_name, error));
        println!("❌ {}: {}", test_name, error);
    }

    pub fn skip(&mut self, test_name: &str, reason: &str) {
        self.skipped += 1;
        println!("⚠️ {} (skipped: {})", test_name, reason);
    }

    /// Records pass/fail by status and hands back the JSON body on a pass.
    pub async fn expect_status(
        &mut self,
        test_name: &str,
        response: Result<Response, reqwest::Error>,
        expected: StatusCode,
    ) -> Option<Value> {
        match response {
            Ok(response) if response.status() == expected => {
                self.pass(test_name);
                Some(response.json().await.unwrap_or(Value::Null))
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                self.fail(test_name, &format!("Status: {} Body: {}", status, body));
                None
            }
            Err(e) => {
                self.fail(test_name, &e.to_string());
                None
            }
        }
    }

    pub fn summary(&self) {
        println!("\n📊 Test Summary:");
        println!("✅ Passed: {}", self.passed);
        println!("❌ Failed: {}", self.failed);
        println!("⚠️ Skipped: {}", self.skipped);

        if !self.failures.is_empty() {
            println!("\n🔍 Failures:");
            for failure in &self.failures {
                println!("  - {}", failure);
            }
        }
    }
}

/// Next Tuesday strictly after today, so the booked slot is always in the future.
fn next_tuesday() -> chrono::NaiveDate {
    let mut day = Local::now().date_naive() + Duration::days(1);
    while day.weekday() != Weekday::Tue {
        day += Duration::days(1);
    }
    day
}

pub async fn run_endpoint_tests(base_url: &str, jwt_secret: &str) -> TestResults {
    let mut results = TestResults::default();

    let vet = TestUser::provider("vet@example.com");
    let owner = TestUser::requester("owner@example.com");
    let anonymous = ApiTestClient::new(base_url, None);
    let vet_client = ApiTestClient::new(
        base_url,
        Some(JwtTestUtils::create_test_token(&vet, jwt_secret, None)),
    );
    let owner_client = ApiTestClient::new(
        base_url,
        Some(JwtTestUtils::create_test_token(&owner, jwt_secret, None)),
    );

    println!("🚀 Starting endpoint tests");
    println!("📍 Base URL: {}", base_url);

    results
        .expect_status("Liveness", anonymous.get("/").await, StatusCode::OK)
        .await;

    // AVAILABILITY
    println!("\n🗓️ Availability");
    let provider_path = format!("/providers/{}", vet.id);

    results
        .expect_status(
            "Unpublished availability is 404",
            anonymous.get(&format!("{}/availability", provider_path)).await,
            StatusCode::NOT_FOUND,
        )
        .await;

    results
        .expect_status(
            "Publish availability",
            vet_client
                .put(
                    &format!("{}/availability", provider_path),
                    json!({
                        "work_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
                        "daily_window": { "from": "09:00:00", "to": "17:00:00" },
                        "slot_granularity_minutes": 30,
                        "offered_services": ["vaccination", "checkup"]
                    }),
                )
                .await,
            StatusCode::OK,
        )
        .await;

    results
        .expect_status(
            "Owner cannot edit availability",
            owner_client
                .put(
                    &format!("{}/availability", provider_path),
                    json!({
                        "work_days": ["Sat"],
                        "daily_window": { "from": "09:00:00", "to": "12:00:00" },
                        "slot_granularity_minutes": 30,
                        "offered_services": []
                    }),
                )
                .await,
            StatusCode::FORBIDDEN,
        )
        .await;

    let tuesday = next_tuesday();
    let closed_day = tuesday + Duration::days(1);

    results
        .expect_status(
            "Close a date",
            vet_client
                .post(
                    &format!("{}/exceptions", provider_path),
                    json!({ "date": closed_day, "reason": "conference" }),
                )
                .await,
            StatusCode::OK,
        )
        .await;

    if let Some(body) = results
        .expect_status(
            "Closed date has no slots",
            anonymous.get(&format!("{}/slots?date={}", provider_path, closed_day)).await,
            StatusCode::OK,
        )
        .await
    {
        if body["slots"].as_array().map(Vec::len) != Some(0) {
            results.fail("Closed date slot count", &body["slots"].to_string());
        }
    }

    results
        .expect_status(
            "Reopen a date",
            vet_client
                .delete(&format!("{}/exceptions/{}", provider_path, closed_day))
                .await,
            StatusCode::OK,
        )
        .await;

    if let Some(body) = results
        .expect_status(
            "Open Tuesday has sixteen slots",
            anonymous.get(&format!("{}/slots?date={}", provider_path, tuesday)).await,
            StatusCode::OK,
        )
        .await
    {
        if body["slots"].as_array().map(Vec::len) != Some(16) {
            results.fail("Tuesday slot count", &body["slots"].to_string());
        }
    }

    // APPOINTMENTS
    println!("\n📅 Appointments");
    let pet = Uuid::new_v4();
    let booking = json!({
        "provider_id": vet.id,
        "subject_id": pet,
        "service_type": "Vaccination",
        "scheduled_at": tuesday.and_hms_opt(10, 0, 0),
    });

    results
        .expect_status(
            "Booking without a token is 401",
            anonymous.post("/appointments", booking.clone()).await,
            StatusCode::UNAUTHORIZED,
        )
        .await;

    let appointment_id = results
        .expect_status(
            "Book appointment",
            owner_client.post("/appointments", booking.clone()).await,
            StatusCode::CREATED,
        )
        .await
        .and_then(|body| body["appointment"]["id"].as_str().map(str::to_string));

    results
        .expect_status(
            "Second booking of the slot is 409",
            owner_client.post("/appointments", booking).await,
            StatusCode::CONFLICT,
        )
        .await;

    match appointment_id {
        Some(id) => {
            results
                .expect_status(
                    "Owner cannot accept",
                    owner_client.post(&format!("/appointments/{}/accept", id), json!({})).await,
                    StatusCode::FORBIDDEN,
                )
                .await;

            results
                .expect_status(
                    "Vet accepts",
                    vet_client.post(&format!("/appointments/{}/accept", id), json!({})).await,
                    StatusCode::OK,
                )
                .await;

            if let Some(body) = results
                .expect_status(
                    "Pet calendar",
                    owner_client
                        .get(&format!(
                            "/appointments/calendar/subjects/{}?from={}&to={}",
                            pet, tuesday, tuesday
                        ))
                        .await,
                    StatusCode::OK,
                )
                .await
            {
                if body["days"][tuesday.to_string()] != "confirmed" {
                    results.fail("Pet calendar marker", &body["days"].to_string());
                }
            }

            results
                .expect_status(
                    "Owner cancels",
                    owner_client
                        .post(
                            &format!("/appointments/{}/cancel", id),
                            json!({ "reason": "feeling better" }),
                        )
                        .await,
                    StatusCode::OK,
                )
                .await;

            results
                .expect_status(
                    "Second cancel is 409",
                    owner_client.post(&format!("/appointments/{}/cancel", id), json!({})).await,
                    StatusCode::CONFLICT,
                )
                .await;
        }
        None => results.skip("Transitions", "No appointment id from booking"),
    }

    results
        .expect_status(
            "Owner's appointments",
            owner_client.get("/appointments/requesters/me").await,
            StatusCode::OK,
        )
        .await;

    results
}

/// Entry point for endpoint tests
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let base_url = std::env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let jwt_secret = match std::env::var("SUPABASE_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            eprintln!("SUPABASE_JWT_SECRET must match the server's secret");
            std::process::exit(2);
        }
    };

    let results = run_endpoint_tests(&base_url, &jwt_secret).await;
    results.summary();

    if results.failed > 0 {
        std::process::exit(1);
    }
}
