use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use super::AppointmentStore;
use crate::error::AppointmentError;
use crate::models::{Appointment, BaseStatus};

const APPOINTMENTS: &str = "/rest/v1/appointments";

/// PostgREST timestamp filter value; avoids the space in `NaiveDateTime`'s `Display`.
fn timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Ledger in the `appointments` table.
///
/// Double booking is prevented by a partial unique index on
/// `(provider_id, scheduled_at) WHERE base_status IN ('pending', 'confirmed')`;
/// the resulting 409 surfaces as `Conflict`. The DDL is in `schema.sql` at the crate root.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::Storage(format!("Failed to parse appointments: {}", e)))
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None, None).await?;
        Self::parse_rows(rows)
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert_if_slot_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::Storage(e.to_string()))?;

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                APPOINTMENTS,
                None,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| {
                let err = AppointmentError::from(e);
                if err == AppointmentError::Conflict {
                    debug!(
                        "Slot {} for provider {} already taken",
                        appointment.scheduled_at, appointment.provider_id
                    );
                }
                err
            })?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Storage("Failed to create appointment".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?id=eq.{}&limit=1", APPOINTMENTS, id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn compare_and_set(
        &self,
        expected: BaseStatus,
        updated: Appointment,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "{}?id=eq.{}&base_status=eq.{}",
            APPOINTMENTS,
            updated.id,
            expected.as_str()
        );
        let body = json!({
            "base_status": updated.base_status,
            "cancel_reason": updated.cancel_reason,
            "confirmed_at": updated.confirmed_at,
            "canceled_at": updated.canceled_at,
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        let stored = Self::parse_rows(rows)?.into_iter().next();
        if stored.is_none() {
            warn!(
                "Appointment {} was no longer {} when updating",
                updated.id,
                expected.as_str()
            );
        }
        Ok(stored)
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "{}?provider_id=eq.{}&scheduled_at=gte.{}&scheduled_at=lt.{}&order=scheduled_at.asc",
            APPOINTMENTS,
            provider_id,
            timestamp(start),
            timestamp(end)
        );
        self.fetch(&path).await
    }

    async fn list_by_subject(
        &self,
        subject_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "{}?subject_id=eq.{}&scheduled_at=gte.{}&scheduled_at=lt.{}&order=scheduled_at.asc",
            APPOINTMENTS,
            subject_id,
            timestamp(start),
            timestamp(end)
        );
        self.fetch(&path).await
    }

    async fn list_by_requester(&self, requester_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "{}?requester_id=eq.{}&order=scheduled_at.asc",
            APPOINTMENTS, requester_id
        );
        self.fetch(&path).await
    }
}
