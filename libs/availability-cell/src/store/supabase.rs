use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use reqwest::{header::{HeaderMap, HeaderValue}, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use super::AvailabilityStore;
use crate::error::AvailabilityError;
use crate::models::{
    normalize_work_days, AvailabilityException, AvailabilityTemplate, DailyWindow, DateRange,
    ServiceLabel,
};

const TEMPLATES: &str = "/rest/v1/availability_templates";
const EXCEPTIONS: &str = "/rest/v1/availability_exceptions";

/// Flat row layout of `availability_templates`.
#[derive(Debug, Serialize, Deserialize)]
struct TemplateRow {
    provider_id: Uuid,
    work_days: Vec<Weekday>,
    window_from: NaiveTime,
    window_to: NaiveTime,
    slot_granularity_minutes: u32,
    offered_services: Vec<ServiceLabel>,
    updated_at: NaiveDateTime,
}

impl From<&AvailabilityTemplate> for TemplateRow {
    fn from(template: &AvailabilityTemplate) -> Self {
        Self {
            provider_id: template.provider_id,
            work_days: template.work_days.clone(),
            window_from: template.daily_window.from,
            window_to: template.daily_window.to,
            slot_granularity_minutes: template.slot_granularity_minutes,
            offered_services: template.offered_services.iter().cloned().collect(),
            updated_at: template.updated_at,
        }
    }
}

impl TryFrom<TemplateRow> for AvailabilityTemplate {
    type Error = AvailabilityError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        if row.slot_granularity_minutes == 0 {
            return Err(AvailabilityError::Storage(format!(
                "Stored template for {} has zero slot granularity",
                row.provider_id
            )));
        }
        let daily_window = DailyWindow::new(row.window_from, row.window_to)
            .map_err(|e| AvailabilityError::Storage(format!("Stored template is invalid: {}", e)))?;

        Ok(Self {
            provider_id: row.provider_id,
            work_days: normalize_work_days(row.work_days),
            daily_window,
            slot_granularity_minutes: row.slot_granularity_minutes,
            offered_services: row.offered_services.into_iter().collect::<BTreeSet<_>>(),
            updated_at: row.updated_at,
        })
    }
}

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, AvailabilityError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| AvailabilityError::Storage(format!("Failed to parse rows: {}", e)))
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn get_template(&self, provider_id: Uuid) -> Result<Option<AvailabilityTemplate>, AvailabilityError> {
        let path = format!("{}?provider_id=eq.{}&limit=1", TEMPLATES, provider_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        Self::parse_rows::<TemplateRow>(rows)?
            .into_iter()
            .next()
            .map(AvailabilityTemplate::try_from)
            .transpose()
    }

    async fn put_template(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, AvailabilityError> {
        debug!("Upserting availability template for provider {}", template.provider_id);

        let body = serde_json::to_value(TemplateRow::from(&template))
            .map_err(|e| AvailabilityError::Storage(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let path = format!("{}?on_conflict=provider_id", TEMPLATES);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, None, Some(body), Some(headers))
            .await?;

        match Self::parse_rows::<TemplateRow>(rows)?.into_iter().next() {
            Some(row) => AvailabilityTemplate::try_from(row),
            None => Err(AvailabilityError::Storage("Failed to store availability template".to_string())),
        }
    }

    async fn insert_exception(&self, exception: AvailabilityException) -> Result<AvailabilityException, AvailabilityError> {
        let body = serde_json::to_value(&exception)
            .map_err(|e| AvailabilityError::Storage(e.to_string()))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=ignore-duplicates,return=representation"),
        );

        let path = format!("{}?on_conflict=provider_id,date", EXCEPTIONS);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::POST, &path, None, Some(body), Some(headers))
            .await?;

        if let Some(created) = Self::parse_rows::<AvailabilityException>(rows)?.into_iter().next() {
            return Ok(created);
        }

        // Ignored duplicate: hand back the row that already closes this date.
        debug!("Exception for {} on {} already exists", exception.provider_id, exception.date);
        self.exceptions_in_range(exception.provider_id, DateRange::single(exception.date))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AvailabilityError::Storage("Failed to store availability exception".to_string()))
    }

    async fn delete_exception(&self, provider_id: Uuid, date: NaiveDate) -> Result<bool, AvailabilityError> {
        let path = format!("{}?provider_id=eq.{}&date=eq.{}", EXCEPTIONS, provider_id, date);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some(SupabaseClient::return_representation()),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn exceptions_in_range(
        &self,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AvailabilityException>, AvailabilityError> {
        let path = format!(
            "{}?provider_id=eq.{}&date=gte.{}&date=lte.{}&order=date.asc",
            EXCEPTIONS, provider_id, range.from, range.to
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;
        Self::parse_rows(rows)
    }
}
