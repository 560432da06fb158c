use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AvailabilityError;

// ==============================================================================
// SERVICE LABELS
// ==============================================================================

/// A service a provider offers, e.g. "vaccination" or "dental cleaning".
///
/// Labels are normalized (trimmed, ASCII-lowercased) on construction so that
/// membership checks ignore incidental casing and whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ServiceLabel(String);

impl ServiceLabel {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ServiceLabel {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ServiceLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ServiceLabel> for String {
    fn from(value: ServiceLabel) -> Self {
        value.0
    }
}

impl fmt::Display for ServiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ==============================================================================
// WEEKLY TEMPLATE
// ==============================================================================

/// Half-open opening hours `[from, to)` applied to every work day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl DailyWindow {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Result<Self, AvailabilityError> {
        let window = Self { from, to };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), AvailabilityError> {
        if self.from >= self.to {
            return Err(AvailabilityError::Validation(
                "Daily window must start before it ends".to_string(),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.from <= time && time < self.to
    }
}

/// One provider's recurring weekly schedule. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityTemplate {
    pub provider_id: Uuid,
    pub work_days: Vec<Weekday>,
    pub daily_window: DailyWindow,
    pub slot_granularity_minutes: u32,
    pub offered_services: BTreeSet<ServiceLabel>,
    pub updated_at: NaiveDateTime,
}

impl AvailabilityTemplate {
    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.work_days.contains(&weekday)
    }

    pub fn offers(&self, service: &ServiceLabel) -> bool {
        self.offered_services.contains(service)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub work_days: Vec<Weekday>,
    pub daily_window: DailyWindow,
    pub slot_granularity_minutes: u32,
    pub offered_services: Vec<ServiceLabel>,
}

impl SetAvailabilityRequest {
    /// Validates the request and turns it into the template that supersedes the current one.
    pub fn into_template(
        self,
        provider_id: Uuid,
        updated_at: NaiveDateTime,
    ) -> Result<AvailabilityTemplate, AvailabilityError> {
        self.daily_window.validate()?;

        if self.slot_granularity_minutes == 0 {
            return Err(AvailabilityError::Validation(
                "Slot granularity must be greater than zero minutes".to_string(),
            ));
        }

        let offered_services: BTreeSet<ServiceLabel> = self
            .offered_services
            .into_iter()
            .filter(|label| !label.is_empty())
            .collect();

        Ok(AvailabilityTemplate {
            provider_id,
            work_days: normalize_work_days(self.work_days),
            daily_window: self.daily_window,
            slot_granularity_minutes: self.slot_granularity_minutes,
            offered_services,
            updated_at,
        })
    }
}

/// Deduplicates and orders work days Monday first.
pub fn normalize_work_days(mut days: Vec<Weekday>) -> Vec<Weekday> {
    days.sort_by_key(|day| day.num_days_from_monday());
    days.dedup();
    days
}

// ==============================================================================
// EXCEPTIONS
// ==============================================================================

/// A calendar date on which the provider is fully closed, whatever the template says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityException {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionRequest {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

// ==============================================================================
// QUERIES
// ==============================================================================

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AvailabilityError> {
        if from > to {
            return Err(AvailabilityError::Validation(
                "Date range must not end before it starts".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// First instant of `from` and first instant after `to`, as a half-open interval.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.from.and_time(NaiveTime::MIN);
        let end = self
            .to
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        (start, end)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateRangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRangeQuery {
    pub fn into_range(self) -> Result<DateRange, AvailabilityError> {
        DateRange::new(self.from, self.to)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<NaiveTime>,
}
