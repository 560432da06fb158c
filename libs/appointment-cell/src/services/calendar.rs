use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;
use uuid::Uuid;

use availability_cell::DateRange;
use shared_models::auth::ActorContext;
use shared_utils::clock::Clock;

use crate::error::AppointmentError;
use crate::models::{Appointment, CalendarProjection, EffectiveStatus};
use crate::services::ledger::visible_to;
use crate::services::status::effective_status;
use crate::store::AppointmentStore;

/// Dominant status among `appointments`, or `None` when there are none.
pub fn project_day<'a, I>(appointments: I, now: NaiveDateTime) -> Option<EffectiveStatus>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    appointments
        .into_iter()
        .map(|appointment| effective_status(appointment, now))
        .max_by_key(|status| status.calendar_priority())
}

/// One marker per date in `range` that has at least one appointment.
pub fn project_range(
    appointments: &[Appointment],
    range: DateRange,
    now: NaiveDateTime,
) -> BTreeMap<NaiveDate, EffectiveStatus> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Appointment>> = BTreeMap::new();
    for appointment in appointments {
        let day = appointment.scheduled_at.date();
        if range.contains(day) {
            by_day.entry(day).or_default().push(appointment);
        }
    }

    by_day
        .into_iter()
        .filter_map(|(day, items)| project_day(items, now).map(|status| (day, status)))
        .collect()
}

/// Calendar markers for a pet or a provider over a date range.
pub struct CalendarProjector {
    store: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
}

impl CalendarProjector {
    pub fn new(store: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn subject_calendar(
        &self,
        actor: &ActorContext,
        subject_id: Uuid,
        range: DateRange,
    ) -> Result<CalendarProjection, AppointmentError> {
        let (start, end) = range.bounds();
        let rows: Vec<Appointment> = self
            .store
            .list_by_subject(subject_id, start, end)
            .await?
            .into_iter()
            .filter(|appointment| visible_to(actor, appointment))
            .collect();

        Ok(self.project(rows, range))
    }

    pub async fn provider_calendar(
        &self,
        actor: &ActorContext,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<CalendarProjection, AppointmentError> {
        if !actor.acts_for(provider_id) {
            return Err(AppointmentError::Forbidden);
        }
        let (start, end) = range.bounds();
        let rows = self.store.list_by_provider(provider_id, start, end).await?;

        Ok(self.project(rows, range))
    }

    fn project(&self, rows: Vec<Appointment>, range: DateRange) -> CalendarProjection {
        let days = project_range(&rows, range, self.clock.now());
        debug!(
            "Projected {} appointments onto {} days between {} and {}",
            rows.len(),
            days.len(),
            range.from,
            range.to
        );
        CalendarProjection { from: range.from, to: range.to, days }
    }
}
