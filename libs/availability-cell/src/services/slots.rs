use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use shared_utils::clock::Clock;

use crate::error::AvailabilityError;
use crate::models::{AvailabilityTemplate, DailyWindow};
use crate::store::AvailabilityStore;

/// Read access to the start times already held by active (pending or confirmed) bookings.
#[async_trait]
pub trait BookedSlotSource: Send + Sync {
    async fn active_start_times(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, AvailabilityError>;
}

/// Every start time `from, from+step, ...` strictly before `to`.
///
/// Stops instead of wrapping past midnight.
pub fn enumerate_window(window: &DailyWindow, granularity_minutes: u32) -> Vec<NaiveTime> {
    if granularity_minutes == 0 {
        return Vec::new();
    }
    let step = Duration::minutes(i64::from(granularity_minutes));

    let mut slots = Vec::new();
    let mut current = window.from;
    while current < window.to {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    slots
}

/// Candidate start times for `date` from the template alone, before
/// exceptions, the clock and existing bookings are applied.
pub fn template_slots(template: &AvailabilityTemplate, date: NaiveDate) -> Vec<NaiveTime> {
    if !template.works_on(date.weekday()) {
        return Vec::new();
    }
    enumerate_window(&template.daily_window, template.slot_granularity_minutes)
}

/// Derives bookable start times from the template, closed dates and the ledger.
///
/// Holds no iteration state; each call recomputes from current data.
pub struct SlotGenerator {
    store: Arc<dyn AvailabilityStore>,
    bookings: Arc<dyn BookedSlotSource>,
    clock: Arc<dyn Clock>,
}

impl SlotGenerator {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        bookings: Arc<dyn BookedSlotSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, bookings, clock }
    }

    pub async fn generate_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, AvailabilityError> {
        let template = self
            .store
            .get_template(provider_id)
            .await?
            .ok_or(AvailabilityError::NotFound)?;

        if date < self.clock.today() {
            return Ok(Vec::new());
        }

        if self.store.is_closed(provider_id, date).await? {
            debug!("Provider {} is closed on {}", provider_id, date);
            return Ok(Vec::new());
        }

        let candidates = template_slots(&template, date);
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let now = self.clock.now();
        let taken: HashSet<NaiveTime> = self
            .bookings
            .active_start_times(provider_id, date)
            .await?
            .into_iter()
            .filter(|start| start.date() == date)
            .map(|start| start.time())
            .collect();

        let slots: Vec<NaiveTime> = candidates
            .into_iter()
            .filter(|time| date.and_time(*time) > now)
            .filter(|time| !taken.contains(time))
            .collect();

        debug!("Found {} open slots for provider {} on {}", slots.len(), provider_id, date);
        Ok(slots)
    }
}
