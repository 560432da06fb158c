#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use uuid::Uuid;

use availability_cell::{
    AvailabilityError, AvailabilityState, BookedSlotSource, DailyWindow, InMemoryAvailabilityStore,
    SetAvailabilityRequest,
};
use shared_utils::clock::FixedClock;

/// Bookings held in a plain map, standing in for the appointment ledger.
#[derive(Default)]
pub struct StaticBookings {
    taken: Mutex<HashMap<Uuid, Vec<NaiveDateTime>>>,
}

impl StaticBookings {
    pub fn hold(&self, provider_id: Uuid, at: NaiveDateTime) {
        if let Ok(mut taken) = self.taken.lock() {
            taken.entry(provider_id).or_default().push(at);
        }
    }
}

#[async_trait]
impl BookedSlotSource for StaticBookings {
    async fn active_start_times(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, AvailabilityError> {
        let taken = self.taken.lock().map_err(|e| AvailabilityError::Storage(e.to_string()))?;
        Ok(taken
            .get(&provider_id)
            .map(|all| all.iter().copied().filter(|t| t.date() == date).collect())
            .unwrap_or_default())
    }
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Mon-Fri 09:00-17:00 every 30 minutes.
pub fn weekday_template_request() -> SetAvailabilityRequest {
    SetAvailabilityRequest {
        work_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        daily_window: DailyWindow { from: time(9, 0), to: time(17, 0) },
        slot_granularity_minutes: 30,
        offered_services: vec!["vaccination".into(), "checkup".into()],
    }
}

pub struct Harness {
    pub state: Arc<AvailabilityState>,
    pub bookings: Arc<StaticBookings>,
    pub clock: Arc<FixedClock>,
}

/// Clock pinned to Sunday 2025-11-16 08:00.
pub fn harness() -> Harness {
    let store = Arc::new(InMemoryAvailabilityStore::new());
    let bookings = Arc::new(StaticBookings::default());
    let clock = Arc::new(FixedClock::new(date(2025, 11, 16).and_time(time(8, 0))));
    let state = Arc::new(AvailabilityState::new(store, bookings.clone(), clock.clone()));
    Harness { state, bookings, clock }
}
