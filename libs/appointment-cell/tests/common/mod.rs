#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use uuid::Uuid;

use appointment_cell::{
    ActiveBookings, AppointmentState, BookAppointmentRequest, InMemoryAppointmentStore,
    Notification, NotificationError, NotificationSink,
};
use availability_cell::{
    AvailabilityState, AvailabilityStore, DailyWindow, InMemoryAvailabilityStore,
    SetAvailabilityRequest,
};
use shared_utils::clock::FixedClock;

/// Keeps every notification it is handed.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Notifications go out on a background task; polls until `count` have arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<Notification> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} notifications, got {}", count, self.sent().len());
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}

/// Refuses every delivery.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected(503))
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Clinic {
    pub appointments: Arc<AppointmentState>,
    pub availability: Arc<AvailabilityState>,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<FixedClock>,
    pub provider_id: Uuid,
}

impl Clinic {
    pub fn request(&self, scheduled_at: NaiveDateTime) -> BookAppointmentRequest {
        BookAppointmentRequest {
            provider_id: self.provider_id,
            subject_id: Uuid::new_v4(),
            service_type: "Vaccination".into(),
            scheduled_at,
            requester_id: None,
        }
    }
}

/// One provider working Mon-Fri 09:00-17:00 in 30 minute slots, clock on Sunday 2025-11-16 08:00.
pub async fn clinic() -> Clinic {
    clinic_with_sink(None).await
}

pub async fn clinic_with_sink(sink: Option<Arc<dyn NotificationSink>>) -> Clinic {
    let clock = Arc::new(FixedClock::new(at(2025, 11, 16, 8, 0)));
    let availability_store = Arc::new(InMemoryAvailabilityStore::new());
    let ledger_store = Arc::new(InMemoryAppointmentStore::new());
    let recording = Arc::new(RecordingSink::default());
    let notifier: Arc<dyn NotificationSink> = sink.unwrap_or_else(|| recording.clone() as Arc<dyn NotificationSink>);

    let provider_id = Uuid::new_v4();
    let template = SetAvailabilityRequest {
        work_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        daily_window: DailyWindow {
            from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            to: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        },
        slot_granularity_minutes: 30,
        offered_services: vec!["vaccination".into(), "checkup".into()],
    }
    .into_template(provider_id, at(2025, 11, 1, 8, 0))
    .unwrap();
    availability_store.put_template(template).await.unwrap();

    let appointments = Arc::new(AppointmentState::new(
        ledger_store.clone(),
        availability_store.clone(),
        notifier,
        clock.clone(),
    ));
    let availability = Arc::new(AvailabilityState::new(
        availability_store,
        Arc::new(ActiveBookings::new(ledger_store)),
        clock.clone(),
    ));

    Clinic { appointments, availability, sink: recording, clock, provider_id }
}
