use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use availability_cell::{AvailabilityError, BookedSlotSource, DateRange};

use crate::error::AppointmentError;
use crate::models::{Appointment, BaseStatus};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// Persistence for the appointment ledger.
///
/// Implementations must make `insert_if_slot_free` a single atomic step: of any
/// number of concurrent inserts for the same `(provider_id, scheduled_at)`, at
/// most one may leave an active row behind.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Fails with `Conflict` when another active appointment already holds the slot.
    async fn insert_if_slot_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Writes `updated` only if the stored row still has `expected` as its base
    /// status. `None` means another writer got there first.
    async fn compare_and_set(
        &self,
        expected: BaseStatus,
        updated: Appointment,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Appointments with `start <= scheduled_at < end`, ordered by `scheduled_at`.
    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Same window semantics as `list_by_provider`.
    async fn list_by_subject(
        &self,
        subject_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_by_requester(&self, requester_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;
}

/// Exposes the ledger's active bookings to the slot generator.
pub struct ActiveBookings {
    store: Arc<dyn AppointmentStore>,
}

impl ActiveBookings {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BookedSlotSource for ActiveBookings {
    async fn active_start_times(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, AvailabilityError> {
        let (start, end) = DateRange::single(date).bounds();
        let rows = self
            .store
            .list_by_provider(provider_id, start, end)
            .await
            .map_err(|e| AvailabilityError::Storage(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter(Appointment::holds_slot)
            .map(|appointment| appointment.scheduled_at)
            .collect())
    }
}
