use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AppointmentStore;
use crate::error::AppointmentError;
use crate::models::{Appointment, BaseStatus};

#[derive(Debug, Default)]
struct Ledger {
    rows: HashMap<Uuid, Appointment>,
    /// `(provider_id, scheduled_at)` of every active row.
    active: HashMap<(Uuid, NaiveDateTime), Uuid>,
}

impl Ledger {
    fn select<F>(&self, keep: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut rows: Vec<Appointment> = self.rows.values().filter(|a| keep(a)).cloned().collect();
        rows.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        rows
    }
}

/// Ledger kept in process memory. Every write takes the single write lock, so
/// the slot check and the insert cannot interleave with another booking.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert_if_slot_free(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut ledger = self.ledger.write().await;
        let key = (appointment.provider_id, appointment.scheduled_at);

        if appointment.holds_slot() {
            if ledger.active.contains_key(&key) {
                return Err(AppointmentError::Conflict);
            }
            ledger.active.insert(key, appointment.id);
        }
        ledger.rows.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.ledger.read().await.rows.get(&id).cloned())
    }

    async fn compare_and_set(
        &self,
        expected: BaseStatus,
        updated: Appointment,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut ledger = self.ledger.write().await;

        match ledger.rows.get(&updated.id) {
            None => return Err(AppointmentError::NotFound),
            Some(current) if current.base_status != expected => return Ok(None),
            Some(_) => {}
        }

        if !updated.holds_slot() {
            let key = (updated.provider_id, updated.scheduled_at);
            if ledger.active.get(&key) == Some(&updated.id) {
                ledger.active.remove(&key);
            }
        }
        ledger.rows.insert(updated.id, updated.clone());
        Ok(Some(updated))
    }

    async fn list_by_provider(
        &self,
        provider_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.ledger.read().await.select(|a| {
            a.provider_id == provider_id && start <= a.scheduled_at && a.scheduled_at < end
        }))
    }

    async fn list_by_subject(
        &self,
        subject_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.ledger.read().await.select(|a| {
            a.subject_id == subject_id && start <= a.scheduled_at && a.scheduled_at < end
        }))
    }

    async fn list_by_requester(&self, requester_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.ledger.read().await.select(|a| a.requester_id == requester_id))
    }
}
