use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use availability_cell::{AvailabilityStore, DateRange};
use shared_models::auth::ActorContext;
use shared_utils::clock::Clock;

use crate::error::AppointmentError;
use crate::models::{Appointment, AppointmentView, BookAppointmentRequest};
use crate::services::notification::{dispatch, Notification, NotificationKind, NotificationSink};
use crate::services::status::view;
use crate::store::AppointmentStore;

/// Whether `actor` may see `appointment`: its provider, its requester, or an admin.
pub(crate) fn visible_to(actor: &ActorContext, appointment: &Appointment) -> bool {
    actor.is_admin() || appointment.involves(actor.actor_id)
}

/// Creates appointments and answers reads over the ledger.
pub struct BookingLedger {
    store: Arc<dyn AppointmentStore>,
    availability: Arc<dyn AvailabilityStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl BookingLedger {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        availability: Arc<dyn AvailabilityStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, availability, notifier, clock }
    }

    /// Books a pending appointment, failing with `Conflict` if an active
    /// appointment already holds the provider's slot.
    #[instrument(
        skip(self, actor, request),
        fields(provider_id = %request.provider_id, scheduled_at = %request.scheduled_at)
    )]
    pub async fn book(
        &self,
        actor: &ActorContext,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let requester_id = match request.requester_id {
            Some(id) if id != actor.actor_id && !actor.is_admin() => {
                return Err(AppointmentError::Forbidden);
            }
            Some(id) => id,
            None => actor.actor_id,
        };

        let template = self
            .availability
            .get_template(request.provider_id)
            .await?
            .ok_or(AppointmentError::ProviderNotFound)?;

        if !template.offers(&request.service_type) {
            return Err(AppointmentError::InvalidService(request.service_type.to_string()));
        }

        let now = self.clock.now();
        if request.scheduled_at <= now {
            return Err(AppointmentError::InvalidTime(format!(
                "{} is not in the future",
                request.scheduled_at
            )));
        }

        let appointment = Appointment::pending(
            request.provider_id,
            request.subject_id,
            requester_id,
            request.service_type,
            request.scheduled_at,
            now,
        );

        let stored = match self.store.insert_if_slot_free(appointment).await {
            Ok(stored) => stored,
            Err(AppointmentError::Conflict) => {
                warn!("Booking conflict: slot already held");
                return Err(AppointmentError::Conflict);
            }
            Err(e) => return Err(e),
        };

        info!("Appointment {} booked for subject {}", stored.id, stored.subject_id);

        let requested = Notification::about(&stored, stored.provider_id, NotificationKind::Requested);
        dispatch(self.notifier.clone(), vec![requested]);

        Ok(stored)
    }

    pub async fn get(&self, actor: &ActorContext, id: Uuid) -> Result<AppointmentView, AppointmentError> {
        let appointment = self.store.get(id).await?.ok_or(AppointmentError::NotFound)?;
        if !visible_to(actor, &appointment) {
            return Err(AppointmentError::Forbidden);
        }
        Ok(view(appointment, self.clock.now()))
    }

    pub async fn list_for_provider(
        &self,
        actor: &ActorContext,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        if !actor.acts_for(provider_id) {
            return Err(AppointmentError::Forbidden);
        }
        let (start, end) = range.bounds();
        let rows = self.store.list_by_provider(provider_id, start, end).await?;
        debug!("Found {} appointments for provider {}", rows.len(), provider_id);

        Ok(self.views(rows))
    }

    /// Appointments for a pet, limited to those the actor takes part in.
    pub async fn list_for_subject(
        &self,
        actor: &ActorContext,
        subject_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        let (start, end) = range.bounds();
        let rows: Vec<Appointment> = self
            .store
            .list_by_subject(subject_id, start, end)
            .await?
            .into_iter()
            .filter(|appointment| visible_to(actor, appointment))
            .collect();

        Ok(self.views(rows))
    }

    pub async fn list_for_requester(
        &self,
        requester_id: Uuid,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        let rows = self.store.list_by_requester(requester_id).await?;
        Ok(self.views(rows))
    }

    fn views(&self, rows: Vec<Appointment>) -> Vec<AppointmentView> {
        let now = self.clock.now();
        rows.into_iter().map(|row| view(row, now)).collect()
    }
}
