use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::auth::ActorContext;
use shared_utils::clock::Clock;

use crate::error::AvailabilityError;
use crate::models::{
    AvailabilityException, AvailabilityTemplate, CreateExceptionRequest, DateRange,
    SetAvailabilityRequest,
};
use crate::store::AvailabilityStore;

/// Reads and maintains a provider's weekly template and closed dates.
pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn get_availability(&self, provider_id: Uuid) -> Result<AvailabilityTemplate, AvailabilityError> {
        debug!("Fetching availability template for provider: {}", provider_id);
        self.store
            .get_template(provider_id)
            .await?
            .ok_or(AvailabilityError::NotFound)
    }

    /// Replaces the provider's template wholesale.
    pub async fn set_availability(
        &self,
        actor: &ActorContext,
        provider_id: Uuid,
        request: SetAvailabilityRequest,
    ) -> Result<AvailabilityTemplate, AvailabilityError> {
        Self::authorize(actor, provider_id)?;

        let template = request.into_template(provider_id, self.clock.now())?;
        let stored = self.store.put_template(template).await?;

        info!(
            "Availability for provider {} replaced: {} work days, {}-{} every {} min",
            provider_id,
            stored.work_days.len(),
            stored.daily_window.from,
            stored.daily_window.to,
            stored.slot_granularity_minutes
        );
        Ok(stored)
    }

    /// Closes a date. Adding a date that is already closed returns the existing row.
    pub async fn add_exception(
        &self,
        actor: &ActorContext,
        provider_id: Uuid,
        request: CreateExceptionRequest,
    ) -> Result<AvailabilityException, AvailabilityError> {
        Self::authorize(actor, provider_id)?;
        debug!("Closing {} for provider {}", request.date, provider_id);

        let exception = AvailabilityException {
            provider_id,
            date: request.date,
            reason: request.reason.filter(|r| !r.trim().is_empty()),
            created_at: self.clock.now(),
        };
        self.store.insert_exception(exception).await
    }

    pub async fn remove_exception(
        &self,
        actor: &ActorContext,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<bool, AvailabilityError> {
        Self::authorize(actor, provider_id)?;

        let removed = self.store.delete_exception(provider_id, date).await?;
        if removed {
            info!("Provider {} reopened {}", provider_id, date);
        }
        Ok(removed)
    }

    pub async fn get_exceptions(
        &self,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<BTreeSet<NaiveDate>, AvailabilityError> {
        let exceptions = self.store.exceptions_in_range(provider_id, range).await?;
        Ok(exceptions.into_iter().map(|e| e.date).collect())
    }

    /// Full exception rows, reasons included.
    pub async fn list_exceptions(
        &self,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AvailabilityException>, AvailabilityError> {
        self.store.exceptions_in_range(provider_id, range).await
    }

    fn authorize(actor: &ActorContext, provider_id: Uuid) -> Result<(), AvailabilityError> {
        if actor.acts_for(provider_id) {
            Ok(())
        } else {
            Err(AvailabilityError::Forbidden)
        }
    }
}
