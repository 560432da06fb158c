use std::sync::Arc;

use availability_cell::AvailabilityStore;
use shared_utils::clock::Clock;

use crate::services::{BookingLedger, CalendarProjector, NotificationSink, TransitionService};
use crate::store::AppointmentStore;

/// Shared state behind the appointment routes.
pub struct AppointmentState {
    pub ledger: BookingLedger,
    pub transitions: TransitionService,
    pub calendar: CalendarProjector,
}

impl AppointmentState {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        availability: Arc<dyn AvailabilityStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger: BookingLedger::new(store.clone(), availability, notifier.clone(), clock.clone()),
            transitions: TransitionService::new(store.clone(), notifier, clock.clone()),
            calendar: CalendarProjector::new(store, clock),
        }
    }
}
