use std::sync::Arc;

use shared_utils::clock::Clock;

use crate::services::{AvailabilityService, BookedSlotSource, SlotGenerator};
use crate::store::AvailabilityStore;

/// Shared state behind the availability routes.
pub struct AvailabilityState {
    pub availability: AvailabilityService,
    pub slots: SlotGenerator,
}

impl AvailabilityState {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        bookings: Arc<dyn BookedSlotSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), clock.clone()),
            slots: SlotGenerator::new(store, bookings, clock),
        }
    }
}
