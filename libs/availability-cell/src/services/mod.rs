pub mod availability;
pub mod slots;

pub use availability::AvailabilityService;
pub use slots::{enumerate_window, BookedSlotSource, SlotGenerator};
