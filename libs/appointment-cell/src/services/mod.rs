pub mod calendar;
pub mod ledger;
pub mod notification;
pub mod status;
pub mod transition;

pub use calendar::{project_day, project_range, CalendarProjector};
pub use ledger::BookingLedger;
pub use notification::{
    dispatch, Notification, NotificationError, NotificationKind, NotificationSink,
    TracingNotificationSink, WebhookNotificationSink,
};
pub use status::effective_status;
pub use transition::{plan_transition, TransitionService};
