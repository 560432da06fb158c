use chrono::NaiveDateTime;

use crate::models::{Appointment, AppointmentView, BaseStatus, EffectiveStatus};

/// Status of `appointment` as seen at `now`.
///
/// Canceled is absorbing. Otherwise, once the start time has been reached the
/// appointment reads as completed whatever its stored status.
pub fn effective_status(appointment: &Appointment, now: NaiveDateTime) -> EffectiveStatus {
    match appointment.base_status {
        BaseStatus::Canceled => EffectiveStatus::Canceled,
        _ if appointment.scheduled_at <= now => EffectiveStatus::Completed,
        BaseStatus::Pending => EffectiveStatus::Pending,
        BaseStatus::Confirmed => EffectiveStatus::Confirmed,
    }
}

pub fn view(appointment: Appointment, now: NaiveDateTime) -> AppointmentView {
    let effective_status = effective_status(&appointment, now);
    AppointmentView { appointment, effective_status }
}
