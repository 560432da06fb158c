use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availability_cell::ServiceLabel;

// ==============================================================================
// STATUS
// ==============================================================================

/// The status stored on the ledger row and written only by transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseStatus {
    Pending,
    Confirmed,
    Canceled,
}

impl BaseStatus {
    /// Pending and confirmed appointments hold their slot.
    pub fn is_active(self) -> bool {
        match self {
            BaseStatus::Pending | BaseStatus::Confirmed => true,
            BaseStatus::Canceled => false,
        }
    }

    /// Wire name, as stored in the `base_status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            BaseStatus::Pending => "pending",
            BaseStatus::Confirmed => "confirmed",
            BaseStatus::Canceled => "canceled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BaseStatus::Pending => "Pending",
            BaseStatus::Confirmed => "Confirmed",
            BaseStatus::Canceled => "Canceled",
        }
    }
}

/// The status as observed at a given instant. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl EffectiveStatus {
    pub fn label(self) -> &'static str {
        match self {
            EffectiveStatus::Pending => "Pending",
            EffectiveStatus::Confirmed => "Confirmed",
            EffectiveStatus::Completed => "Completed",
            EffectiveStatus::Canceled => "Canceled",
        }
    }

    /// Rank used when several appointments share a calendar day; the highest wins.
    pub fn calendar_priority(self) -> u8 {
        match self {
            EffectiveStatus::Pending => 4,
            EffectiveStatus::Confirmed => 3,
            EffectiveStatus::Completed => 2,
            EffectiveStatus::Canceled => 1,
        }
    }
}

impl fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Accept,
    Reject,
    Cancel,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            TransitionAction::Accept => "accept",
            TransitionAction::Reject => "reject",
            TransitionAction::Cancel => "cancel",
        };
        f.write_str(verb)
    }
}

// ==============================================================================
// LEDGER ROW
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub subject_id: Uuid,
    pub requester_id: Uuid,
    pub service_type: ServiceLabel,
    pub scheduled_at: NaiveDateTime,
    pub base_status: BaseStatus,
    pub cancel_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub confirmed_at: Option<NaiveDateTime>,
    pub canceled_at: Option<NaiveDateTime>,
}

impl Appointment {
    pub fn pending(
        provider_id: Uuid,
        subject_id: Uuid,
        requester_id: Uuid,
        service_type: ServiceLabel,
        scheduled_at: NaiveDateTime,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            subject_id,
            requester_id,
            service_type,
            scheduled_at,
            base_status: BaseStatus::Pending,
            cancel_reason: None,
            created_at,
            confirmed_at: None,
            canceled_at: None,
        }
    }

    pub fn holds_slot(&self) -> bool {
        self.base_status.is_active()
    }

    pub fn involves(&self, actor_id: Uuid) -> bool {
        self.provider_id == actor_id || self.requester_id == actor_id
    }
}

// ==============================================================================
// REQUESTS AND VIEWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub provider_id: Uuid,
    pub subject_id: Uuid,
    pub service_type: ServiceLabel,
    pub scheduled_at: NaiveDateTime,
    /// Only admins may book on someone else's behalf; defaults to the caller.
    #[serde(default)]
    pub requester_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// A ledger row paired with its status at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub effective_status: EffectiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarProjection {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: BTreeMap<NaiveDate, EffectiveStatus>,
}
