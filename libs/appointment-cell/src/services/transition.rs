use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_models::auth::ActorContext;
use shared_utils::clock::Clock;

use crate::error::AppointmentError;
use crate::models::{Appointment, BaseStatus, EffectiveStatus, TransitionAction};
use crate::services::notification::{dispatch, Notification, NotificationKind, NotificationSink};
use crate::services::status::effective_status;
use crate::store::AppointmentStore;

/// Applies `action` to `current`, producing the row to write.
///
/// Only an effectively pending appointment can be accepted; reject and cancel
/// also accept a confirmed one. Elapsed and canceled appointments refuse everything.
pub fn plan_transition(
    current: &Appointment,
    action: TransitionAction,
    reason: Option<String>,
    now: NaiveDateTime,
) -> Result<Appointment, AppointmentError> {
    let from = effective_status(current, now);
    let mut next = current.clone();

    match (action, from) {
        (TransitionAction::Accept, EffectiveStatus::Pending) => {
            next.base_status = BaseStatus::Confirmed;
            next.confirmed_at = Some(now);
        }
        (
            TransitionAction::Reject | TransitionAction::Cancel,
            EffectiveStatus::Pending | EffectiveStatus::Confirmed,
        ) => {
            next.base_status = BaseStatus::Canceled;
            next.canceled_at = Some(now);
            next.cancel_reason = reason;
        }
        _ => return Err(AppointmentError::InvalidTransition { from, action }),
    }
    Ok(next)
}

/// Accept and reject belong to the provider. Cancel is open to either party or an admin.
fn authorize(
    actor: &ActorContext,
    appointment: &Appointment,
    action: TransitionAction,
) -> Result<(), AppointmentError> {
    let allowed = match action {
        TransitionAction::Accept | TransitionAction::Reject => actor.actor_id == appointment.provider_id,
        TransitionAction::Cancel => actor.is_admin() || appointment.involves(actor.actor_id),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppointmentError::Forbidden)
    }
}

/// Who hears about a transition performed by `actor`.
fn recipients(actor: &ActorContext, appointment: &Appointment, action: TransitionAction) -> Vec<Uuid> {
    match action {
        TransitionAction::Accept | TransitionAction::Reject => vec![appointment.requester_id],
        TransitionAction::Cancel if actor.actor_id == appointment.provider_id => {
            vec![appointment.requester_id]
        }
        TransitionAction::Cancel if actor.actor_id == appointment.requester_id => {
            vec![appointment.provider_id]
        }
        TransitionAction::Cancel => vec![appointment.provider_id, appointment.requester_id],
    }
}

/// Moves appointments through accept, reject and cancel.
pub struct TransitionService {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl TransitionService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifier, clock }
    }

    pub async fn accept(&self, actor: &ActorContext, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(actor, id, TransitionAction::Accept, None).await
    }

    pub async fn reject(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(actor, id, TransitionAction::Reject, reason).await
    }

    pub async fn cancel(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(actor, id, TransitionAction::Cancel, reason).await
    }

    #[instrument(skip(self, actor, reason), fields(actor_id = %actor.actor_id))]
    async fn transition(
        &self,
        actor: &ActorContext,
        id: Uuid,
        action: TransitionAction,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.store.get(id).await?.ok_or(AppointmentError::NotFound)?;
        authorize(actor, &current, action)?;

        let now = self.clock.now();
        let next = plan_transition(&current, action, reason, now)?;

        let stored = match self.store.compare_and_set(current.base_status, next).await? {
            Some(stored) => stored,
            None => {
                // Lost a race with another transition; report against the winner's state.
                let from = match self.store.get(id).await? {
                    Some(latest) => effective_status(&latest, now),
                    None => effective_status(&current, now),
                };
                warn!("Concurrent transition on appointment {}; {} refused", id, action);
                return Err(AppointmentError::InvalidTransition { from, action });
            }
        };

        info!(
            "Appointment {} moved from {} to {}",
            id,
            current.base_status.label(),
            stored.base_status.label()
        );

        let kind = match stored.base_status {
            BaseStatus::Confirmed => NotificationKind::Confirmed,
            BaseStatus::Canceled | BaseStatus::Pending => NotificationKind::Canceled,
        };
        let notifications: Vec<Notification> = recipients(actor, &stored, action)
            .into_iter()
            .map(|recipient| Notification::about(&stored, recipient, kind))
            .collect();
        dispatch(self.notifier.clone(), notifications);

        Ok(stored)
    }
}
