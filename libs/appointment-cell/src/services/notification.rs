use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new booking is waiting for the provider.
    Requested,
    Confirmed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub appointment_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub reason: Option<String>,
}

impl Notification {
    pub fn about(appointment: &Appointment, recipient_id: Uuid, kind: NotificationKind) -> Self {
        Self {
            recipient_id,
            kind,
            appointment_id: appointment.id,
            scheduled_at: appointment.scheduled_at,
            reason: appointment.cancel_reason.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification endpoint answered {0}")]
    Rejected(u16),
}

/// Outbound side channel. Delivery may repeat; receivers must tolerate duplicates.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Upper bound on one webhook delivery.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends the notifications on a background task, in order, logging failures.
///
/// Callers invoke this after the ledger write commits and do not await the handle.
pub fn dispatch(sink: Arc<dyn NotificationSink>, notifications: Vec<Notification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        for notification in &notifications {
            if let Err(e) = sink.notify(notification).await {
                warn!(
                    "Failed to deliver {:?} notification for appointment {} to {}: {}",
                    notification.kind, notification.appointment_id, notification.recipient_id, e
                );
            }
        }
    })
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            recipient_id = %notification.recipient_id,
            appointment_id = %notification.appointment_id,
            "Notification {:?} for appointment at {}",
            notification.kind,
            notification.scheduled_at
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a fixed URL.
pub struct WebhookNotificationSink {
    client: Client,
    url: String,
}

impl WebhookNotificationSink {
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        Self::with_timeout(url, WEBHOOK_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self.client.post(&self.url).json(notification).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
