use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use freight_shared::models::events::{Counterpart, NotificationKind, PackageNotification};
use freight_shipment::{Package, Shipment};

/// What the channel did with a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyOutcome {
    Delivered,
    /// Channel chose not to send (no contact details, channel disabled...)
    Skipped(String),
}

/// Outbound messaging to senders and recipients. Best-effort: a failure is
/// logged and reported, never rolls back the transition that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        notification: &PackageNotification,
    ) -> Result<NotifyOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

/// A notification that could not be delivered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationWarning {
    pub package_id: Uuid,
    pub kind: NotificationKind,
    pub counterpart: Counterpart,
    pub message: String,
}

/// Who hears about which event
pub fn counterpart_for(kind: NotificationKind) -> Counterpart {
    match kind {
        NotificationKind::Created | NotificationKind::Lost => Counterpart::Sender,
        NotificationKind::Departed | NotificationKind::Arrived => Counterpart::Recipient,
    }
}

pub fn build_notification(
    kind: NotificationKind,
    package: &Package,
    shipment: &Shipment,
    now: DateTime<Utc>,
) -> PackageNotification {
    let counterpart = counterpart_for(kind);
    let contact = match counterpart {
        Counterpart::Sender => &package.sender,
        Counterpart::Recipient => &package.recipient,
    };

    PackageNotification {
        kind,
        counterpart,
        package_id: package.id,
        shipment_id: shipment.id,
        shipment_number: shipment.number.clone(),
        contact_name: contact.name.clone(),
        contact_phone: contact.phone.clone(),
        contact_email: contact.email.clone(),
        recipient_code: package.recipient_code.clone(),
        timestamp: now,
    }
}

/// Send each notification, collecting failures as warnings.
pub async fn dispatch(notifier: &dyn Notifier, notifications: Vec<PackageNotification>) -> Vec<NotificationWarning> {
    let mut warnings = Vec::new();

    for notification in notifications {
        match notifier.notify(&notification).await {
            Ok(NotifyOutcome::Delivered) => {
                tracing::debug!(
                    package_id = %notification.package_id,
                    kind = ?notification.kind,
                    counterpart = ?notification.counterpart,
                    "Notification delivered"
                );
            }
            Ok(NotifyOutcome::Skipped(reason)) => {
                tracing::debug!(
                    package_id = %notification.package_id,
                    kind = ?notification.kind,
                    "Notification skipped: {}",
                    reason
                );
            }
            Err(e) => {
                tracing::warn!(
                    package_id = %notification.package_id,
                    kind = ?notification.kind,
                    counterpart = ?notification.counterpart,
                    "Notification failed: {}",
                    e
                );
                warnings.push(NotificationWarning {
                    package_id: notification.package_id,
                    kind: notification.kind,
                    counterpart: notification.counterpart,
                    message: e.to_string(),
                });
            }
        }
    }

    warnings
}
