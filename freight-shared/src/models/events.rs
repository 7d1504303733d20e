use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::pii::Masked;

/// What happened to the package.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Created,
    Departed,
    Arrived,
    Lost,
}

/// Which party of the package gets the message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Counterpart {
    Sender,
    Recipient,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackageNotification {
    pub kind: NotificationKind,
    pub counterpart: Counterpart,
    pub package_id: Uuid,
    pub shipment_id: Uuid,
    pub shipment_number: String,
    pub contact_name: String,
    pub contact_phone: Masked<String>,
    pub contact_email: Option<Masked<String>>,
    pub recipient_code: String,
    pub timestamp: DateTime<Utc>,
}

impl PackageNotification {
    /// Short human-readable message body used by text-based channels.
    pub fn message(&self) -> String {
        match self.kind {
            NotificationKind::Created => format!(
                "Package registered on shipment {}. Tracking code: {}",
                self.shipment_number, self.recipient_code
            ),
            NotificationKind::Departed => format!(
                "Your package on shipment {} is on its way. Tracking code: {}",
                self.shipment_number, self.recipient_code
            ),
            NotificationKind::Arrived => format!(
                "Your package on shipment {} has arrived. Bring code {} to collect it.",
                self.shipment_number, self.recipient_code
            ),
            NotificationKind::Lost => format!(
                "Package {} on shipment {} has been declared lost.",
                self.recipient_code, self.shipment_number
            ),
        }
    }
}
