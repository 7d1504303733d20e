use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use freight_core::notifier::{Notifier, NotifyOutcome};
use freight_shared::models::events::PackageNotification;

/// Writes each notification to the log. Contact details stay masked.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        notification: &PackageNotification,
    ) -> Result<NotifyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        info!(
            package_id = %notification.package_id,
            shipment = %notification.shipment_number,
            kind = ?notification.kind,
            to = %notification.contact_phone,
            "{}",
            notification.message()
        );
        Ok(NotifyOutcome::Delivered)
    }
}

/// Publishes notifications on an in-process channel for downstream senders
/// (SMS, e-mail gateways) to consume.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PackageNotification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PackageNotification> {
        self.sender.subscribe()
    }

    /// Subscribe `sink` and hand it every published notification until all
    /// publishers are gone.
    pub fn spawn_forwarder(&self, sink: Arc<dyn Notifier>) -> JoinHandle<()> {
        let mut rx = self.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => {
                        if let Err(e) = sink.notify(&notification).await {
                            warn!(
                                package_id = %notification.package_id,
                                kind = ?notification.kind,
                                "Forwarding notification failed: {}",
                                e
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Notification forwarder fell behind, {} notifications dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("Notification forwarder stopped");
        })
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(
        &self,
        notification: &PackageNotification,
    ) -> Result<NotifyOutcome, Box<dyn std::error::Error + Send + Sync>> {
        if self.sender.receiver_count() == 0 {
            return Ok(NotifyOutcome::Skipped("no subscribers".to_string()));
        }

        let receivers = self.sender.send(notification.clone())?;
        info!(
            package_id = %notification.package_id,
            kind = ?notification.kind,
            "Published notification to {} subscribers",
            receivers
        );
        Ok(NotifyOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::mpsc;
    use uuid::Uuid;
    use freight_shared::models::events::{Counterpart, NotificationKind};

    fn notification() -> PackageNotification {
        PackageNotification {
            kind: NotificationKind::Departed,
            counterpart: Counterpart::Recipient,
            package_id: Uuid::new_v4(),
            shipment_id: Uuid::new_v4(),
            shipment_number: "SHP-000004".to_string(),
            contact_name: "Fatou".to_string(),
            contact_phone: "+221770000010".into(),
            contact_email: None,
            recipient_code: "ABCD2345".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier_delivers() {
        let outcome = LogNotifier.notify(&notification()).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let notifier = BroadcastNotifier::new(16);
        let mut rx = notifier.subscribe();

        let sent = notification();
        assert_eq!(notifier.notify(&sent).await.unwrap(), NotifyOutcome::Delivered);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.package_id, sent.package_id);
        assert_eq!(received.contact_phone.expose(), "+221770000010");
    }

    struct ChannelSink(mpsc::UnboundedSender<PackageNotification>);

    #[async_trait]
    impl Notifier for ChannelSink {
        async fn notify(
            &self,
            notification: &PackageNotification,
        ) -> Result<NotifyOutcome, Box<dyn std::error::Error + Send + Sync>> {
            self.0.send(notification.clone())?;
            Ok(NotifyOutcome::Delivered)
        }
    }

    #[tokio::test]
    async fn test_forwarder_hands_notifications_to_sink() {
        let notifier = BroadcastNotifier::new(16);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = notifier.spawn_forwarder(Arc::new(ChannelSink(tx)));

        let sent = notification();
        assert_eq!(notifier.notify(&sent).await.unwrap(), NotifyOutcome::Delivered);

        let forwarded = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(forwarded.package_id, sent.package_id);

        // Last publisher gone, the forwarder ends
        drop(notifier);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_skipped() {
        let notifier = BroadcastNotifier::new(16);
        let outcome = notifier.notify(&notification()).await.unwrap();
        assert!(matches!(outcome, NotifyOutcome::Skipped(_)));
    }
}
