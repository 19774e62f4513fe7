use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// A rendered confirmation email waiting to be sent.
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound email transport. The default implementation only logs; a real
/// SMTP or HTTP-API transport is a drop-in replacement behind this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, job: &EmailJob) -> anyhow::Result<()>;
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, job: &EmailJob) -> anyhow::Result<()> {
        tracing::info!(to = %job.to, subject = %job.subject, "email dispatched");
        Ok(())
    }
}

/// Hands email jobs to a background worker so the HTTP response never waits
/// on the mail transport. Delivery is best-effort by design: enqueue and send
/// failures are logged and never surfaced to the request that queued them.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<EmailJob>,
}

impl Notifier {
    pub fn spawn(mailer: Arc<dyn Mailer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<EmailJob>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(err) = mailer.send(&job).await {
                    tracing::warn!(error = %err, to = %job.to, "email send failed");
                }
            }
        });
        Self { tx }
    }

    pub fn enqueue(&self, job: EmailJob) {
        if let Err(err) = self.tx.send(job) {
            tracing::warn!(error = %err, "email queue closed, dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Arc<Mutex<Vec<EmailJob>>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, job: &EmailJob) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(job.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn enqueued_jobs_reach_the_mailer() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::spawn(Arc::new(RecordingMailer { sent: sent.clone() }));

        notifier.enqueue(EmailJob {
            to: "customer@example.com".into(),
            subject: "Order confirmation".into(),
            html: "<p>thanks</p>".into(),
        });

        // The worker runs on its own task; give it a moment to drain.
        for _ in 0..50 {
            if !sent.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "customer@example.com");
    }
}
