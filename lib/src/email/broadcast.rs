//! Sending one newsletter to every subscriber.
//!
//! Recipients are processed strictly one after another, each over its own
//! relay session. A failed recipient is logged and counted, never aborting
//! the batch, and the caller only gets an answer once every address was
//! attempted.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use lettre::message::Mailbox;

use crate::email::footer::{inject_footer, unsubscribe_footer};
use crate::email::list::SubscriberStore;
use crate::email::{compose, parse_mailbox, Relay, DELIVERY_TIMEOUT};
use crate::{Config, ErrorKind, Result};

/// Operator-authored newsletter.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Broadcast {
    pub subject: String,
    /// Html fragment or a full document.
    pub body: String,
}

impl Broadcast {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() || self.body.trim().is_empty() {
            return Err(
                ErrorKind::BadInput("Subject and message cannot be empty".to_string()).into(),
            );
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    NoSubscribers,
    FullySent,
    PartiallySent,
    FullyFailed,
}

/// Aggregate result of a broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub succeeded: usize,
    pub failed: usize,
}

impl Report {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn status(&self) -> Status {
        match (self.succeeded, self.failed) {
            (0, 0) => Status::NoSubscribers,
            (_, 0) => Status::FullySent,
            (0, _) => Status::FullyFailed,
            _ => Status::PartiallySent,
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status() {
            Status::NoSubscribers => write!(f, "No subscribers found."),
            Status::FullySent => write!(f, "Email sent to all {} subscribers.", self.succeeded),
            Status::PartiallySent => write!(
                f,
                "Sent to {}/{} subscribers; {} failed.",
                self.succeeded,
                self.total(),
                self.failed
            ),
            Status::FullyFailed => {
                write!(f, "Failed to send to all {} subscribers.", self.failed)
            }
        }
    }
}

/// Delivers broadcasts to the subscribers found in the store.
pub struct Dispatcher {
    store: Arc<dyn SubscriberStore>,
    relay: Arc<dyn Relay>,
    sender: Mailbox,
    base_url: String,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        relay: Arc<dyn Relay>,
        sender: &str,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            relay,
            sender: parse_mailbox(sender)?,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn SubscriberStore>,
        relay: Arc<dyn Relay>,
    ) -> Result<Self> {
        Self::new(store, relay, config.sender(), config.base_url.clone())
    }

    /// Sends the broadcast to every current subscriber.
    ///
    /// Returns an error without touching the relay if the broadcast is empty
    /// or the subscriber list can't be read. Otherwise the report tells how
    /// many deliveries succeeded. Broadcasts that reached at least one
    /// subscriber are recorded in the store; a failure to record is only
    /// logged.
    #[tracing::instrument(skip_all, fields(subject = %broadcast.subject))]
    pub async fn dispatch(&self, broadcast: &Broadcast) -> Result<Report> {
        broadcast.validate()?;

        let recipients = self.store.list_subscriber_emails().map_err(|e| {
            tracing::error!("failed retrieving subscribers: {e}");
            ErrorKind::SubscriberRetrieval(e.kind.to_string())
        })?;

        let mut report = Report::default();
        if recipients.is_empty() {
            tracing::info!("no subscribers, nothing to send");
            return Ok(report);
        }

        for recipient in &recipients {
            match self.deliver(broadcast, recipient).await {
                Ok(()) => {
                    tracing::info!(recipient = %recipient, "newsletter sent");
                    report.succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(recipient = %recipient, "failed sending newsletter: {e}");
                    report.failed += 1;
                }
            }
        }

        if report.succeeded > 0 {
            if let Err(e) = self
                .store
                .append_newsletter_log(&broadcast.subject, &broadcast.body)
            {
                tracing::error!("failed logging newsletter: {e}");
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "broadcast finished"
        );
        Ok(report)
    }

    /// Body as sent to one recipient, carrying their own unsubscribe link.
    fn personalize(&self, body: &str, recipient: &str) -> String {
        inject_footer(body, &unsubscribe_footer(&self.base_url, recipient))
    }

    async fn deliver(&self, broadcast: &Broadcast, recipient: &str) -> Result<()> {
        let body = self.personalize(&broadcast.body, recipient);
        let message = compose(self.sender.clone(), recipient, &broadcast.subject, body)?;

        tokio::time::timeout(DELIVERY_TIMEOUT, self.relay.send(message))
            .await
            .map_err(|_| ErrorKind::DeliveryTimeout(DELIVERY_TIMEOUT.as_secs()))?
    }
}
