//! Subscribers and the record of what was sent to them.
//!
//! Subscriber management happens elsewhere; the broadcast only needs to read
//! the current addresses and to append a record of each newsletter.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Database, Identifiable};
use crate::Result;

/// A newsletter recipient.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub address: String,
}

impl Subscriber {
    pub fn new(address: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            address,
        }
    }
}

impl Collectable for Subscriber {
    fn get_collection_name() -> &'static str {
        "email_subscriptions"
    }
}

impl Identifiable for Subscriber {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// Audit record of a sent newsletter. Holds the body as written by the
/// operator, before any footer is added.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsletterLog {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl NewsletterLog {
    pub fn new(subject: &str, body: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            body: body.to_string(),
            sent_at: Utc::now(),
        }
    }
}

impl Collectable for NewsletterLog {
    fn get_collection_name() -> &'static str {
        "newsletters"
    }
}

impl Identifiable for NewsletterLog {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// The two operations the broadcast needs from subscriber storage.
pub trait SubscriberStore: Send + Sync {
    /// All current subscriber addresses. Order carries no meaning.
    fn list_subscriber_emails(&self) -> Result<Vec<String>>;

    fn append_newsletter_log(&self, subject: &str, body: &str) -> Result<()>;
}

impl SubscriberStore for Database {
    fn list_subscriber_emails(&self) -> Result<Vec<String>> {
        Ok(self
            .get_collection::<Subscriber>()?
            .into_iter()
            .map(|s| s.address)
            .collect())
    }

    fn append_newsletter_log(&self, subject: &str, body: &str) -> Result<()> {
        self.set(&NewsletterLog::new(subject, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_stored_addresses() {
        let db = Database::temporary().unwrap();
        db.set(&Subscriber::new("a@x.com".to_string())).unwrap();
        db.set(&Subscriber::new("b@x.com".to_string())).unwrap();

        let mut emails = db.list_subscriber_emails().unwrap();
        emails.sort();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn appends_newsletter_log() {
        let db = Database::temporary().unwrap();
        db.append_newsletter_log("Update", "<p>hi</p>").unwrap();

        let logs = db.get_collection::<NewsletterLog>().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].subject, "Update");
        assert_eq!(logs[0].body, "<p>hi</p>");
    }
}
