use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::{Error, ErrorKind, Result};

pub mod broadcast;
pub mod footer;
pub mod list;

/// Standard port for SMTP submission over implicit TLS.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Upper bound for connecting, negotiating TLS, authenticating and
/// submitting a single message.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// How the connection to the relay gets encrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte.
    Implicit,
    /// Plain connection upgraded with `STARTTLS`, which the server must
    /// support.
    StartTls,
}

impl TlsMode {
    pub fn for_port(port: u16) -> Self {
        if port == IMPLICIT_TLS_PORT {
            TlsMode::Implicit
        } else {
            TlsMode::StartTls
        }
    }
}

/// Something that accepts one message per call for delivery.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn send(&self, message: Message) -> Result<()>;
}

/// Connection settings for an SMTP relay.
#[derive(Clone, Debug)]
pub struct SmtpRelay {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl SmtpRelay {
    pub fn from_config(config: &crate::config::Email) -> Self {
        Self {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            user: config.smtp_user.clone(),
            password: config.smtp_password.clone(),
        }
    }

    /// Builds a fresh transport, so every message travels over its own
    /// session. Lettre is built without connection pooling, so the session
    /// is closed before `send` returns.
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = match TlsMode::for_port(self.port) {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.server)?,
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)?
            }
        };

        Ok(builder
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .authentication(vec![Mechanism::Plain])
            .timeout(Some(DELIVERY_TIMEOUT))
            .build())
    }
}

#[async_trait]
impl Relay for SmtpRelay {
    async fn send(&self, message: Message) -> Result<()> {
        let mailer = self.transport()?;

        let response = mailer.send(message).await?;
        if response.is_positive() {
            Ok(())
        } else {
            Err(ErrorKind::EmailBadResponse(response.code().to_string()).into())
        }
    }
}

pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            Error::new(ErrorKind::EmailParseError(format!("{address}: {e}")))
        })
}

/// Builds a single-part html message.
pub fn compose(from: Mailbox, to: &str, subject: &str, html_body: String) -> Result<Message> {
    let message = Message::builder()
        .from(from)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body)?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn port_465_uses_implicit_tls() {
        assert_eq!(TlsMode::for_port(465), TlsMode::Implicit);
    }

    #[test]
    fn other_ports_use_starttls() {
        assert_eq!(TlsMode::for_port(587), TlsMode::StartTls);
        assert_eq!(TlsMode::for_port(25), TlsMode::StartTls);
        assert_eq!(TlsMode::for_port(2525), TlsMode::StartTls);
    }

    /// Minimal plaintext smtp server accepting a single session. Raises
    /// `quit` right before answering `QUIT`.
    async fn serve_one_session(listener: TcpListener, quit: Arc<AtomicBool>) {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        write.write_all(b"220 localhost ready\r\n").await.unwrap();
        let mut in_data = false;
        while let Ok(Some(line)) = lines.next_line().await {
            if in_data {
                if line == "." {
                    in_data = false;
                    write.write_all(b"250 queued\r\n").await.unwrap();
                }
                continue;
            }
            let command = line.to_ascii_uppercase();
            if command.starts_with("EHLO") {
                write.write_all(b"250 localhost\r\n").await.unwrap();
            } else if command.starts_with("DATA") {
                in_data = true;
                write.write_all(b"354 go ahead\r\n").await.unwrap();
            } else if command.starts_with("QUIT") {
                quit.store(true, Ordering::SeqCst);
                write.write_all(b"221 bye\r\n").await.unwrap();
                break;
            } else {
                write.write_all(b"250 ok\r\n").await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn session_is_closed_before_send_returns() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let quit = Arc::new(AtomicBool::new(false));
        let server = tokio::spawn(serve_one_session(listener, quit.clone()));

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("127.0.0.1")
            .port(port)
            .timeout(Some(DELIVERY_TIMEOUT))
            .build();
        let from = parse_mailbox("news@example.com").unwrap();
        let message = compose(from, "a@x.com", "Update", "<p>hi</p>".to_string()).unwrap();

        let response = mailer.send(message).await.unwrap();
        assert!(response.is_positive());
        assert!(quit.load(Ordering::SeqCst));

        server.await.unwrap();
    }

    #[test]
    fn composes_html_message() {
        let from = parse_mailbox("News <news@example.com>").unwrap();
        let message = compose(from, "a@x.com", "Update", "<p>hi</p>".to_string()).unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("From: News <news@example.com>"));
        assert!(formatted.contains("To: a@x.com"));
        assert!(formatted.contains("Subject: Update"));
        assert!(formatted.contains("Content-Type: text/html; charset=utf-8"));
        assert!(formatted.contains("<p>hi</p>"));
        assert_eq!(message.envelope().to()[0].to_string(), "a@x.com");
    }

    #[test]
    fn malformed_recipient_is_rejected() {
        let from = parse_mailbox("news@example.com").unwrap();
        let result = compose(from, "not an address", "Update", String::new());
        assert!(matches!(
            result.map_err(|e| e.kind),
            Err(ErrorKind::EmailParseError(_))
        ));
    }
}
