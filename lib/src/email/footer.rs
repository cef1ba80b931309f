//! Unsubscribe footer appended to outgoing newsletters.

use url::form_urlencoded;

/// Link a subscriber can follow to unsubscribe. `base_url` is the public
/// host of the site, without the scheme.
pub fn unsubscribe_link(base_url: &str, recipient: &str) -> String {
    let email: String = form_urlencoded::byte_serialize(recipient.as_bytes()).collect();
    format!("https://{base_url}/unsubscribe?email={email}")
}

pub fn unsubscribe_footer(base_url: &str, recipient: &str) -> String {
    format!(
        "<br><br><hr><p style='font-size: 12px; color: #666;'>If you ever wish to unsubscribe, \
        please click <a href='{}'>here</a>.</p>",
        unsubscribe_link(base_url, recipient)
    )
}

/// Inserts the footer into the body.
///
/// The footer goes right before the first `</html>` if there is one, else
/// before the first `</body>`, else at the very end. Tags are matched
/// case-insensitively.
pub fn inject_footer(body: &str, footer: &str) -> String {
    // Ascii lowercasing keeps byte offsets intact.
    let lower = body.to_ascii_lowercase();
    let at = lower
        .find("</html>")
        .or_else(|| lower.find("</body>"))
        .unwrap_or(body.len());

    let mut out = String::with_capacity(body.len() + footer.len());
    out.push_str(&body[..at]);
    out.push_str(footer);
    out.push_str(&body[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = "<p>footer</p>";

    #[test]
    fn goes_before_closing_html_rather_than_body() {
        assert_eq!(
            inject_footer("<html><body>hi</body></html>", FOOTER),
            "<html><body>hi</body><p>footer</p></html>"
        );
    }

    #[test]
    fn goes_before_closing_body_without_html() {
        assert_eq!(
            inject_footer("<body>hi</body>", FOOTER),
            "<body>hi<p>footer</p></body>"
        );
    }

    #[test]
    fn appended_to_fragments() {
        assert_eq!(inject_footer("hi", FOOTER), "hi<p>footer</p>");
        assert_eq!(inject_footer("", FOOTER), FOOTER);
    }

    #[test]
    fn tags_match_case_insensitively() {
        assert_eq!(
            inject_footer("<HTML><BODY>hi</BODY></HTML>", FOOTER),
            "<HTML><BODY>hi</BODY><p>footer</p></HTML>"
        );
    }

    #[test]
    fn only_first_occurrence_is_used() {
        assert_eq!(
            inject_footer("a</html>b</html>", FOOTER),
            "a<p>footer</p></html>b</html>"
        );
    }

    #[test]
    fn non_ascii_body_keeps_offsets() {
        assert_eq!(
            inject_footer("<body>zażółć</body>", FOOTER),
            "<body>zażółć<p>footer</p></body>"
        );
    }

    #[test]
    fn recipient_is_url_encoded() {
        assert_eq!(
            unsubscribe_link("example.com", "a+b@x.com"),
            "https://example.com/unsubscribe?email=a%2Bb%40x.com"
        );
        assert!(unsubscribe_footer("example.com", "a@x.com")
            .contains("href='https://example.com/unsubscribe?email=a%40x.com'"));
    }
}
