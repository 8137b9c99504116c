//! Normalised view of one transcript line.

use std::sync::LazyLock;

use regex::Regex;

/// `[timestamp] <@nick> message`, timestamp optional.
static CHAT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[\]\d:\-./ TZ+]*<\s*[~&@%+]?([^<>\s]+)\s*>\s?(.*)$")
        .unwrap_or_else(|e| unreachable!("chat line pattern: {e}"))
});

static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:\[[^\]]*\]|\d{1,2}:\d{2}(?::\d{2})?)\s*)+")
        .unwrap_or_else(|e| unreachable!("timestamp pattern: {e}"))
});

/// Second words that mark `* nick ...` as a client status line.
const STATUS_VERBS: &[&str] = &[
    "has", "is", "was", "sets", "kicked", "changes", "gives", "removes", "now",
];

/// Client notices of the form `* Word ...` that carry no nick.
const NOTICE_HEADS: &[&str] = &[
    "Disconnected",
    "Connecting",
    "Connected",
    "Now",
    "Topic",
    "Looking",
    "Retrieving",
    "Joined",
    "Mode",
    "Channel",
    "You",
];

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap_or_else(|e| unreachable!("tag pattern: {e}")));

/// A raw line split into speaker and message body.
///
/// Lines without a `<nick>` speaker are status lines written by the client
/// itself (joins, quits, kicks, disconnects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    /// Nick that said the line, for chat lines.
    pub speaker: Option<String>,
    /// Message text (chat) or status text, without timestamp.
    pub body: String,
}

impl LineView {
    /// Parse a raw log line.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = normalize(raw);

        if let Some(caps) = CHAT_LINE.captures(&text) {
            return Self {
                speaker: Some(caps[1].to_string()),
                body: caps[2].trim().to_string(),
            };
        }

        let body = TIMESTAMP_PREFIX.replace(&text, "");
        Self {
            speaker: None,
            body: body.trim().to_string(),
        }
    }

    /// Whether this is a status line rather than chat.
    #[must_use]
    pub fn is_status(&self) -> bool {
        self.speaker.is_none()
    }

    /// Nick performing a `/me` action, for lines like `* bob waves`.
    ///
    /// Client status lines that share the `* ` prefix (joins, quits, mode
    /// changes, kicks, connection notices) yield `None`.
    #[must_use]
    pub fn action_nick(&self) -> Option<&str> {
        if !self.is_status() {
            return None;
        }
        let mut words = self.body.strip_prefix("* ")?.split_whitespace();
        let nick = words.next()?;
        let verb = words.next()?;

        let nick_shaped = nick
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_[]\\`^{}|".contains(c));
        if !nick_shaped
            || NOTICE_HEADS.contains(&nick)
            || !verb.starts_with(|c: char| c.is_alphabetic())
            || STATUS_VERBS.iter().any(|v| v.eq_ignore_ascii_case(verb))
        {
            return None;
        }
        Some(nick)
    }

    /// Whether the speaker is one of the given nicks.
    #[must_use]
    pub fn spoken_by_any(&self, nicks: &[String]) -> bool {
        self.speaker
            .as_deref()
            .is_some_and(|speaker| nicks.iter().any(|n| n.eq_ignore_ascii_case(speaker)))
    }
}

/// Strip line endings and, for HTML exports, markup and entities.
fn normalize(raw: &str) -> String {
    let line = raw.trim_end_matches(['\r', '\n']);
    if !line.contains("</") {
        return line.to_string();
    }
    HTML_TAG
        .replace_all(line, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
